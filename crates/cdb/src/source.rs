//! Random-access byte sources backing a database.

use std::fs::File;
use std::io;

use memmap2::Mmap;

/// Uniform random-access byte retrieval.
///
/// `read_at` must fill `buf` exactly from absolute `offset`. A short read
/// is an error (`UnexpectedEof`), never a truncated success — the lookup
/// engine never tolerates partial data.
///
/// The file backing uses a positioned-read primitive rather than a
/// seek-then-read pair, so one handle serves concurrent lookups without
/// shared cursor state. The slice backings serve subrange reads with no
/// syscalls at all.
pub trait ByteSource {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()>;
}

impl ByteSource for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut filled = 0;
        while filled < buf.len() {
            match self.seek_read(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ByteSource for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let src = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(buf.len()).map(|end| (start, end)))
            .and_then(|(start, end)| self.get(start..end))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of buffer")
            })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        self.as_slice().read_at(buf, offset)
    }
}

impl ByteSource for Mmap {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        self[..].read_at(buf, offset)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        (**self).read_at(buf, offset)
    }
}
