use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cdb::{Cdb, CdbWriter};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cdb", version, about = "Constant key/value database tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a database from tab-separated key/value lines.
    Make {
        /// Output database path
        db: PathBuf,
        /// Input file with one record per line (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Look up a single key and print its value.
    ///
    /// Exits 0 when the key is found, 1 when it is absent, 2 on error.
    Get {
        db: PathBuf,
        key: String,
        /// Serve reads from a memory mapping instead of positioned file reads
        #[arg(long)]
        mmap: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    match args.command {
        Command::Make { db, input } => {
            make(&db, input.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Get { db, key, mmap } => get(&db, key.as_bytes(), mmap),
    }
}

fn make(db: &Path, input: Option<&Path>) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut writer =
        CdbWriter::create(db).with_context(|| format!("creating {}", db.display()))?;
    let mut records = 0u64;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('\t') else {
            bail!("line {}: expected `key<TAB>value`", lineno + 1);
        };
        writer.put(key.as_bytes(), value.as_bytes())?;
        records += 1;
    }
    writer.finish()?;
    info!(records, db = %db.display(), "database written");
    Ok(())
}

fn get(db: &Path, key: &[u8], mmap: bool) -> Result<ExitCode> {
    let context = || format!("opening {}", db.display());
    let value = if mmap {
        Cdb::open_mmap(db).with_context(context)?.get(key)?
    } else {
        Cdb::open(db).with_context(context)?.get(key)?
    };

    match value {
        Some(value) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.write_all(b"\n")?;
            Ok(ExitCode::SUCCESS)
        }
        // Absent is not an error; report it through the exit code alone.
        None => Ok(ExitCode::from(1)),
    }
}
