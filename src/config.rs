//! Command-line flags and the settings derived from them.

use crate::cursor::DEFAULT_PAGE_SIZE;
use anyhow::{Context, Result, bail};
use argh::FromArgs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Size hint used when the database file does not exist yet.
pub const DEFAULT_SIZE_HINT: u64 = 32 * 1024 * 1024;

#[derive(FromArgs, Debug)]
/// Interactive console for an embedded key-value store.
pub struct Args {
    #[argh(option)]
    /// path of the database file
    pub db: Option<PathBuf>,

    #[argh(positional)]
    /// database file, when --db is not given
    pub path: Option<PathBuf>,

    #[argh(option, default = "2.0")]
    /// growth factor applied to the current file size to size the store
    pub size: f64,

    #[argh(switch)]
    /// open the database in read-only mode
    pub ro: bool,

    #[argh(option, default = "DEFAULT_PAGE_SIZE")]
    /// number of entries printed per scan page
    pub page_size: usize,

    #[argh(switch, short = 'v')]
    /// enable debug logging
    pub verbose: bool,
}

/// Settings the console starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub path: PathBuf,
    /// Bytes handed to the store as its cache budget.
    pub size_hint: u64,
    pub read_only: bool,
    pub page_size: usize,
}

impl ConsoleConfig {
    /// Validates the flags and computes the size hint from the existing file.
    pub fn from_args(args: &Args) -> Result<Self> {
        let Some(path) = args.db.clone().or_else(|| args.path.clone()) else {
            bail!("--db must be specified");
        };
        if !(args.size.is_finite() && args.size > 0.0) {
            bail!("--size must be a positive number, got {}", args.size);
        }
        if args.page_size == 0 {
            bail!("--page-size must be at least 1");
        }

        Ok(Self {
            size_hint: size_hint(&path, args.size)?,
            path,
            read_only: args.ro,
            page_size: args.page_size,
        })
    }
}

/// Existing file size scaled by `factor`, or [`DEFAULT_SIZE_HINT`] for a new file.
pub fn size_hint(path: &Path, factor: f64) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok((meta.len() as f64 * factor) as u64),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(DEFAULT_SIZE_HINT),
        Err(e) => {
            Err(e).with_context(|| format!("failed to stat database file {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["kv_console"], args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--db", "/nonexistent/data.redb"]);
        let config = ConsoleConfig::from_args(&args).unwrap();
        assert_eq!(config.path, PathBuf::from("/nonexistent/data.redb"));
        assert_eq!(config.size_hint, DEFAULT_SIZE_HINT);
        assert!(!config.read_only);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_positional_path() {
        let args = parse(&["--ro", "--page-size", "3", "/nonexistent/other.redb"]);
        let config = ConsoleConfig::from_args(&args).unwrap();
        assert_eq!(config.path, PathBuf::from("/nonexistent/other.redb"));
        assert!(config.read_only);
        assert_eq!(config.page_size, 3);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let args = parse(&[]);
        let err = ConsoleConfig::from_args(&args).unwrap_err();
        assert!(err.to_string().contains("--db"));
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        assert!(ConsoleConfig::from_args(&parse(&["--db", "x", "--size", "0"])).is_err());
        assert!(ConsoleConfig::from_args(&parse(&["--db", "x", "--page-size", "0"])).is_err());
    }

    #[test]
    fn test_size_hint_scales_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 1000]).unwrap();
        file.flush().unwrap();
        assert_eq!(size_hint(file.path(), 2.0).unwrap(), 2000);
        assert_eq!(size_hint(file.path(), 0.5).unwrap(), 500);
    }
}
