use std::{fs, io};

use crate::data_path;

const LOG_FILE: &str = "tickerboard-current.log";

/// Create or open the log file for writing, truncated per run. The
/// parent directory is created if needed.
pub fn file() -> Result<fs::File, Error> {
    let path = data_path(Some(LOG_FILE));

    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    Ok(fs::OpenOptions::new()
        .write(true)
        .create(true)
        .append(false)
        .truncate(true)
        .open(path)?)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SetLog(#[from] log::SetLoggerError),
    #[error(transparent)]
    ParseLevel(#[from] log::ParseLevelError),
}
