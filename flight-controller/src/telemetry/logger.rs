use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

use crate::util::time::get_unix_time_seconds;

static LOGGER: OnceCell<FlightLogger> = OnceCell::new();

/// Errors go to the console; the volatile file gets warnings and above, or
/// everything when diagnostics are on. The file lives in RAM during flight
/// and is moved to durable storage at shutdown.
pub struct FlightLogger {
    file: Mutex<Option<File>>,
    path: PathBuf,
    file_level: LevelFilter,
}

impl FlightLogger {
    /// Installs the process-wide logger. Later calls return the first one.
    pub fn init(path: &Path, diagnostics: bool) -> &'static FlightLogger {
        let logger = LOGGER.get_or_init(|| {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .ok();
            if file.is_none() {
                eprintln!("could not open log file {}", path.display());
            }
            FlightLogger {
                file: Mutex::new(file),
                path: path.to_path_buf(),
                file_level: if diagnostics {
                    LevelFilter::Trace
                } else {
                    LevelFilter::Warn
                },
            }
        });
        if log::set_logger(logger).is_ok() {
            log::set_max_level(logger.file_level.max(LevelFilter::Error));
        }
        logger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the volatile file and moves it to `directory` as
    /// `qcstats-<unix seconds>.csv`.
    pub fn persist(&self, directory: &Path) -> std::io::Result<PathBuf> {
        if let Ok(mut file) = self.file.lock() {
            if let Some(open) = file.as_mut() {
                open.flush()?;
            }
            *file = None;
        }
        persist_log(&self.path, directory, get_unix_time_seconds())
    }
}

/// Renames `source` into `directory`, copying when they are on different
/// filesystems.
pub fn persist_log(source: &Path, directory: &Path, timestamp: u64) -> std::io::Result<PathBuf> {
    let destination = directory.join(format!("qcstats-{}.csv", timestamp));
    if fs::rename(source, &destination).is_err() {
        fs::copy(source, &destination)?;
        fs::remove_file(source)?;
    }
    Ok(destination)
}

impl Log for FlightLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() == Level::Error
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if record.level() == Level::Error {
            eprintln!("{}", record.args());
        }
        if record.level() > self.file_level {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = writeln!(
                    file,
                    "[{}] {} {}, {}",
                    record.level(),
                    record.target(),
                    record.line().unwrap_or(0),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
