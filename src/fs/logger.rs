//! File-backed implementation of the [`log`] facade.
//!
//! Every record is printed to the terminal and appended to `log.txt`, which
//! on the brain lands on the SD card. Each line carries the level, the time
//! since the program started, the module path and the message:
//!
//! ```text
//! INFO [1m 12s 40ms] punchbot::puncher::task - Puncher Task Started
//! WARN [1m 15s 200ms] punchbot::puncher::task - Launch Ignored: Puncher Not Ready
//! ```
//!
//! ```ignore
//! use log::LevelFilter;
//! use punchbot::fs::logger;
//!
//! logger::init(LevelFilter::Info).unwrap_or_else(|e| println!("Logger Error: {e}"));
//! ```

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    sync::{Mutex, OnceLock},
    time::Duration,
};

use humantime::format_duration;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Name of the log file, relative to the working directory.
pub const LOG_FILE: &str = "log.txt";

/// Writes log records to stdout and [`LOG_FILE`].
pub struct PunchLogger {
    /// `None` when the file could not be opened, e.g. without an SD card.
    file_writer: Mutex<Option<BufWriter<File>>>,
}

impl PunchLogger {
    fn new() -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(LOG_FILE)
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
        }
    }
}

impl log::Log for PunchLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record, uptime());
        print!("{}", line);

        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.flush();
            }
        }
    }
}

static LOGGER: OnceLock<PunchLogger> = OnceLock::new();

/// Installs the logger and sets the maximum level.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(PunchLogger::new);
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

/// One log line, newline included.
fn format_line(record: &Record, uptime: Duration) -> String {
    format!(
        "{} [{}] {} - {}\n",
        record.level(),
        format_duration(uptime),
        record.target(),
        record.args()
    )
}

/// Time since the user program started, at millisecond resolution.
#[cfg(target_os = "vexos")]
fn uptime() -> Duration { truncate_millis(vexide::time::user_uptime()) }

/// Time since the first log record.
#[cfg(not(target_os = "vexos"))]
fn uptime() -> Duration {
    static START: OnceLock<std::time::Instant> = OnceLock::new();
    truncate_millis(START.get_or_init(std::time::Instant::now).elapsed())
}

fn truncate_millis(duration: Duration) -> Duration { Duration::from_millis(duration.as_millis() as u64) }

#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, debug, error, info, trace, warn};

    use super::*;

    #[test]
    fn line_layout() {
        let line = format_line(
            &Record::builder()
                .level(Level::Warn)
                .target("punchbot::puncher")
                .args(format_args!("Launch Ignored"))
                .build(),
            Duration::from_millis(75_040),
        );
        assert_eq!(line, "WARN [1m 15s 40ms] punchbot::puncher - Launch Ignored\n");
    }

    #[test]
    fn uptime_has_millisecond_resolution() {
        assert_eq!(truncate_millis(Duration::from_micros(1_500)), Duration::from_millis(1));
        assert_eq!(uptime().subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    #[ignore = "filesystem access needed (file write)"]
    fn log_full_test() {
        super::init(LevelFilter::Trace).expect("Failed to initialize logger");

        trace!("This is a trace message");
        debug!("This is a debug message");
        info!("This is an info message");
        warn!("This is a warning message");
        error!("This is an error message");

        log::logger().flush();

        assert!(
            log::logger().enabled(
                &log::Metadata::builder()
                    .level(log::Level::Error)
                    .target("test")
                    .build()
            )
        );
    }
}
