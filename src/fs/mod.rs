//! Filesystem utilities.
//!
//! The only file the robot writes is its log. Install the logger once, before
//! the puncher task is spawned, so its startup message is captured:
//!
//! ```ignore
//! use log::LevelFilter;
//! use punchbot::fs::logger;
//!
//! logger::init(LevelFilter::Debug).unwrap_or_else(|e| println!("Logger Error: {e}"));
//! ```

/// Terminal and `log.txt` logger.
pub mod logger;
