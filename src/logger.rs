use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use chrono::Local;
use sentry_log::SentryLogger;

pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Logger { level }
    }

    fn format(&self, record: &Record) -> String {
        format!("{} [{}] {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.target(), record.level(), record.args())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if record.level() <= Level::Warn {
                eprintln!("{}", self.format(record));
            }
            else {
                println!("{}", self.format(record));
            }
        }
    }

    fn flush(&self) {}
}


/// Installs the console logger, forwarding to Sentry when a client is bound.
pub fn init_logger(level: LevelFilter, with_sentry: bool) -> Result<(), SetLoggerError> {
    let logger = Logger::new(level);

    if with_sentry {
        log::set_boxed_logger(Box::new(SentryLogger::with_dest(logger)))?;
    }
    else {
        log::set_boxed_logger(Box::new(logger))?;
    }

    log::set_max_level(level);
    Ok(())
}
