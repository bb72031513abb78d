use std::io::{self, Write};

use chrono::Utc;

use log::{Level, LevelFilter, Metadata, Record};

/// Installs a [`StderrLogger`]; stdout stays reserved for lookup results.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger::new(level)))
        .map(|()| log::set_max_level(level))
}

/// Maps repeated `-v` flags to a level, warnings being the default.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(level: LevelFilter) -> Self {
        StderrLogger { level }
    }
}

fn format_line(level: Level, args: &std::fmt::Arguments) -> String {
    let marker = match level {
        Level::Error => "💣",
        Level::Warn => "🚧",
        Level::Info => "🏁",
        Level::Debug | Level::Trace => "🐜",
    };
    format!("[{}] {} {}: {}", Utc::now(), marker, level, args)
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format_line(record.level(), record.args());
            // nowhere left to report a failed write to stderr
            let _ = writeln!(io::stderr().lock(), "{}", line);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}
