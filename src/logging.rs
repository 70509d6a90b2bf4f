use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Custom logger structure
#[derive(Debug)]
struct ValueControllerLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl log::Log for ValueControllerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() <= self.level {
            // Debug and trace records only pass when their topic is listed
            if let Some(filters) = &self.debug_filters {
                if metadata.level() == log::Level::Debug || metadata.level() == log::Level::Trace {
                    return filters.contains(metadata.target())
                        || filters.iter().any(|f| metadata.target().starts_with(f));
                }
            }
            return true;
        }
        false
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m", // Red
            log::Level::Warn => "\x1B[33m",  // Yellow
            log::Level::Info => "\x1B[32m",  // Green
            log::Level::Debug => "\x1B[36m", // Cyan
            log::Level::Trace => "\x1B[35m", // Magenta
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {target}: {message}",
            level = record.level(),
            target = record.target(),
            message = record.args()
        );

        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // A closed stdout must not take the simulation down with it
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static LOGGER: OnceLock<ValueControllerLogger> = OnceLock::new();

/// Parse a level name as accepted on the command line
pub fn parse_level(name: &str) -> LevelFilter {
    match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn parse_filters(debug_filter: Option<String>) -> Option<HashSet<String>> {
    debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    })
}

/// Initialize the logger with optional debug topic filters (e.g. "controller,value")
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| ValueControllerLogger {
        level,
        debug_filters: parse_filters(debug_filter),
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Topic macros: controller lifecycle, dynamic value transitions, village demo

#[macro_export]
macro_rules! debug_controller {
    ($($arg:tt)*) => {
        log::debug!(target: "controller", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_value {
    ($key:expr, $($arg:tt)*) => {
        log::debug!(target: "value", "[{}] {}", $key, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_village {
    ($($arg:tt)*) => {
        log::debug!(target: "village", "{}", format_args!($($arg)*))
    };
}
