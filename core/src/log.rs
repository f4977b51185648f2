//! Logger and logging macros
//!
//! For the macros to properly compile, the calling crate must add a dependency to
//! crate `log` since the macros expand into calls to it.

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::str::FromStr;

/// Console (stdout) log line pattern, with explicit UTC time zone denoted by the suffix Z
pub const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)}Z [{h({({l}):5.5})}] {m}{n}";

const CONSOLE_APPENDER: &str = "stdout";

/// Tries to init the global logger, but does not panic if it was already setup.
/// Should be used for tests.
pub fn try_init_logger(filters: &str) {
    let stdout = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN))).build();
    let mut root_level = LevelFilter::Info;
    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(stdout)));
    for spec in filters.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()) {
        match spec.split_once('=') {
            Some((target, level)) => {
                if let Ok(level) = LevelFilter::from_str(level) {
                    builder = builder.logger(Logger::builder().build(target.replace('-', "_"), level));
                }
            }
            None => {
                if let Ok(level) = LevelFilter::from_str(spec) {
                    root_level = level;
                }
            }
        }
    }
    if let Ok(config) = builder.build(Root::builder().appender(CONSOLE_APPENDER).build(root_level)) {
        let _ = log4rs::init_config(config);
    }
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        log::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        log::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        log::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        log::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        log::error!($($t)*)
    )
}
