use log::{Record, Level, Metadata, LevelFilter, SetLoggerError};

pub const TARGET: &str = "auction";

#[macro_use]
pub mod macros {
    #[doc(alias = "log::error")]
    #[macro_export]
    macro_rules! log_error {
        ($($arg:tt)*) => {
            ::log::error!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::warn")]
    #[macro_export]
    macro_rules! log_warn {
        ($($arg:tt)*) => {
            ::log::warn!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::info")]
    #[macro_export]
    macro_rules! log_info {
        ($($arg:tt)*) => {
            ::log::info!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::debug")]
    #[macro_export]
    macro_rules! log_debug {
        ($($arg:tt)*) => {
            ::log::debug!(target: $crate::log::TARGET, $($arg)*)
        };
    }
}

struct SimpleLogger;

impl log::Log for SimpleLogger {
    #[inline]
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target() == TARGET && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            match record.level() {
                Level::Error | Level::Warn => eprintln!("{} [{}] {}", now, record.level(), record.args()),
                _ => println!("{} [{}] {}", now, record.level(), record.args()),
            }
        }
    }
    #[inline]
    fn flush(&self) {}
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Installe le logger du bot.
///
/// Tout est affiché en debug, seulement les infos et plus en release.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)
        .map(|_| log::set_max_level(if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info }))
}
