// bridge_core/src/logging/logging.rs
use crate::storage::bridge_config::BridgeConfig;
use std::cell::RefCell;
use flexi_logger::*;
use log::Record;
use std::io;

thread_local! {
    /// The most recent message logged through the `bridge_*` macros on this thread.
    pub static LAST_LOG: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Logs through the `log` facade and remembers the message in `LAST_LOG`.
#[macro_export]
macro_rules! bridge_log {
    ($lvl:expr, $($arg:tt)*) => {{
        log::log!($lvl, $($arg)*);
        $crate::logging::logging::LAST_LOG.with(|buf| *buf.borrow_mut() = format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! bridge_info  { ($($arg:tt)*) => { $crate::bridge_log!(log::Level::Info,  $($arg)*) }; }

#[macro_export]
macro_rules! bridge_warn  { ($($arg:tt)*) => { $crate::bridge_log!(log::Level::Warn,  $($arg)*) }; }

#[macro_export]
macro_rules! bridge_error { ($($arg:tt)*) => { $crate::bridge_log!(log::Level::Error, $($arg)*) }; }

#[macro_export]
macro_rules! bridge_debug { ($($arg:tt)*) => { $crate::bridge_log!(log::Level::Debug, $($arg)*) }; }

/// Returns a copy of the last message logged through the `bridge_*` macros.
pub fn last_log() -> String {
    LAST_LOG.with(|buf| buf.borrow().clone())
}

/// Starts the logger described by `config`.
///
/// Logs go to rotating files when `log_dir` is set and to stderr otherwise.
/// Keep the returned handle alive for as long as logs should be written.
pub fn init_logger(config: &BridgeConfig) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_str(&config.log_spec)?.format(bridge_formatter);

    let logger = match &config.log_dir {
        Some(log_dir) => {
            let file_spec = FileSpec::default()
                .directory(log_dir)
                .basename("propbridge")
                .suffix("log");

            logger
                .log_to_file(file_spec)
                .rotate(
                    Criterion::Size(5_000_000),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(5),
                )
                .write_mode(WriteMode::BufferAndFlush)
        }
        None => logger.log_to_stderr(),
    };

    let handle = logger.start()?;

    match &config.log_dir {
        Some(dir) => bridge_info!("Log dir: {}.", dir.display()),
        None => bridge_debug!("Logging to stderr."),
    }

    Ok(handle)
}

fn bridge_formatter(
    write: &mut dyn io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> io::Result<()> {
    write!(
        write,
        "{} {:5} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.module_path().unwrap_or("<unknown>"),
        &record.args()
    )
}
