use anyhow::{anyhow, Result};
use arc_swap::ArcSwapOption;
use byte_unit::Byte;
use colored::Colorize;
use env_logger::Builder;
use log::kv::{Key, Value, VisitSource};
use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::appender::DEFAULT_THRESHOLD;
use crate::slot::Slot;

const FILTER_ENV: &str = "RUST_LOG";
const DEFAULT_LOG_DIR: &str = "log";
const DEFAULT_ACCESS_LOG: &str = "access.log";
const DEFAULT_APP_LOG: &str = "app.log";
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

static SLOT: ArcSwapOption<Slot> = ArcSwapOption::const_empty();
static INSTALLED: OnceCell<()> = OnceCell::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub access_log: PathBuf,
    pub app_log: PathBuf,
    pub rotation_size: u64,
}

impl Config {
    pub fn new(access_log: impl Into<PathBuf>, app_log: impl Into<PathBuf>) -> Config {
        Config {
            access_log: access_log.into(),
            app_log: app_log.into(),
            rotation_size: DEFAULT_THRESHOLD,
        }
    }

    pub fn rotation_size(mut self, size: u64) -> Config {
        self.rotation_size = size;
        self
    }

    /// Reads `LOG_DIR`, `ACCESS_LOG`, `APP_LOG` and `LOG_ROTATION_SIZE`.
    ///
    /// File names default to `access.log` and `app.log` inside `LOG_DIR`,
    /// which is created when missing.
    pub fn from_env() -> Result<Config> {
        let log_dir = PathBuf::from(
            env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_owned()),
        );
        std::fs::create_dir_all(&log_dir)?;
        let access_log = env::var_os("ACCESS_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| log_dir.join(DEFAULT_ACCESS_LOG));
        let app_log = env::var_os("APP_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| log_dir.join(DEFAULT_APP_LOG));
        let rotation_size = match env::var("LOG_ROTATION_SIZE") {
            Ok(v) => parse_size(&v)?,
            Err(_) => DEFAULT_THRESHOLD,
        };
        Ok(Config {
            access_log,
            app_log,
            rotation_size,
        })
    }
}

/// Parses sizes such as `104857600`, `100MiB` or `1 GB`.
pub fn parse_size(s: &str) -> Result<u64> {
    Ok(Byte::from_str(s)
        .map_err(|e| anyhow!("LOG_ROTATION_SIZE has an error:{:?}", e))?
        .get_bytes())
}

/// Opens the global [`Slot`] and routes `log` records into its application log.
///
/// Calling it again replaces the global slot and closes the previous one.
/// Fails without opening any file when another logger is already installed.
pub fn init(config: Config) -> Result<Arc<Slot>> {
    INSTALLED.get_or_try_init(|| {
        let logger = Logger::new();
        let filter = logger.inner.filter();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(filter);
        Ok::<(), log::SetLoggerError>(())
    })?;

    let mut slot = Slot::new();
    slot.initialize(&config.access_log, &config.app_log)?;
    slot.set_rotation_size(config.rotation_size);
    let slot = Arc::new(slot);
    if let Some(old) = SLOT.swap(Some(Arc::clone(&slot))) {
        old.close();
    }
    Ok(slot)
}

/// The slot installed by [`init`], if any.
pub fn slot() -> Option<Arc<Slot>> {
    SLOT.load_full()
}

/// Closes and removes the global slot. Records logged afterwards go to stderr.
pub fn shutdown() {
    if let Some(slot) = SLOT.swap(None) {
        slot.close();
    }
}

struct Logger {
    inner: env_logger::Logger,
}

impl Logger {
    fn new() -> Logger {
        let mut builder = Builder::from_env(FILTER_ENV);

        Logger {
            inner: builder.build(),
        }
    }
}

#[derive(Default)]
struct KvBuf(String);

impl<'kvs> VisitSource<'kvs> for KvBuf {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), log::kv::Error> {
        let str = format!(
            "\t{}:{}",
            key,
            serde_json::to_string(&value).unwrap_or_default()
        );
        self.0.push_str(&str);
        Ok(())
    }
}

fn print_console(level: Level, line: &str) {
    if level == Level::Error {
        eprint!("{}", line.red());
    } else if level == Level::Warn {
        eprint!("{}", line.yellow());
    } else {
        eprint!("{}", line);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut visitor = KvBuf::default();
        let _ = record.key_values().visit(&mut visitor);
        let msg = format!("{}{}", record.args(), visitor.0);

        // rotation diagnostics are raised while an appender lock is held
        if record.target().starts_with(OWN_TARGET) {
            print_console(
                record.level(),
                &format!("[{}] {}: {}\n", record.level(), record.target(), msg),
            );
            return;
        }

        let slot = SLOT.load_full();
        if slot.is_none() || cfg!(debug_assertions) {
            print_console(record.level(), &format!("[{}] {}\n", record.level(), msg));
        }
        if let Some(slot) = slot {
            slot.output(record.level().as_str(), &msg);
        }
    }

    fn flush(&self) {
        if let Some(slot) = SLOT.load_full() {
            slot.flush();
        }
    }
}
