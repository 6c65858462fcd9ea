use anyhow::Result;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::appender::Appender;

const QUIT_PREFIX: &str = "Quit: ";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Level {
    Debug,
    Info,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "ERROR" => Ok(Level::Error),
            "FATAL" => Ok(Level::Fatal),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}

#[derive(Debug)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: {}", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application log and access log, each on its own rotating file.
#[derive(Debug)]
pub struct Slot {
    pid: u32,
    log: Option<Appender>,
    bus: Option<Appender>,
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

impl Slot {
    pub fn new() -> Slot {
        Self::with_pid(std::process::id())
    }

    /// Uses `pid` in application log headers instead of the current process id.
    pub fn with_pid(pid: u32) -> Slot {
        Slot {
            pid,
            log: None,
            bus: None,
        }
    }

    /// Opens both files, replacing and closing any previously opened ones.
    ///
    /// A path that cannot be opened leaves its channel disabled; logging to it
    /// is silently dropped.
    pub fn initialize(
        &mut self,
        access_path: impl AsRef<Path>,
        log_path: impl AsRef<Path>,
    ) -> Result<()> {
        self.close();
        self.log = Some(Appender::with_pid(log_path, self.pid));
        self.bus = Some(Appender::with_pid(access_path, self.pid));
        Ok(())
    }

    pub fn set_rotation_size(&self, size: u64) {
        if let Some(log) = &self.log {
            log.resize_threshold(size);
        }
        if let Some(bus) = &self.bus {
            bus.resize_threshold(size);
        }
    }

    pub fn app_appender(&self) -> Option<&Appender> {
        self.log.as_ref()
    }

    pub fn access_appender(&self) -> Option<&Appender> {
        self.bus.as_ref()
    }

    pub fn is_log_enabled(&self) -> bool {
        self.log.as_ref().is_some_and(Appender::is_enabled)
    }

    pub fn is_access_enabled(&self) -> bool {
        self.bus.as_ref().is_some_and(Appender::is_enabled)
    }

    /// Writes `msg` to the application log under an arbitrary prefix.
    pub fn output(&self, prefix: &str, msg: &str) {
        if let Some(log) = &self.log {
            log.write_with_header(prefix, msg);
        }
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.output(level.as_str(), &message(args));
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Logs with a `Quit: ` prefix, flushes everything and exits with status 1.
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.output(QUIT_PREFIX, &message(args));
        self.close();
        std::process::exit(1)
    }

    /// Access log entry; dropped when the access log was never initialized.
    pub fn access(&self, args: fmt::Arguments<'_>) {
        if let Some(bus) = &self.bus {
            bus.write_access(&message(args));
        }
    }

    pub fn flush(&self) {
        if let Some(log) = &self.log {
            log.flush();
        }
        if let Some(bus) = &self.bus {
            bus.flush();
        }
    }

    pub fn close(&self) {
        if let Some(log) = &self.log {
            log.close();
        }
        if let Some(bus) = &self.bus {
            bus.close();
        }
    }
}

fn message(args: fmt::Arguments<'_>) -> Cow<'static, str> {
    match args.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(args.to_string()),
    }
}

#[macro_export]
macro_rules! slot_debug {
    ($slot:expr, $($arg:tt)+) => {
        $slot.debug(format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! slot_info {
    ($slot:expr, $($arg:tt)+) => {
        $slot.info(format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! slot_error {
    ($slot:expr, $($arg:tt)+) => {
        $slot.error(format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! slot_fatal {
    ($slot:expr, $($arg:tt)+) => {
        $slot.fatal(format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! slot_access {
    ($slot:expr, $($arg:tt)+) => {
        $slot.access(format_args!($($arg)+))
    };
}
