use bytes::{BufMut, BytesMut};
use chrono::{Datelike, Local, Timelike};
use colored::Colorize;
use log::{warn, LevelFilter};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::archive::{archive_dir, free_archive_path};
use crate::header::{append_message, format_access_header, format_header};

/// Rotation threshold used unless overridden: 100 MiB.
pub const DEFAULT_THRESHOLD: u64 = 104_857_600;

const WRITE_BUFFER_SIZE: usize = 8192;
const HEADER_BUFFER_SIZE: usize = 256;

/// A single log file that is archived and reopened once it grows past its threshold.
///
/// Every operation takes the appender's mutex, so concurrent writers never
/// interleave partial lines and never see a half finished rotation. When the
/// file cannot be opened the appender is disabled and writes are dropped
/// until a later [`Appender::open`] or [`Appender::rotate`] succeeds.
#[derive(Debug)]
pub struct Appender {
    path: PathBuf,
    pid: u32,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    threshold: u64,
    written: u64,
    file: Option<BufWriter<File>>,
    buf: BytesMut,
}

impl Appender {
    pub fn new(path: impl AsRef<Path>) -> Appender {
        Self::with_pid(path, std::process::id())
    }

    pub fn with_pid(path: impl AsRef<Path>, pid: u32) -> Appender {
        Self::with_options(path, pid, DEFAULT_THRESHOLD)
    }

    /// Opens `path` for appending. An existing file already at or above
    /// `threshold` is archived first.
    pub fn with_options(path: impl AsRef<Path>, pid: u32, threshold: u64) -> Appender {
        let path = path.as_ref().to_owned();
        let mut state = State {
            threshold,
            written: 0,
            file: None,
            buf: BytesMut::with_capacity(HEADER_BUFFER_SIZE),
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.len() >= threshold => state.rotate(&path, &Local::now()),
            _ => state.open(&path),
        }
        Appender {
            path,
            pid,
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// `false` while the file handle is missing and writes are being dropped.
    pub fn is_enabled(&self) -> bool {
        self.lock().file.is_some()
    }

    /// Bytes appended to the current file since it was opened or rotated.
    pub fn written(&self) -> u64 {
        self.lock().written
    }

    pub fn threshold(&self) -> u64 {
        self.lock().threshold
    }

    /// Replaces the threshold; checked on the next write.
    pub fn resize_threshold(&self, threshold: u64) {
        self.lock().threshold = threshold;
    }

    /// Reopens the file if the appender is currently closed or disabled.
    ///
    /// The byte counter is left as it was, so a file reopened after `close()`
    /// keeps counting towards the same threshold; only rotation resets it.
    /// A newly constructed appender starts at 0 even on an existing file.
    pub fn open(&self) {
        let mut state = self.lock();
        if state.file.is_none() {
            state.open(&self.path);
        }
    }

    pub fn close(&self) {
        self.lock().close();
    }

    pub fn flush(&self) {
        if let Some(file) = self.lock().file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Archives the current file and starts a fresh one, regardless of size.
    pub fn rotate(&self) {
        self.lock().rotate(&self.path, &Local::now());
    }

    /// Appends `raw` untouched.
    pub fn write(&self, raw: &[u8]) {
        let now = Local::now();
        let mut state = self.lock();
        if state.file.is_none() {
            return;
        }
        state.buf.clear();
        state.buf.put_slice(raw);
        state.commit(&self.path, &now);
    }

    /// Appends `[prefix] [pid] YYYY-MM-DD HH:MM:SS message\n`.
    pub fn write_with_header(&self, prefix: &str, msg: &str) {
        self.write_with_header_at(prefix, msg, &Local::now());
    }

    /// Appends `[YYYY-MM-DD HH:MM:SS] message\n`.
    pub fn write_access(&self, msg: &str) {
        self.write_access_at(msg, &Local::now());
    }

    pub(crate) fn write_with_header_at<T>(&self, prefix: &str, msg: &str, now: &T)
    where
        T: Datelike + Timelike,
    {
        let mut state = self.lock();
        if state.file.is_none() {
            return;
        }
        state.buf.clear();
        format_header(&mut state.buf, now, prefix, self.pid);
        append_message(&mut state.buf, msg);
        state.commit(&self.path, now);
    }

    pub(crate) fn write_access_at<T>(&self, msg: &str, now: &T)
    where
        T: Datelike + Timelike,
    {
        let mut state = self.lock();
        if state.file.is_none() {
            return;
        }
        state.buf.clear();
        format_access_header(&mut state.buf, now);
        append_message(&mut state.buf, msg);
        state.commit(&self.path, now);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn open(&mut self, path: &Path) {
        let mut options = OpenOptions::new();
        options.create(true).append(true).read(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        self.file = options
            .open(path)
            .map(|file| BufWriter::with_capacity(WRITE_BUFFER_SIZE, file))
            .ok();
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }

    /// Writes the assembled line in `buf`, rotating first when the current
    /// file has already reached the threshold.
    fn commit<T>(&mut self, path: &Path, now: &T)
    where
        T: Datelike + Timelike,
    {
        if self.written >= self.threshold {
            self.rotate(path, now);
        }
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if file.write_all(&self.buf).is_ok() {
            self.written += self.buf.len() as u64;
        }
    }

    fn rotate<T>(&mut self, path: &Path, now: &T)
    where
        T: Datelike + Timelike,
    {
        self.close();
        let dir = archive_dir(path);
        if !dir.is_dir() {
            if let Err(e) = create_dir(&dir) {
                diagnostic(format_args!("mkdir failed {}: {}", dir.display(), e));
            }
        }
        let archive = free_archive_path(path, now);
        if let Err(e) = fs::rename(path, &archive) {
            diagnostic(format_args!(
                "rename {} to {} failed: {}",
                path.display(),
                archive.display(),
                e
            ));
        }
        self.written = 0;
        self.open(path);
    }
}

/// Rotation failures go through `log`, or straight to stderr while no
/// logger would let a warning through.
fn diagnostic(args: fmt::Arguments<'_>) {
    if diagnostics_to_stderr() {
        eprintln!("{}", args.to_string().yellow());
    } else {
        warn!("{}", args);
    }
}

fn diagnostics_to_stderr() -> bool {
    log::max_level() < LevelFilter::Warn
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o777).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir(dir)
}
