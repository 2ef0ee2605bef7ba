//! File sink and log directory preparation.
//!
//! Records are appended as one JSON document per line. Writes go through a
//! `tracing-appender` non-blocking worker, so a call returns before the line
//! reaches the disk.
//!
//! Each log file is opened once per [`FileWriters`] set: every file sink
//! resolving to the same path shares one appender and one worker thread, and
//! the file is closed when the last of those sinks is dropped.

use std::collections::HashMap;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use fuselog_core::{Record, Severity};
use parking_lot::Mutex;
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use super::{Sink, SinkDescriptor, SinkKind, SinkParams};
use crate::error::{SinkError, SinkResult};

/// File shared by every logger when naming is [`FileNaming::Shared`].
pub const SHARED_FILE_NAME: &str = "all.log";

/// How the log file inside `logpath` is named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// Every logger appends to `all.log`.
    #[default]
    Shared,
    /// Each logger appends to `<file tag>.log` (`all.log` for an empty tag).
    ///
    /// Characters other than ASCII alphanumerics, `-`, `_` and `.` are
    /// replaced by `_`, so the file always lands directly inside `logpath`.
    PerCaller,
}

impl FileNaming {
    /// File name for a logger with the given tag.
    pub fn file_name(self, file_tag: &str) -> String {
        match self {
            Self::PerCaller if !file_tag.is_empty() => format!("{}.log", sanitize_tag(file_tag)),
            _ => SHARED_FILE_NAME.to_string(),
        }
    }
}

fn sanitize_tag(file_tag: &str) -> String {
    file_tag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Creates every directory leading to `logpath`, one segment at a time.
///
/// `logpath` is a validated directory path ending in `/`. Directories that
/// already exist are fine; any other failure aborts.
pub fn create_log_path(logpath: &str) -> SinkResult<()> {
    let mut segments: Vec<&str> = logpath.split('/').collect();
    segments.pop();

    let mut prefix = String::new();
    for segment in segments {
        prefix.push_str(segment);
        prefix.push('/');
        match std::fs::create_dir(&prefix) {
            Ok(()) => debug!(path = %prefix, "Created log directory"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(SinkError::directory(&prefix, e)),
        }
    }
    Ok(())
}

// ─── Shared writers ───────────────────────────────────────────────────────────

struct OpenFile {
    writer: NonBlocking,
    // Flushes pending lines when the last sink on this file is dropped.
    _guard: WorkerGuard,
}

/// Log files currently open, keyed by resolved path.
///
/// Clones share the same set. Entries are weak; a file stays open only while
/// some sink uses it.
#[derive(Clone, Default)]
pub struct FileWriters {
    open: Arc<Mutex<HashMap<PathBuf, Weak<OpenFile>>>>,
}

impl FileWriters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the writer for `logpath` + `file_name`, opening it if needed.
    fn acquire(&self, logpath: &str, file_name: &str) -> SinkResult<Arc<OpenFile>> {
        let path = resolve_path(logpath, file_name);
        let mut open = self.open.lock();
        open.retain(|_, file| file.strong_count() > 0);

        if let Some(file) = open.get(&path).and_then(Weak::upgrade) {
            return Ok(file);
        }

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(logpath)
            .map_err(|source| SinkError::FileOpen {
                path: path.clone(),
                source,
            })?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file = Arc::new(OpenFile {
            writer,
            _guard: guard,
        });

        debug!(path = %path.display(), "Opened log file");
        open.insert(path, Arc::downgrade(&file));
        Ok(file)
    }

    /// Number of log files currently open.
    pub fn len(&self) -> usize {
        let mut open = self.open.lock();
        open.retain(|_, file| file.strong_count() > 0);
        open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FileWriters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.open.lock().keys()).finish()
    }
}

// ─── Sink ─────────────────────────────────────────────────────────────────────

/// Appends records to a file under the configured log path.
pub struct FileSink {
    descriptor: SinkDescriptor,
    file: Arc<OpenFile>,
}

impl FileSink {
    /// Prepares the directory and opens `logpath` + `file_name` for appending,
    /// reusing the writer `files` already has for that path.
    pub fn open(
        level: Severity,
        logpath: &str,
        file_name: &str,
        files: &FileWriters,
    ) -> SinkResult<Self> {
        create_log_path(logpath)?;
        let file = files.acquire(logpath, file_name)?;

        Ok(Self {
            descriptor: SinkDescriptor {
                kind: SinkKind::File,
                level,
                params: SinkParams::File {
                    path: resolve_path(logpath, file_name),
                },
            },
            file,
        })
    }

    /// Resolved file path.
    pub fn path(&self) -> &Path {
        match &self.descriptor.params {
            SinkParams::File { path } => path,
            _ => Path::new(""),
        }
    }

    /// Whether both sinks write through the same open file.
    pub fn shares_file_with(&self, other: &FileSink) -> bool {
        Arc::ptr_eq(&self.file, &other.file)
    }
}

impl Sink for FileSink {
    fn descriptor(&self) -> &SinkDescriptor {
        &self.descriptor
    }

    fn write(&self, record: &Record) -> SinkResult<()> {
        let mut line = serde_json::to_vec(&record.to_document())?;
        line.push(b'\n');
        let mut writer = self.file.writer.clone();
        writer.write_all(&line)?;
        Ok(())
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Joins a validated `logpath` with a file name.
pub fn resolve_path(logpath: &str, file_name: &str) -> PathBuf {
    Path::new(logpath).join(file_name)
}
