//! Console sink.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use fuselog_core::Record;
use parking_lot::Mutex;

use super::{Sink, SinkDescriptor, SinkKind, SinkParams};
use crate::error::SinkResult;

/// Formatting flags of the console sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleFormat {
    /// Prefix each line with an RFC 3339 timestamp.
    pub timestamp: bool,
    /// Print metadata as indented JSON on the following lines.
    pub pretty: bool,
}

impl Default for ConsoleFormat {
    fn default() -> Self {
        Self {
            timestamp: true,
            pretty: true,
        }
    }
}

impl ConsoleFormat {
    /// Renders a record as console text, without the trailing newline.
    pub fn render(&self, record: &Record) -> SinkResult<String> {
        let mut line = String::new();
        if self.timestamp {
            line.push_str(&record.timestamp_rfc3339());
            line.push_str(" - ");
        }
        line.push_str(record.severity.as_str());
        line.push_str(": ");
        line.push_str(&record.message);

        if !record.meta.is_empty() {
            if self.pretty {
                line.push('\n');
                line.push_str(&serde_json::to_string_pretty(&record.meta)?);
            } else {
                line.push(' ');
                line.push_str(&serde_json::to_string(&record.meta)?);
            }
        }
        Ok(line)
    }
}

/// In-memory writer shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter(Arc<Mutex<Vec<u8>>>);

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where console output goes.
#[derive(Clone, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
    /// A custom writer, shared by every console sink built from the context.
    Writer(Arc<Mutex<dyn Write + Send>>),
}

impl ConsoleTarget {
    /// Wraps any writer.
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::Writer(Arc::new(Mutex::new(writer)))
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            Self::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Self::Stderr => writeln!(io::stderr().lock(), "{line}"),
            Self::Writer(writer) => writeln!(writer.lock(), "{line}"),
        }
    }
}

impl fmt::Debug for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("Stdout"),
            Self::Stderr => f.write_str("Stderr"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Writes formatted lines to the console target.
pub struct ConsoleSink {
    descriptor: SinkDescriptor,
    target: ConsoleTarget,
    format: ConsoleFormat,
}

impl ConsoleSink {
    pub fn new(level: fuselog_core::Severity, target: ConsoleTarget, format: ConsoleFormat) -> Self {
        Self {
            descriptor: SinkDescriptor {
                kind: SinkKind::Console,
                level,
                params: SinkParams::Console(format),
            },
            target,
            format,
        }
    }
}

impl Sink for ConsoleSink {
    fn descriptor(&self) -> &SinkDescriptor {
        &self.descriptor
    }

    fn write(&self, record: &Record) -> SinkResult<()> {
        let line = self.format.render(record)?;
        self.target.write_line(&line)?;
        Ok(())
    }
}
