use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLine {
    pub at: DateTime<Local>,
    pub message: String,
}

impl ActivityLine {
    pub fn render(&self) -> String {
        format!("[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Human-readable session log, optionally mirrored to a file
#[derive(Debug, Default)]
pub struct ActivityLog {
    lines: Vec<ActivityLine>,
    sink_path: Option<PathBuf>,
    sink: Option<LineWriter<File>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every line to `path`, appending. The file stays open for the
    /// life of the log.
    pub fn with_sink<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self {
            lines: Vec::new(),
            sink_path: Some(path.to_path_buf()),
            sink: Some(LineWriter::new(file)),
        })
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let line = ActivityLine {
            at: Local::now(),
            message: message.into(),
        };
        if let Some(sink) = self.sink.as_mut() {
            // a failing write must not interrupt the session
            let _ = writeln!(sink, "{}", line.render());
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ActivityLine] {
        &self.lines
    }

    pub fn tail(&self, n: usize) -> &[ActivityLine] {
        &self.lines[self.lines.len().saturating_sub(n)..]
    }

    pub fn sink(&self) -> Option<&Path> {
        self.sink_path.as_deref()
    }
}
