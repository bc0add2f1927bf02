//! Transcript sinks: where raw lines and status messages end up.
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sampler_traits::TranscriptSink;
use tracing::warn;

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTranscript;

impl TranscriptSink for NullTranscript {
    fn append_line(&mut self, _text: &str) {}
}

/// Keeps lines in memory. Clones share the same buffer, so a test can keep
/// one handle and give the other to the engine.
#[derive(Debug, Default, Clone)]
pub struct MemoryTranscript {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .borrow()
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }
}

impl TranscriptSink for MemoryTranscript {
    fn append_line(&mut self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }

    fn clear(&mut self) {
        self.lines.borrow_mut().clear();
    }
}

/// Appends every line to a file.
///
/// Write failures are logged once and otherwise ignored; losing the
/// transcript must not stop acquisition.
#[derive(Debug)]
pub struct FileTranscript {
    path: PathBuf,
    file: Option<File>,
    warned: bool,
}

impl FileTranscript {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            warned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptSink for FileTranscript {
    fn append_line(&mut self, text: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(file, "{text}")
            && !self.warned
        {
            warn!(path = %self.path.display(), error = %e, "transcript write failed");
            self.warned = true;
        }
    }

    /// Truncates the file.
    fn clear(&mut self) {
        match File::create(&self.path) {
            Ok(f) => self.file = Some(f),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "transcript truncate failed");
                self.file = None;
            }
        }
    }
}

/// Fans every line out to several sinks.
#[derive(Default)]
pub struct TeeTranscript {
    sinks: Vec<Box<dyn TranscriptSink>>,
}

impl TeeTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl TranscriptSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl TranscriptSink for TeeTranscript {
    fn append_line(&mut self, text: &str) {
        for s in &mut self.sinks {
            s.append_line(text);
        }
    }

    fn clear(&mut self) {
        for s in &mut self.sinks {
            s.clear();
        }
    }
}
