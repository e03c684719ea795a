//! Non-fatal export report.
//!
//! Recoverable problems are collected here and surfaced once the export
//! finishes. Each entry is mirrored to the `log` facade as it is recorded.

use serde::Serialize;

/// A reference to a scene object, optionally narrowed to some of its faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub name: String,
    /// Source polygon indices. Empty means the whole object.
    pub faces: Vec<usize>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }

    pub fn with_faces(name: impl Into<String>, faces: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }
}

/// Severity of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

/// One message plus the objects it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub objects: Vec<ObjectRef>,
}

/// Accumulated report for one export pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportLog {
    entries: Vec<LogEntry>,
}

impl ExportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>, objects: Vec<ObjectRef>) {
        let message = message.into();
        log::info!("{}", message);
        self.entries.push(LogEntry {
            level: Level::Info,
            message,
            objects,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>, objects: Vec<ObjectRef>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(LogEntry {
            level: Level::Warn,
            message,
            objects,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_level() {
        let mut log = ExportLog::new();
        log.info("Multiple Levels Of Detail found", Vec::new());
        log.warn(
            "Found 2 two-sided face(s) in mesh \"Wing\"",
            vec![ObjectRef::with_faces("Wing", vec![0, 3])],
        );

        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].level, Level::Info);
        assert_eq!(log.entries()[1].objects[0].faces, vec![0, 3]);
        assert!(log.mentions("two-sided"));
        assert!(!log.mentions("degenerate"));
    }
}
