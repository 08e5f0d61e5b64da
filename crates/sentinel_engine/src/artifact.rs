use std::path::PathBuf;

use crate::{AtomicFileWriter, PersistError};

/// Snapshot of the page handed off for out-of-band storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Why it was captured, e.g. `change`.
    pub cause: String,
    pub timestamp: String,
    pub html: String,
    pub screenshot: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub screenshot: PathBuf,
    pub html: PathBuf,
}

pub trait ArtifactSink: Send + Sync {
    fn store(&self, artifact: &Artifact) -> Result<StoredArtifact, PersistError>;
}

/// Lays artifacts out as `{root}/screenshots/{cause}_{ts}.png` and `{root}/html/{cause}_{ts}.html`.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSink {
    screenshots: AtomicFileWriter,
    html: AtomicFileWriter,
}

impl DirectoryArtifactSink {
    pub fn new(root: PathBuf) -> Self {
        Self {
            screenshots: AtomicFileWriter::new(root.join("screenshots")),
            html: AtomicFileWriter::new(root.join("html")),
        }
    }
}

impl ArtifactSink for DirectoryArtifactSink {
    fn store(&self, artifact: &Artifact) -> Result<StoredArtifact, PersistError> {
        let stem = artifact_stem(&artifact.cause, &artifact.timestamp);
        let screenshot = self
            .screenshots
            .write(&format!("{stem}.png"), &artifact.screenshot)?;
        let html = self
            .html
            .write(&format!("{stem}.html"), artifact.html.as_bytes())?;
        Ok(StoredArtifact { screenshot, html })
    }
}

/// `{cause}_{timestamp}` with every character that is unsafe in filenames
/// (including `:` and `.` of RFC3339 timestamps) replaced by `-`.
pub fn artifact_stem(cause: &str, timestamp: &str) -> String {
    let cause: String = cause.chars().map(filename_char).collect();
    let timestamp: String = timestamp.chars().map(filename_char).collect();
    format!("{cause}_{timestamp}")
}

fn filename_char(c: char) -> char {
    if is_forbidden(c) || c == '.' {
        '-'
    } else {
        c
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_replaces_timestamp_separators() {
        assert_eq!(
            artifact_stem("change", "2026-10-15T20:37:01.123Z"),
            "change_2026-10-15T20-37-01-123Z"
        );
    }

    #[test]
    fn stem_sanitizes_cause() {
        assert_eq!(artifact_stem("a/b", "t"), "a-b_t");
    }
}
