//! Artifact persistence
//!
//! Saving the finished PDF is the only side effect of an export. The
//! [`ArtifactSink`] trait is where a host plugs in its "download": a file on
//! disk for the CLI, an in-memory list for embedding hosts and tests.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// Metadata of a saved artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArtifact {
    pub file_name: String,
    pub mime: String,
    pub byte_len: usize,
    /// Where the artifact landed, if it has a filesystem location
    pub location: Option<PathBuf>,
}

/// Destination for finished artifacts
pub trait ArtifactSink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> io::Result<SavedArtifact>;
}

/// Writes artifacts into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl FileSink {
    /// Write `file_name` through a temporary file in the target directory.
    ///
    /// The final path only appears once `write` and the sync succeeded, so a
    /// failed save leaves any earlier file of that name untouched.
    fn write_atomic(
        &self,
        file_name: &str,
        write: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        write(staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }
}

impl ArtifactSink for FileSink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> io::Result<SavedArtifact> {
        let path = self.write_atomic(file_name, |file| file.write_all(bytes))?;

        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            byte_len: bytes.len(),
            location: Some(path),
        })
    }
}

/// An artifact held in memory
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub meta: SavedArtifact,
    pub bytes: Vec<u8>,
}

/// Keeps saved artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<StoredArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredArtifact>> {
        self.artifacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of everything saved so far
    pub fn artifacts(&self) -> Vec<StoredArtifact> {
        self.lock().clone()
    }

    /// Remove and return everything saved so far
    pub fn take(&self) -> Vec<StoredArtifact> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> io::Result<SavedArtifact> {
        let meta = SavedArtifact {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            byte_len: bytes.len(),
            location: None,
        };
        self.lock().push(StoredArtifact {
            meta: meta.clone(),
            bytes: bytes.to_vec(),
        });
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path().join("exports"));

        let saved = sink
            .save("jane_resume.pdf", "application/pdf", b"%PDF-1.4")
            .unwrap();

        let path = saved.location.unwrap();
        assert_eq!(path, temp_dir.path().join("exports").join("jane_resume.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4");
        assert_eq!(saved.byte_len, 8);
    }

    #[test]
    fn test_file_sink_reports_io_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let sink = FileSink::new(&blocker);
        assert!(sink.save("x.pdf", "application/pdf", b"data").is_err());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path());
        let existing = temp_dir.path().join("jane_resume.pdf");
        std::fs::write(&existing, b"%PDF-1.4 previous").unwrap();

        let disk_full = |file: &mut File| -> io::Result<()> {
            file.write_all(b"%PDF-1.4 trunc")?;
            Err(io::Error::other("no space left on device"))
        };
        assert!(sink.write_atomic("jane_resume.pdf", disk_full).is_err());
        assert!(sink.write_atomic("john_resume.pdf", disk_full).is_err());

        assert_eq!(std::fs::read(&existing).unwrap(), b"%PDF-1.4 previous");
        assert!(!temp_dir.path().join("john_resume.pdf").exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_sink_replaces_earlier_export() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path());
        sink.save("jane_resume.pdf", "application/pdf", b"first").unwrap();
        let saved = sink.save("jane_resume.pdf", "application/pdf", b"second").unwrap();

        assert_eq!(std::fs::read(saved.location.unwrap()).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.save("a.pdf", "application/pdf", b"one").unwrap();
        sink.save("b.pdf", "application/pdf", b"two").unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.artifacts()[1].bytes, b"two");

        let taken = sink.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].meta.file_name, "a.pdf");
        assert!(sink.is_empty());
    }
}
