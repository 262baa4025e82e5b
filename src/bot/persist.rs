//! Corpus lines and their flat-file persistence.
//!
//! The file holds one sentence per line, sorted ascending, nothing else.
//! The lines and the dirty flag live behind one lock so a save sees a
//! consistent snapshot and clears exactly the changes it wrote.

use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Errors that can occur when saving the corpus.
#[derive(Debug)]
pub enum PersistError {
    /// Destination exists but is not a regular file.
    NotAFile(PathBuf),
    /// Destination is a read-only file.
    ReadOnly(PathBuf),
    /// Failed to create the destination directory.
    CreateDir { path: PathBuf, source: std::io::Error },
    /// Failed to write the file.
    Write { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAFile(path) => {
                write!(f, "'{}' exists but is not a regular file", path.display())
            }
            Self::ReadOnly(path) => write!(f, "'{}' is not writable", path.display()),
            Self::CreateDir { path, source } => {
                write!(f, "failed to create directory '{}': {}", path.display(), source)
            }
            Self::Write { path, source } => {
                write!(f, "failed to write '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } | Self::Write { source, .. } => Some(source),
            Self::NotAFile(_) | Self::ReadOnly(_) => None,
        }
    }
}

/// What a save call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last save.
    Clean,
    /// Wrote this many lines.
    Written(usize),
}

/// In-memory corpus lines plus the unsaved-changes flag.
pub struct CorpusStore {
    path: PathBuf,
    lines: Vec<String>,
    dirty: bool,
}

impl CorpusStore {
    /// Store starting from lines that already match what is on disk.
    pub fn new(path: PathBuf, lines: Vec<String>) -> Self {
        Self {
            path,
            lines,
            dirty: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append learned lines. Marks the store dirty if anything was added.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        let before = self.lines.len();
        self.lines.extend(lines);
        if self.lines.len() > before {
            self.dirty = true;
        }
    }

    /// Lines sorted the way they are written to disk.
    pub fn sorted_lines(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.lines.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// Write the sorted lines if anything changed since the last save.
    ///
    /// On error the store stays dirty so a later save retries.
    pub fn save(&mut self) -> Result<SaveOutcome, PersistError> {
        if !self.dirty {
            return Ok(SaveOutcome::Clean);
        }

        info!("Saving {} lines to {}", self.lines.len(), self.path.display());

        match std::fs::metadata(&self.path) {
            Ok(meta) if !meta.is_file() => return Err(PersistError::NotAFile(self.path.clone())),
            Ok(meta) if meta.permissions().readonly() => {
                return Err(PersistError::ReadOnly(self.path.clone()));
            }
            Ok(_) => {}
            Err(_) => {
                if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty())
                    && !dir.is_dir()
                {
                    std::fs::create_dir_all(dir).map_err(|e| PersistError::CreateDir {
                        path: dir.to_path_buf(),
                        source: e,
                    })?;
                }
                info!("{} not found, creating new file", self.path.display());
            }
        }

        let content = self.sorted_lines().join("\n");
        std::fs::write(&self.path, content).map_err(|e| PersistError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        self.dirty = false;
        info!("💾 Lines saved");
        Ok(SaveOutcome::Written(self.lines.len()))
    }
}
