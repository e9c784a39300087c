use std::io;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::error::AppError;

lazy_static! {
    // Only uuid-style names ever leave this store, so the allow-list can be
    // strict: alphanumerics and hyphens, fixed .wav extension.
    static ref AUDIO_FILENAME: Regex = Regex::new(r"^[A-Za-z0-9-]+\.wav$").unwrap();
}

/// Flat directory of generated `.wav` artifacts.
///
/// Files are created by the synthesis engine writing to paths handed out by
/// [`AudioStore::path_for`]; the store itself only owns naming and deletion.
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub fn new(dir: PathBuf) -> Result<Self, AppError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// A filename no previous call has handed out.
    pub fn fresh_filename(&self) -> String {
        format!("{}.wav", Uuid::new_v4())
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Delete a generated artifact by name.
    ///
    /// Two independent guards run before any filesystem mutation: the
    /// allow-list pattern, then a canonical-path containment check. Both must
    /// pass even though the pattern alone excludes separators and `..`.
    pub fn delete(&self, filename: &str) -> Result<(), AppError> {
        if !AUDIO_FILENAME.is_match(filename) {
            return Err(AppError::BadRequest("Invalid filename".into()));
        }

        let root = self.dir.canonicalize()?;
        let resolved = match self.dir.join(filename).canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AppError::AudioNotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !resolved.starts_with(&root) {
            return Err(AppError::BadRequest("Invalid file path".into()));
        }

        std::fs::remove_file(&resolved)?;
        tracing::info!("Deleted audio file: {}", filename);
        Ok(())
    }
}
