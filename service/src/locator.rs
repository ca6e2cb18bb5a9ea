//! Local model artifact discovery.

use std::path::{Path, PathBuf};

/// File extension of local model artifacts.
const ARTIFACT_EXT: &str = "gguf";

/// Resolves model identifiers to local GGUF files under a fixed base
/// directory.
///
/// The lookup is `<base>/<model>/*.gguf`; the first matching entry in
/// directory order wins. Resolution is stateless and re-reads the filesystem
/// on every call, so dropping a weights file into place is picked up without
/// a restart.
#[derive(Debug, Clone)]
pub struct ModelLocator {
    base_dir: PathBuf,
}

impl ModelLocator {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// First `.gguf` file inside `<base>/<model>/`, if any.
    ///
    /// A missing or unreadable model directory is `None`, not an error.
    pub fn resolve(&self, model: &str) -> Option<PathBuf> {
        let dir = self.base_dir.join(model);
        let entries = std::fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ARTIFACT_EXT) {
                return Some(path);
            }
        }
        None
    }

    pub fn is_available(&self, model: &str) -> bool {
        self.resolve(model).is_some()
    }
}
