use super::{Artifact, ArtifactStore, StorageError, StorageResult, RUN_FOLDERS};
use crate::config::StoreKind;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes artifacts to the local filesystem, relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ArtifactStore for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    fn resolve_root(&self, metadata_folder: &Path) -> PathBuf {
        metadata_folder.to_path_buf()
    }

    fn prepare_run(&self, run_path: &Path) -> StorageResult<()> {
        for folder in RUN_FOLDERS {
            let dir = run_path.join(folder);
            fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, artifact: &Artifact) -> StorageResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let bytes = match artifact {
            Artifact::Raw(bytes) => bytes.clone(),
            Artifact::Structured(value) => serde_json::to_string_pretty(value)?.into_bytes(),
        };

        debug!("Writing {} bytes to {}", bytes.len(), path.display());
        fs::write(path, bytes).map_err(io_error(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_run_creates_folders() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().join("Suite/Model/123");
        LocalStore::new().prepare_run(&run).unwrap();

        for folder in RUN_FOLDERS {
            assert!(run.join(folder).is_dir());
        }
    }

    #[test]
    fn test_structured_is_indented_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/report.json");
        LocalStore::new()
            .write_file(&path, &Artifact::Structured(json!({"a": [1]})))
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"a\": [\n    1\n  ]\n}");
    }

    #[test]
    fn test_raw_written_as_is() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plot.svg");
        LocalStore::new()
            .write_file(&path, &Artifact::text("<svg/>"))
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"<svg/>");
    }

    #[test]
    fn test_unwritable_path_reports_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = LocalStore::new()
            .write_file(&blocker.join("child.json"), &Artifact::text("y"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
