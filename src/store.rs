use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::error::CotError;
use crate::resolver::RemoteLocation;

/// Directory of downloaded archives, one file per remote archive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCache {
    root: Utf8PathBuf,
}

impl ArchiveCache {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn default_root() -> Result<Utf8PathBuf, CotError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("cftc-cot")).ok()
            })
            .ok_or_else(|| CotError::Filesystem("unable to resolve cache directory".to_string()))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn archive_path(&self, location: &RemoteLocation) -> Utf8PathBuf {
        self.root.join(location.filename())
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }

    pub fn read(&self, path: &Utf8Path) -> Result<Vec<u8>, CotError> {
        fs::read(path.as_std_path())
            .map_err(|err| CotError::Filesystem(format!("read {path}: {err}")))
    }

    pub fn write(&self, path: &Utf8Path, content: &[u8]) -> Result<(), CotError> {
        write_bytes_atomic(path, content)
    }

    pub fn list(&self) -> Result<Vec<Utf8PathBuf>, CotError> {
        if !self.root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| CotError::Filesystem(err.to_string()))?;
        let mut archives = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| CotError::Filesystem(err.to_string()))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.is_file() && path.extension() == Some("zip") {
                archives.push(path);
            }
        }
        archives.sort();
        Ok(archives)
    }
}

/// Writes through a temp file in the destination directory so concurrent
/// writers never leave a truncated archive behind.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), CotError> {
    let parent = path
        .parent()
        .ok_or_else(|| CotError::Filesystem(format!("invalid destination path {path}")))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| CotError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("cftc-cot")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| CotError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| CotError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| CotError::Filesystem(err.to_string()))?;
    Ok(())
}
