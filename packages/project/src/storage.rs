//! Where project bytes come from and go to.
//!
//! The orchestrator never touches the filesystem directly; it asks a
//! [`FilePicker`] for input and hands output to a [`FileWriter`].

use crate::error::{ProjectError, ProjectResult};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A file the user chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    /// Mime type reported by the host, if any
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

pub trait FilePicker: Send {
    /// `Ok(None)` means the user cancelled
    fn pick(&mut self) -> impl Future<Output = ProjectResult<Option<PickedFile>>> + Send;
}

pub trait FileWriter: Send {
    /// Store `bytes` under `name`, returning where they ended up
    fn write(&mut self, name: &str, bytes: Vec<u8>) -> impl Future<Output = ProjectResult<PathBuf>> + Send;
}

/// Only the final component of `name`, so writers stay inside their root
fn file_name_of(name: &str) -> ProjectResult<&str> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ProjectError::io(
                "name",
                name,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file name"),
            )
        })
}

/// Reads and writes project files inside one directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
    selection: Option<String>,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            selection: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File returned by the next `pick`; without one the pick is cancelled
    pub fn select(&mut self, name: impl Into<String>) -> &mut Self {
        self.selection = Some(name.into());
        self
    }
}

impl FilePicker for DirectoryStorage {
    async fn pick(&mut self) -> ProjectResult<Option<PickedFile>> {
        let Some(name) = self.selection.take() else {
            return Ok(None);
        };
        let path = self.root.join(file_name_of(&name)?);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ProjectError::io("read", &path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Picked project file");
        Ok(Some(PickedFile::new(name, bytes)))
    }
}

impl FileWriter for DirectoryStorage {
    async fn write(&mut self, name: &str, bytes: Vec<u8>) -> ProjectResult<PathBuf> {
        let file_name = file_name_of(name)?;
        let path = self.root.join(file_name);
        let temp_path = self.root.join(format!("{}.tmp", file_name));

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ProjectError::io("create directory", &self.root, e))?;

        let written = match tokio::fs::write(&temp_path, &bytes).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path)
                .await
                .map_err(|e| ProjectError::io("rename", &path, e)),
            Err(e) => Err(ProjectError::io("write", &temp_path, e)),
        };
        if let Err(err) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                debug!(path = %temp_path.display(), error = %cleanup, "Temp file not removed");
            }
            return Err(err);
        }

        info!("Saved project to {}", path.display());
        Ok(path)
    }
}

/// In-memory files, for tests and embedders that manage storage themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, Vec<u8>>,
    selection: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn select(&mut self, name: impl Into<String>) -> &mut Self {
        self.selection = Some(name.into());
        self
    }
}

impl FilePicker for MemoryStorage {
    async fn pick(&mut self) -> ProjectResult<Option<PickedFile>> {
        let Some(name) = self.selection.take() else {
            return Ok(None);
        };
        match self.files.get(&name) {
            Some(bytes) => Ok(Some(PickedFile::new(name.clone(), bytes.clone()))),
            None => Err(ProjectError::io(
                "read",
                &name,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )),
        }
    }
}

impl FileWriter for MemoryStorage {
    async fn write(&mut self, name: &str, bytes: Vec<u8>) -> ProjectResult<PathBuf> {
        let name = file_name_of(name)?.to_string();
        self.files.insert(name.clone(), bytes);
        Ok(PathBuf::from(name))
    }
}
