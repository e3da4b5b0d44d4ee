use chroma_assets::AssetError;
use chroma_shader::UniformError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing a project file.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive container is unreadable")]
    Container(#[from] zip::result::ZipError),

    #[error("Archive has no manifest.json")]
    MissingManifest,

    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[source] serde_json::Error),

    #[error("Project format version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },

    #[error("Invalid legacy project: {0}")]
    InvalidLegacy(#[source] serde_json::Error),

    #[error("Unrecognised project file: {name}")]
    UnknownFormat { name: String },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Failed to {operation} archive entry {path}")]
    Entry {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Failures surfaced by the project orchestrator.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// The user dismissed the file picker
    #[error("File selection cancelled")]
    Cancelled,

    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project file")]
    InvalidManifest {
        #[source]
        source: ArchiveError,
    },

    #[error("Project format version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },

    #[error("Project archive has no manifest")]
    MissingManifest,

    #[error("Unrecognised project file: {name}")]
    UnknownFormat { name: String },

    #[error("Another load or save is in progress")]
    Busy,

    #[error("No project is loaded")]
    NotLoaded,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Section {index} does not exist")]
    NoSection { index: usize },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Uniform(#[from] UniformError),
}

impl ProjectError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ArchiveError> for ProjectError {
    fn from(error: ArchiveError) -> Self {
        match error {
            ArchiveError::MissingManifest => Self::MissingManifest,
            ArchiveError::UnsupportedVersion {
                found,
                max_supported,
            } => Self::UnsupportedVersion {
                found,
                max_supported,
            },
            ArchiveError::UnknownFormat { name } => Self::UnknownFormat { name },
            other => Self::InvalidManifest { source: other },
        }
    }
}

pub type ProjectResult<T> = Result<T, ProjectError>;
