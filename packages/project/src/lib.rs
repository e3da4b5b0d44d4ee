//! # Chroma Project
//!
//! The saved unit of work: a [`ProjectDocument`] (name, notes, shader
//! sources, uniforms, scene, texture bindings) plus the binary assets it
//! references.
//!
//! - [`archive`] turns a document and its [`AssetTable`] into a single zip
//!   file and back, and reads legacy JSON projects.
//! - [`Project`] owns the open project and mediates every load, save and
//!   edit.
//! - [`storage`] supplies the files: a directory on disk or memory.
//!
//! [`AssetTable`]: chroma_assets::AssetTable

pub mod archive;
mod document;
mod error;
mod legacy;
mod project;
pub mod storage;

pub use archive::{
    decode, encode, read_archive, read_project, ArchiveContents, DecodeReport, EncodeReport,
    Manifest, ManifestAsset, ProjectFileKind, FORMAT_VERSION,
};
pub use document::{
    Camera, Geometry, Projection, ProjectDocument, SceneSettings, Section, TextureSlots,
};
pub use error::{ArchiveError, ArchiveResult, ProjectError, ProjectResult};
pub use legacy::parse_legacy;
pub use project::{Project, SaveOutcome, SharedProject, ARCHIVE_EXTENSION};
pub use storage::{DirectoryStorage, FilePicker, FileWriter, MemoryStorage, PickedFile};
