//! Project orchestrator.
//!
//! ```text
//!            load_default / load / load_bytes
//! Unloaded ──────────────────────────────────► Loaded
//!                                               │  ▲
//!                                               └──┘ load* (replace), save
//! ```
//!
//! A failed or cancelled load never touches the current state: decoding
//! happens on a blocking worker and the result is swapped in only once it
//! is complete.

use crate::archive::{encode, read_project, ArchiveContents, DecodeReport, EncodeReport};
use crate::document::{ProjectDocument, Section};
use crate::error::{ProjectError, ProjectResult};
use crate::legacy::parse_legacy;
use crate::storage::{FilePicker, FileWriter};
use chroma_assets::{AssetError, AssetHandle, AssetId, AssetTable};
use chroma_common::ShaderStage;
use chroma_markdown::{BasicConverter, Converter, DisplayText, MarkdownBridge, StorageText};
use chroma_shader::{TextureChannel, UniformError, UniformTable, UniformValue};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const DEFAULT_PROJECT: &str = include_str!("../assets/default_project.json");

/// Extension given to saved archives
pub const ARCHIVE_EXTENSION: &str = "chroma";

#[derive(Debug)]
struct Loaded {
    document: ProjectDocument,
    assets: AssetTable,
}

#[derive(Debug)]
enum ProjectState {
    Unloaded,
    Loaded(Box<Loaded>),
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub report: EncodeReport,
}

/// The open project: one document plus the assets it references.
#[derive(Debug)]
pub struct Project<C = BasicConverter> {
    state: ProjectState,
    bridge: MarkdownBridge<C>,
    extension: String,
}

impl Default for Project<BasicConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl Project<BasicConverter> {
    pub fn new() -> Self {
        Self::with_bridge(MarkdownBridge::new())
    }
}

impl<C: Converter> Project<C> {
    pub fn with_bridge(bridge: MarkdownBridge<C>) -> Self {
        Self {
            state: ProjectState::Unloaded,
            bridge,
            extension: ARCHIVE_EXTENSION.to_string(),
        }
    }

    /// Extension appended to save names that lack one
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ProjectState::Loaded(_))
    }

    fn loaded(&self) -> ProjectResult<&Loaded> {
        match &self.state {
            ProjectState::Loaded(loaded) => Ok(loaded),
            ProjectState::Unloaded => Err(ProjectError::NotLoaded),
        }
    }

    fn loaded_mut(&mut self) -> ProjectResult<&mut Loaded> {
        match &mut self.state {
            ProjectState::Loaded(loaded) => Ok(loaded),
            ProjectState::Unloaded => Err(ProjectError::NotLoaded),
        }
    }

    /// Swap in a decoded project. Handles of the previous table are revoked
    /// before the new records get theirs.
    fn install(&mut self, contents: ArchiveContents) -> ProjectResult<DecodeReport> {
        let ArchiveContents {
            document,
            records,
            report,
        } = contents;

        match &mut self.state {
            ProjectState::Loaded(loaded) => {
                loaded.assets.replace_all(records)?;
                loaded.document = document;
            }
            ProjectState::Unloaded => {
                let mut assets = AssetTable::new();
                assets.replace_all(records)?;
                self.state = ProjectState::Loaded(Box::new(Loaded { document, assets }));
            }
        }

        Ok(report)
    }

    /// Load the bundled starter project
    pub fn load_default(&mut self) -> ProjectResult<&ProjectDocument> {
        let document = parse_legacy(DEFAULT_PROJECT.as_bytes())?;
        self.install(ArchiveContents {
            document,
            records: Vec::new(),
            report: DecodeReport {
                missing: Vec::new(),
                legacy: true,
            },
        })?;
        debug!("Loaded default project");
        self.get()
    }

    /// Ask `picker` for a file and load it. Cancellation yields
    /// [`ProjectError::Cancelled`] and leaves the current project in place.
    #[instrument(skip_all)]
    pub async fn load<P: FilePicker>(&mut self, picker: &mut P) -> ProjectResult<DecodeReport> {
        let picked = match picker.pick().await? {
            Some(picked) => picked,
            None => {
                debug!("Project load cancelled");
                return Err(ProjectError::Cancelled);
            }
        };
        self.load_file(picked.name, picked.mime, picked.bytes).await
    }

    /// Load raw bytes, e.g. from a drop target
    pub async fn load_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> ProjectResult<DecodeReport> {
        self.load_file(name.into(), None, bytes).await
    }

    async fn load_file(&mut self, name: String, mime: Option<String>, bytes: Vec<u8>) -> ProjectResult<DecodeReport> {
        let file_name = name.clone();
        let contents = tokio::task::spawn_blocking(move || read_project(&name, mime.as_deref(), &bytes))
            .await?
            .map_err(|e| {
                warn!(file = %file_name, error = %e, "Failed to read project");
                ProjectError::from(e)
            })?;

        let report = self.install(contents)?;
        info!(
            file = %file_name,
            missing = report.missing.len(),
            legacy = report.legacy,
            "Loaded project"
        );
        Ok(report)
    }

    /// Encode the current project and hand it to `writer`
    #[instrument(skip_all, fields(name = %name))]
    pub async fn save<W: FileWriter>(&self, name: &str, writer: &mut W) -> ProjectResult<SaveOutcome> {
        let loaded = self.loaded()?;
        let (bytes, report) = encode(&loaded.document, &loaded.assets)?;

        if !report.unresolved.is_empty() {
            warn!(unresolved = ?report.unresolved, "Saved with unresolved asset references");
        }

        let file_name = self.file_name_for(name);
        let path = writer.write(&file_name, bytes).await?;
        Ok(SaveOutcome { path, report })
    }

    fn file_name_for(&self, name: &str) -> String {
        let name = name.trim();
        let name = if name.is_empty() { "untitled" } else { name };
        let suffix = format!(".{}", self.extension);
        if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }

    pub fn get(&self) -> ProjectResult<&ProjectDocument> {
        Ok(&self.loaded()?.document)
    }

    pub fn document_mut(&mut self) -> ProjectResult<&mut ProjectDocument> {
        Ok(&mut self.loaded_mut()?.document)
    }

    pub fn assets(&self) -> ProjectResult<&AssetTable> {
        Ok(&self.loaded()?.assets)
    }

    pub fn assets_mut(&mut self) -> ProjectResult<&mut AssetTable> {
        Ok(&mut self.loaded_mut()?.assets)
    }

    pub fn name(&self) -> ProjectResult<&str> {
        Ok(&self.get()?.name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> ProjectResult<()> {
        self.document_mut()?.name = name.into();
        Ok(())
    }

    pub fn shader(&self, stage: ShaderStage) -> ProjectResult<&str> {
        Ok(self.get()?.shader(stage))
    }

    pub fn set_shader(&mut self, stage: ShaderStage, source: impl Into<String>) -> ProjectResult<()> {
        self.document_mut()?.shaders.set(stage, source.into());
        Ok(())
    }

    pub fn sections(&self) -> ProjectResult<&[Section]> {
        Ok(&self.get()?.sections)
    }

    /// Replace section `index`; `index == len` appends
    pub fn set_section(&mut self, index: usize, section: Section) -> ProjectResult<()> {
        let sections = &mut self.document_mut()?.sections;
        match index.cmp(&sections.len()) {
            std::cmp::Ordering::Less => sections[index] = section,
            std::cmp::Ordering::Equal => sections.push(section),
            std::cmp::Ordering::Greater => return Err(ProjectError::NoSection { index }),
        }
        Ok(())
    }

    /// Engine uniforms plus the document's user uniforms
    pub fn uniforms(&self) -> ProjectResult<UniformTable> {
        Ok(UniformTable::with_user(&self.get()?.uniforms)?)
    }

    /// Set a user uniform; engine names are rejected
    pub fn set_uniform(&mut self, name: impl Into<String>, value: UniformValue) -> ProjectResult<()> {
        let name = name.into();
        let document = self.document_mut()?;
        if UniformTable::new().is_reserved(&name) {
            return Err(UniformError::Reserved(name).into());
        }
        document.uniforms.insert(name, value);
        Ok(())
    }

    /// Store a texture payload and bind it to `channel`
    pub fn set_texture(
        &mut self,
        channel: TextureChannel,
        payload: Vec<u8>,
        mime: impl Into<String>,
        name: Option<String>,
    ) -> ProjectResult<(AssetId, AssetHandle)> {
        let loaded = self.loaded_mut()?;
        let (id, handle) = loaded.assets.add(payload, mime, name);
        loaded.document.textures.set(channel, id.to_string());
        debug!(channel = %channel, id = %id, "Bound texture");
        Ok((id, handle))
    }

    /// Bind an asset that is already in the table
    pub fn assign_texture(&mut self, channel: TextureChannel, id: &AssetId) -> ProjectResult<()> {
        let loaded = self.loaded_mut()?;
        if !loaded.assets.contains(id) {
            return Err(AssetError::not_found(id.as_str()).into());
        }
        loaded.document.textures.set(channel, id.to_string());
        Ok(())
    }

    pub fn clear_texture(&mut self, channel: TextureChannel) -> ProjectResult<Option<String>> {
        Ok(self.document_mut()?.textures.clear(channel))
    }

    /// Live handle bound to `channel`, if any
    pub fn texture_handle(&self, channel: TextureChannel) -> ProjectResult<Option<&AssetHandle>> {
        let loaded = self.loaded()?;
        let handle = loaded
            .document
            .textures
            .get(channel)
            .and_then(|reference| AssetId::parse(reference).ok())
            .and_then(|id| loaded.assets.handle_of(&id).ok());
        Ok(handle)
    }

    /// Store an image for use in section text. Embed it with
    /// `chroma_markdown::image_reference(&id)`.
    pub fn attach_image(
        &mut self,
        payload: Vec<u8>,
        mime: impl Into<String>,
        name: Option<String>,
    ) -> ProjectResult<(AssetId, AssetHandle)> {
        let loaded = self.loaded_mut()?;
        Ok(loaded.assets.add(payload, mime, name))
    }

    /// Section `index` as HTML with live image handles
    pub fn section_display(&self, index: usize) -> ProjectResult<DisplayText> {
        let loaded = self.loaded()?;
        let section = loaded
            .document
            .sections
            .get(index)
            .ok_or(ProjectError::NoSection { index })?;
        Ok(self.bridge.to_display(&section.content, &loaded.assets))
    }

    /// Store edited HTML back into section `index`
    pub fn update_section_from_display(&mut self, index: usize, html: &str) -> ProjectResult<StorageText> {
        let Self { state, bridge, .. } = self;
        let loaded = match state {
            ProjectState::Loaded(loaded) => loaded,
            ProjectState::Unloaded => return Err(ProjectError::NotLoaded),
        };
        let storage = bridge.to_storage(html, &loaded.assets);
        let section = loaded
            .document
            .sections
            .get_mut(index)
            .ok_or(ProjectError::NoSection { index })?;
        section.content = storage.text.clone();
        Ok(storage)
    }
}

/// A [`Project`] shared between tasks.
///
/// `load`/`save` wait for any operation in flight; `try_load`/`try_save`
/// fail with [`ProjectError::Busy`] instead.
#[derive(Debug)]
pub struct SharedProject<C = BasicConverter> {
    inner: Arc<Mutex<Project<C>>>,
}

impl<C> Clone for SharedProject<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Converter + Send> SharedProject<C> {
    pub fn new(project: Project<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(project)),
        }
    }

    /// Exclusive access for field-level edits
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, Project<C>> {
        self.inner.lock().await
    }

    pub async fn load<P: FilePicker>(&self, picker: &mut P) -> ProjectResult<DecodeReport> {
        self.inner.lock().await.load(picker).await
    }

    pub async fn try_load<P: FilePicker>(&self, picker: &mut P) -> ProjectResult<DecodeReport> {
        let mut project = self.inner.try_lock().map_err(|_| ProjectError::Busy)?;
        project.load(picker).await
    }

    pub async fn save<W: FileWriter>(&self, name: &str, writer: &mut W) -> ProjectResult<SaveOutcome> {
        self.inner.lock().await.save(name, writer).await
    }

    pub async fn try_save<W: FileWriter>(&self, name: &str, writer: &mut W) -> ProjectResult<SaveOutcome> {
        let project = self.inner.try_lock().map_err(|_| ProjectError::Busy)?;
        project.save(name, writer).await
    }
}
