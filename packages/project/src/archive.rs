//! Single-file project container.
//!
//! ```text
//! project.chroma (zip)
//! ├── manifest.json          formatVersion, savedAt, document, assets[]
//! ├── images/<id>.<ext>      payloads referenced from section text
//! └── textures/<id>.<ext>    payloads bound to texture channels
//! ```
//!
//! Inside the manifest every asset reference is an archive path. In memory
//! the same references are asset ids (`image:<id>` in text, the bare id in
//! texture slots).

use crate::document::ProjectDocument;
use crate::error::{ArchiveError, ArchiveResult};
use crate::legacy::parse_legacy;
use chroma_assets::{
    extension_for_mime, is_image_mime, mime_for_extension, sniff_mime, AssetId, AssetRecord,
    AssetTable,
};
use chroma_markdown::{image_reference, parse_image_reference, rewrite_link_targets};
use chroma_shader::TextureChannel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, instrument, warn};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Newest manifest version this build reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_PATH: &str = "manifest.json";

const IMAGES_DIR: &str = "images";
const TEXTURES_DIR: &str = "textures";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub document: ProjectDocument,
    #[serde(default)]
    pub assets: Vec<ManifestAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub path: String,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestHeader {
    format_version: u32,
}

/// What `encode` left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeReport {
    /// Archive paths written, in manifest order
    pub written: Vec<String>,
    /// Assets in the table that nothing references
    pub excluded: Vec<AssetId>,
    /// References whose id is not in the table
    pub unresolved: Vec<String>,
}

/// What `read_archive` could not restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Manifest paths with no payload in the container
    pub missing: Vec<String>,
    /// The file was a legacy JSON project
    pub legacy: bool,
}

/// Decoded project whose records have not been issued handles yet
#[derive(Debug, Clone)]
pub struct ArchiveContents {
    pub document: ProjectDocument,
    pub records: Vec<AssetRecord>,
    pub report: DecodeReport,
}

impl ArchiveContents {
    /// Records adopted by a fresh table
    pub fn into_table(self) -> ArchiveResult<(ProjectDocument, AssetTable, DecodeReport)> {
        let mut assets = AssetTable::new();
        assets.replace_all(self.records)?;
        Ok((self.document, assets, self.report))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFileKind {
    Archive,
    Legacy,
    Image,
    Unknown,
}

impl ProjectFileKind {
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        Self::detect_with_mime(file_name, None, bytes)
    }

    /// Content first, then extension, then the mime type the host reported
    pub fn detect_with_mime(file_name: &str, mime: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            return ProjectFileKind::Archive;
        }
        if bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{')
        {
            return ProjectFileKind::Legacy;
        }
        if sniff_mime(bytes).is_some() {
            return ProjectFileKind::Image;
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("chroma") | Some("zip") => return ProjectFileKind::Archive,
            Some("json") => return ProjectFileKind::Legacy,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp") => return ProjectFileKind::Image,
            _ => {}
        }

        match mime {
            Some("application/zip" | "application/x-zip-compressed" | "application/x-zip") => {
                ProjectFileKind::Archive
            }
            Some("application/json") => ProjectFileKind::Legacy,
            Some(m) if is_image_mime(m) => ProjectFileKind::Image,
            _ => ProjectFileKind::Unknown,
        }
    }
}

fn asset_path(dir: &str, id: &AssetId, mime: &str) -> String {
    format!("{}/{}.{}", dir, id, extension_for_mime(mime))
}

/// Id encoded in an `images/` or `textures/` path
fn id_from_path(path: &str) -> Option<AssetId> {
    let (dir, file) = path.split_once('/')?;
    if dir != IMAGES_DIR && dir != TEXTURES_DIR {
        return None;
    }
    let stem = file.split('.').next()?;
    AssetId::parse(stem).ok()
}

fn is_asset_path(path: &str) -> bool {
    path.starts_with("images/") || path.starts_with("textures/")
}

/// Serialize a project into a zip container.
///
/// The document is copied; neither argument is modified. Assets nothing
/// references are left out, and references to ids absent from `assets` are
/// reported rather than failing the save.
#[instrument(skip_all, fields(project = %document.name))]
pub fn encode(document: &ProjectDocument, assets: &AssetTable) -> ArchiveResult<(Vec<u8>, EncodeReport)> {
    encode_at(document, assets, Utc::now())
}

pub fn encode_at(
    document: &ProjectDocument,
    assets: &AssetTable,
    saved_at: DateTime<Utc>,
) -> ArchiveResult<(Vec<u8>, EncodeReport)> {
    let mut document = document.clone();
    let mut report = EncodeReport::default();
    // id -> archive path, first reference wins
    let mut paths: BTreeMap<AssetId, String> = BTreeMap::new();
    let mut order: Vec<AssetId> = Vec::new();

    for section in &mut document.sections {
        section.content = rewrite_link_targets(&section.content, |target| {
            let id = parse_image_reference(target)?;
            match assets.record(&id) {
                Ok(record) => {
                    let path = paths.entry(id.clone()).or_insert_with(|| {
                        order.push(id.clone());
                        asset_path(IMAGES_DIR, &id, &record.mime)
                    });
                    Some(path.clone())
                }
                Err(_) => {
                    report.unresolved.push(target.to_string());
                    None
                }
            }
        });
    }

    for channel in TextureChannel::ALL {
        let Some(reference) = document.textures.get(channel).map(str::to_string) else {
            continue;
        };
        let record = AssetId::parse(reference.as_str())
            .ok()
            .and_then(|id| assets.record(&id).ok());
        match record {
            Some(record) => {
                let id = record.id.clone();
                let path = paths.entry(id.clone()).or_insert_with(|| {
                    order.push(id.clone());
                    asset_path(TEXTURES_DIR, &id, &record.mime)
                });
                document.textures.set(channel, path.clone());
            }
            None => {
                warn!(channel = %channel, reference = %reference, "Texture references unknown asset");
                document.textures.clear(channel);
                report.unresolved.push(reference);
            }
        }
    }

    report.excluded = assets
        .ids()
        .filter(|id| !paths.contains_key(*id))
        .cloned()
        .collect();

    let mut manifest_assets = Vec::with_capacity(order.len());
    let mut payloads = Vec::with_capacity(order.len());
    for id in &order {
        let record = assets.record(id)?;
        let path = paths[id].clone();
        manifest_assets.push(ManifestAsset {
            path: path.clone(),
            mime: record.mime.clone(),
            name: record.name.clone(),
        });
        payloads.push((path, record.payload.clone()));
    }

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        saved_at,
        document,
        assets: manifest_assets,
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(ArchiveError::InvalidManifest)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(MANIFEST_PATH, options)?;
    writer
        .write_all(&manifest_json)
        .map_err(|source| ArchiveError::Entry {
            operation: "write",
            path: MANIFEST_PATH.to_string(),
            source,
        })?;

    for (path, payload) in payloads {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(&payload).map_err(|source| ArchiveError::Entry {
            operation: "write",
            path: path.clone(),
            source,
        })?;
        report.written.push(path);
    }

    let bytes = writer.finish()?.into_inner();

    debug!(
        bytes = bytes.len(),
        written = report.written.len(),
        excluded = report.excluded.len(),
        unresolved = report.unresolved.len(),
        "Encoded project archive"
    );

    Ok((bytes, report))
}

/// Parse a zip container into a document and handle-less records.
///
/// Payloads missing from the container do not fail the load: texture slots
/// pointing at them are cleared, text references are left as written, and
/// the paths are listed in [`DecodeReport::missing`].
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn read_archive(bytes: &[u8]) -> ArchiveResult<ArchiveContents> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let manifest_json = {
        let mut entry = match archive.by_name(MANIFEST_PATH) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(ArchiveError::MissingManifest),
            Err(e) => return Err(e.into()),
        };
        let mut json = Vec::new();
        entry
            .read_to_end(&mut json)
            .map_err(|source| ArchiveError::Entry {
                operation: "read",
                path: MANIFEST_PATH.to_string(),
                source,
            })?;
        json
    };

    let header: ManifestHeader =
        serde_json::from_slice(&manifest_json).map_err(ArchiveError::InvalidManifest)?;
    if header.format_version > FORMAT_VERSION {
        return Err(ArchiveError::UnsupportedVersion {
            found: header.format_version,
            max_supported: FORMAT_VERSION,
        });
    }
    let manifest: Manifest =
        serde_json::from_slice(&manifest_json).map_err(ArchiveError::InvalidManifest)?;

    let mut report = DecodeReport::default();
    let mut records = Vec::new();
    // archive path -> id of a payload that was actually loaded
    let mut loaded: BTreeMap<String, AssetId> = BTreeMap::new();

    for asset in &manifest.assets {
        let Some(id) = id_from_path(&asset.path) else {
            warn!(path = %asset.path, "Manifest asset path carries no valid id");
            report.missing.push(asset.path.clone());
            continue;
        };
        if loaded.values().any(|known| *known == id) {
            debug!(path = %asset.path, "Asset id already loaded from another path");
            loaded.insert(asset.path.clone(), id);
            continue;
        }

        let Some(payload) = read_entry(&mut archive, &asset.path)? else {
            warn!(path = %asset.path, "Archive entry missing");
            report.missing.push(asset.path.clone());
            continue;
        };

        let mut record = AssetRecord::new(id.clone(), payload, asset.mime.clone()).with_path(asset.path.clone());
        record.name = asset.name.clone();
        records.push(record);
        loaded.insert(asset.path.clone(), id);
    }

    // references the manifest's asset list does not cover
    let mut referenced: Vec<String> = Vec::new();
    for section in &manifest.document.sections {
        rewrite_link_targets(&section.content, |target| {
            referenced.push(target.to_string());
            None
        });
    }
    referenced.extend(
        TextureChannel::ALL
            .iter()
            .filter_map(|channel| manifest.document.textures.get(*channel).map(str::to_string)),
    );

    for path in referenced {
        if loaded.contains_key(&path) || !is_asset_path(&path) {
            continue;
        }
        let Some(id) = id_from_path(&path) else {
            continue;
        };
        if loaded.values().any(|known| *known == id) {
            loaded.insert(path, id);
            continue;
        }
        let Some(payload) = read_entry(&mut archive, &path)? else {
            continue;
        };

        let mime = sniff_mime(&payload).unwrap_or_else(|| {
            let extension = Path::new(&path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            mime_for_extension(extension)
        });
        debug!(path = %path, mime, "Loaded entry absent from the manifest asset list");
        records.push(AssetRecord::new(id.clone(), payload, mime).with_path(path.clone()));
        report.missing.retain(|missing| *missing != path);
        loaded.insert(path, id);
    }

    let mut document = manifest.document;

    for section in &mut document.sections {
        section.content = rewrite_link_targets(&section.content, |target| {
            match loaded.get(target) {
                Some(id) => Some(image_reference(id)),
                None => {
                    if is_asset_path(target) && !report.missing.iter().any(|m| m == target) {
                        report.missing.push(target.to_string());
                    }
                    None
                }
            }
        });
    }

    for channel in TextureChannel::ALL {
        let Some(path) = document.textures.get(channel).map(str::to_string) else {
            continue;
        };
        match loaded.get(&path) {
            Some(id) => {
                document.textures.set(channel, id.to_string());
            }
            None => {
                document.textures.clear(channel);
                if !report.missing.contains(&path) {
                    report.missing.push(path);
                }
            }
        }
    }

    debug!(
        assets = records.len(),
        missing = report.missing.len(),
        "Read project archive"
    );

    Ok(ArchiveContents {
        document,
        records,
        report,
    })
}

/// Payload of `path`, or `None` when the container has no such entry
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> ArchiveResult<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    // declared sizes come from the container and are not trusted
    let mut payload = Vec::new();
    entry
        .read_to_end(&mut payload)
        .map_err(|source| ArchiveError::Entry {
            operation: "read",
            path: path.to_string(),
            source,
        })?;
    Ok(Some(payload))
}

/// Parse a zip container straight into a document and a live table
pub fn decode(bytes: &[u8]) -> ArchiveResult<(ProjectDocument, AssetTable)> {
    let (document, assets, _) = read_archive(bytes)?.into_table()?;
    Ok((document, assets))
}

/// Read any supported project file
pub fn read_project(file_name: &str, mime: Option<&str>, bytes: &[u8]) -> ArchiveResult<ArchiveContents> {
    match ProjectFileKind::detect_with_mime(file_name, mime, bytes) {
        ProjectFileKind::Archive => read_archive(bytes),
        ProjectFileKind::Legacy => Ok(ArchiveContents {
            document: parse_legacy(bytes)?,
            records: Vec::new(),
            report: DecodeReport {
                missing: Vec::new(),
                legacy: true,
            },
        }),
        ProjectFileKind::Image | ProjectFileKind::Unknown => Err(ArchiveError::UnknownFormat {
            name: file_name.to_string(),
        }),
    }
}
