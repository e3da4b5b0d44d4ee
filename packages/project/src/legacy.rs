//! Read-only support for the original single-section JSON project files.

use crate::document::{ProjectDocument, Section};
use crate::error::{ArchiveError, ArchiveResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyProject {
    project_name: String,
    shaders: LegacyShaders,
    #[serde(default)]
    section: Option<LegacySection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyShaders {
    vertex: String,
    fragment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacySection {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Parse a legacy project. Scene and uniforms take their defaults.
pub fn parse_legacy(bytes: &[u8]) -> ArchiveResult<ProjectDocument> {
    let legacy: LegacyProject = serde_json::from_slice(bytes).map_err(ArchiveError::InvalidLegacy)?;

    let mut document = ProjectDocument::new(
        legacy.project_name,
        legacy.shaders.vertex,
        legacy.shaders.fragment,
    );
    if let Some(section) = legacy.section {
        document.sections.push(Section::new(section.title, section.content));
    }

    Ok(document)
}
