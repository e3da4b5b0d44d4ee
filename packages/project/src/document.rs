use chroma_common::{ShaderStage, StageMap};
use chroma_shader::{TextureChannel, UniformValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One titled rich-text section. `content` is storage-form markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Projection {
    Perspective { fov: f32, near: f32, far: f32 },
    Orthographic { near: f32, far: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub projection: Projection,
    pub position_z: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                fov: 70.0,
                near: 0.01,
                far: 10.0,
            },
            position_z: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Geometry {
    Plane { width: f32, height: f32 },
    Box { width: f32, height: f32, depth: f32 },
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::Plane {
            width: 0.5,
            height: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneSettings {
    /// Linear RGB in `[0, 1]`
    pub background: [f32; 3],
    pub camera: Camera,
    pub geometry: Geometry,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background: [0.5, 0.5, 0.5],
            camera: Camera::default(),
            geometry: Geometry::default(),
        }
    }
}

/// Texture channel bindings.
///
/// In memory each slot holds an asset id; inside an archive manifest it
/// holds the archive-relative path of the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlots {
    #[serde(rename = "iChannel0", default, skip_serializing_if = "Option::is_none")]
    channel0: Option<String>,
    #[serde(rename = "iChannel1", default, skip_serializing_if = "Option::is_none")]
    channel1: Option<String>,
    #[serde(rename = "iChannel2", default, skip_serializing_if = "Option::is_none")]
    channel2: Option<String>,
    #[serde(rename = "iChannel3", default, skip_serializing_if = "Option::is_none")]
    channel3: Option<String>,
}

impl TextureSlots {
    pub fn get(&self, channel: TextureChannel) -> Option<&str> {
        self.slot(channel).as_deref()
    }

    /// Bind a channel, returning the previous reference
    pub fn set(&mut self, channel: TextureChannel, reference: impl Into<String>) -> Option<String> {
        self.slot_mut(channel).replace(reference.into())
    }

    pub fn clear(&mut self, channel: TextureChannel) -> Option<String> {
        self.slot_mut(channel).take()
    }

    /// Bound channels in channel order
    pub fn iter(&self) -> impl Iterator<Item = (TextureChannel, &str)> {
        TextureChannel::ALL
            .into_iter()
            .filter_map(move |channel| self.get(channel).map(|r| (channel, r)))
    }

    fn slot(&self, channel: TextureChannel) -> &Option<String> {
        match channel {
            TextureChannel::Channel0 => &self.channel0,
            TextureChannel::Channel1 => &self.channel1,
            TextureChannel::Channel2 => &self.channel2,
            TextureChannel::Channel3 => &self.channel3,
        }
    }

    fn slot_mut(&mut self, channel: TextureChannel) -> &mut Option<String> {
        match channel {
            TextureChannel::Channel0 => &mut self.channel0,
            TextureChannel::Channel1 => &mut self.channel1,
            TextureChannel::Channel2 => &mut self.channel2,
            TextureChannel::Channel3 => &mut self.channel3,
        }
    }
}

/// Everything a project persists apart from binary payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub shaders: StageMap<String>,
    /// User uniforms only; engine uniforms are never stored
    #[serde(default)]
    pub uniforms: BTreeMap<String, UniformValue>,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub textures: TextureSlots,
}

impl ProjectDocument {
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            shaders: StageMap::new(vertex.into(), fragment.into()),
            uniforms: BTreeMap::new(),
            scene: SceneSettings::default(),
            textures: TextureSlots::default(),
        }
    }

    pub fn shader(&self, stage: ShaderStage) -> &str {
        self.shaders.get(stage)
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_defaults() {
        let scene = SceneSettings::default();
        assert_eq!(scene.background, [0.5, 0.5, 0.5]);
        assert_eq!(scene.camera.position_z, 1.0);
        assert_eq!(
            scene.camera.projection,
            Projection::Perspective {
                fov: 70.0,
                near: 0.01,
                far: 10.0
            }
        );
        assert_eq!(
            scene.geometry,
            Geometry::Plane {
                width: 0.5,
                height: 0.5
            }
        );
    }

    #[test]
    fn test_texture_slots() {
        let mut slots = TextureSlots::default();
        assert_eq!(slots.set(TextureChannel::Channel2, "abc"), None);
        assert_eq!(slots.get(TextureChannel::Channel2), Some("abc"));
        assert_eq!(
            slots.iter().collect::<Vec<_>>(),
            vec![(TextureChannel::Channel2, "abc")]
        );
        assert_eq!(slots.clear(TextureChannel::Channel2).as_deref(), Some("abc"));
        assert_eq!(slots.iter().count(), 0);
    }

    #[test]
    fn test_document_json_shape() {
        let mut doc = ProjectDocument::new("Waves", "void main() {}", "void main() {}")
            .with_section(Section::new("Intro", "Hello"));
        doc.textures.set(TextureChannel::Channel0, "id0");
        doc.scene.geometry = Geometry::Box {
            width: 0.2,
            height: 0.7,
            depth: 0.2,
        };
        doc.uniforms
            .insert("u_speed".into(), UniformValue::Float(1.5));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["textures"]["iChannel0"], "id0");
        assert_eq!(json["scene"]["geometry"]["type"], "box");
        assert_eq!(json["scene"]["camera"]["projection"]["type"], "perspective");
        assert_eq!(json["uniforms"]["u_speed"]["type"], "float");

        let back: ProjectDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let doc: ProjectDocument = serde_json::from_str(
            r#"{"name":"n","shaders":{"vertex":"v","fragment":"f"}}"#,
        )
        .unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.scene, SceneSettings::default());
        assert_eq!(doc.textures, TextureSlots::default());
    }
}
