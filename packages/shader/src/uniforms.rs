//! Typed uniform declarations.
//!
//! Every uniform carries a value and an `editable` flag. Engine uniforms
//! (time, mouse, resolution, texture channels) are always present, cannot be
//! overwritten by user declarations, and are never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sampler aliasing the first texture channel
pub const USER_TEXTURE_UNIFORM: &str = "u_userTexture";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UniformError {
    #[error("Uniform '{0}' is reserved by the engine")]
    Reserved(String),

    #[error("Unknown texture channel: {0}")]
    UnknownChannel(String),
}

/// One of the four texture inputs exposed to shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureChannel {
    #[serde(rename = "iChannel0")]
    Channel0,
    #[serde(rename = "iChannel1")]
    Channel1,
    #[serde(rename = "iChannel2")]
    Channel2,
    #[serde(rename = "iChannel3")]
    Channel3,
}

impl TextureChannel {
    pub const ALL: [TextureChannel; 4] = [
        TextureChannel::Channel0,
        TextureChannel::Channel1,
        TextureChannel::Channel2,
        TextureChannel::Channel3,
    ];

    /// Name of the sampler uniform for this channel
    pub fn uniform_name(&self) -> &'static str {
        match self {
            TextureChannel::Channel0 => "iChannel0",
            TextureChannel::Channel1 => "iChannel1",
            TextureChannel::Channel2 => "iChannel2",
            TextureChannel::Channel3 => "iChannel3",
        }
    }
}

impl fmt::Display for TextureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uniform_name())
    }
}

impl FromStr for TextureChannel {
    type Err = UniformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextureChannel::ALL
            .into_iter()
            .find(|c| c.uniform_name() == s)
            .ok_or_else(|| UniformError::UnknownChannel(s.to_string()))
    }
}

/// A uniform's value, tagged with its GLSL type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum UniformValue {
    #[serde(rename = "float")]
    Float(f32),
    #[serde(rename = "int")]
    Int(i32),
    #[serde(rename = "bool")]
    Bool(bool),
    #[serde(rename = "vec2")]
    Vec2([f32; 2]),
    #[serde(rename = "vec3")]
    Vec3([f32; 3]),
    #[serde(rename = "vec4")]
    Vec4([f32; 4]),
    /// Sampler bound to a texture channel, or unbound
    #[serde(rename = "sampler2D")]
    Sampler2D(Option<TextureChannel>),
}

impl UniformValue {
    pub fn glsl_type(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Sampler2D(_) => "sampler2D",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub value: UniformValue,
    pub editable: bool,
}

/// All uniforms of one shader program
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTable {
    entries: BTreeMap<String, Uniform>,
}

impl UniformTable {
    /// Table containing only the engine uniforms
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        let mut reserve = |name: &str, value: UniformValue| {
            entries.insert(
                name.to_string(),
                Uniform {
                    value,
                    editable: false,
                },
            );
        };

        reserve("u_time", UniformValue::Float(0.0));
        reserve("u_mousePosition", UniformValue::Vec2([0.0, 0.0]));
        reserve("u_screenResolution", UniformValue::Vec2([0.0, 0.0]));
        reserve(
            USER_TEXTURE_UNIFORM,
            UniformValue::Sampler2D(Some(TextureChannel::Channel0)),
        );
        for channel in TextureChannel::ALL {
            reserve(channel.uniform_name(), UniformValue::Sampler2D(Some(channel)));
        }

        Self { entries }
    }

    /// Engine uniforms plus the given user declarations.
    ///
    /// User entries that collide with engine names are rejected.
    pub fn with_user(user: &BTreeMap<String, UniformValue>) -> Result<Self, UniformError> {
        let mut table = Self::new();
        table.replace_user(user)?;
        Ok(table)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|u| !u.editable)
    }

    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.get(name)
    }

    /// Declare or update a user uniform
    pub fn set_user(&mut self, name: impl Into<String>, value: UniformValue) -> Result<(), UniformError> {
        let name = name.into();
        if self.is_reserved(&name) {
            return Err(UniformError::Reserved(name));
        }
        self.entries.insert(
            name,
            Uniform {
                value,
                editable: true,
            },
        );
        Ok(())
    }

    /// Update an engine uniform (time, mouse, resolution) from the render loop
    pub fn set_engine(&mut self, name: &str, value: UniformValue) -> bool {
        match self.entries.get_mut(name) {
            Some(uniform) if !uniform.editable => {
                uniform.value = value;
                true
            }
            _ => false,
        }
    }

    pub fn remove_user(&mut self, name: &str) -> Option<UniformValue> {
        if self.is_reserved(name) {
            return None;
        }
        self.entries.remove(name).map(|u| u.value)
    }

    /// Drop every user uniform and install `user` instead.
    ///
    /// Validation happens before anything is removed.
    pub fn replace_user(&mut self, user: &BTreeMap<String, UniformValue>) -> Result<(), UniformError> {
        if let Some(name) = user.keys().find(|name| self.is_reserved(name)) {
            return Err(UniformError::Reserved(name.clone()));
        }
        self.entries.retain(|_, u| !u.editable);
        for (name, value) in user {
            self.entries.insert(
                name.clone(),
                Uniform {
                    value: value.clone(),
                    editable: true,
                },
            );
        }
        Ok(())
    }

    /// The persistable subset: user-editable uniforms only
    pub fn user_uniforms(&self) -> BTreeMap<String, UniformValue> {
        self.entries
            .iter()
            .filter(|(_, u)| u.editable)
            .map(|(name, u)| (name.clone(), u.value.clone()))
            .collect()
    }

    /// `(name, glsl type)` in declaration order
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.entries
            .iter()
            .map(|(name, u)| (name.as_str(), u.value.glsl_type()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UniformTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_uniforms_present_and_locked() {
        let table = UniformTable::new();
        assert_eq!(table.len(), 8);
        assert!(table.is_reserved("u_time"));
        assert!(table.is_reserved("iChannel3"));
        assert!(table.user_uniforms().is_empty());
    }

    #[test]
    fn test_user_cannot_shadow_engine_uniform() {
        let mut table = UniformTable::new();
        let err = table
            .set_user("u_time", UniformValue::Float(3.0))
            .unwrap_err();
        assert_eq!(err, UniformError::Reserved("u_time".to_string()));
        assert_eq!(table.get("u_time").unwrap().value, UniformValue::Float(0.0));
    }

    #[test]
    fn test_replace_user_keeps_engine_entries() {
        let mut table = UniformTable::new();
        table.set_user("u_old", UniformValue::Int(1)).unwrap();

        let mut user = BTreeMap::new();
        user.insert("u_tint".to_string(), UniformValue::Vec3([1.0, 0.5, 0.0]));
        table.replace_user(&user).unwrap();

        assert!(table.get("u_old").is_none());
        assert!(table.get("u_time").is_some());
        assert_eq!(table.user_uniforms(), user);
    }

    #[test]
    fn test_replace_user_rejects_before_mutating() {
        let mut table = UniformTable::new();
        table.set_user("u_keep", UniformValue::Bool(true)).unwrap();

        let mut user = BTreeMap::new();
        user.insert("iChannel0".to_string(), UniformValue::Sampler2D(None));
        assert!(table.replace_user(&user).is_err());
        assert!(table.get("u_keep").is_some());
    }

    #[test]
    fn test_set_engine_only_touches_reserved() {
        let mut table = UniformTable::new();
        table.set_user("u_speed", UniformValue::Float(1.0)).unwrap();

        assert!(table.set_engine("u_time", UniformValue::Float(2.5)));
        assert!(!table.set_engine("u_speed", UniformValue::Float(9.0)));
        assert_eq!(table.get("u_speed").unwrap().value, UniformValue::Float(1.0));
    }

    #[test]
    fn test_value_serializes_with_glsl_type_tag() {
        let json = serde_json::to_value(UniformValue::Vec2([1.0, 2.0])).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "vec2", "value": [1.0, 2.0] }));

        let sampler: UniformValue =
            serde_json::from_str(r#"{ "type": "sampler2D", "value": "iChannel2" }"#).unwrap();
        assert_eq!(sampler, UniformValue::Sampler2D(Some(TextureChannel::Channel2)));
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("iChannel1".parse::<TextureChannel>(), Ok(TextureChannel::Channel1));
        assert!("iChannel9".parse::<TextureChannel>().is_err());
    }
}
