use crate::error::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GL enum for `VERTEX_SHADER`
pub const GL_VERTEX_SHADER: u32 = 0x8B31;

/// GL enum for `FRAGMENT_SHADER`
pub const GL_FRAGMENT_SHADER: u32 = 0x8B30;

/// One of the two compilation units of a shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    /// Resolve a native GL shader type enum.
    pub fn from_gl_enum(value: u32) -> StageResult<Self> {
        match value {
            GL_VERTEX_SHADER => Ok(ShaderStage::Vertex),
            GL_FRAGMENT_SHADER => Ok(ShaderStage::Fragment),
            other => Err(StageError::UnknownEnum(other)),
        }
    }

    pub fn gl_enum(&self) -> u32 {
        match self {
            ShaderStage::Vertex => GL_VERTEX_SHADER,
            ShaderStage::Fragment => GL_FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShaderStage {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" | "vert" | "vs" => Ok(ShaderStage::Vertex),
            "fragment" | "frag" | "fs" => Ok(ShaderStage::Fragment),
            _ => Err(StageError::UnknownName(s.to_string())),
        }
    }
}

/// Exactly one value per shader stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMap<T> {
    pub vertex: T,
    pub fragment: T,
}

impl<T> StageMap<T> {
    pub fn new(vertex: T, fragment: T) -> Self {
        Self { vertex, fragment }
    }

    pub fn get(&self, stage: ShaderStage) -> &T {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    pub fn get_mut(&mut self, stage: ShaderStage) -> &mut T {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }

    pub fn set(&mut self, stage: ShaderStage, value: T) -> T {
        std::mem::replace(self.get_mut(stage), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &T)> {
        [
            (ShaderStage::Vertex, &self.vertex),
            (ShaderStage::Fragment, &self.fragment),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_names() {
        assert_eq!("vertex".parse::<ShaderStage>(), Ok(ShaderStage::Vertex));
        assert_eq!("Fragment".parse::<ShaderStage>(), Ok(ShaderStage::Fragment));
        assert_eq!("frag".parse::<ShaderStage>(), Ok(ShaderStage::Fragment));
    }

    #[test]
    fn test_unknown_stage_is_an_error() {
        assert_eq!(
            "geometry".parse::<ShaderStage>(),
            Err(StageError::UnknownName("geometry".to_string()))
        );
        assert_eq!(
            ShaderStage::from_gl_enum(0x91B9),
            Err(StageError::UnknownEnum(0x91B9))
        );
    }

    #[test]
    fn test_gl_enum_roundtrip() {
        for stage in ShaderStage::ALL {
            assert_eq!(ShaderStage::from_gl_enum(stage.gl_enum()), Ok(stage));
        }
    }

    #[test]
    fn test_stage_map_access() {
        let mut map = StageMap::new("v".to_string(), "f".to_string());
        assert_eq!(map.get(ShaderStage::Fragment), "f");

        let old = map.set(ShaderStage::Vertex, "v2".to_string());
        assert_eq!(old, "v");
        assert_eq!(map.vertex, "v2");

        let stages: Vec<_> = map.iter().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Fragment]);
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&ShaderStage::Vertex).unwrap();
        assert_eq!(json, "\"vertex\"");
    }
}
