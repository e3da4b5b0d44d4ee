use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Informational lines some drivers emit alongside real errors
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[r"(?i)no precision specified"];

#[derive(Error, Debug)]
#[error("Invalid noise pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Serializable noise configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseConfig {
    /// Lines matching any of these are dropped
    #[serde(default = "default_deny")]
    pub deny: Vec<String>,

    /// Lines matching any of these are kept even if denied
    #[serde(default)]
    pub allow: Vec<String>,
}

fn default_deny() -> Vec<String> {
    DEFAULT_NOISE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            deny: default_deny(),
            allow: Vec::new(),
        }
    }
}

/// Compiled allow/deny lists
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    deny: Vec<Regex>,
    allow: Vec<Regex>,
}

impl NoiseFilter {
    pub fn from_config(config: &NoiseConfig) -> Result<Self, PatternError> {
        Ok(Self {
            deny: compile_all(&config.deny)?,
            allow: compile_all(&config.allow)?,
        })
    }

    /// A filter that keeps every line
    pub fn empty() -> Self {
        Self {
            deny: Vec::new(),
            allow: Vec::new(),
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        if self.allow.iter().any(|re| re.is_match(line)) {
            return false;
        }
        self.deny.iter().any(|re| re.is_match(line))
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        let deny = DEFAULT_NOISE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("default noise patterns are valid"))
            .collect();
        Self {
            deny,
            allow: Vec::new(),
        }
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, PatternError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| PatternError {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
