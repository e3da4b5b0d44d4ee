use anyhow::Context;
use chroma_diagnostics::{DiagnosticMapper, MapperConfig, NoiseConfig, NoiseFilter};
use chroma_markdown::BridgeOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "chroma.config.json";

/// Chroma configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Driver log lines to ignore
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Extension for saved project archives
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,

    /// Where `init` and `convert` write projects
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Section text conversion
    #[serde(default)]
    pub markdown: BridgeOptions,
}

fn default_archive_extension() -> String {
    chroma_project::ARCHIVE_EXTENSION.to_string()
}

fn default_out_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Load config from a directory. Noise patterns are compiled here so a
    /// bad regex fails before any command runs.
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid {}", DEFAULT_CONFIG_NAME))?;
        NoiseFilter::from_config(&config.noise)
            .with_context(|| format!("Invalid noise pattern in {}", DEFAULT_CONFIG_NAME))?;
        Ok(config)
    }

    /// Get absolute path to the output directory
    pub fn get_out_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.out_dir)
    }

    /// `--out-dir` wins over the configured directory
    pub fn resolve_out_dir(&self, cwd: &str, flag: Option<&str>) -> PathBuf {
        match flag {
            Some(out) => PathBuf::from(cwd).join(out),
            None => self.get_out_dir(cwd),
        }
    }

    pub fn mapper(&self) -> anyhow::Result<DiagnosticMapper> {
        let config = MapperConfig {
            noise: self.noise.clone(),
        };
        Ok(DiagnosticMapper::from_config(&config)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            archive_extension: default_archive_extension(),
            out_dir: default_out_dir(),
            markdown: BridgeOptions::default(),
        }
    }
}
