use crate::diagnostic::{CharRange, CompileDiagnostic};
use crate::grammar::parse_log_line;
use crate::noise::{NoiseConfig, NoiseFilter, PatternError};
use chroma_common::{line_count, line_text, ShaderStage};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, instrument, trace};

/// Options for configuring the mapper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub noise: NoiseConfig,
}

/// Maps driver logs onto the visible source of one stage
#[derive(Debug, Clone, Default)]
pub struct DiagnosticMapper {
    noise: NoiseFilter,
}

impl DiagnosticMapper {
    pub fn new(noise: NoiseFilter) -> Self {
        Self { noise }
    }

    pub fn from_config(config: &MapperConfig) -> Result<Self, PatternError> {
        Ok(Self::new(NoiseFilter::from_config(&config.noise)?))
    }

    /// Parse `raw_log` into diagnostics positioned in `visible_source`.
    ///
    /// `line_offset` is the number of lines the engine prepended before the
    /// visible source. Output follows log order; duplicates are kept.
    #[instrument(level = "debug", skip(self, raw_log, visible_source))]
    pub fn map(
        &self,
        raw_log: &str,
        line_offset: usize,
        visible_source: &str,
        stage: ShaderStage,
    ) -> Vec<CompileDiagnostic> {
        let last_line = line_count(visible_source).max(1);
        let mut diagnostics = Vec::new();

        for raw_line in raw_log.lines() {
            let text = raw_line.trim_matches(|c: char| c.is_whitespace() || c == '\0');
            if text.is_empty() {
                continue;
            }
            if self.noise.is_noise(text) {
                trace!(line = text, "Dropping noise line");
                continue;
            }

            let entry = parse_log_line(text);
            let line = entry
                .line
                .map_or(1, |full| full.saturating_sub(line_offset))
                .clamp(1, last_line);

            let range = entry.token.as_deref().and_then(|token| {
                line_text(visible_source, line).and_then(|l| token_range(l, token))
            });

            diagnostics.push(CompileDiagnostic {
                stage,
                line,
                range,
                severity: entry.severity,
                message: entry.rewrite_line(line),
            });
        }

        debug!(count = diagnostics.len(), line_offset, "Mapped compile log");
        diagnostics
    }
}

/// Character range of the first occurrence of `token` in `line`
fn token_range(line: &str, token: &str) -> Option<CharRange> {
    let byte_idx = line.find(token)?;
    let start = line[..byte_idx].chars().count();
    Some(CharRange::new(start, start + token.chars().count()))
}

/// Map a log with the default noise filter.
pub fn parse_log(
    raw_log: &str,
    line_offset: usize,
    visible_source: &str,
    stage: ShaderStage,
) -> Vec<CompileDiagnostic> {
    static DEFAULT: OnceLock<DiagnosticMapper> = OnceLock::new();
    DEFAULT
        .get_or_init(DiagnosticMapper::default)
        .map(raw_log, line_offset, visible_source, stage)
}
