use chroma_common::{line_col_to_byte_offset, line_start_offset, line_text, ShaderStage};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Character columns within one line, 0-based, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A compiler diagnostic expressed in the visible buffer's coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileDiagnostic {
    /// Stage whose buffer this diagnostic belongs to
    pub stage: ShaderStage,

    /// 1-based line in the visible source
    pub line: usize,

    /// Tight range of the offending token; `None` spans the whole line
    pub range: Option<CharRange>,

    pub severity: Severity,

    /// Driver message with its line reference rewritten to `line`
    pub message: String,
}

impl CompileDiagnostic {
    pub fn error(stage: ShaderStage, line: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            line,
            range: None,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn with_range(mut self, range: CharRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Byte range into `visible_source` covering this diagnostic.
    ///
    /// Without a character range this is the full line, excluding the line
    /// terminator. Positions past the end of the buffer collapse to its end.
    pub fn buffer_range(&self, visible_source: &str) -> Range<usize> {
        let line_idx = self.line.saturating_sub(1);

        match self.range {
            Some(range) => {
                let start = line_col_to_byte_offset(visible_source, line_idx, range.start);
                let end = line_col_to_byte_offset(visible_source, line_idx, range.end);
                start..end.max(start)
            }
            None => {
                let Some(start) = line_start_offset(visible_source, self.line) else {
                    return visible_source.len()..visible_source.len();
                };
                let len = line_text(visible_source, self.line).map_or(0, str::len);
                start..start + len
            }
        }
    }
}
