use crate::diagnostic::Severity;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// `ERROR: <column>:<line>: '<token>' <rest of message>`
fn log_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(ERROR|WARNING):\s*(\d+):(\d+):\s*(?:'([^']*)')?")
            .expect("log grammar is a valid regex")
    })
}

/// One recognised line of a driver info log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,

    /// Line in the full (compiled) source, `None` if the grammar did not match
    pub line: Option<usize>,

    /// Offending token quoted by the driver
    pub token: Option<String>,

    /// The trimmed log line
    pub text: String,

    /// Byte span of the line number inside `text`
    line_span: Option<Range<usize>>,
}

impl LogEntry {
    /// Rebuild the message so it names `line` instead of the driver's line.
    pub fn rewrite_line(&self, line: usize) -> String {
        match &self.line_span {
            Some(span) => {
                let mut message = String::with_capacity(self.text.len());
                message.push_str(&self.text[..span.start]);
                message.push_str(&line.to_string());
                message.push_str(&self.text[span.end..]);
                message
            }
            None => self.text.clone(),
        }
    }
}

/// Parse a single trimmed, non-empty log line.
///
/// Lines that do not follow the grammar are kept with no position.
pub fn parse_log_line(text: &str) -> LogEntry {
    let Some(caps) = log_line_regex().captures(text) else {
        let severity = if text.starts_with("WARNING") {
            Severity::Warning
        } else {
            Severity::Error
        };
        return LogEntry {
            severity,
            line: None,
            token: None,
            text: text.to_string(),
            line_span: None,
        };
    };

    let severity = match &caps[1] {
        "WARNING" => Severity::Warning,
        _ => Severity::Error,
    };
    let line_match = caps.get(3);
    let line = line_match.and_then(|m| m.as_str().parse::<usize>().ok());
    let token = caps
        .get(4)
        .map(|m| m.as_str().to_string())
        .filter(|t| !t.is_empty());

    LogEntry {
        severity,
        line,
        token,
        text: text.to_string(),
        // only rewrite numbers we could actually parse
        line_span: line.and(line_match.map(|m| m.range())),
    }
}
