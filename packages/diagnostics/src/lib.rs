//! # Chroma Diagnostics
//!
//! Turns a shader driver's info log into editor diagnostics that point at
//! the user's own buffer.
//!
//! ```text
//! raw log ──► noise filter ──► log grammar ──► line remap ──► token range
//!                                                 │
//!                                   line_offset = injected header lines
//! ```
//!
//! The compiler sees `header + visible`, the user sees `visible`. Every
//! reported line is shifted back by the header length and clamped into the
//! visible buffer, and the message text is rewritten to match.

mod diagnostic;
mod grammar;
mod mapper;
mod noise;
mod sink;

pub use diagnostic::{CharRange, CompileDiagnostic, Severity};
pub use grammar::{parse_log_line, LogEntry};
pub use mapper::{parse_log, DiagnosticMapper, MapperConfig};
pub use noise::{NoiseConfig, NoiseFilter, PatternError, DEFAULT_NOISE_PATTERNS};
pub use sink::{DiagnosticsSink, DiagnosticsStore};

pub use chroma_common::ShaderStage;
