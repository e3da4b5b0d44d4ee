use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use chroma_diagnostics::{CompileDiagnostic, DiagnosticsStore, Severity};
use chroma_shader::{CompileInterceptor, CompilerError, ShaderCompiler, ShaderStage, UniformTable};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Shader source as the user edits it
    pub source: PathBuf,

    /// Info log the driver produced for this shader
    #[arg(short, long)]
    pub log: PathBuf,

    /// Shader stage (vertex, fragment); inferred from .vert/.frag if omitted
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Lines prepended before the source (defaults to the uniform preamble)
    #[arg(long)]
    pub offset: Option<usize>,

    /// Print diagnostics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Replays a captured driver log instead of compiling
struct RecordedLog {
    log: String,
}

impl ShaderCompiler for RecordedLog {
    fn compile(&mut self, _stage: ShaderStage, _source: &str) -> Result<String, CompilerError> {
        Ok(self.log.clone())
    }
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let stage = resolve_stage(&args)?;

    let source = fs::read_to_string(&args.source)
        .with_context(|| format!("Failed to read {}", args.source.display()))?;
    let log = fs::read_to_string(&args.log)
        .with_context(|| format!("Failed to read {}", args.log.display()))?;

    let mut interceptor =
        CompileInterceptor::with_mapper(RecordedLog { log }, DiagnosticsStore::new(), config.mapper()?);
    interceptor.set_visible_source(stage, source.clone());

    let diagnostics = match args.offset {
        Some(offset) => {
            let full = format!("{}{}", "\n".repeat(offset), source);
            interceptor.on_native_compile(&full, stage)?
        }
        None => interceptor.compile_stage(stage, &UniformTable::new())?,
    };

    debug!(
        source = %args.source.display(),
        stage = %stage,
        diagnostics = diagnostics.len(),
        "Mapped driver log"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        let file_name = args
            .source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("shader");
        eprint!("{}", render_diagnostics(&diagnostics, &source, file_name)?);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;

    if errors > 0 {
        return Err(anyhow!(
            "{} error(s), {} warning(s) in {} stage",
            errors,
            warnings,
            stage
        ));
    }

    if !args.json {
        println!(
            "{} {} stage: {} warning(s)",
            "✓".green(),
            stage,
            warnings
        );
    }
    Ok(())
}

fn resolve_stage(args: &CheckArgs) -> Result<ShaderStage> {
    if let Some(stage) = &args.stage {
        return Ok(stage.parse()?);
    }
    extension_stage(&args.source).ok_or_else(|| {
        anyhow!(
            "Cannot infer the stage of {}; pass --stage vertex|fragment",
            args.source.display()
        )
    })
}

fn extension_stage(path: &Path) -> Option<ShaderStage> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.to_ascii_lowercase().parse().ok())
}

fn char_index(source: &str, byte: usize) -> usize {
    source[..byte.min(source.len())].chars().count()
}

/// Pretty-print diagnostics with source context using ariadne
pub fn render_diagnostics(
    diagnostics: &[CompileDiagnostic],
    source: &str,
    filename: &str,
) -> Result<String> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        let bytes = diagnostic.buffer_range(source);
        let span = char_index(source, bytes.start)..char_index(source, bytes.end);
        let (kind, color) = match diagnostic.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let report = Report::build(kind, filename, span.start)
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((filename, span))
                    .with_color(color)
                    .with_message(format!("{} stage, line {}", diagnostic.stage, diagnostic.line)),
            )
            .finish();

        report.write((filename, Source::from(source)), &mut output)?;
    }

    Ok(String::from_utf8_lossy(&output).into_owned())
}
