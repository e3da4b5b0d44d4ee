use anyhow::{anyhow, Context, Result};
use chroma_project::{read_project, ArchiveContents, ProjectFileKind};
use chroma_shader::ShaderStage;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Project file, or a directory to scan for project files
    #[arg(default_value = ".")]
    pub path: String,
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let path = PathBuf::from(cwd).join(&args.path);

    let files = if path.is_dir() {
        find_project_files(&path)
    } else if path.is_file() {
        vec![path.clone()]
    } else {
        return Err(anyhow!("Path does not exist: {}", path.display()));
    };

    if files.is_empty() {
        println!("{}", "⚠️  No project files found".yellow());
        return Ok(());
    }

    let mut failures = 0;
    for file in &files {
        match inspect_file(file) {
            Ok(summary) => println!("{}", summary),
            Err(e) => {
                failures += 1;
                eprintln!("  {} {} - {}", "✗".red(), file.display(), format!("{:#}", e).red());
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} files could not be read", failures, files.len()));
    }
    Ok(())
}

fn find_project_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("chroma") | Some("json")
            ) && !path.ends_with(crate::config::DEFAULT_CONFIG_NAME)
        })
        .collect()
}

fn inspect_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let kind = ProjectFileKind::detect(name, &bytes);
    let contents = read_project(name, None, &bytes)?;
    Ok(summarize(path, kind, &contents))
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

pub fn summarize(path: &Path, kind: ProjectFileKind, contents: &ArchiveContents) -> String {
    let document = &contents.document;
    let mut out = Vec::new();

    let format = match kind {
        ProjectFileKind::Archive => "archive",
        ProjectFileKind::Legacy => "legacy json",
        ProjectFileKind::Image => "image",
        ProjectFileKind::Unknown => "unknown",
    };
    out.push(format!(
        "📦 {} ({})",
        path.display().to_string().bright_white().bold(),
        format
    ));
    out.push(format!("  Name:      {}", document.name));

    for stage in ShaderStage::ALL {
        let lines = chroma_common::line_count(document.shader(stage));
        out.push(format!("  {:<10} {} lines", format!("{}:", stage), lines));
    }

    out.push(format!("  Sections:  {}", document.sections.len()));
    for section in &document.sections {
        out.push(format!("    - {}", section.title));
    }

    if !document.uniforms.is_empty() {
        out.push("  Uniforms:".to_string());
        for (name, value) in &document.uniforms {
            out.push(format!("    {} {}", value.glsl_type().dimmed(), name));
        }
    }

    let bound: Vec<_> = document.textures.iter().collect();
    if !bound.is_empty() {
        out.push("  Textures:".to_string());
        for (channel, reference) in bound {
            out.push(format!("    {} → {}", channel, reference));
        }
    }

    if !contents.records.is_empty() {
        out.push("  Assets:".to_string());
        for record in &contents.records {
            out.push(format!(
                "    {}  {}  {}",
                record.path.as_deref().unwrap_or(record.id.as_str()),
                record.mime.dimmed(),
                format_size(record.payload.len())
            ));
        }
    }

    for missing in &contents.report.missing {
        out.push(format!("  {} missing {}", "⚠️".yellow(), missing));
    }

    out.join("\n")
}
