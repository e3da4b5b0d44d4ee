use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use chroma_markdown::{parse_image_reference, BasicConverter, MarkdownBridge};
use chroma_project::{DirectoryStorage, Project};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Legacy JSON project (or an archive to re-save)
    pub input: PathBuf,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Name of the written project (defaults to the project name)
    #[arg(short, long)]
    pub name: Option<String>,
}

pub async fn convert(args: ConvertArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;

    let input = PathBuf::from(cwd).join(&args.input);
    let (Some(dir), Some(file_name)) = (input.parent(), input.file_name().and_then(|n| n.to_str()))
    else {
        return Err(anyhow!("Not a file: {}", input.display()));
    };

    let bridge = MarkdownBridge::with_converter(BasicConverter, config.markdown.clone());
    let mut project = Project::with_bridge(bridge).with_extension(config.archive_extension.clone());

    let mut source = DirectoryStorage::new(dir);
    source.select(file_name);
    let report = project
        .load(&mut source)
        .await
        .with_context(|| format!("Failed to load {}", input.display()))?;

    for missing in &report.missing {
        println!("  {} missing asset {}", "⚠️".yellow(), missing);
    }

    let out_dir = config.resolve_out_dir(cwd, args.out_dir.as_deref());
    let name = match args.name {
        Some(name) => name,
        None => project.name()?.to_string(),
    };

    debug!(
        input = %input.display(),
        out_dir = %out_dir.display(),
        name = %name,
        legacy = report.legacy,
        "Converting project"
    );
    let mut target = DirectoryStorage::new(out_dir);
    let outcome = project.save(&name, &mut target).await?;

    for unresolved in &outcome.report.unresolved {
        println!("  {} {}", "⚠️".yellow(), unresolved_note(unresolved));
    }
    println!(
        "{} {} → {}",
        "✓".green(),
        args.input.display(),
        outcome.path.display()
    );

    Ok(())
}

/// Saving keeps text references as written and only clears texture slots
fn unresolved_note(reference: &str) -> String {
    match parse_image_reference(reference) {
        Some(_) => format!("no asset for {}, text reference kept as written", reference),
        None => format!("no asset for {}, texture slot cleared", reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_note_matches_save_behaviour() {
        assert_eq!(
            unresolved_note("image:abc123"),
            "no asset for image:abc123, text reference kept as written"
        );
        assert_eq!(
            unresolved_note("abc123"),
            "no asset for abc123, texture slot cleared"
        );
    }
}
