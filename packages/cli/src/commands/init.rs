use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use chroma_project::{DirectoryStorage, Project};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the starter project
    #[arg(default_value = "Brute")]
    pub name: String,

    /// Output directory (stored in a new config, overrides an existing one)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub async fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    println!("{}", "📝 Initializing Chroma workspace...".bright_blue().bold());

    let config = if config_path.exists() && !args.force {
        println!(
            "  {} {} already exists, keeping it",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        Config::load(cwd)?
    } else {
        let mut config = Config::default();
        if let Some(out_dir) = &args.out_dir {
            config.out_dir = out_dir.clone();
        }
        fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
        println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
        config
    };

    let out_dir = config.resolve_out_dir(cwd, args.out_dir.as_deref());
    let file_name = format!("{}.{}", args.name, config.archive_extension);
    if out_dir.join(&file_name).exists() && !args.force {
        println!(
            "  {} {} already exists",
            "⚠️".yellow(),
            file_name.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut project = Project::new().with_extension(config.archive_extension.clone());
    project.load_default()?;
    project.set_name(args.name.clone())?;

    let mut storage = DirectoryStorage::new(&out_dir);
    let outcome = project.save(&args.name, &mut storage).await?;
    println!("  {} Created {}", "✓".green(), outcome.path.display());

    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: chroma inspect {}", outcome.path.display());
    println!("  2. Check a shader: chroma check shader.frag --log driver.log");

    Ok(())
}
