mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portrait_gallery::config::load_app_config;
use portrait_gallery::{logging, open_gallery};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portrait-gallery", about = "Character portrait gallery")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding characters.json and the images folder
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Gallery to operate on (defaults to the first one)
    #[arg(short, long, global = true)]
    gallery: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List galleries and the characters of the selected gallery
    List,
    /// Create, rename or delete galleries
    Gallery(commands::gallery::GalleryArgs),
    /// Add a character
    New(commands::character::NewArgs),
    /// Rename a character
    Rename(commands::character::RenameArgs),
    /// Delete a character and its portrait
    Delete(commands::character::DeleteArgs),
    /// Print a character's record
    Show(commands::character::ShowArgs),
    /// Replace a character's DNA text from a file or stdin
    Dna(commands::character::DnaArgs),
    /// Crop an image into a character's portrait
    Portrait(commands::portrait::PortraitArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    let config = load_app_config();
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.resolve_data_dir());
    let mut controller = open_gallery(&data_dir, config.crop_settings())
        .with_context(|| format!("failed to open gallery data in {}", data_dir.display()))?;

    if let Some(name) = cli.gallery.as_deref() {
        if !matches!(cli.command, Commands::Gallery(_)) {
            controller
                .select_gallery(name)
                .with_context(|| format!("failed to select gallery {name:?}"))?;
        }
    }

    match &cli.command {
        Commands::List => commands::gallery::list(&controller),
        Commands::Gallery(args) => commands::gallery::run(args, &mut controller),
        Commands::New(args) => commands::character::new(args, &mut controller),
        Commands::Rename(args) => commands::character::rename(args, &mut controller),
        Commands::Delete(args) => commands::character::delete(args, &mut controller),
        Commands::Show(args) => commands::character::show(args, &mut controller),
        Commands::Dna(args) => commands::character::dna(args, &mut controller),
        Commands::Portrait(args) => commands::portrait::run(args, &mut controller),
    }
}
