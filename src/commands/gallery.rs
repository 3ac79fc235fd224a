use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::Controller;

#[derive(Args)]
pub struct GalleryArgs {
    #[command(subcommand)]
    pub action: GalleryAction,
}

#[derive(Subcommand)]
pub enum GalleryAction {
    /// Create an empty gallery
    Create { name: String },
    /// Rename a gallery
    Rename { old: String, new: String },
    /// Delete a gallery, its characters and their portraits
    Delete { name: String },
}

pub fn run(args: &GalleryArgs, controller: &mut Controller) -> Result<()> {
    match &args.action {
        GalleryAction::Create { name } => {
            controller
                .create_gallery(name)
                .with_context(|| format!("failed to create gallery {name:?}"))?;
            println!("Created gallery {:?}", controller.current_gallery().name);
        }
        GalleryAction::Rename { old, new } => {
            controller
                .rename_gallery(old, new)
                .with_context(|| format!("failed to rename gallery {old:?}"))?;
            println!("Renamed gallery {old:?} to {:?}", new.trim());
        }
        GalleryAction::Delete { name } => {
            controller
                .delete_gallery(name)
                .with_context(|| format!("failed to delete gallery {name:?}"))?;
            println!("Deleted gallery {name:?}");
        }
    }
    Ok(())
}

pub fn list(controller: &Controller) -> Result<()> {
    let current = &controller.current_gallery().name;
    for gallery in &controller.library().galleries {
        let marker = if &gallery.name == current { "*" } else { " " };
        println!("{marker} {} ({} characters)", gallery.name, gallery.characters.len());
    }

    println!();
    for (index, character) in controller.characters().iter().enumerate() {
        let portrait = if character.image.is_some() { "portrait" } else { "no portrait" };
        println!("{:>3}. {:<24} {}  [{portrait}]", index + 1, character.name, character.id);
    }
    Ok(())
}
