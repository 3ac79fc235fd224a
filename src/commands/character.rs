use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::Controller;

#[derive(Args)]
pub struct NewArgs {
    /// Display name (defaults to "Character N")
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Character id or name
    pub character: String,
    pub name: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Character id or name
    pub character: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Character id or name
    pub character: String,
}

#[derive(Args)]
pub struct DnaArgs {
    /// Character id or name
    pub character: String,
    /// Read DNA from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

fn select(controller: &mut Controller, query: &str) -> Result<()> {
    controller
        .select_by_query(query)
        .with_context(|| format!("failed to select character {query:?}"))?;
    Ok(())
}

pub fn new(args: &NewArgs, controller: &mut Controller) -> Result<()> {
    let character = controller
        .new_character(args.name.as_deref())
        .context("failed to create character")?;
    println!("Created {} ({})", character.name, character.id);
    Ok(())
}

pub fn rename(args: &RenameArgs, controller: &mut Controller) -> Result<()> {
    select(controller, &args.character)?;
    controller
        .rename_character(&args.name)
        .context("failed to rename character")?;
    println!("Renamed to {}", args.name.trim());
    Ok(())
}

pub fn delete(args: &DeleteArgs, controller: &mut Controller) -> Result<()> {
    select(controller, &args.character)?;
    let removed = controller
        .delete_character()
        .context("failed to delete character")?;
    println!("Deleted {} ({})", removed.name, removed.id);
    Ok(())
}

pub fn show(args: &ShowArgs, controller: &mut Controller) -> Result<()> {
    select(controller, &args.character)?;
    let Some(character) = controller.current_character() else {
        return Ok(());
    };

    println!("Id:        {}", character.id);
    println!("Name:      {}", character.name);
    match &character.image {
        Some(path) => println!("Portrait:  {}", path.display()),
        None => println!("Portrait:  (none)"),
    }
    println!("Created:   {}", character.created);
    println!("Modified:  {}", character.modified);
    println!("DNA:");
    println!("{}", character.dna);
    Ok(())
}

pub fn dna(args: &DnaArgs, controller: &mut Controller) -> Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read DNA from stdin")?;
            text
        }
    };

    select(controller, &args.character)?;
    controller.set_dna(&text).context("failed to update DNA")?;
    if controller.is_dirty() {
        controller.save().context("failed to save library")?;
        println!("DNA updated");
    } else {
        println!("DNA unchanged");
    }
    Ok(())
}
