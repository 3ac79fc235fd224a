use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use portrait_gallery::input::Gesture;

use super::Controller;

#[derive(Args)]
pub struct PortraitArgs {
    /// Character id or name
    pub character: String,
    /// Source image to crop
    pub image: PathBuf,
    /// Gesture applied in order: pan:DX,DY or zoom:in|out[@X,Y]
    #[arg(short = 'G', long = "gesture", allow_hyphen_values = true)]
    pub gestures: Vec<Gesture>,
    /// Write the crop dialog canvas to this PNG after applying gestures
    #[arg(long)]
    pub preview_out: Option<PathBuf>,
    /// Print the crop rectangle without saving a portrait
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: &PortraitArgs, controller: &mut Controller) -> Result<()> {
    controller
        .select_by_query(&args.character)
        .with_context(|| format!("failed to select character {:?}", args.character))?;

    let session = controller
        .begin_portrait_from_path(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?;
    for gesture in &args.gestures {
        session.apply(*gesture);
    }

    let viewport = session.viewport();
    let (offset_x, offset_y) = viewport.offset();
    println!(
        "Scale:  {:.4} (fit {:.4}, range {:.4}..{:.4})",
        viewport.scale(),
        viewport.fit_scale(),
        viewport.min_scale(),
        viewport.max_scale()
    );
    println!("Offset: {offset_x:.1}, {offset_y:.1}");
    println!("Crop:   {}", session.current_rect());

    if let Some(path) = &args.preview_out {
        let frame = session.render_preview();
        if let Err(err) = frame.save(path) {
            controller.cancel_portrait()?;
            return Err(err).with_context(|| format!("failed to write {}", path.display()));
        }
        println!("Preview written to {}", path.display());
    }

    if args.dry_run {
        controller.cancel_portrait()?;
        return Ok(());
    }

    controller
        .confirm_portrait()
        .context("failed to save portrait")?;
    if let Some(path) = controller.current_character().and_then(|c| c.image.as_ref()) {
        println!("Portrait saved to {}", path.display());
    }
    Ok(())
}
