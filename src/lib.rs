pub mod config;
pub mod crop;
pub mod error;
pub mod gallery;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod state;
pub mod storage;
pub mod viewport;
pub use error::{AppError, AppResult};

use crate::crop::CropSettings;
use crate::gallery::GalleryController;
use crate::storage::FileGalleryStore;

/// Opens the gallery stored under `data_dir`, used by the CLI and other front ends.
pub fn open_gallery(
    data_dir: &std::path::Path,
    crop_settings: CropSettings,
) -> AppResult<GalleryController<FileGalleryStore>> {
    tracing::info!(data_dir = %data_dir.display(), "opening gallery");
    let store = FileGalleryStore::open(data_dir)?;
    Ok(GalleryController::load(store, crop_settings)?)
}
