//! Character galleries and the controller that owns application state.

pub mod controller;
pub mod model;

use thiserror::Error;

use crate::crop::CropError;
use crate::state::StateError;
use crate::storage::StorageError;

pub use controller::GalleryController;
pub use model::{Character, Gallery, Library, DEFAULT_GALLERY_NAME};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("no character is selected")]
    NoSelection,
    #[error("character index {index} is out of range ({len} characters)")]
    CharacterIndexOutOfRange { index: usize, len: usize },
    #[error("no character matches {query:?}")]
    UnknownCharacter { query: String },
    #[error("no gallery named {name:?}")]
    UnknownGallery { name: String },
    #[error("a gallery named {name:?} already exists")]
    DuplicateGallery { name: String },
    #[error("gallery name must not be empty")]
    EmptyGalleryName,
    #[error("the last gallery can not be deleted")]
    LastGallery,
    #[error("a crop session is already open")]
    CropSessionOpen,
    #[error("no crop session is open")]
    NoCropSession,
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Crop(#[from] CropError),
}

pub type GalleryResult<T> = std::result::Result<T, GalleryError>;
