use crate::gallery::GalleryError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
