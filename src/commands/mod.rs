pub mod character;
pub mod gallery;
pub mod portrait;

use portrait_gallery::gallery::GalleryController;
use portrait_gallery::storage::FileGalleryStore;

pub type Controller = GalleryController<FileGalleryStore>;
