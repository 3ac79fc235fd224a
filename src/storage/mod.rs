use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use crate::gallery::model::{is_file_safe_id, Library, LibraryFile};

const LIBRARY_FILE_NAME: &str = "characters.json";
const IMAGES_SUBDIR: &str = "images";
const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("character id is empty")]
    MissingCharacterId,
    #[error("character id {id:?} cannot be used as a file name")]
    InvalidCharacterId { id: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed library file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode portrait {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub trait GalleryStorage {
    fn load_library(&self) -> StorageResult<Library>;
    fn save_library(&self, library: &Library) -> StorageResult<()>;
    fn portrait_path(&self, character_id: &str) -> StorageResult<PathBuf>;
    fn write_portrait(&self, character_id: &str, portrait: &RgbaImage) -> StorageResult<PathBuf>;
    fn remove_portrait(&self, path: &Path) -> StorageResult<()>;
}

/// Keeps the library as `characters.json` and portraits as `images/<id>.png`
/// under one data directory.
#[derive(Debug, Clone)]
pub struct FileGalleryStore {
    data_dir: PathBuf,
    images_dir: PathBuf,
    library_file: PathBuf,
}

impl FileGalleryStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        let images_dir = data_dir.join(IMAGES_SUBDIR);
        fs::create_dir_all(&images_dir).map_err(io_error(&images_dir))?;
        let library_file = data_dir.join(LIBRARY_FILE_NAME);
        tracing::debug!(data_dir = %data_dir.display(), "opened gallery store");
        Ok(Self {
            data_dir,
            images_dir,
            library_file,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn library_file(&self) -> &Path {
        &self.library_file
    }

    fn validate_character_id(character_id: &str) -> StorageResult<()> {
        if character_id.trim().is_empty() {
            return Err(StorageError::MissingCharacterId);
        }
        if !is_file_safe_id(character_id) {
            return Err(StorageError::InvalidCharacterId {
                id: character_id.to_string(),
            });
        }
        Ok(())
    }
}

impl GalleryStorage for FileGalleryStore {
    fn load_library(&self) -> StorageResult<Library> {
        let contents = match fs::read_to_string(&self.library_file) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.library_file.display(), "no library file yet; starting empty");
                return Ok(Library::default());
            }
            Err(err) => return Err(io_error(&self.library_file)(err)),
        };

        let file: LibraryFile =
            serde_json::from_str(&contents).map_err(|source| StorageError::Json {
                path: self.library_file.clone(),
                source,
            })?;
        Ok(Library::from(file))
    }

    fn save_library(&self, library: &Library) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(library).map_err(|source| StorageError::Json {
            path: self.library_file.clone(),
            source,
        })?;

        let temp = self.library_file.with_extension(TEMP_SUFFIX);
        fs::write(&temp, json).map_err(io_error(&temp))?;
        fs::rename(&temp, &self.library_file).map_err(io_error(&self.library_file))?;
        tracing::info!(
            path = %self.library_file.display(),
            galleries = library.galleries.len(),
            "library saved"
        );
        Ok(())
    }

    fn portrait_path(&self, character_id: &str) -> StorageResult<PathBuf> {
        Self::validate_character_id(character_id)?;
        Ok(self.images_dir.join(format!("{character_id}.png")))
    }

    fn write_portrait(&self, character_id: &str, portrait: &RgbaImage) -> StorageResult<PathBuf> {
        let path = self.portrait_path(character_id)?;
        portrait
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| StorageError::Image {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), "portrait written");
        Ok(path)
    }

    fn remove_portrait(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "portrait already missing");
                Ok(())
            }
            Err(err) => Err(io_error(path)(err)),
        }
    }
}
