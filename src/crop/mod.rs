//! The modal "adjust image position" session.
//!
//! A [`CropSession`] owns the decoded source image and a [`ViewportMapper`]
//! for as long as the dialog is open. Pointer and scroll events move the
//! image beneath the fixed crop window; [`CropSession::confirm`] produces the
//! square portrait and [`CropSession::cancel`] drops everything.

mod image_processing;

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, RgbaImage};
use thiserror::Error;

use crate::geometry::{CropRect, PreviewPoint};
use crate::input::{Gesture, PointerTracker};
use crate::viewport::{ViewportError, ViewportMapper, ZoomAnchor, ZoomDirection};

pub const DEFAULT_PREVIEW_SIZE: u32 = 500;
pub const DEFAULT_CROP_SIZE: u32 = 300;
pub const DEFAULT_PORTRAIT_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

pub type CropResult<T> = std::result::Result<T, CropError>;

/// Canvas metrics supplied by the caller's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSettings {
    pub preview_size: u32,
    pub crop_size: u32,
    pub portrait_size: u32,
    pub zoom_anchor: ZoomAnchor,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            preview_size: DEFAULT_PREVIEW_SIZE,
            crop_size: DEFAULT_CROP_SIZE,
            portrait_size: DEFAULT_PORTRAIT_SIZE,
            zoom_anchor: ZoomAnchor::Canvas,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CropOutcome {
    pub rect: CropRect,
    pub portrait: RgbaImage,
}

#[derive(Debug)]
pub struct CropSession {
    source: DynamicImage,
    source_path: Option<PathBuf>,
    viewport: ViewportMapper,
    pointer: PointerTracker,
    settings: CropSettings,
}

impl CropSession {
    pub fn open(source: DynamicImage, settings: CropSettings) -> CropResult<Self> {
        let (width, height) = source.dimensions();
        let viewport = ViewportMapper::initialize(
            width,
            height,
            f64::from(settings.preview_size),
            f64::from(settings.crop_size),
        )?
        .with_zoom_anchor(settings.zoom_anchor);

        tracing::debug!(width, height, ?settings, "crop session opened");
        Ok(Self {
            source,
            source_path: None,
            viewport,
            pointer: PointerTracker::new(),
            settings,
        })
    }

    pub fn open_path(path: &Path, settings: CropSettings) -> CropResult<Self> {
        let source = image::open(path).map_err(|err| CropError::Decode {
            path: path.to_path_buf(),
            source: err,
        })?;
        let mut session = Self::open(source, settings)?;
        session.source_path = Some(path.to_path_buf());
        Ok(session)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub const fn settings(&self) -> CropSettings {
        self.settings
    }

    pub const fn viewport(&self) -> &ViewportMapper {
        &self.viewport
    }

    pub fn pointer_pressed(&mut self, x: f64, y: f64) {
        self.pointer.press(PreviewPoint::new(x, y));
    }

    pub fn pointer_dragged(&mut self, x: f64, y: f64) {
        if let Some((dx, dy)) = self.pointer.drag(PreviewPoint::new(x, y)) {
            self.viewport.pan(dx, dy);
        }
    }

    pub fn pointer_released(&mut self) {
        self.pointer.release();
    }

    pub fn scrolled(&mut self, direction: ZoomDirection, anchor: Option<PreviewPoint>) -> f64 {
        self.viewport.zoom(direction, anchor)
    }

    pub fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Pan { dx, dy } => self.viewport.pan(dx, dy),
            Gesture::Zoom { direction, anchor } => {
                self.viewport.zoom(direction, anchor);
            }
        }
    }

    /// The rectangle that would be kept if the session were confirmed now.
    pub fn current_rect(&self) -> CropRect {
        self.viewport.compute_crop_result()
    }

    pub fn render_preview(&self) -> RgbaImage {
        image_processing::render_preview(&self.source, &self.viewport)
    }

    /// Crops the current rectangle without ending the session.
    pub fn render_outcome(&self) -> CropOutcome {
        let rect = self.viewport.compute_crop_result();
        let portrait =
            image_processing::crop_to_portrait(&self.source, rect, self.settings.portrait_size);
        CropOutcome { rect, portrait }
    }

    pub fn confirm(self) -> CropOutcome {
        let outcome = self.render_outcome();
        tracing::info!(rect = %outcome.rect, size = self.settings.portrait_size, "crop confirmed");
        outcome
    }

    pub fn cancel(self) {
        tracing::debug!(source = ?self.source_path, "crop session cancelled");
        self.viewport.cancel();
    }
}
