//! Mapping between the scaled preview canvas and source-image pixels.
//!
//! The mapper keeps the scale and pan offset of an image displayed beneath a
//! fixed, canvas-centred crop window, and turns that state into a crop
//! rectangle in source pixels. It is pure state: nothing here touches pixels
//! or widgets, so every gesture can be replayed headlessly.

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{CropRect, ImageBounds, PreviewPoint};

pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;
pub const MAX_SCALE: f64 = 10.0;
/// Lower zoom bound as a fraction of the fit scale.
pub const MIN_SCALE_FIT_RATIO: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("source image has no area: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("invalid canvas metrics: preview={preview_size} crop={crop_size}")]
    InvalidCanvas { preview_size: f64, crop_size: f64 },
}

pub type ViewportResult<T> = std::result::Result<T, ViewportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    pub const fn factor(self) -> f64 {
        match self {
            Self::In => ZOOM_IN_FACTOR,
            Self::Out => ZOOM_OUT_FACTOR,
        }
    }

    /// Scroll wheels report negative vertical deltas when scrolling up.
    pub fn from_scroll_delta(delta_y: f64) -> Option<Self> {
        if delta_y < 0.0 {
            Some(Self::In)
        } else if delta_y > 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// How a zoom step treats the pan offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomAnchor {
    /// Offset is carried over unchanged; the image scales about its own
    /// displayed centre and the gesture position is ignored.
    #[default]
    Canvas,
    /// The source point under the gesture position stays put on screen.
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportMapper {
    source: ImageBounds,
    preview_size: f64,
    crop_size: f64,
    fit_scale: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    zoom_anchor: ZoomAnchor,
}

impl ViewportMapper {
    pub fn initialize(
        source_width: u32,
        source_height: u32,
        preview_size: f64,
        crop_size: f64,
    ) -> ViewportResult<Self> {
        let source = ImageBounds::new(source_width, source_height);
        if source.is_empty() {
            return Err(ViewportError::EmptyImage {
                width: source_width,
                height: source_height,
            });
        }
        if !(preview_size.is_finite() && preview_size > 0.0)
            || !(crop_size.is_finite() && crop_size > 0.0)
        {
            return Err(ViewportError::InvalidCanvas {
                preview_size,
                crop_size,
            });
        }

        let fit_scale = (preview_size / f64::from(source_width))
            .min(preview_size / f64::from(source_height));
        tracing::debug!(
            source_width,
            source_height,
            preview_size,
            crop_size,
            fit_scale,
            "initialize viewport"
        );

        Ok(Self {
            source,
            preview_size,
            crop_size,
            fit_scale,
            scale: fit_scale,
            offset_x: 0.0,
            offset_y: 0.0,
            zoom_anchor: ZoomAnchor::default(),
        })
    }

    pub fn with_zoom_anchor(mut self, zoom_anchor: ZoomAnchor) -> Self {
        self.zoom_anchor = zoom_anchor;
        self
    }

    pub const fn source(&self) -> ImageBounds {
        self.source
    }

    pub const fn preview_size(&self) -> f64 {
        self.preview_size
    }

    pub const fn crop_size(&self) -> f64 {
        self.crop_size
    }

    pub const fn fit_scale(&self) -> f64 {
        self.fit_scale
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    pub const fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub const fn zoom_anchor(&self) -> ZoomAnchor {
        self.zoom_anchor
    }

    pub fn min_scale(&self) -> f64 {
        self.fit_scale * MIN_SCALE_FIT_RATIO
    }

    /// Images small enough to fit above `MAX_SCALE` keep their fit scale as the ceiling.
    pub fn max_scale(&self) -> f64 {
        MAX_SCALE.max(self.fit_scale)
    }

    pub fn canvas_center(&self) -> PreviewPoint {
        let center = self.preview_size / 2.0;
        PreviewPoint::new(center, center)
    }

    /// Size of the image as currently drawn on the canvas.
    pub fn displayed_size(&self) -> (f64, f64) {
        (
            f64::from(self.source.width) * self.scale,
            f64::from(self.source.height) * self.scale,
        )
    }

    /// Canvas position of the displayed image's top-left corner.
    pub fn displayed_origin(&self) -> PreviewPoint {
        let center = self.canvas_center();
        let (width, height) = self.displayed_size();
        PreviewPoint::new(
            center.x + self.offset_x - width / 2.0,
            center.y + self.offset_y - height / 2.0,
        )
    }

    pub fn pan(&mut self, delta_x: f64, delta_y: f64) {
        if delta_x == 0.0 && delta_y == 0.0 {
            return;
        }
        self.offset_x += delta_x;
        self.offset_y += delta_y;
        tracing::trace!(
            offset_x = self.offset_x,
            offset_y = self.offset_y,
            "pan viewport"
        );
    }

    /// Applies one zoom step and returns the new scale.
    pub fn zoom(&mut self, direction: ZoomDirection, anchor: Option<PreviewPoint>) -> f64 {
        let previous = self.scale;
        self.scale = (previous * direction.factor()).clamp(self.min_scale(), self.max_scale());

        if self.zoom_anchor == ZoomAnchor::Pointer {
            let ratio = self.scale / previous;
            let center = self.canvas_center();
            let anchor = anchor.unwrap_or(center);
            let anchor_x = anchor.x - center.x;
            let anchor_y = anchor.y - center.y;
            self.offset_x = anchor_x - (anchor_x - self.offset_x) * ratio;
            self.offset_y = anchor_y - (anchor_y - self.offset_y) * ratio;
        }

        tracing::debug!(
            direction = direction.label(),
            previous,
            scale = self.scale,
            "zoom viewport"
        );
        self.scale
    }

    pub fn compute_crop_result(&self) -> CropRect {
        let center = self.canvas_center();
        let image_center_x = center.x + self.offset_x;
        let image_center_y = center.y + self.offset_y;
        let source_offset_x = (center.x - image_center_x) / self.scale;
        let source_offset_y = (center.y - image_center_y) / self.scale;

        let source_center_x = f64::from(self.source.width) / 2.0 + source_offset_x;
        let source_center_y = f64::from(self.source.height) / 2.0 + source_offset_y;
        let half = self.crop_size / self.scale / 2.0;

        let (left, right) = clamp_span(
            source_center_x - half,
            source_center_x + half,
            self.source.width,
        );
        let (top, bottom) = clamp_span(
            source_center_y - half,
            source_center_y + half,
            self.source.height,
        );
        CropRect::new(left, top, right, bottom)
    }

    pub fn cancel(self) {
        tracing::debug!(scale = self.scale, "viewport discarded");
    }
}

/// Clamps `[start, end)` into `[0, limit]`, truncating toward zero and
/// keeping at least one pixel.
fn clamp_span(start: f64, end: f64, limit: u32) -> (u32, u32) {
    let limit_f = f64::from(limit);
    let start = start.clamp(0.0, limit_f) as u32;
    let end = end.clamp(0.0, limit_f) as u32;
    let start = start.min(limit.saturating_sub(1));
    let end = end.max(start + 1).min(limit);
    (start, end)
}
