use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::geometry::CropRect;
use crate::viewport::ViewportMapper;

const PREVIEW_BACKGROUND: Rgba<u8> = Rgba([0x1e, 0x1e, 0x1e, 0xff]);
const CROP_OUTLINE_COLOR: Rgba<u8> = Rgba([0xff, 0x00, 0x00, 0xff]);
const CROP_OUTLINE_WIDTH: u32 = 3;

/// Cuts `rect` out of `source` and resamples it to a `size`×`size` square.
pub(crate) fn crop_to_portrait(source: &DynamicImage, rect: CropRect, size: u32) -> RgbaImage {
    let region = source.crop_imm(rect.left, rect.top, rect.width(), rect.height());
    let size = size.max(1);
    imageops::resize(
        &region.to_rgba8(),
        size,
        size,
        imageops::FilterType::Lanczos3,
    )
}

/// Source-pixel span visible on a canvas axis of `canvas` preview pixels.
fn visible_source_span(origin: f64, scale: f64, source_len: u32, canvas: f64) -> Option<(u32, u32)> {
    let source_len_f = f64::from(source_len);
    let start = ((0.0 - origin) / scale).floor().clamp(0.0, source_len_f);
    let end = ((canvas - origin) / scale).ceil().clamp(0.0, source_len_f);
    if end <= start {
        return None;
    }
    Some((start as u32, end as u32))
}

/// Draws the canvas as the crop dialog shows it: the scaled image at its
/// current offset with the fixed crop window outlined on top.
pub(crate) fn render_preview(source: &DynamicImage, viewport: &ViewportMapper) -> RgbaImage {
    let canvas_size = viewport.preview_size().round().max(1.0) as u32;
    let canvas_len = f64::from(canvas_size);
    let mut canvas = RgbaImage::from_pixel(canvas_size, canvas_size, PREVIEW_BACKGROUND);

    let scale = viewport.scale();
    let origin = viewport.displayed_origin();
    let bounds = viewport.source();
    let spans = visible_source_span(origin.x, scale, bounds.width, canvas_len).zip(
        visible_source_span(origin.y, scale, bounds.height, canvas_len),
    );

    if let Some(((left, right), (top, bottom))) = spans {
        let region = source.crop_imm(left, top, right - left, bottom - top).to_rgba8();
        let width = ((f64::from(right - left) * scale).round() as u32).max(1);
        let height = ((f64::from(bottom - top) * scale).round() as u32).max(1);
        let scaled = imageops::resize(&region, width, height, imageops::FilterType::Triangle);
        let x = (origin.x + f64::from(left) * scale).round() as i64;
        let y = (origin.y + f64::from(top) * scale).round() as i64;
        imageops::overlay(&mut canvas, &scaled, x, y);
    } else {
        tracing::debug!("image is entirely outside the preview canvas");
    }

    let crop_side = viewport.crop_size().round() as i64;
    let crop_origin = ((canvas_len - viewport.crop_size()) / 2.0).round() as i64;
    draw_outline(
        &mut canvas,
        crop_origin,
        crop_origin,
        crop_side,
        CROP_OUTLINE_WIDTH,
        CROP_OUTLINE_COLOR,
    );
    canvas
}

fn draw_outline(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    side: i64,
    thickness: u32,
    color: Rgba<u8>,
) {
    let width = i64::from(canvas.width());
    let height = i64::from(canvas.height());
    let mut put = |px: i64, py: i64| {
        if (0..width).contains(&px) && (0..height).contains(&py) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    };

    let thickness = i64::from(thickness);
    for band in 0..thickness {
        for step in 0..side {
            put(x + step, y + band);
            put(x + step, y + side - 1 - band);
            put(x + band, y + step);
            put(x + side - 1 - band, y + step);
        }
    }
}
