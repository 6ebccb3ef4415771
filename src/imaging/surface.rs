//! Owned offscreen bitmap with the draw primitives the tools need.
//!
//! A [`RasterSurface`] has a fixed size for its whole life. A different
//! size means a new surface, and allocation is checked against
//! [`SurfaceLimits`] before any pixel memory is reserved.
//!
//! Edges of shapes and glyphs are anti-aliased by 4×4 supersampling: each
//! pixel's coverage is the fraction of 16 sub-sample points that fall inside.
//! Compositing is plain source-over on straight (non-premultiplied) RGBA.

use super::calculations::{TargetDimensions, calculate_cover_crop};
use super::error::PipelineError;
use super::params::{Color, Shape, SurfaceLimits};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Sub-samples per axis for coverage estimation.
const SUBSAMPLES: u32 = 4;

/// Glyph cell size of the bitmap font.
const GLYPH_CELLS: usize = 8;

/// Most characters drawn by [`RasterSurface::draw_centered_text`].
pub const MAX_TEXT_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    /// Allocate a fully transparent surface.
    pub fn new(width: u32, height: u32, limits: &SurfaceLimits) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid(format!(
                "surface dimensions {width}x{height} must both be positive"
            )));
        }
        let pixels = width as u64 * height as u64;
        if width > limits.max_side || height > limits.max_side {
            return Err(PipelineError::ResourceExhausted {
                width,
                height,
                limit: format!("{}px per side", limits.max_side),
            });
        }
        if pixels > limits.max_pixels {
            return Err(PipelineError::ResourceExhausted {
                width,
                height,
                limit: format!("{} pixels", limits.max_pixels),
            });
        }
        tracing::trace!(width, height, "allocating raster surface");
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn for_target(
        target: TargetDimensions,
        limits: &SurfaceLimits,
    ) -> Result<Self, PipelineError> {
        Self::new(target.width, target.height, limits)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
        Color { r, g, b, a }
    }

    /// Fill the area inside `shape` with `color`.
    pub fn fill_shape(&mut self, shape: Shape, color: Color) {
        let (w, h) = self.dimensions();
        let src = color.to_rgba();
        for y in 0..h {
            for x in 0..w {
                let coverage = shape_coverage(shape, w, h, x, y);
                if coverage > 0.0 {
                    blend_over(self.pixels.get_pixel_mut(x, y), src, coverage);
                }
            }
        }
    }

    /// Draw `image` stretched to exactly the surface size.
    pub fn draw_image_scaled(&mut self, image: &DynamicImage) {
        let (w, h) = self.dimensions();
        let resized = image::imageops::resize(&image.to_rgba8(), w, h, FilterType::Lanczos3);
        image::imageops::overlay(&mut self.pixels, &resized, 0, 0);
    }

    /// Draw `image` cover-fit: center-cropped to the surface ratio, scaled to
    /// fill, clipped to `clip`.
    ///
    /// The crop happens before scaling, so the only new buffer is surface-sized.
    pub fn draw_image_cover(&mut self, image: &DynamicImage, clip: Shape) {
        let (w, h) = self.dimensions();
        let (cx, cy, cw, ch) = calculate_cover_crop((image.width(), image.height()), (w, h));
        let cropped = image.crop_imm(cx, cy, cw, ch).to_rgba8();
        let filled = image::imageops::resize(&cropped, w, h, FilterType::Lanczos3);

        for y in 0..h {
            for x in 0..w {
                let coverage = shape_coverage(clip, w, h, x, y);
                if coverage > 0.0 {
                    let src = *filled.get_pixel(x, y);
                    blend_over(self.pixels.get_pixel_mut(x, y), src, coverage);
                }
            }
        }
    }

    /// Draw up to [`MAX_TEXT_CHARS`] uppercased characters centered on the surface.
    ///
    /// `glyph_height` is the rendered cell height in pixels; the 8×8 bitmap
    /// font is scaled nearest-neighbour. Characters without a glyph render as
    /// `?`. Blank text draws nothing.
    pub fn draw_centered_text(&mut self, text: &str, glyph_height: f32, color: Color, clip: Shape) {
        let glyphs: Vec<[u8; 8]> = initials(text).chars().map(glyph_for).collect();
        if glyphs.is_empty() || !glyph_height.is_finite() || glyph_height <= 0.0 {
            return;
        }

        let (w, h) = self.dimensions();
        let scale = glyph_height / GLYPH_CELLS as f32;
        let text_w = glyphs.len() as f32 * glyph_height;
        let origin_x = (w as f32 - text_w) / 2.0;
        let origin_y = (h as f32 - glyph_height) / 2.0;

        let inside = |sx: f32, sy: f32| -> bool {
            let gx = (sx - origin_x) / scale;
            let gy = (sy - origin_y) / scale;
            if gx < 0.0 || gy < 0.0 {
                return false;
            }
            let (gx, gy) = (gx as usize, gy as usize);
            let index = gx / GLYPH_CELLS;
            if index >= glyphs.len() || gy >= GLYPH_CELLS {
                return false;
            }
            (glyphs[index][gy] >> (gx % GLYPH_CELLS)) & 1 == 1
        };

        // Only visit pixels that can intersect the text block.
        let x_start = origin_x.floor().max(0.0) as u32;
        let y_start = origin_y.floor().max(0.0) as u32;
        let x_end = ((origin_x + text_w).ceil().max(0.0) as u32).min(w);
        let y_end = ((origin_y + glyph_height).ceil().max(0.0) as u32).min(h);
        let src = color.to_rgba();

        for y in y_start..y_end {
            for x in x_start..x_end {
                let coverage = supersample(x, y, &inside) * shape_coverage(clip, w, h, x, y);
                if coverage > 0.0 {
                    blend_over(self.pixels.get_pixel_mut(x, y), src, coverage);
                }
            }
        }
    }

    /// Copy of the pixels composited over an opaque background.
    pub fn flattened(&self, background: Color) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(self.width(), self.height(), background.to_rgba());
        image::imageops::overlay(&mut out, &self.pixels, 0, 0);
        out
    }
}

/// The first [`MAX_TEXT_CHARS`] characters of `text`, trimmed and uppercased.
pub fn initials(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_uppercase)
        .take(MAX_TEXT_CHARS)
        .collect()
}

fn glyph_for(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Fraction of the pixel at `(x, y)` covered by `inside`, in `[0, 1]`.
fn supersample(x: u32, y: u32, inside: impl Fn(f32, f32) -> bool) -> f32 {
    let step = 1.0 / SUBSAMPLES as f32;
    let mut hits = 0u32;
    for sy in 0..SUBSAMPLES {
        for sx in 0..SUBSAMPLES {
            let px = x as f32 + (sx as f32 + 0.5) * step;
            let py = y as f32 + (sy as f32 + 0.5) * step;
            if inside(px, py) {
                hits += 1;
            }
        }
    }
    hits as f32 / (SUBSAMPLES * SUBSAMPLES) as f32
}

/// Coverage of pixel `(x, y)` by `shape` drawn over a `w`×`h` surface.
///
/// Rounded corners use radius `min(w, h) / 10`; the circle is inscribed and
/// centered.
fn shape_coverage(shape: Shape, w: u32, h: u32, x: u32, y: u32) -> f32 {
    let (wf, hf) = (w as f32, h as f32);
    let short = wf.min(hf);
    match shape {
        Shape::Square => 1.0,
        Shape::Circle => {
            let (cx, cy, r) = (wf / 2.0, hf / 2.0, short / 2.0);
            supersample(x, y, |px, py| {
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy <= r * r
            })
        }
        Shape::Rounded => {
            let r = short / 10.0;
            // Cheap exit for pixels well clear of the corners.
            let (xf, yf) = (x as f32, y as f32);
            if xf >= r && xf + 1.0 <= wf - r || yf >= r && yf + 1.0 <= hf - r {
                return 1.0;
            }
            supersample(x, y, |px, py| {
                let nx = px.clamp(r, wf - r);
                let ny = py.clamp(r, hf - r);
                let (dx, dy) = (px - nx, py - ny);
                dx * dx + dy * dy <= r * r
            })
        }
    }
}

/// Source-over composite of `src`, scaled by `coverage`, onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}
