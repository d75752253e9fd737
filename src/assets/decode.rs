use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Size;
use crate::foundation::error::{CodelayerError, CodelayerResult};

/// Decoded raster in premultiplied RGBA8, immutable once built.
///
/// Cloning is cheap: pixels and the prepared paint are shared.
#[derive(Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.rgba8_premul.len())
            .finish()
    }
}

impl Bitmap {
    /// Build from row-major premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CodelayerResult<Self> {
        if width == 0 || height == 0 {
            return Err(CodelayerError::decode("bitmap must have non-zero dimensions"));
        }
        let pixmap = pixmap_from_premul_bytes(&rgba8_premul, width, height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            paint,
        })
    }

    /// Build from row-major straight-alpha RGBA8 bytes.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> CodelayerResult<Self> {
        premultiply_rgba8_in_place(&mut rgba8);
        Self::from_premul_rgba8(width, height, rgba8)
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `height / width` of the decoded image.
    pub fn natural_aspect(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }

    /// Premultiplied pixel bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        self.paint.clone()
    }
}

/// Parsed SVG code image, kept alongside its markup for vector export.
#[derive(Clone)]
pub struct SvgImage {
    tree: Arc<usvg::Tree>,
    markup: Arc<str>,
}

impl std::fmt::Debug for SvgImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.tree.size();
        f.debug_struct("SvgImage")
            .field("width", &size.width())
            .field("height", &size.height())
            .field("markup_len", &self.markup.len())
            .finish()
    }
}

impl SvgImage {
    /// Original SVG markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Document size in user units.
    pub fn size(&self) -> Size {
        let size = self.tree.size();
        Size::new(f64::from(size.width()), f64::from(size.height()))
    }

    /// Rasterize the whole document into a `width x height` bitmap.
    pub fn rasterize(&self, width: u32, height: u32) -> CodelayerResult<Bitmap> {
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| CodelayerError::render("failed to allocate svg pixmap"))?;

        let sx = (width as f32) / self.tree.size().width();
        let sy = (height as f32) / self.tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

        resvg::render(&self.tree, xform, &mut pixmap.as_mut());
        Bitmap::from_premul_rgba8(width, height, pixmap.data().to_vec())
    }
}

/// The code image the overlays are composed onto, as produced by the external encoder.
#[derive(Clone, Debug)]
pub enum BaseImage {
    /// Raster output; scaled to fill the destination.
    Raster(Bitmap),
    /// Vector output; rasterized at the destination size.
    Svg(SvgImage),
}

impl BaseImage {
    /// Decode encoder output; XML or `<svg` markup becomes a vector base, anything else a raster.
    pub fn from_bytes(bytes: &[u8]) -> CodelayerResult<Self> {
        if looks_like_svg(bytes) {
            Ok(Self::Svg(parse_svg(bytes)?))
        } else {
            Ok(Self::Raster(decode_image(bytes)?))
        }
    }

    /// Intrinsic size: pixel dimensions for rasters, user units for SVG.
    pub fn natural_size(&self) -> Size {
        match self {
            Self::Raster(b) => Size::new(f64::from(b.width()), f64::from(b.height())),
            Self::Svg(svg) => svg.size(),
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = bytes[..bytes.len().min(256)].trim_ascii_start();
    head.starts_with(b"<?xml") || head.starts_with(b"<svg")
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CodelayerResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| CodelayerError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Bitmap::from_straight_rgba8(width, height, rgba.into_raw())
}

/// Parse SVG bytes into a prepared `usvg` tree.
pub fn parse_svg(bytes: &[u8]) -> CodelayerResult<SvgImage> {
    let markup = std::str::from_utf8(bytes)
        .map_err(|e| CodelayerError::decode(format!("svg is not utf-8: {e}")))?;
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| CodelayerError::decode(format!("parse svg tree: {e}")))?;
    Ok(SvgImage {
        tree: Arc::new(tree),
        markup: Arc::from(markup),
    })
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CodelayerResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CodelayerError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CodelayerError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(CodelayerError::render("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
