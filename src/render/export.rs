use std::io::Cursor;

use crate::assets::decode::BaseImage;
use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{CodelayerError, CodelayerResult};
use crate::render::cpu::Frame;

/// Encoded output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExportFormat {
    /// Lossless PNG with alpha.
    Png,
    /// JPEG flattened onto the background color.
    Jpeg {
        /// Encoder quality, 1..=100.
        quality: u8,
    },
    /// Uncompressed BMP with alpha.
    Bmp,
    /// The base SVG markup. Only valid while no overlays exist.
    Svg,
}

impl ExportFormat {
    /// True for formats produced by the vector encoder rather than the compositor.
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::Bmp => "bmp",
            Self::Svg => "svg",
        }
    }
}

/// Caller-chosen export target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportRequest {
    /// Output width in pixels; height follows the logical aspect ratio.
    pub target_width: u32,
    /// Output encoding.
    pub format: ExportFormat,
}

/// Export scale and pixel size for `logical` rendered `target_width` pixels wide.
pub fn export_geometry(
    logical: Size,
    target_width: u32,
    max_dim: u32,
) -> CodelayerResult<(f64, u32, u32)> {
    if target_width == 0 {
        return Err(CodelayerError::validation("export width must be > 0"));
    }
    if !(logical.width > 0.0 && logical.height > 0.0) {
        return Err(CodelayerError::validation("logical canvas size must be > 0"));
    }
    let scale = f64::from(target_width) / logical.width;
    let height = (logical.height * scale).round().max(1.0);
    if target_width > max_dim || height > f64::from(max_dim) {
        return Err(CodelayerError::render(format!(
            "export {target_width}x{height} exceeds the {max_dim}px limit"
        )));
    }
    Ok((scale, target_width, height as u32))
}

/// Vector export: the base SVG markup verbatim.
///
/// Overlays cannot be expressed by the vector encoder, so any overlay rejects the export.
pub fn export_vector(base: Option<&BaseImage>, overlay_count: usize) -> CodelayerResult<Vec<u8>> {
    if overlay_count > 0 {
        return Err(CodelayerError::export_rejected(format!(
            "svg export cannot include {overlay_count} overlay(s)"
        )));
    }
    match base {
        Some(BaseImage::Svg(svg)) => Ok(svg.markup().as_bytes().to_vec()),
        Some(BaseImage::Raster(_)) => Err(CodelayerError::export_rejected(
            "svg export needs a vector base image",
        )),
        None => Err(CodelayerError::export_rejected(
            "svg export needs a valid base image",
        )),
    }
}

/// Encode a composed frame as a raster format.
#[tracing::instrument(skip(frame), fields(width = frame.width, height = frame.height))]
pub fn encode_frame(
    frame: &Frame,
    format: ExportFormat,
    background: Rgba8,
) -> CodelayerResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ExportFormat::Png | ExportFormat::Bmp => {
            let img = frame.to_rgba_image()?;
            let fmt = if format == ExportFormat::Png {
                image::ImageFormat::Png
            } else {
                image::ImageFormat::Bmp
            };
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut buf), fmt)
                .map_err(|e| CodelayerError::render(format!("encode {}: {e}", format.extension())))?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb = flatten_onto(frame, background);
            let quality = quality.clamp(1, 100);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
                .encode(&rgb, frame.width, frame.height, image::ExtendedColorType::Rgb8)
                .map_err(|e| CodelayerError::render(format!("encode jpeg: {e}")))?;
        }
        ExportFormat::Svg => {
            return Err(CodelayerError::export_rejected(
                "svg is not a raster format",
            ));
        }
    }
    tracing::debug!(bytes = buf.len(), format = format.extension(), "encoded export");
    Ok(buf)
}

/// Composite premultiplied pixels over an opaque `background`, yielding packed RGB8.
pub(crate) fn flatten_onto(frame: &Frame, background: Rgba8) -> Vec<u8> {
    let bg = [background.r, background.g, background.b];
    let mut out = Vec::with_capacity(frame.data.len() / 4 * 3);
    for px in frame.data.chunks_exact(4) {
        let inv = 255 - u16::from(px[3]);
        for c in 0..3 {
            let v = u16::from(px[c]) + (u16::from(bg[c]) * inv + 127) / 255;
            out.push(v.min(255) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
