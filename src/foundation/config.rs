use crate::foundation::core::Rgba8;
use crate::foundation::error::{CodelayerError, CodelayerResult};

/// Tunables shared by hit testing, drag manipulation and the compositor.
///
/// A single handle radius and leader length apply to every code type so that what is drawn as a
/// handle is exactly what responds to the pointer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Radius of the resize and rotate handles, in logical units.
    pub handle_radius: f64,
    /// Distance from the top edge of a layer to the rotate handle center, in logical units.
    pub leader_length: f64,
    /// Minimum width/height of an image layer.
    pub min_extent: f64,
    /// Minimum font size of a text layer.
    pub min_font_size: f64,
    /// Font size given to freshly added text layers.
    pub default_font_size: f64,
    /// Width of a freshly added image layer as a fraction of the canvas width.
    pub default_image_width: f64,
    /// Stroke color of selection decorations.
    pub selection_color: Rgba8,
    /// Width of selection outlines, in logical units.
    pub selection_stroke_width: f64,
    /// Fill painted under the base image, and in its place when the base is invalid.
    pub background: Rgba8,
    /// Largest export edge, in pixels.
    pub max_export_dim: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_radius: 8.0,
            leader_length: 20.0,
            min_extent: 4.0,
            min_font_size: 4.0,
            default_font_size: 32.0,
            default_image_width: 0.3,
            selection_color: Rgba8::rgb(0x25, 0x63, 0xeb),
            selection_stroke_width: 1.5,
            background: Rgba8::WHITE,
            max_export_dim: 8192,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> CodelayerResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| CodelayerError::validation(format!("invalid editor config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject non-finite or non-positive tunables.
    pub fn validate(&self) -> CodelayerResult<()> {
        let positive = [
            ("handle_radius", self.handle_radius),
            ("leader_length", self.leader_length),
            ("min_extent", self.min_extent),
            ("min_font_size", self.min_font_size),
            ("default_font_size", self.default_font_size),
            ("default_image_width", self.default_image_width),
            ("selection_stroke_width", self.selection_stroke_width),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(CodelayerError::validation(format!(
                    "{name} must be finite and > 0 (got {v})"
                )));
            }
        }
        if self.default_font_size < self.min_font_size {
            return Err(CodelayerError::validation(
                "default_font_size must be >= min_font_size",
            ));
        }
        if self.max_export_dim == 0 {
            return Err(CodelayerError::validation("max_export_dim must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
