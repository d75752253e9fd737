use crate::assets::decode::Bitmap;
use crate::assets::text::{FontSpec, TextExtents, TextMeasure};
use crate::foundation::core::{Point, Rect, Rgba8};

/// Stable identifier of an overlay, unique for the lifetime of its layer list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct OverlayId(pub u64);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Discriminant of an overlay's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// Text layer.
    Text,
    /// Bitmap layer.
    Image,
}

/// Horizontal anchoring of a text layer relative to its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Text starts at the position.
    Left,
    /// Text is centered on the position.
    #[default]
    Center,
    /// Text ends at the position.
    Right,
}

impl TextAlign {
    /// Left edge of a line of `width`, relative to the anchor.
    pub fn origin_x(self, width: f64) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => -width / 2.0,
            Self::Right => -width,
        }
    }
}

/// Editable style of a text layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Fill color.
    pub color: Rgba8,
    /// Font family name.
    pub family: String,
    /// CSS-style weight.
    pub weight: u16,
    /// Italic style.
    pub italic: bool,
    /// Anchoring relative to the layer position.
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::BLACK,
            family: "sans-serif".to_string(),
            weight: 400,
            italic: false,
            align: TextAlign::Center,
        }
    }
}

/// Content of a text overlay, with extents cached from the last measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    pub(crate) text: String,
    pub(crate) font_size: f64,
    pub(crate) style: TextStyle,
    pub(crate) extents: TextExtents,
}

impl TextLayer {
    /// Text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Font size in logical units.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Current style.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Extents from the last measurement.
    pub fn extents(&self) -> TextExtents {
        self.extents
    }

    /// Font selection derived from style and size.
    pub fn font_spec(&self) -> FontSpec {
        FontSpec {
            family: self.style.family.clone(),
            size: self.font_size,
            weight: self.style.weight,
            italic: self.style.italic,
        }
    }

    pub(crate) fn remeasure(&mut self, measure: &mut dyn TextMeasure) {
        self.extents = measure.measure(&self.font_spec(), &self.text);
    }
}

/// Content of an image overlay. The bitmap never changes after creation.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    pub(crate) bitmap: Bitmap,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl ImageLayer {
    /// Decoded bitmap.
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Displayed width in logical units.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Displayed height in logical units.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// `height / width` of the source bitmap, fixed for the layer's lifetime.
    pub fn natural_aspect(&self) -> f64 {
        self.bitmap.natural_aspect()
    }

    /// Set the width and derive the height from the natural aspect ratio.
    ///
    /// Both edges stay at or above `min_extent`.
    pub(crate) fn set_width_locked(&mut self, width: f64, min_extent: f64) {
        let aspect = self.natural_aspect();
        let width = if width.is_finite() { width } else { self.width };
        let width = width.max(min_extent).max(min_extent / aspect);
        self.width = width;
        self.height = width * aspect;
    }
}

/// Kind-specific payload of an overlay.
#[derive(Clone, Debug)]
pub enum OverlayContent {
    /// Text glyph run.
    Text(TextLayer),
    /// Bitmap.
    Image(ImageLayer),
}

/// A positioned, rotatable layer drawn above the base code image.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub(crate) id: OverlayId,
    pub(crate) position: Point,
    pub(crate) rotation_deg: f64,
    pub(crate) content: OverlayContent,
}

impl Overlay {
    /// Stable id.
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// Content kind.
    pub fn kind(&self) -> OverlayKind {
        match self.content {
            OverlayContent::Text(_) => OverlayKind::Text,
            OverlayContent::Image(_) => OverlayKind::Image,
        }
    }

    /// Anchor in logical space: the center for images, the aligned baseline origin for text.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Rotation in degrees, clockwise in a y-down space.
    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    /// Kind-specific content.
    pub fn content(&self) -> &OverlayContent {
        &self.content
    }

    /// Text payload, if this is a text overlay.
    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.content {
            OverlayContent::Text(t) => Some(t),
            OverlayContent::Image(_) => None,
        }
    }

    /// Image payload, if this is an image overlay.
    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.content {
            OverlayContent::Image(i) => Some(i),
            OverlayContent::Text(_) => None,
        }
    }

    /// Body box in the layer's unrotated frame, with the anchor at the origin.
    ///
    /// Images are centered on the anchor. Text spans `[-ascent, descent]` vertically around its
    /// baseline and is shifted horizontally by its alignment.
    pub fn local_bounds(&self) -> Rect {
        match &self.content {
            OverlayContent::Image(img) => Rect::new(
                -img.width / 2.0,
                -img.height / 2.0,
                img.width / 2.0,
                img.height / 2.0,
            ),
            OverlayContent::Text(t) => {
                let x0 = t.style.align.origin_x(t.extents.width);
                Rect::new(
                    x0,
                    -t.extents.ascent,
                    x0 + t.extents.width,
                    t.extents.descent,
                )
            }
        }
    }

    /// Center of the resize handle in the local frame (bottom-right of the body box).
    pub fn resize_handle_local(&self) -> Point {
        let b = self.local_bounds();
        Point::new(b.x1, b.y1)
    }

    /// Center of the rotate handle in the local frame, `leader` above the top edge.
    pub fn rotate_handle_local(&self, leader: f64) -> Point {
        let b = self.local_bounds();
        Point::new(b.center().x, b.y0 - leader)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/overlay.rs"]
mod tests;
