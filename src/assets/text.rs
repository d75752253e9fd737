use crate::foundation::core::Rgba8;
use crate::foundation::error::{CodelayerError, CodelayerResult};

/// Font selection for a text layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    /// Family name as registered with the text engine.
    pub family: String,
    /// Font size in logical units.
    pub size: f64,
    /// CSS-style weight (400 regular, 700 bold).
    pub weight: u16,
    /// Italic style.
    pub italic: bool,
}

/// Measured extents of a single text layer, relative to its baseline origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtents {
    /// Advance width of the widest line.
    pub width: f64,
    /// Distance from the first baseline up to the top of the text box.
    pub ascent: f64,
    /// Distance from the first baseline down to the bottom of the text box.
    pub descent: f64,
}

/// Text measurement capability consumed by the layer model and hit testing.
pub trait TextMeasure {
    /// Measure `text` laid out with `font`.
    fn measure(&mut self, font: &FontSpec, text: &str) -> TextExtents;
}

/// Deterministic metrics derived from the font size alone.
///
/// Used when no font is available to shape with.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxMetrics;

impl ApproxMetrics {
    const ADVANCE: f64 = 0.6;
    const BOLD_ADVANCE: f64 = 0.65;
    const ASCENT: f64 = 0.8;
    const DESCENT: f64 = 0.2;
    const LINE_HEIGHT: f64 = 1.2;
}

impl TextMeasure for ApproxMetrics {
    fn measure(&mut self, font: &FontSpec, text: &str) -> TextExtents {
        let advance = if font.weight >= 600 {
            Self::BOLD_ADVANCE
        } else {
            Self::ADVANCE
        };
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let extra_lines = lines.len().saturating_sub(1) as f64;
        TextExtents {
            width: widest as f64 * font.size * advance,
            ascent: font.size * Self::ASCENT,
            descent: font.size * Self::DESCENT + extra_lines * font.size * Self::LINE_HEIGHT,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

struct RegisteredFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// A shaped text layer ready to be drawn.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
}

/// Parley-backed shaping and measurement over explicitly registered fonts.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    fonts: Vec<RegisteredFont>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field(
                "families",
                &self.fonts.iter().map(|f| f.family.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    /// Construct an engine with no registered fonts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: Vec::new(),
        }
    }

    /// Register font bytes and return the family name they provide.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> CodelayerResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CodelayerError::decode("no font families registered from font bytes")
        })?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CodelayerError::decode("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family, "registered font");
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        self.fonts.push(RegisteredFont {
            family: family.clone(),
            data,
        });
        Ok(family)
    }

    /// Whether any font has been registered.
    pub fn has_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    fn resolve(&self, family: &str) -> Option<&RegisteredFont> {
        self.fonts
            .iter()
            .find(|f| f.family.eq_ignore_ascii_case(family))
            .or_else(|| self.fonts.first())
    }

    pub(crate) fn shape(
        &mut self,
        font: &FontSpec,
        text: &str,
        color: Rgba8,
    ) -> Option<ShapedText> {
        let (family, data) = {
            let f = self.resolve(&font.family)?;
            (f.family.clone(), f.data.clone())
        };
        if !font.size.is_finite() || font.size <= 0.0 {
            return None;
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size as f32));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(font.weight)),
        ));
        if font.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(color)));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Some(ShapedText { layout, font: data })
    }
}

/// Extents of a shaped layout with the first baseline as origin.
pub(crate) fn layout_extents(layout: &parley::Layout<TextBrushRgba8>) -> TextExtents {
    let baseline = layout
        .lines()
        .next()
        .map(|line| f64::from(line.metrics().baseline))
        .unwrap_or(0.0);
    let height = f64::from(layout.height());
    TextExtents {
        width: f64::from(layout.width()),
        ascent: baseline,
        descent: (height - baseline).max(0.0),
    }
}

impl TextMeasure for TextEngine {
    fn measure(&mut self, font: &FontSpec, text: &str) -> TextExtents {
        match self.shape(font, text, Rgba8::BLACK) {
            Some(shaped) => layout_extents(&shaped.layout),
            None => ApproxMetrics.measure(font, text),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
