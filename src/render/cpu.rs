use vello_cpu::kurbo::Shape;

use crate::assets::decode::{BaseImage, unpremultiply_rgba8_in_place};
use crate::assets::text::{TextEngine, layout_extents};
use crate::foundation::config::EditorConfig;
use crate::foundation::core::{Affine, Rect, Rgba8, Size, Vec2, affine_to_cpu, deg_to_rad};
use crate::foundation::error::{CodelayerError, CodelayerResult};
use crate::geometry::hit::HandleMetrics;
use crate::model::layers::LayerList;
use crate::model::overlay::{Overlay, OverlayContent, OverlayId};

/// Rendered surface in premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Premultiplied pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Convert to a straight-alpha image.
    pub fn to_rgba_image(&self) -> CodelayerResult<image::RgbaImage> {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| CodelayerError::render("frame byte len mismatch"))
    }
}

/// Result of a render call.
#[derive(Clone, Debug)]
pub struct RenderOutcome {
    /// The composed surface.
    pub frame: Frame,
    /// False when the base image is missing or the encoder rejected the content; overlays are
    /// still drawn against the background.
    pub base_valid: bool,
}

/// Everything the compositor reads.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Logical canvas size.
    pub logical: Size,
    /// Base code image; `None` draws only the background.
    pub base: Option<&'a BaseImage>,
    /// Overlays, bottom to top.
    pub layers: &'a LayerList,
    /// Overlay that gets selection decorations. Always `None` for export.
    pub selection: Option<OverlayId>,
}

/// CPU compositor shared by live preview and export.
#[derive(Clone, Debug)]
pub struct Compositor {
    background: Rgba8,
    selection_color: Rgba8,
    stroke_width: f64,
    handles: HandleMetrics,
}

impl Compositor {
    /// Build from editor tunables.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            background: config.background,
            selection_color: config.selection_color,
            stroke_width: config.selection_stroke_width,
            handles: HandleMetrics {
                radius: config.handle_radius,
                leader: config.leader_length,
            },
        }
    }

    /// Maps an overlay's local frame to destination pixels at `scale`.
    ///
    /// Translation to `position * scale`, then rotation, then one uniform `scale` for every local
    /// length.
    pub fn overlay_transform(overlay: &Overlay, scale: f64) -> Affine {
        Affine::translate(overlay.position().to_vec2() * scale)
            * Affine::rotate(deg_to_rad(overlay.rotation_deg()))
            * Affine::scale(scale)
    }

    /// Pixel size of a surface for `logical` at `scale`.
    pub fn surface_size(logical: Size, scale: f64) -> CodelayerResult<(u16, u16)> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CodelayerError::validation("render scale must be finite and > 0"));
        }
        let dim = |v: f64, axis: &str| -> CodelayerResult<u16> {
            let px = (v * scale).round();
            if !(1.0..=f64::from(u16::MAX)).contains(&px) {
                return Err(CodelayerError::render(format!(
                    "surface {axis} {px} is outside 1..={}",
                    u16::MAX
                )));
            }
            Ok(px as u16)
        };
        Ok((dim(logical.width, "width")?, dim(logical.height, "height")?))
    }

    /// Draw `scene` at `scale` device pixels per logical unit.
    #[tracing::instrument(skip_all, fields(scale = scale, overlays = scene.layers.len()))]
    pub fn render(
        &self,
        scene: &Scene<'_>,
        scale: f64,
        text: &mut TextEngine,
    ) -> CodelayerResult<Frame> {
        let (w, h) = Self::surface_size(scene.logical, scale)?;
        let dest = Rect::new(
            0.0,
            0.0,
            scene.logical.width * scale,
            scene.logical.height * scale,
        );

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(self.background));
        ctx.fill_rect(&rect_to_cpu(dest));

        if let Some(base) = scene.base {
            self.draw_base(&mut ctx, base, dest, w, h)?;
        }

        for overlay in scene.layers.iter() {
            let xf = Self::overlay_transform(overlay, scale);
            match overlay.content() {
                OverlayContent::Image(img) => {
                    let bw = f64::from(img.bitmap().width());
                    let bh = f64::from(img.bitmap().height());
                    let place = xf
                        * Affine::translate(Vec2::new(-img.width() / 2.0, -img.height() / 2.0))
                        * Affine::scale_non_uniform(img.width() / bw, img.height() / bh);
                    ctx.set_transform(affine_to_cpu(place));
                    ctx.set_paint(img.bitmap().paint());
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));
                }
                OverlayContent::Text(t) => {
                    let Some(shaped) = text.shape(&t.font_spec(), t.text(), t.style().color) else {
                        tracing::warn!(id = %overlay.id(), "no font available, text layer skipped");
                        continue;
                    };
                    let ext = layout_extents(&shaped.layout);
                    let origin = Vec2::new(t.style().align.origin_x(ext.width), -ext.ascent);
                    ctx.set_transform(affine_to_cpu(xf * Affine::translate(origin)));
                    for line in shaped.layout.lines() {
                        for item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let brush = run.style().brush;
                            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                                brush.r, brush.g, brush.b, brush.a,
                            ));
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(&shaped.font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                }
            }

            if scene.selection == Some(overlay.id()) {
                ctx.set_transform(affine_to_cpu(xf));
                self.draw_decorations(&mut ctx, overlay);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(Frame {
            width: u32::from(w),
            height: u32::from(h),
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn draw_base(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        base: &BaseImage,
        dest: Rect,
        w: u16,
        h: u16,
    ) -> CodelayerResult<()> {
        let bitmap = match base {
            BaseImage::Raster(b) => b.clone(),
            BaseImage::Svg(svg) => svg.rasterize(u32::from(w), u32::from(h))?,
        };
        let bw = f64::from(bitmap.width());
        let bh = f64::from(bitmap.height());
        let fit = Affine::scale_non_uniform(dest.width() / bw, dest.height() / bh);
        ctx.set_transform(affine_to_cpu(fit));
        ctx.set_paint(bitmap.paint());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));
        Ok(())
    }

    /// Outline, resize handle, leader line and rotate handle, in the overlay's local frame.
    fn draw_decorations(&self, ctx: &mut vello_cpu::RenderContext, overlay: &Overlay) {
        let b = overlay.local_bounds();
        let half = self.stroke_width / 2.0;
        let radius = self.handles.radius;
        let rotate_at = overlay.rotate_handle_local(self.handles.leader);

        ctx.set_paint(color_to_cpu(self.selection_color));
        let edges = [
            Rect::new(b.x0 - half, b.y0 - half, b.x1 + half, b.y0 + half),
            Rect::new(b.x0 - half, b.y1 - half, b.x1 + half, b.y1 + half),
            Rect::new(b.x0 - half, b.y0 - half, b.x0 + half, b.y1 + half),
            Rect::new(b.x1 - half, b.y0 - half, b.x1 + half, b.y1 + half),
            Rect::new(rotate_at.x - half, rotate_at.y, rotate_at.x + half, b.y0),
        ];
        for edge in edges {
            ctx.fill_rect(&rect_to_cpu(edge));
        }

        for center in [overlay.resize_handle_local(), rotate_at] {
            let c = vello_cpu::kurbo::Point::new(center.x, center.y);
            ctx.set_paint(color_to_cpu(self.selection_color));
            ctx.fill_path(&vello_cpu::kurbo::Circle::new(c, radius).to_path(0.1));
            ctx.set_paint(color_to_cpu(Rgba8::WHITE));
            ctx.fill_path(&vello_cpu::kurbo::Circle::new(c, radius * 0.55).to_path(0.1));
        }
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
