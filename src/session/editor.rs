use crate::assets::decode::{BaseImage, Bitmap, decode_image};
use crate::assets::text::TextEngine;
use crate::foundation::config::EditorConfig;
use crate::foundation::core::{Point, Size};
use crate::foundation::error::{CodelayerError, CodelayerResult};
use crate::geometry::hit::{HandleMetrics, HitMode, hit_test};
use crate::geometry::transform::CanvasView;
use crate::interact::drag::{DragController, DragLimits, DragState, apply_drag};
use crate::interact::input::{Action, PointerEvent, PointerKind};
use crate::model::layers::{LayerList, LayerObserver, Selection, clear_selection_if};
use crate::model::overlay::{OverlayId, TextStyle};
use crate::render::cpu::{Compositor, RenderOutcome, Scene};
use crate::render::export::{ExportRequest, encode_frame, export_geometry, export_vector};

/// One editing session: layer model, selection, drag state, base image and rendering.
///
/// Everything is single-threaded. Pointer handlers and property edits mutate the same layer list
/// synchronously; pointer moves during a drag are buffered and applied by [`Editor::tick`].
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    logical: Size,
    layers: LayerList,
    selection: Option<Selection>,
    drag: DragController,
    view: Option<CanvasView>,
    base: Option<BaseImage>,
    base_valid: bool,
    text: TextEngine,
    compositor: Compositor,
}

impl Editor {
    /// Start a session over a canvas of `logical` size.
    pub fn new(logical: Size, config: EditorConfig) -> CodelayerResult<Self> {
        config.validate()?;
        let finite = logical.width.is_finite() && logical.height.is_finite();
        if !(finite && logical.width > 0.0 && logical.height > 0.0) {
            return Err(CodelayerError::validation(
                "logical canvas size must be finite and > 0",
            ));
        }
        let compositor = Compositor::new(&config);
        Ok(Self {
            config,
            logical,
            layers: LayerList::new(),
            selection: None,
            drag: DragController::new(),
            view: None,
            base: None,
            base_valid: false,
            text: TextEngine::new(),
            compositor,
        })
    }

    /// Active tunables.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Logical canvas size.
    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// The layer model.
    pub fn layers(&self) -> &LayerList {
        &self.layers
    }

    /// Current selection.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Current drag state.
    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// Whether the last base image update succeeded.
    pub fn base_valid(&self) -> bool {
        self.base_valid
    }

    /// Observe layer model mutations.
    pub fn subscribe(&mut self, observer: LayerObserver) {
        self.layers.subscribe(observer);
    }

    /// Attach or detach the on-screen canvas. Without a view, pointer events are ignored.
    pub fn set_view(&mut self, view: Option<CanvasView>) {
        self.view = view;
    }

    /// Replace the base code image.
    pub fn set_base(&mut self, base: BaseImage) {
        self.base = Some(base);
        self.base_valid = true;
    }

    /// Decode and install a base image; SVG markup is kept as a vector base.
    ///
    /// On failure the previous base is left untouched.
    pub fn load_base(&mut self, bytes: &[u8]) -> CodelayerResult<()> {
        let base = BaseImage::from_bytes(bytes)?;
        self.set_base(base);
        Ok(())
    }

    /// Record that the encoder rejected the current content.
    ///
    /// Overlays keep rendering against the background until a valid base arrives.
    pub fn set_base_invalid(&mut self) {
        tracing::debug!("base image marked invalid");
        self.base = None;
        self.base_valid = false;
    }

    /// Register font bytes for text layers and re-measure existing text.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> CodelayerResult<String> {
        let family = self.text.register_font(font_bytes)?;
        self.layers.remeasure_text(&mut self.text);
        Ok(family)
    }

    fn center(&self) -> Point {
        Point::new(self.logical.width / 2.0, self.logical.height / 2.0)
    }

    fn limits(&self) -> DragLimits {
        DragLimits {
            min_extent: self.config.min_extent,
            min_font_size: self.config.min_font_size,
        }
    }

    fn handles(&self) -> HandleMetrics {
        HandleMetrics {
            radius: self.config.handle_radius,
            leader: self.config.leader_length,
        }
    }

    /// Add a text layer with default geometry, centered on the canvas.
    pub fn add_text(&mut self, text: impl Into<String>) -> OverlayId {
        let at = self.center();
        let size = self.config.default_font_size;
        self.add_text_with(text, at, size, TextStyle::default())
    }

    /// Add a text layer with explicit geometry and style.
    pub fn add_text_with(
        &mut self,
        text: impl Into<String>,
        position: Point,
        font_size: f64,
        style: TextStyle,
    ) -> OverlayId {
        let min = self.config.min_font_size;
        self.layers
            .add_text(text, position, font_size, min, style, &mut self.text)
    }

    /// Decode `bytes` and add an image layer centered on the canvas.
    ///
    /// A decode failure leaves the layer list unchanged.
    pub fn add_image(&mut self, bytes: &[u8]) -> CodelayerResult<OverlayId> {
        let bitmap = decode_image(bytes).inspect_err(|e| {
            tracing::warn!(error = %e, "image overlay not added");
        })?;
        Ok(self.add_image_bitmap(bitmap))
    }

    /// Add an already-decoded bitmap centered on the canvas.
    pub fn add_image_bitmap(&mut self, bitmap: Bitmap) -> OverlayId {
        let width = self.logical.width * self.config.default_image_width;
        let at = self.center();
        self.layers
            .add_image(bitmap, at, width, self.config.min_extent)
    }

    /// Delete an overlay. Clears the selection and ends any drag that pointed at it.
    pub fn delete(&mut self, id: OverlayId) -> Vec<Action> {
        if self.layers.remove(id).is_none() {
            return Vec::new();
        }
        if self.drag.session().is_some_and(|s| s.id == id) {
            self.drag.end();
        }
        let mut actions = vec![Action::Redraw];
        if clear_selection_if(&mut self.selection, id) {
            actions.push(Action::SelectionChanged(None));
        }
        actions
    }

    /// Select an overlay by id. Unknown ids are ignored.
    pub fn select(&mut self, id: OverlayId) -> Vec<Action> {
        let Some(overlay) = self.layers.get(id) else {
            return Vec::new();
        };
        let next = Some(Selection {
            id,
            kind: overlay.kind(),
        });
        self.change_selection(next)
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        self.change_selection(None)
    }

    fn change_selection(&mut self, next: Option<Selection>) -> Vec<Action> {
        if self.selection == next {
            return Vec::new();
        }
        tracing::debug!(?next, "selection changed");
        self.selection = next;
        vec![Action::SelectionChanged(next), Action::Redraw]
    }

    /// Replace the content of a text layer.
    pub fn set_text(&mut self, id: OverlayId, text: impl Into<String>) -> CodelayerResult<()> {
        self.layers.set_text(id, text, &mut self.text)
    }

    /// Replace the style of a text layer.
    pub fn set_text_style(&mut self, id: OverlayId, style: TextStyle) -> CodelayerResult<()> {
        self.layers.set_text_style(id, style, &mut self.text)
    }

    /// Set the font size of a text layer.
    pub fn set_font_size(&mut self, id: OverlayId, font_size: f64) -> CodelayerResult<()> {
        let min = self.config.min_font_size;
        self.layers.set_font_size(id, font_size, min, &mut self.text)
    }

    /// Move a layer.
    pub fn set_position(&mut self, id: OverlayId, position: Point) -> CodelayerResult<()> {
        self.layers.set_position(id, position)
    }

    /// Rotate a layer.
    pub fn set_rotation(&mut self, id: OverlayId, degrees: f64) -> CodelayerResult<()> {
        self.layers.set_rotation(id, degrees)
    }

    /// Resize an image layer, keeping its natural aspect ratio.
    pub fn set_image_width(&mut self, id: OverlayId, width: f64) -> CodelayerResult<()> {
        let min = self.config.min_extent;
        self.layers.set_image_width(id, width, min)
    }

    /// Raise one step in paint order.
    pub fn bring_forward(&mut self, id: OverlayId) -> bool {
        self.layers.bring_forward(id)
    }

    /// Lower one step in paint order.
    pub fn send_backward(&mut self, id: OverlayId) -> bool {
        self.layers.send_backward(id)
    }

    /// Make topmost.
    pub fn bring_to_front(&mut self, id: OverlayId) -> bool {
        self.layers.bring_to_front(id)
    }

    /// Make bottommost.
    pub fn send_to_back(&mut self, id: OverlayId) -> bool {
        self.layers.send_to_back(id)
    }

    /// Move to an explicit paint-order index.
    pub fn move_to(&mut self, id: OverlayId, index: usize) -> bool {
        self.layers.move_to(id, index)
    }

    fn to_logical(&self, x: f64, y: f64) -> Option<Point> {
        self.view?.to_logical(Point::new(x, y))
    }

    /// Dispatch a pointer event.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<Action> {
        match event.kind {
            PointerKind::Down => self.on_pointer_down(event.x, event.y),
            PointerKind::Move => self.on_pointer_move(event.x, event.y),
            PointerKind::Up => self.on_pointer_up(event.x, event.y),
            PointerKind::Cancel => self.on_pointer_cancel(event.x, event.y),
        }
    }

    /// Pointer pressed at client `(x, y)`.
    ///
    /// Hits start a drag and select the overlay; a miss clears the selection. Ignored while a drag
    /// is already active.
    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> Vec<Action> {
        if self.drag.is_dragging() {
            return Vec::new();
        }
        let Some(pointer) = self.to_logical(x, y) else {
            return Vec::new();
        };
        let Some(hit) = hit_test(pointer, &self.layers, self.handles(), 1.0) else {
            return self.change_selection(None);
        };
        let Some(overlay) = self.layers.get(hit.id) else {
            return Vec::new();
        };
        let next = Some(Selection {
            id: hit.id,
            kind: overlay.kind(),
        });
        let position = overlay.position();
        self.drag.begin(hit, pointer, position);
        let mut actions = self.change_selection(next);
        if actions.is_empty() {
            actions.push(Action::Redraw);
        }
        actions
    }

    /// Pointer moved to client `(x, y)`. Buffers the position while dragging.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> Vec<Action> {
        if !self.drag.is_dragging() {
            return Vec::new();
        }
        match self.to_logical(x, y) {
            Some(pointer) if self.drag.queue(pointer) => vec![Action::RequestFrame],
            _ => Vec::new(),
        }
    }

    /// Pointer released. Ends the drag and drops any update still waiting for a frame.
    pub fn on_pointer_up(&mut self, _x: f64, _y: f64) -> Vec<Action> {
        self.finish_drag()
    }

    /// Gesture aborted by the platform. Same as release.
    pub fn on_pointer_cancel(&mut self, _x: f64, _y: f64) -> Vec<Action> {
        self.finish_drag()
    }

    fn finish_drag(&mut self) -> Vec<Action> {
        match self.drag.end() {
            Some(_) => vec![Action::Redraw],
            None => Vec::new(),
        }
    }

    /// Animation-frame callback: apply the most recent buffered pointer position.
    pub fn tick(&mut self) -> Vec<Action> {
        if self.apply_pending() {
            vec![Action::Redraw]
        } else {
            Vec::new()
        }
    }

    fn apply_pending(&mut self) -> bool {
        let Some((session, pointer)) = self.drag.take_pending() else {
            return false;
        };
        let limits = self.limits();
        if apply_drag(&mut self.layers, &session, pointer, limits, &mut self.text) {
            return true;
        }
        tracing::debug!(id = %session.id, "drag target vanished");
        self.drag.end();
        false
    }

    /// Mode the pointer at client `(x, y)` would start, for cursor feedback.
    ///
    /// Hit testing runs against the layer model after any buffered drag update is applied.
    pub fn hover(&mut self, x: f64, y: f64) -> Option<HitMode> {
        self.apply_pending();
        let pointer = self.to_logical(x, y)?;
        hit_test(pointer, &self.layers, self.handles(), 1.0).map(|h| h.mode)
    }

    /// Live canvas at `scale` device pixels per logical unit, with selection decorations.
    ///
    /// A buffered drag update is applied first so the frame never lags the pointer.
    pub fn render_preview(&mut self, scale: f64) -> CodelayerResult<RenderOutcome> {
        self.apply_pending();
        let scene = Scene {
            logical: self.logical,
            base: valid_base(&self.base, self.base_valid),
            layers: &self.layers,
            selection: self.selection.map(|s| s.id),
        };
        let frame = self.compositor.render(&scene, scale, &mut self.text)?;
        Ok(RenderOutcome {
            frame,
            base_valid: self.base_valid,
        })
    }

    /// Encode the layer model at `request.target_width` pixels wide, without decorations.
    #[tracing::instrument(skip(self), fields(overlays = self.layers.len()))]
    pub fn render_export(&mut self, request: ExportRequest) -> CodelayerResult<Vec<u8>> {
        self.apply_pending();
        if request.format.is_vector() {
            return export_vector(valid_base(&self.base, self.base_valid), self.layers.len());
        }
        let (scale, _, _) =
            export_geometry(self.logical, request.target_width, self.config.max_export_dim)?;
        let scene = Scene {
            logical: self.logical,
            base: valid_base(&self.base, self.base_valid),
            layers: &self.layers,
            selection: None,
        };
        let frame = self.compositor.render(&scene, scale, &mut self.text)?;
        encode_frame(&frame, request.format, self.config.background)
    }
}

fn valid_base(base: &Option<BaseImage>, valid: bool) -> Option<&BaseImage> {
    if valid { base.as_ref() } else { None }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
