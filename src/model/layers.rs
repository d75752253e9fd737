use crate::assets::decode::Bitmap;
use crate::assets::text::{TextExtents, TextMeasure};
use crate::foundation::core::Point;
use crate::foundation::error::{CodelayerError, CodelayerResult};
use crate::model::overlay::{
    ImageLayer, Overlay, OverlayContent, OverlayId, OverlayKind, TextLayer, TextStyle,
};

/// Notification emitted synchronously after each layer list mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerEvent {
    /// An overlay was appended on top.
    Added(OverlayId),
    /// An overlay was deleted.
    Removed(OverlayId),
    /// Geometry, style or content of an overlay changed.
    Changed(OverlayId),
    /// Paint order changed.
    Reordered,
}

/// Callback registered with [`LayerList::subscribe`].
pub type LayerObserver = Box<dyn FnMut(&LayerEvent)>;

/// The active overlay of an editing session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Selected overlay.
    pub id: OverlayId,
    /// Kind of the selected overlay.
    pub kind: OverlayKind,
}

/// Clear `selection` if it points at `removed`. Returns whether it was cleared.
pub fn clear_selection_if(selection: &mut Option<Selection>, removed: OverlayId) -> bool {
    if selection.is_some_and(|s| s.id == removed) {
        *selection = None;
        true
    } else {
        false
    }
}

/// Ordered overlays. Index 0 paints first (bottom); the last entry is topmost.
pub struct LayerList {
    overlays: Vec<Overlay>,
    next_id: u64,
    observers: Vec<LayerObserver>,
}

impl Default for LayerList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LayerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerList")
            .field("overlays", &self.overlays)
            .field("next_id", &self.next_id)
            .field("observers", &format!("<{} observers>", self.observers.len()))
            .finish()
    }
}

impl LayerList {
    /// Empty list.
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
            next_id: 1,
            observers: Vec::new(),
        }
    }

    /// Register a callback invoked after every mutation.
    pub fn subscribe(&mut self, observer: LayerObserver) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: LayerEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn allocate_id(&mut self) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, overlay: Overlay) -> OverlayId {
        let id = overlay.id;
        tracing::debug!(%id, kind = ?overlay.kind(), "overlay added");
        self.overlays.push(overlay);
        self.emit(LayerEvent::Added(id));
        id
    }

    /// Append a text overlay on top. `font_size` is clamped to `min_font_size`.
    pub fn add_text(
        &mut self,
        text: impl Into<String>,
        position: Point,
        font_size: f64,
        min_font_size: f64,
        style: TextStyle,
        measure: &mut dyn TextMeasure,
    ) -> OverlayId {
        let id = self.allocate_id();
        let mut layer = TextLayer {
            text: text.into(),
            font_size: clamp_min(font_size, min_font_size),
            style,
            extents: TextExtents::default(),
        };
        layer.remeasure(measure);
        self.push(Overlay {
            id,
            position,
            rotation_deg: 0.0,
            content: OverlayContent::Text(layer),
        })
    }

    /// Append an image overlay on top, `width` wide with the bitmap's natural aspect ratio.
    pub fn add_image(
        &mut self,
        bitmap: Bitmap,
        position: Point,
        width: f64,
        min_extent: f64,
    ) -> OverlayId {
        let id = self.allocate_id();
        let mut layer = ImageLayer {
            bitmap,
            width: min_extent,
            height: min_extent,
        };
        layer.set_width_locked(width, min_extent);
        self.push(Overlay {
            id,
            position,
            rotation_deg: 0.0,
            content: OverlayContent::Image(layer),
        })
    }

    /// Delete an overlay. Unknown ids return `None` and leave the list untouched.
    pub fn remove(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.index_of(id)?;
        let removed = self.overlays.remove(index);
        tracing::debug!(%id, "overlay removed");
        self.emit(LayerEvent::Removed(id));
        Some(removed)
    }

    /// Overlay by id.
    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Position of `id` in paint order.
    pub fn index_of(&self, id: OverlayId) -> Option<usize> {
        self.overlays.iter().position(|o| o.id == id)
    }

    /// Overlays bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, Overlay> {
        self.overlays.iter()
    }

    /// Overlays top to bottom, in hit-test priority.
    pub fn iter_topmost_first(&self) -> std::iter::Rev<std::slice::Iter<'_, Overlay>> {
        self.overlays.iter().rev()
    }

    /// Ids bottom to top.
    pub fn ids(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(|o| o.id).collect()
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// True when no overlays exist.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Mutate one overlay in place and emit [`LayerEvent::Changed`].
    pub(crate) fn edit<R>(&mut self, id: OverlayId, f: impl FnOnce(&mut Overlay) -> R) -> Option<R> {
        let overlay = self.overlays.iter_mut().find(|o| o.id == id)?;
        let out = f(overlay);
        self.emit(LayerEvent::Changed(id));
        Some(out)
    }

    fn edit_or_unknown<R>(
        &mut self,
        id: OverlayId,
        f: impl FnOnce(&mut Overlay) -> CodelayerResult<R>,
    ) -> CodelayerResult<R> {
        let overlay = self
            .overlays
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| CodelayerError::validation(format!("unknown {id}")))?;
        let out = f(overlay)?;
        self.emit(LayerEvent::Changed(id));
        Ok(out)
    }

    /// Re-measure every text overlay, e.g. after the available fonts changed.
    pub(crate) fn remeasure_text(&mut self, measure: &mut dyn TextMeasure) {
        let mut changed = Vec::new();
        for overlay in &mut self.overlays {
            if let OverlayContent::Text(t) = &mut overlay.content {
                t.remeasure(measure);
                changed.push(overlay.id);
            }
        }
        for id in changed {
            self.emit(LayerEvent::Changed(id));
        }
    }

    /// Move an overlay's anchor.
    pub fn set_position(&mut self, id: OverlayId, position: Point) -> CodelayerResult<()> {
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(CodelayerError::validation("position must be finite"));
        }
        self.edit_or_unknown(id, |o| {
            o.position = position;
            Ok(())
        })
    }

    /// Set rotation in degrees. Any finite value is accepted.
    pub fn set_rotation(&mut self, id: OverlayId, degrees: f64) -> CodelayerResult<()> {
        if !degrees.is_finite() {
            return Err(CodelayerError::validation("rotation must be finite"));
        }
        self.edit_or_unknown(id, |o| {
            o.rotation_deg = degrees;
            Ok(())
        })
    }

    /// Replace the content of a text overlay and re-measure it.
    pub fn set_text(
        &mut self,
        id: OverlayId,
        text: impl Into<String>,
        measure: &mut dyn TextMeasure,
    ) -> CodelayerResult<()> {
        let text = text.into();
        self.edit_or_unknown(id, |o| {
            let layer = text_layer_mut(o)?;
            layer.text = text;
            layer.remeasure(measure);
            Ok(())
        })
    }

    /// Replace the style of a text overlay and re-measure it.
    pub fn set_text_style(
        &mut self,
        id: OverlayId,
        style: TextStyle,
        measure: &mut dyn TextMeasure,
    ) -> CodelayerResult<()> {
        self.edit_or_unknown(id, |o| {
            let layer = text_layer_mut(o)?;
            layer.style = style;
            layer.remeasure(measure);
            Ok(())
        })
    }

    /// Set the font size of a text overlay, clamped to `min_font_size`.
    pub fn set_font_size(
        &mut self,
        id: OverlayId,
        font_size: f64,
        min_font_size: f64,
        measure: &mut dyn TextMeasure,
    ) -> CodelayerResult<()> {
        self.edit_or_unknown(id, |o| {
            let layer = text_layer_mut(o)?;
            layer.font_size = clamp_min(font_size, min_font_size);
            layer.remeasure(measure);
            Ok(())
        })
    }

    /// Set the width of an image overlay; the height follows the natural aspect ratio.
    pub fn set_image_width(
        &mut self,
        id: OverlayId,
        width: f64,
        min_extent: f64,
    ) -> CodelayerResult<()> {
        self.edit_or_unknown(id, |o| match &mut o.content {
            OverlayContent::Image(img) => {
                img.set_width_locked(width, min_extent);
                Ok(())
            }
            OverlayContent::Text(_) => Err(CodelayerError::validation(format!(
                "{} is not an image overlay",
                o.id
            ))),
        })
    }

    /// Move `id` to paint-order position `index` (clamped to the list bounds).
    ///
    /// Returns `false` if the id is unknown or the order did not change.
    pub fn move_to(&mut self, id: OverlayId, index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = index.min(self.overlays.len() - 1);
        if from == to {
            return false;
        }
        let overlay = self.overlays.remove(from);
        self.overlays.insert(to, overlay);
        tracing::trace!(%id, from, to, "overlay reordered");
        self.emit(LayerEvent::Reordered);
        true
    }

    /// Swap with the overlay directly above.
    pub fn bring_forward(&mut self, id: OverlayId) -> bool {
        match self.index_of(id) {
            Some(i) => self.move_to(id, i + 1),
            None => false,
        }
    }

    /// Swap with the overlay directly below.
    pub fn send_backward(&mut self, id: OverlayId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => self.move_to(id, i - 1),
            _ => false,
        }
    }

    /// Make topmost.
    pub fn bring_to_front(&mut self, id: OverlayId) -> bool {
        self.move_to(id, usize::MAX)
    }

    /// Make bottommost.
    pub fn send_to_back(&mut self, id: OverlayId) -> bool {
        self.move_to(id, 0)
    }
}

fn text_layer_mut(o: &mut Overlay) -> CodelayerResult<&mut TextLayer> {
    let id = o.id;
    match &mut o.content {
        OverlayContent::Text(t) => Ok(t),
        OverlayContent::Image(_) => Err(CodelayerError::validation(format!(
            "{id} is not a text overlay"
        ))),
    }
}

pub(crate) fn clamp_min(value: f64, min: f64) -> f64 {
    if value.is_finite() { value.max(min) } else { min }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layers.rs"]
mod tests;
