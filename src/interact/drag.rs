use crate::assets::text::TextMeasure;
use crate::foundation::core::{Point, Vec2};
use crate::geometry::hit::{Hit, HitMode};
use crate::geometry::transform::rotate_vec;
use crate::model::layers::{LayerList, clamp_min};
use crate::model::overlay::{OverlayContent, OverlayId};

/// Reference captured when a drag starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// Grab offset `pointer - position`, preserved while moving.
    Offset(Vec2),
    /// Pointer position at press time.
    Pointer(Point),
}

/// The single active drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    /// Overlay being edited.
    pub id: OverlayId,
    /// What the drag does.
    pub mode: HitMode,
    /// Captured reference.
    pub anchor: Anchor,
}

/// Drag controller state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A pointer is down on an overlay.
    Dragging(DragSession),
}

/// Lower bounds enforced by resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragLimits {
    /// Minimum width and height of image layers, and minimum resize width for text.
    pub min_extent: f64,
    /// Minimum font size of text layers.
    pub min_font_size: f64,
}

/// Single-session drag state machine with one buffered pointer position per frame.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    state: DragState,
    pending: Option<Point>,
}

impl DragController {
    /// Idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Active session, if any.
    pub fn session(&self) -> Option<DragSession> {
        match self.state {
            DragState::Dragging(s) => Some(s),
            DragState::Idle => None,
        }
    }

    /// True while a drag is active.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// True when a pointer position is waiting for the next frame.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a drag on `hit`. Ignored (returns `None`) while another drag is active.
    pub fn begin(&mut self, hit: Hit, pointer: Point, position: Point) -> Option<DragSession> {
        if self.is_dragging() {
            tracing::trace!(id = %hit.id, "pointer down ignored during drag");
            return None;
        }
        let anchor = match hit.mode {
            HitMode::Move => Anchor::Offset(pointer - position),
            HitMode::Resize | HitMode::Rotate => Anchor::Pointer(pointer),
        };
        let session = DragSession {
            id: hit.id,
            mode: hit.mode,
            anchor,
        };
        self.state = DragState::Dragging(session);
        self.pending = None;
        tracing::debug!(id = %hit.id, mode = ?hit.mode, "drag started");
        Some(session)
    }

    /// Buffer the latest pointer position.
    ///
    /// Returns `true` when the caller must schedule a frame, i.e. no update was already pending.
    /// Positions received while idle are dropped.
    pub fn queue(&mut self, pointer: Point) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.pending.replace(pointer).is_none()
    }

    /// Take the buffered position together with the session it belongs to.
    ///
    /// Yields nothing once the session has ended, so a frame that fires late is a no-op.
    pub fn take_pending(&mut self) -> Option<(DragSession, Point)> {
        let pointer = self.pending.take()?;
        self.session().map(|s| (s, pointer))
    }

    /// End the session and discard any buffered position.
    pub fn end(&mut self) -> Option<DragSession> {
        self.pending = None;
        match std::mem::take(&mut self.state) {
            DragState::Dragging(s) => {
                tracing::debug!(id = %s.id, "drag ended");
                Some(s)
            }
            DragState::Idle => None,
        }
    }
}

/// New anchor position for a move drag.
pub fn moved_position(pointer: Point, anchor: Anchor) -> Point {
    match anchor {
        Anchor::Offset(offset) => pointer - offset,
        Anchor::Pointer(_) => pointer,
    }
}

/// Rotation in degrees that points the rotate handle at `pointer`.
///
/// Zero when the pointer is straight above `center`.
pub fn rotation_towards(pointer: Point, center: Point) -> f64 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees() + 90.0
}

/// Symmetric resize width: twice the pointer's local x distance from the body box's horizontal
/// center `box_center_x`, never below `min_extent`.
///
/// Images are centered on their anchor (`box_center_x == 0`); text boxes are shifted by alignment.
pub fn resized_width(
    pointer: Point,
    anchor: Point,
    rotation_deg: f64,
    box_center_x: f64,
    min_extent: f64,
) -> f64 {
    let local = rotate_vec(pointer - anchor, -rotation_deg);
    clamp_min((local.x - box_center_x).abs() * 2.0, min_extent)
}

/// Apply one drag update to the session's overlay.
///
/// Returns `false` when the overlay no longer exists.
pub fn apply_drag(
    layers: &mut LayerList,
    session: &DragSession,
    pointer: Point,
    limits: DragLimits,
    measure: &mut dyn TextMeasure,
) -> bool {
    let applied = layers.edit(session.id, |o| match session.mode {
        HitMode::Move => o.position = moved_position(pointer, session.anchor),
        HitMode::Rotate => o.rotation_deg = rotation_towards(pointer, o.position),
        HitMode::Resize => {
            let box_center_x = o.local_bounds().center().x;
            let width = resized_width(
                pointer,
                o.position,
                o.rotation_deg,
                box_center_x,
                limits.min_extent,
            );
            match &mut o.content {
                OverlayContent::Image(img) => img.set_width_locked(width, limits.min_extent),
                OverlayContent::Text(text) => {
                    let measured = text.extents.width;
                    if measured > 0.0 {
                        text.font_size =
                            clamp_min(text.font_size * width / measured, limits.min_font_size);
                        text.remeasure(measure);
                    }
                }
            }
        }
    });
    applied.is_some()
}

#[cfg(test)]
#[path = "../../tests/unit/interact/drag.rs"]
mod tests;
