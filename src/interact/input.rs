use crate::foundation::core::Point;
use crate::model::layers::Selection;

/// Phase of a single-pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    /// Button pressed or touch started.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or touch ended.
    Up,
    /// The platform aborted the gesture.
    Cancel,
}

/// Pointer event in client coordinates, independent of any windowing toolkit.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerEvent {
    /// Client-space x.
    pub x: f64,
    /// Client-space y.
    pub y: f64,
    /// Event phase.
    pub kind: PointerKind,
}

impl PointerEvent {
    /// Construct an event.
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self { x, y, kind }
    }

    /// Client position as a point.
    pub fn client(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Follow-up work the host should perform after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Schedule one animation frame and call `Editor::tick` from it.
    RequestFrame,
    /// The preview is stale and should be re-rendered.
    Redraw,
    /// Selection changed to the given value.
    SelectionChanged(Option<Selection>),
}
