use crate::foundation::core::Point;
use crate::geometry::transform::to_local;
use crate::model::layers::LayerList;
use crate::model::overlay::{Overlay, OverlayId};

/// Interaction a hit exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitMode {
    /// Translate the layer.
    Move,
    /// Symmetric resize about the anchor.
    Resize,
    /// Rotate about the anchor.
    Rotate,
}

/// Result of a successful hit test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    /// Overlay under the pointer.
    pub id: OverlayId,
    /// Mode exposed at that point.
    pub mode: HitMode,
}

/// Handle dimensions in logical units, before the view scale is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleMetrics {
    /// Radius of the resize and rotate hotspots.
    pub radius: f64,
    /// Distance from the top edge of the body box to the rotate handle center.
    pub leader: f64,
}

/// Classify a point already expressed in `overlay`'s local frame.
///
/// Handles win over the body: resize, then rotate, then move.
pub fn classify_local(
    overlay: &Overlay,
    local: Point,
    handles: HandleMetrics,
    scale: f64,
) -> Option<HitMode> {
    let radius = handles.radius * scale;
    if local.distance(overlay.resize_handle_local()) <= radius {
        return Some(HitMode::Resize);
    }
    if local.distance(overlay.rotate_handle_local(handles.leader * scale)) <= radius {
        return Some(HitMode::Rotate);
    }
    let b = overlay.local_bounds();
    let inside = local.x >= b.x0 && local.x <= b.x1 && local.y >= b.y0 && local.y <= b.y1;
    inside.then_some(HitMode::Move)
}

/// Find the topmost overlay under `pointer` (logical space).
///
/// Layers are searched from the top of the list down and the first match wins, so lower layers are
/// never considered once something above them is hit.
pub fn hit_test(
    pointer: Point,
    layers: &LayerList,
    handles: HandleMetrics,
    scale: f64,
) -> Option<Hit> {
    layers.iter_topmost_first().find_map(|overlay| {
        let local = to_local(pointer, overlay.position(), overlay.rotation_deg());
        classify_local(overlay, local, handles, scale).map(|mode| Hit {
            id: overlay.id(),
            mode,
        })
    })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/hit.rs"]
mod tests;
