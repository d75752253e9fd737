use crate::foundation::core::{Point, Rect, Size, Vec2, deg_to_rad};

/// How the canvas is presented on screen.
///
/// `rect` is the canvas's client-space box, `backing` its backing-store pixel size and
/// `preview_scale` the number of backing pixels per logical unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasView {
    /// Client-space placement of the canvas element.
    pub rect: Rect,
    /// Backing-store size in device pixels.
    pub backing: Size,
    /// Device pixels per logical unit.
    pub preview_scale: f64,
}

impl CanvasView {
    /// View whose client box, backing store and logical space all coincide.
    pub fn identity(logical: Size) -> Self {
        Self {
            rect: Rect::from_origin_size(Point::ZERO, logical),
            backing: logical,
            preview_scale: 1.0,
        }
    }

    /// Map a client-space point into logical space.
    ///
    /// Returns `None` for a degenerate view (empty rect or non-positive scale); callers treat that
    /// as "no canvas" and ignore the event.
    pub fn to_logical(&self, client: Point) -> Option<Point> {
        let (rw, rh) = (self.rect.width(), self.rect.height());
        let usable = rw > 0.0
            && rh > 0.0
            && self.preview_scale > 0.0
            && self.preview_scale.is_finite()
            && client.x.is_finite()
            && client.y.is_finite();
        if !usable {
            return None;
        }
        let sx = self.backing.width / rw;
        let sy = self.backing.height / rh;
        Some(Point::new(
            (client.x - self.rect.x0) * sx / self.preview_scale,
            (client.y - self.rect.y0) * sy / self.preview_scale,
        ))
    }
}

/// Rotate `v` by `degrees` (clockwise on a y-down canvas).
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (s, c) = deg_to_rad(degrees).sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Express `point` in the unrotated frame of a layer anchored at `center` and rotated by
/// `rotation_deg`.
///
/// Computed from absolute geometry every time so repeated calls never drift.
pub fn to_local(point: Point, center: Point, rotation_deg: f64) -> Point {
    rotate_vec(point - center, -rotation_deg).to_point()
}

/// Inverse of [`to_local`].
pub fn to_world(local: Point, center: Point, rotation_deg: f64) -> Point {
    center + rotate_vec(local.to_vec2(), rotation_deg)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
