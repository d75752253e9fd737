//! Codelayer is an interactive overlay canvas for QR and barcode images.
//!
//! A base code image is composed with freely positioned, rotated and resized text and image
//! layers. The public API is session-oriented:
//!
//! - Create an [`Editor`] over a logical canvas size
//! - Feed it [`PointerEvent`]s and property edits, call [`Editor::tick`] once per frame
//! - Render a live preview or encode an export at any resolution
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod geometry;
mod interact;
mod model;
mod render;
mod session;

pub use crate::assets::decode::{BaseImage, Bitmap, SvgImage, decode_image, parse_svg};
pub use crate::assets::text::{ApproxMetrics, FontSpec, TextEngine, TextExtents, TextMeasure};
pub use crate::foundation::config::EditorConfig;
pub use crate::foundation::core::{Affine, Point, Rect, Rgba8, Size, Vec2};
pub use crate::foundation::error::{CodelayerError, CodelayerResult};
pub use crate::geometry::hit::{HandleMetrics, Hit, HitMode, hit_test};
pub use crate::geometry::transform::{CanvasView, to_local, to_world};
pub use crate::interact::drag::{
    Anchor, DragController, DragLimits, DragSession, DragState, apply_drag,
};
pub use crate::interact::input::{Action, PointerEvent, PointerKind};
pub use crate::model::layers::{LayerEvent, LayerList, LayerObserver, Selection};
pub use crate::model::overlay::{
    ImageLayer, Overlay, OverlayContent, OverlayId, OverlayKind, TextAlign, TextLayer, TextStyle,
};
pub use crate::render::cpu::{Compositor, Frame, RenderOutcome, Scene};
pub use crate::render::export::{ExportFormat, ExportRequest};
pub use crate::session::editor::Editor;
