//! Force-directed layout and view geometry for the life graph.

mod force;
mod types;
mod viewport;

pub use force::ForceLayout;
pub use types::*;
pub use viewport::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP, Viewport, ZoomDirection};
