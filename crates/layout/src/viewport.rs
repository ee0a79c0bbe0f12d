use serde::{Deserialize, Serialize};

use crate::types::Position;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: scrolling up (negative delta) zooms in.
    pub fn from_wheel(delta_y: f64) -> Option<Self> {
        if delta_y < 0.0 {
            Some(ZoomDirection::In)
        } else if delta_y > 0.0 {
            Some(ZoomDirection::Out)
        } else {
            None
        }
    }
}

/// Pan/zoom view transform applied at render time.
///
/// `screen = canvas * zoom + pan + origin * (1 - zoom)`, where `origin` is the
/// point the last zoom was centered on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Position,
    pub zoom: f64,
    pub origin: Position,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Position::ORIGIN,
            zoom: 1.0,
            origin: Position::ORIGIN,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, canvas: Position) -> Position {
        let keep = 1.0 - self.zoom;
        Position::new(
            canvas.x * self.zoom + self.pan.x + self.origin.x * keep,
            canvas.y * self.zoom + self.pan.y + self.origin.y * keep,
        )
    }

    pub fn to_canvas(&self, screen: Position) -> Position {
        let keep = 1.0 - self.zoom;
        Position::new(
            (screen.x - self.pan.x - self.origin.x * keep) / self.zoom,
            (screen.y - self.pan.y - self.origin.y * keep) / self.zoom,
        )
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Step the zoom level around `cursor` (screen space). The canvas point
    /// under the cursor stays put. Returns whether the zoom changed.
    pub fn zoom_step_at(&mut self, cursor: Position, direction: ZoomDirection) -> bool {
        let delta = match direction {
            ZoomDirection::In => ZOOM_STEP,
            ZoomDirection::Out => -ZOOM_STEP,
        };
        // Round to one decimal so repeated steps land on exact levels.
        let next = (((self.zoom + delta) * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
        if next == self.zoom {
            return false;
        }

        let anchored = self.to_canvas(cursor);
        self.zoom = next;
        self.origin = cursor;
        // Solve to_screen(anchored) == cursor for pan.
        self.pan = Position::new(
            next * (cursor.x - anchored.x),
            next * (cursor.y - anchored.y),
        );
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Position, b: Position) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_identity_transform() {
        let view = Viewport::default();
        let p = Position::new(100.0, 100.0);
        assert_eq!(view.to_screen(p), p);
        assert_eq!(view.to_canvas(p), p);
    }

    #[test]
    fn test_zoom_steps_and_clamp() {
        let mut view = Viewport::default();
        for _ in 0..3 {
            view.zoom_step_at(Position::ORIGIN, ZoomDirection::In);
        }
        assert_eq!(view.zoom, 1.3);

        for _ in 0..20 {
            view.zoom_step_at(Position::ORIGIN, ZoomDirection::In);
        }
        assert_eq!(view.zoom, MAX_ZOOM);
        assert!(!view.zoom_step_at(Position::ORIGIN, ZoomDirection::In));

        for _ in 0..30 {
            view.zoom_step_at(Position::ORIGIN, ZoomDirection::Out);
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut view = Viewport::default();
        view.pan_by(30.0, -20.0);
        let cursor = Position::new(250.0, 180.0);
        let before = view.to_canvas(cursor);

        view.zoom_step_at(cursor, ZoomDirection::In);
        assert!(close(view.to_screen(before), cursor));

        let second = Position::new(400.0, 50.0);
        let under = view.to_canvas(second);
        view.zoom_step_at(second, ZoomDirection::Out);
        view.zoom_step_at(second, ZoomDirection::Out);
        assert!(close(view.to_screen(under), second));
    }

    #[test]
    fn test_round_trip() {
        let mut view = Viewport::default();
        view.zoom_step_at(Position::new(10.0, 10.0), ZoomDirection::In);
        view.pan_by(5.0, 7.0);
        let p = Position::new(-42.0, 318.5);
        assert!(close(view.to_canvas(view.to_screen(p)), p));
    }

    #[test]
    fn test_wheel_direction() {
        assert_eq!(ZoomDirection::from_wheel(-3.0), Some(ZoomDirection::In));
        assert_eq!(ZoomDirection::from_wheel(3.0), Some(ZoomDirection::Out));
        assert_eq!(ZoomDirection::from_wheel(0.0), None);
    }
}
