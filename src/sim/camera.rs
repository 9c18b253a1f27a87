/// Scrolling camera. The view only moves when the tracked point
/// pushes past a margin band inside the viewport, then clamps to the
/// level extent so empty space outside the level is never shown.

use crate::domain::geom::Vec2;

/// Fraction of the viewport width kept clear on each side.
const VIEW_MARGIN: f32 = 0.35;
/// Vertical margins are asymmetric: more headroom than footroom.
const TOP_MARGIN: f32 = 0.3;
const BOTTOM_MARGIN: f32 = 0.1;

/// Top-left corner of the view in world units.
#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Track `target`, scrolling only when it leaves the margin band.
    /// `level` and `viewport` are extents in world units.
    pub fn follow(&mut self, target: Vec2, level: (f32, f32), viewport: (f32, f32)) {
        let (level_w, level_h) = level;
        let (view_w, view_h) = viewport;

        let margin_w = view_w * VIEW_MARGIN;
        let left = self.x + margin_w;
        let right = self.x + view_w - margin_w;
        if target.x < left {
            self.x += target.x - left;
        } else if target.x > right {
            self.x += target.x - right;
        }

        let top = self.y + view_h * TOP_MARGIN;
        let bottom = self.y + view_h - view_h * BOTTOM_MARGIN;
        if target.y < top {
            self.y += target.y - top;
        } else if target.y > bottom {
            self.y += target.y - bottom;
        }

        self.x = self.x.clamp(0.0, (level_w - view_w).max(0.0));
        self.y = self.y.clamp(0.0, (level_h - view_h).max(0.0));
    }
}
