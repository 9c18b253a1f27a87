/// Axis-separated collision resolution against the tile grid.
///
/// ## Algorithm
///
/// A displacement is resolved one axis at a time: the bounding box is
/// moved along X and clamped against any intersecting Impassable tile,
/// then moved along Y and clamped again. Platform tiles participate in
/// the Y pass only, and only when the entity is moving downward and its
/// bottom edge started at or above the platform's top surface (landing).
/// Platforms never block upward or horizontal movement.
///
/// Out-of-bounds cells follow the TileGrid policy: side walls are
/// Impassable, the space above and below the level is Passable.
///
/// The same resolver serves Player and Enemy. Gems do not collide with
/// tiles at all.

use super::geom::{Rect, Vec2};
use super::grid::TileGrid;
use super::tile::{Tile, TileCollision};

/// Tolerance for "resting on a surface" comparisons.
const SKIN: f32 = 0.01;

/// Outcome of one resolved displacement.
#[derive(Clone, Copy, Debug, Default)]
pub struct Moved {
    /// Displacement actually applied after clamping.
    pub delta: Vec2,
    /// Horizontal movement was cut short by a solid tile.
    pub hit_x: bool,
    /// Vertical movement was cut short.
    pub hit_y: bool,
    /// The vertical clamp was a downward landing on a supporting tile.
    pub landed: bool,
}

/// Resolve `displacement` for a bounding box, X axis first, then Y.
pub fn move_bounds(grid: &TileGrid, bounds: Rect, displacement: Vec2) -> Moved {
    let (new_x, hit_x) = sweep_x(grid, bounds, displacement.x);
    let after_x = Rect::new(new_x, bounds.y, bounds.w, bounds.h);
    let (new_y, hit_y, landed) = sweep_y(grid, after_x, displacement.y);

    Moved {
        delta: Vec2::new(new_x - bounds.x, new_y - bounds.y),
        hit_x,
        hit_y,
        landed,
    }
}

/// Is the box resting on a supporting surface? Probes one unit below
/// the bottom edge; Impassable always supports, Platform supports only
/// when the box sits on its top surface rather than inside it.
pub fn on_ground(grid: &TileGrid, bounds: Rect) -> bool {
    let probe_y = bounds.bottom() + 1.0;
    let ty = (probe_y / Tile::HEIGHT).floor() as i32;
    let (x0, x1) = col_span(bounds.left(), bounds.right());

    for tx in x0..=x1 {
        match grid.collision_at(tx, ty) {
            TileCollision::Impassable => return true,
            TileCollision::Platform => {
                if bounds.bottom() <= ty as f32 * Tile::HEIGHT + SKIN {
                    return true;
                }
            }
            TileCollision::Passable => {}
        }
    }
    false
}

// ── Per-axis sweeps ──

fn sweep_x(grid: &TileGrid, bounds: Rect, dx: f32) -> (f32, bool) {
    if dx == 0.0 {
        return (bounds.x, false);
    }
    let moved = bounds.offset(dx, 0.0);
    let (x0, x1) = col_span(moved.left(), moved.right());
    let (y0, y1) = row_span(moved.top(), moved.bottom());

    let mut new_x = moved.x;
    let mut hit = false;

    for ty in y0..=y1 {
        for tx in x0..=x1 {
            if grid.collision_at(tx, ty) != TileCollision::Impassable {
                continue;
            }
            let cell = grid.cell_bounds(tx, ty);
            if dx > 0.0 {
                let pushed = cell.left() - bounds.w;
                if pushed < new_x {
                    new_x = pushed;
                    hit = true;
                }
            } else {
                let pushed = cell.right();
                if pushed > new_x {
                    new_x = pushed;
                    hit = true;
                }
            }
        }
    }
    (new_x, hit)
}

fn sweep_y(grid: &TileGrid, bounds: Rect, dy: f32) -> (f32, bool, bool) {
    if dy == 0.0 {
        return (bounds.y, false, false);
    }
    let moved = bounds.offset(0.0, dy);
    let (x0, x1) = col_span(moved.left(), moved.right());
    let (y0, y1) = row_span(moved.top(), moved.bottom());

    let mut new_y = moved.y;
    let mut hit = false;
    let mut landed = false;

    for ty in y0..=y1 {
        for tx in x0..=x1 {
            let collision = grid.collision_at(tx, ty);
            let cell = grid.cell_bounds(tx, ty);
            let blocks = match collision {
                TileCollision::Impassable => true,
                // One-way: only a downward move that started above the
                // platform's top surface is stopped.
                TileCollision::Platform => {
                    dy > 0.0 && bounds.bottom() <= cell.top() + SKIN
                }
                TileCollision::Passable => false,
            };
            if !blocks {
                continue;
            }
            if dy > 0.0 {
                let pushed = cell.top() - bounds.h;
                if pushed < new_y {
                    new_y = pushed;
                    hit = true;
                    landed = true;
                }
            } else {
                let pushed = cell.bottom();
                if pushed > new_y {
                    new_y = pushed;
                    hit = true;
                }
            }
        }
    }
    (new_y, hit, landed)
}

// ── Tile spans covered by a half-open interval in world units ──

fn col_span(left: f32, right: f32) -> (i32, i32) {
    let x0 = (left / Tile::WIDTH).floor() as i32;
    let x1 = (right / Tile::WIDTH).ceil() as i32 - 1;
    (x0, x1)
}

fn row_span(top: f32, bottom: f32) -> (i32, i32) {
    let y0 = (top / Tile::HEIGHT).floor() as i32;
    let y1 = (bottom / Tile::HEIGHT).ceil() as i32 - 1;
    (y0, y1)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::SpriteRef;

    /// Build a grid from a string diagram.
    /// Legend: '#' = Impassable, '-' = Platform, anything else Passable.
    fn grid_from(rows: &[&str]) -> TileGrid {
        let height = rows.len();
        let width = rows[0].len();
        let mut tiles = Vec::with_capacity(width * height);
        for row in rows {
            for ch in row.chars() {
                let collision = match ch {
                    '#' => TileCollision::Impassable,
                    '-' => TileCollision::Platform,
                    _ => TileCollision::Passable,
                };
                let sprite = match collision {
                    TileCollision::Passable => None,
                    _ => Some(SpriteRef { set: "BlockA", variant: 0 }),
                };
                tiles.push(Tile::new(sprite, collision));
            }
        }
        TileGrid::new(tiles, width, height)
    }

    fn box_at(x: f32, y: f32) -> Rect {
        // 20x30 box, top-left corner given directly.
        Rect::new(x, y, 20.0, 30.0)
    }

    #[test]
    fn falls_freely_through_open_space() {
        let g = grid_from(&["...", "...", "..."]);
        let m = move_bounds(&g, box_at(40.0, 0.0), Vec2::new(0.0, 10.0));
        assert_eq!(m.delta.y, 10.0);
        assert!(!m.hit_y && !m.landed);
    }

    #[test]
    fn lands_exactly_on_solid_top() {
        let g = grid_from(&["...", "###"]);
        // Bottom edge at y=30, tile row 1 top at y=32. Fall 10 units.
        let start = box_at(40.0, 0.0);
        let m = move_bounds(&g, start, Vec2::new(0.0, 10.0));
        assert!(m.hit_y && m.landed);
        let bottom = start.bottom() + m.delta.y;
        assert!((bottom - Tile::HEIGHT).abs() < 0.001);
    }

    #[test]
    fn lands_exactly_on_platform_top() {
        let g = grid_from(&["...", "---"]);
        let start = box_at(40.0, 0.0);
        let m = move_bounds(&g, start, Vec2::new(0.0, 10.0));
        assert!(m.landed);
        assert!((start.bottom() + m.delta.y - Tile::HEIGHT).abs() < 0.001);
        assert!(on_ground(&g, start.offset(0.0, m.delta.y)));
    }

    #[test]
    fn platform_ignores_upward_movement() {
        let g = grid_from(&["---", "..."]);
        // Box inside row 1 moving up through the platform row.
        let start = box_at(40.0, 33.0);
        let m = move_bounds(&g, start, Vec2::new(0.0, -20.0));
        assert_eq!(m.delta.y, -20.0);
        assert!(!m.hit_y);
    }

    #[test]
    fn platform_ignores_horizontal_movement() {
        let g = grid_from(&[".-.", "###"]);
        // Box overlapping the platform row, sliding right across it.
        let start = Rect::new(10.0, 10.0, 20.0, 20.0);
        let m = move_bounds(&g, start, Vec2::new(30.0, 0.0));
        assert_eq!(m.delta.x, 30.0);
        assert!(!m.hit_x);
    }

    #[test]
    fn platform_does_not_catch_a_box_already_below_its_top() {
        let g = grid_from(&["...", "---", "..."]);
        // Bottom edge already inside the platform row: no landing.
        let start = box_at(40.0, 10.0); // bottom = 40, platform top = 32
        let m = move_bounds(&g, start, Vec2::new(0.0, 15.0));
        assert_eq!(m.delta.y, 15.0);
        assert!(!m.landed);
    }

    #[test]
    fn solid_wall_blocks_horizontal() {
        let g = grid_from(&["..#", "..#"]);
        let start = box_at(40.0, 10.0); // right edge at 60, wall at 80
        let m = move_bounds(&g, start, Vec2::new(50.0, 0.0));
        assert!(m.hit_x);
        assert!((start.right() + m.delta.x - 80.0).abs() < 0.001);
    }

    #[test]
    fn level_edges_act_as_walls() {
        let g = grid_from(&["...", "..."]);
        let left = move_bounds(&g, box_at(5.0, 10.0), Vec2::new(-20.0, 0.0));
        assert!(left.hit_x);
        assert_eq!(5.0 + left.delta.x, 0.0);

        let right = move_bounds(&g, box_at(95.0, 10.0), Vec2::new(20.0, 0.0));
        assert!(right.hit_x);
        assert!((95.0 + right.delta.x + 20.0 - g.pixel_width()).abs() < 0.001);
    }

    #[test]
    fn open_above_and_below_the_level() {
        let g = grid_from(&["...", "..."]);
        let up = move_bounds(&g, box_at(40.0, 5.0), Vec2::new(0.0, -50.0));
        assert!(!up.hit_y);
        let down = move_bounds(&g, box_at(40.0, 30.0), Vec2::new(0.0, 200.0));
        assert!(!down.hit_y);
    }

    #[test]
    fn ground_probe() {
        let g = grid_from(&["...", "#-."]);
        // Resting on the solid tile.
        let on_solid = Rect::new(5.0, 2.0, 20.0, 30.0);
        assert!(on_ground(&g, on_solid));
        // Resting on the platform.
        let on_platform = Rect::new(45.0, 2.0, 20.0, 30.0);
        assert!(on_ground(&g, on_platform));
        // Over the gap.
        let in_air = Rect::new(85.0, 2.0, 20.0, 30.0);
        assert!(!on_ground(&g, in_air));
        // Airborne well above the ground.
        let high = Rect::new(5.0, -60.0, 20.0, 30.0);
        assert!(!on_ground(&g, high));
    }
}
