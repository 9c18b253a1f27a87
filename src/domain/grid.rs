/// TileGrid: immutable 2D lookup of tiles, built once at level load.
///
/// Storage is a single flat buffer indexed `y * width + x`. All bounds
/// handling lives in `collision_at`, which takes signed coordinates so
/// callers never have to range-check before a lookup:
///
///   - Horizontal out-of-range resolves to Impassable (entities cannot
///     leave the level past the left or right edge).
///   - Vertical out-of-range resolves to Passable (entities may jump
///     above the top of the level and fall below the bottom).

use super::geom::Rect;
use super::tile::{Tile, TileCollision};

#[derive(Debug)]
pub struct TileGrid {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl TileGrid {
    /// Build a grid from a row-major tile buffer.
    /// Callers (the parser) guarantee `tiles.len() == width * height`
    /// and both dimensions nonzero.
    pub fn new(tiles: Vec<Tile>, width: usize, height: usize) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert_eq!(tiles.len(), width * height);
        TileGrid { tiles, width, height }
    }

    /// Width of the level measured in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the level measured in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Level extent in world units.
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * Tile::WIDTH
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * Tile::HEIGHT
    }

    /// Tile at an in-bounds coordinate. Used by the renderer, which
    /// only iterates the visible range.
    pub fn tile(&self, x: usize, y: usize) -> &Tile {
        &self.tiles[y * self.width + x]
    }

    /// Collision kind at any coordinate, applying the out-of-bounds
    /// policy described above.
    pub fn collision_at(&self, x: i32, y: i32) -> TileCollision {
        if x < 0 || x >= self.width as i32 {
            return TileCollision::Impassable;
        }
        if y < 0 || y >= self.height as i32 {
            return TileCollision::Passable;
        }
        self.tiles[y as usize * self.width + x as usize].collision
    }

    /// Bounding rectangle of a tile cell in world units.
    pub fn cell_bounds(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x as f32 * Tile::WIDTH,
            y as f32 * Tile::HEIGHT,
            Tile::WIDTH,
            Tile::HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::SpriteRef;

    fn grid_3x2() -> TileGrid {
        // Row 0: passable; row 1: solid.
        let mut tiles = vec![Tile::empty(); 6];
        for x in 0..3 {
            tiles[3 + x] = Tile::new(
                Some(SpriteRef { set: "BlockA", variant: 0 }),
                TileCollision::Impassable,
            );
        }
        TileGrid::new(tiles, 3, 2)
    }

    #[test]
    fn in_bounds_lookup() {
        let g = grid_3x2();
        assert_eq!(g.collision_at(0, 0), TileCollision::Passable);
        assert_eq!(g.collision_at(2, 1), TileCollision::Impassable);
    }

    #[test]
    fn horizontal_out_of_range_is_impassable() {
        let g = grid_3x2();
        assert_eq!(g.collision_at(-1, 0), TileCollision::Impassable);
        assert_eq!(g.collision_at(3, 0), TileCollision::Impassable);
        assert_eq!(g.collision_at(-1, 100), TileCollision::Impassable);
    }

    #[test]
    fn vertical_out_of_range_is_passable() {
        let g = grid_3x2();
        assert_eq!(g.collision_at(1, -1), TileCollision::Passable);
        assert_eq!(g.collision_at(1, 2), TileCollision::Passable);
    }

    #[test]
    fn cell_bounds_in_world_units() {
        let g = grid_3x2();
        let b = g.cell_bounds(2, 1);
        assert_eq!(b.left(), 2.0 * Tile::WIDTH);
        assert_eq!(b.top(), Tile::HEIGHT);
        assert_eq!(b.w, Tile::WIDTH);
        assert_eq!(b.h, Tile::HEIGHT);
    }
}
