/// Tile collision kinds and the per-cell tile record.
/// Collision semantics are queried via methods, not stored as flags,
/// so tile behavior is centralized here.

/// Controls which movement directions a tile blocks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileCollision {
    /// No collision at all.
    Passable,
    /// Solid on all sides.
    Impassable,
    /// Solid only to an entity landing on its top surface;
    /// passable from the sides and from below.
    Platform,
}

impl TileCollision {
    /// Can an entity rest on top of this tile?
    pub fn supports(self) -> bool {
        matches!(self, TileCollision::Impassable | TileCollision::Platform)
    }
}

/// Sprite reference for the renderer. Opaque to the simulation:
/// physics only ever reads `collision`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpriteRef {
    pub set: &'static str,
    pub variant: u8,
}

/// One cell of the level grid.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    pub sprite: Option<SpriteRef>,
    pub collision: TileCollision,
}

impl Tile {
    /// Tile extent in world units.
    pub const WIDTH: f32 = 40.0;
    pub const HEIGHT: f32 = 32.0;

    pub fn new(sprite: Option<SpriteRef>, collision: TileCollision) -> Self {
        Tile { sprite, collision }
    }

    pub fn empty() -> Self {
        Tile { sprite: None, collision: TileCollision::Passable }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::empty()
    }
}
