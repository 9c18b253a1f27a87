//! Pure gameplay model: geometry, tiles, entities, collision.
//! Nothing in here touches the terminal, the clock, or the filesystem.

pub mod entity;
pub mod geom;
pub mod grid;
pub mod physics;
pub mod tile;
