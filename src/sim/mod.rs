//! Simulation layer: level files in, frame updates and events out.

pub mod camera;
pub mod event;
pub mod level;
pub mod parser;
pub mod save;
