//! Terminal shell: input polling, rendering, sound.

pub mod input;
pub mod renderer;
pub mod sound;
