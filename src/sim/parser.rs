/// Level file parsing.
///
/// A level is a text file of equal-length rows, one character per tile:
///
/// ```text
///   .   open air                 1   player start
///   X   exit                     G   gem
///   P   power-up gem             Q   poison gem
///   -   platform (one-way)       ~   decorated platform
///   :   decorated passable       #   solid block
///   A-D monster patrol spawn
/// ```
///
/// Decorated tiles pick a random sprite variant; the RNG is seeded
/// with a fixed value so a given file always parses to the same
/// appearance. Start and exit are mandatory and unique.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::domain::entity::{Enemy, Gem, GemKind};
use crate::domain::geom::Vec2;
use crate::domain::grid::TileGrid;
use crate::domain::tile::{SpriteRef, Tile, TileCollision};

/// Seed for sprite variant selection.
pub const VARIETY_SEED: u64 = 354668;

#[derive(Debug, Error)]
pub enum LevelFormatError {
    #[error("level has no rows")]
    Empty,
    #[error("line {line} is {found} tiles wide, expected {expected}")]
    UnevenRow { line: usize, expected: usize, found: usize },
    #[error("unsupported tile character {ch:?} at line {line}, column {column}")]
    UnknownTile { ch: char, line: usize, column: usize },
    #[error("second player start at line {line}, column {column}")]
    DuplicateStart { line: usize, column: usize },
    #[error("second exit at line {line}, column {column}")]
    DuplicateExit { line: usize, column: usize },
    #[error("level has no player start")]
    MissingStart,
    #[error("level has no exit")]
    MissingExit,
}

/// A fully parsed level, ready to hand to the simulation.
#[derive(Debug)]
pub struct ParsedLevel {
    pub grid: TileGrid,
    /// Player spawn, bottom-center of the start tile.
    pub start: Vec2,
    /// Exit point, center of the exit tile.
    pub exit: Vec2,
    pub enemies: Vec<Enemy>,
    pub gems: Vec<Gem>,
}

pub fn parse(text: &str) -> Result<ParsedLevel, LevelFormatError> {
    parse_seeded(text, VARIETY_SEED)
}

pub fn parse_seeded(text: &str, seed: u64) -> Result<ParsedLevel, LevelFormatError> {
    let rows: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if rows.is_empty() {
        return Err(LevelFormatError::Empty);
    }

    let width = rows[0].chars().count();
    let height = rows.len();
    for (i, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LevelFormatError::UnevenRow {
                line: i + 1,
                expected: width,
                found,
            });
        }
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut tiles = Vec::with_capacity(width * height);
    let mut start = None;
    let mut exit = None;
    let mut enemies = Vec::new();
    let mut gems = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let tile = match ch {
                '.' => Tile::empty(),

                'X' => {
                    if exit.is_some() {
                        return Err(LevelFormatError::DuplicateExit {
                            line: y + 1,
                            column: x + 1,
                        });
                    }
                    exit = Some(tile_center(x, y));
                    Tile::new(
                        Some(SpriteRef { set: "Exit", variant: 0 }),
                        TileCollision::Passable,
                    )
                }

                '1' => {
                    if start.is_some() {
                        return Err(LevelFormatError::DuplicateStart {
                            line: y + 1,
                            column: x + 1,
                        });
                    }
                    start = Some(tile_bottom_center(x, y));
                    Tile::empty()
                }

                'G' | 'P' | 'Q' => {
                    let kind = match ch {
                        'G' => GemKind::Plain,
                        'P' => GemKind::PowerUp,
                        _ => GemKind::Poison,
                    };
                    gems.push(Gem::new(tile_center(x, y), kind));
                    Tile::empty()
                }

                'A' | 'B' | 'C' | 'D' => {
                    let set = match ch {
                        'A' => "MonsterA",
                        'B' => "MonsterB",
                        'C' => "MonsterC",
                        _ => "MonsterD",
                    };
                    enemies.push(Enemy::new(tile_bottom_center(x, y), set));
                    Tile::empty()
                }

                '-' => Tile::new(
                    Some(SpriteRef { set: "Platform", variant: 0 }),
                    TileCollision::Platform,
                ),

                '~' => variety_tile(&mut rng, "BlockB", 2, TileCollision::Platform),
                ':' => variety_tile(&mut rng, "BlockB", 2, TileCollision::Passable),
                '#' => variety_tile(&mut rng, "BlockA", 7, TileCollision::Impassable),

                _ => {
                    return Err(LevelFormatError::UnknownTile {
                        ch,
                        line: y + 1,
                        column: x + 1,
                    })
                }
            };
            tiles.push(tile);
        }
    }

    let start = start.ok_or(LevelFormatError::MissingStart)?;
    let exit = exit.ok_or(LevelFormatError::MissingExit)?;

    Ok(ParsedLevel {
        grid: TileGrid::new(tiles, width, height),
        start,
        exit,
        enemies,
        gems,
    })
}

fn variety_tile(rng: &mut SmallRng, set: &'static str, variants: u8, collision: TileCollision) -> Tile {
    let variant = rng.gen_range(0..variants);
    Tile::new(Some(SpriteRef { set, variant }), collision)
}

fn tile_center(x: usize, y: usize) -> Vec2 {
    Vec2::new(
        x as f32 * Tile::WIDTH + Tile::WIDTH / 2.0,
        y as f32 * Tile::HEIGHT + Tile::HEIGHT / 2.0,
    )
}

fn tile_bottom_center(x: usize, y: usize) -> Vec2 {
    Vec2::new(
        x as f32 * Tile::WIDTH + Tile::WIDTH / 2.0,
        (y + 1) as f32 * Tile::HEIGHT,
    )
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
