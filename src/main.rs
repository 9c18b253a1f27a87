/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::level::Level;
use sim::parser::{self, ParsedLevel};
use sim::save;
use ui::input::InputState;
use ui::renderer::{HudInfo, Renderer};
use ui::sound::SoundEngine;

const FRAME_TIME: Duration = Duration::from_millis(16);
/// Upper bound on a simulation step, so a stall (suspend, resize,
/// debugger) doesn't teleport entities through walls.
const MAX_DT: f32 = 0.1;

/// Built-in levels, used when no levels directory is found.
const FALLBACK_LEVELS: [&str; 3] = [
    "\
....................
......G......G......
....####....####....
.G................G.
1...A.......B......X
####################",
    "\
........................
..P..........Q..........
.###.........:::........
.....G.....G.....G.....X
....---.....---.....####
1..C.........D..........
####~~~~####~~~~####~~##",
    "\
............................
..........Q.................
....####....####............
..G......G.........G......X.
..........................#.
....P.......................
1....B........C....D........
############################",
];

fn main() {
    let config = GameConfig::load();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let mut session = Session::new(&config);
    let result = game_loop(&mut session, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    let high_score_path = save::high_score_path();
    let best = save::record_score(&high_score_path, session.level.score);
    println!();
    println!("Thanks for playing Gem Runner!");
    println!("Final Score: {}   Best: {}", session.level.score, best);
}

// ══════════════════════════════════════════════════════════════
// Session: sequential levels with carried score and lives
// ══════════════════════════════════════════════════════════════

struct Session<'a> {
    config: &'a GameConfig,
    level: Level,
    level_index: usize,
    high_score: u32,
    paused: bool,
}

impl<'a> Session<'a> {
    fn new(config: &'a GameConfig) -> Self {
        let parsed = load_level(config, 0);
        let high_score = save::load_high_score(&save::high_score_path());
        Session {
            config,
            level: Level::new(parsed, config.rules(), config.scoring.starting_lives, 0),
            level_index: 0,
            high_score,
            paused: false,
        }
    }

    fn load(&mut self, index: usize, lives: u32, score: u32) {
        let parsed = load_level(self.config, index);
        self.level_index = index;
        self.level = Level::new(parsed, self.config.rules(), lives, score);
    }

    fn next_level(&mut self) {
        self.load(
            self.level_index + 1,
            self.level.player.lives,
            self.level.score,
        );
    }

    fn reload_level(&mut self) {
        self.load(self.level_index, self.level.player.lives, self.level.score);
    }

    fn restart(&mut self) {
        self.high_score = save::record_score(&save::high_score_path(), self.level.score);
        self.load(0, self.config.scoring.starting_lives, 0);
    }

    /// The "press Enter" prompt, if the level is waiting for one.
    fn status_message(&self) -> Option<&'static str> {
        let level = &self.level;
        if !level.player.is_alive {
            if level.player.lives == 0 {
                Some("GAME OVER    Enter: new game")
            } else {
                Some("You died!    Enter: try again")
            }
        } else if level.time_remaining <= 0.0 {
            if level.reached_exit {
                Some("Level clear!    Enter: next level")
            } else {
                Some("Time's up!    Enter: retry")
            }
        } else {
            None
        }
    }

    /// Advance past whatever the status message was waiting on.
    fn continue_pressed(&mut self) {
        if !self.level.player.is_alive {
            if self.level.player.lives == 0 {
                self.restart();
            } else {
                self.level.start_new_life();
            }
        } else if self.level.time_remaining <= 0.0 {
            if self.level.reached_exit {
                self.high_score = save::record_score(&save::high_score_path(), self.level.score);
                self.next_level();
            } else {
                self.reload_level();
            }
        }
    }
}

/// Read `<levels_dir>/<n>.txt`, wrapping to level 1 when the sequence
/// runs out. Falls back to the built-in set when no usable files exist.
fn load_level(config: &GameConfig, index: usize) -> ParsedLevel {
    let count = level_file_count(config);
    if count > 0 {
        let n = index % count + 1;
        let path = config.levels_dir.join(format!("{n}.txt"));
        match std::fs::read_to_string(&path) {
            Ok(text) => match parser::parse_seeded(&text, config.variety_seed) {
                Ok(parsed) => return parsed,
                Err(e) => eprintln!("Warning: {}: {e}", path.display()),
            },
            Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
        }
    }

    let text = FALLBACK_LEVELS[index % FALLBACK_LEVELS.len()];
    parser::parse_seeded(text, config.variety_seed).unwrap_or_else(|e| {
        // Built-in levels are compile-time data; a parse failure here
        // is a programming error, not a user error.
        panic!("built-in level {} invalid: {e}", index % FALLBACK_LEVELS.len())
    })
}

/// Number of consecutive `1.txt`, `2.txt`, ... files in the levels dir.
fn level_file_count(config: &GameConfig) -> usize {
    let mut n = 0;
    while config.levels_dir.join(format!("{}.txt", n + 1)).is_file() {
        n += 1;
    }
    n
}

// ══════════════════════════════════════════════════════════════
// Game loop
// ══════════════════════════════════════════════════════════════

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q')]) {
            break;
        }
        if kb.any_pressed(&[KeyCode::Char('p'), KeyCode::Char('P')]) {
            session.paused = !session.paused;
        }
        if kb.was_pressed(KeyCode::Enter) {
            session.continue_pressed();
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32().min(MAX_DT);
        last_frame = now;

        if !session.paused {
            let events = session.level.update(dt, kb.frame_input(), renderer.viewport_world());
            if let Some(sfx) = sound {
                for event in &events {
                    sfx.play_event(*event);
                }
            }
            session.high_score = session.high_score.max(session.level.score);
        }

        let hud = HudInfo {
            level_number: session.level_index + 1,
            high_score: session.high_score,
            paused: session.paused,
            message: session.status_message(),
        };
        renderer.render(&session.level, &hud)?;

        let elapsed = last_frame.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_levels_parse() {
        for (i, text) in FALLBACK_LEVELS.iter().enumerate() {
            let parsed = parser::parse(text)
                .unwrap_or_else(|e| panic!("level {i}: {e}"));
            assert!(!parsed.gems.is_empty(), "level {i} has no gems");
            assert!(!parsed.enemies.is_empty(), "level {i} has no enemies");
        }
    }

    #[test]
    fn built_in_exits_stand_on_support() {
        use crate::domain::tile::Tile;
        for (i, text) in FALLBACK_LEVELS.iter().enumerate() {
            let parsed = parser::parse(text).unwrap();
            let tx = (parsed.exit.x / Tile::WIDTH).floor() as i32;
            let ty = (parsed.exit.y / Tile::HEIGHT).floor() as i32;
            assert!(
                parsed.grid.collision_at(tx, ty + 1).supports(),
                "level {i}: exit floats in the air"
            );
        }
    }
}
