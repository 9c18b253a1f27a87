/// One playable level: grid, entities, score, timer, camera.
///
/// `update` advances the whole level by one frame and returns the
/// events that happened, in order. The branch structure mirrors the
/// player's coarse state:
///
///   - dead or out of time: physics only, so the avatar settles, but
///     nothing else advances (no timer, no gems, no enemies),
///   - standing at the exit: remaining time converts to points,
///   - otherwise: normal play.
///
/// The bonus-life check runs first and the camera follows last, in
/// every branch.

use crate::domain::entity::{Enemy, FrameInput, Gem, GemKind, Player};
use crate::domain::geom::Vec2;
use crate::domain::grid::TileGrid;

use super::camera::Camera;
use super::event::GameEvent;
use super::parser::ParsedLevel;

/// Session-wide scoring knobs, normally read from the config file.
#[derive(Clone, Copy, Debug)]
pub struct Rules {
    pub time_limit: f32,
    pub points_per_second: u32,
    pub bonus_life_step: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            time_limit: 180.0,
            points_per_second: 5,
            bonus_life_step: 2000,
        }
    }
}

pub struct Level {
    grid: TileGrid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub gems: Vec<Gem>,
    start: Vec2,
    exit: Vec2,
    pub camera: Camera,
    pub score: u32,
    pub time_remaining: f32,
    pub reached_exit: bool,
    rules: Rules,
    next_life_score: u32,
}

impl Level {
    /// Build a level from parsed data. `lives` and `score` carry over
    /// from the previous level of the session.
    pub fn new(parsed: ParsedLevel, rules: Rules, lives: u32, score: u32) -> Self {
        let ParsedLevel { grid, start, exit, enemies, gems } = parsed;
        // Skip thresholds the carried score has already passed.
        let next_life_score = (score / rules.bonus_life_step + 1) * rules.bonus_life_step;
        Level {
            player: Player::new(start, lives),
            grid,
            enemies,
            gems,
            start,
            exit,
            camera: Camera::new(),
            score,
            time_remaining: rules.time_limit,
            reached_exit: false,
            rules,
            next_life_score,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn exit(&self) -> Vec2 {
        self.exit
    }

    /// Spend a life and respawn at the start point. Dying does not
    /// touch the life count; it is deducted here, on the explicit
    /// restart. Does nothing once the lives are gone.
    pub fn start_new_life(&mut self) {
        if self.player.lives == 0 {
            return;
        }
        self.player.lives -= 1;
        self.player.reset(self.start);
    }

    /// Advance one frame. `viewport` is the view extent in world units,
    /// used for camera tracking.
    pub fn update(&mut self, dt: f32, input: FrameInput, viewport: (f32, f32)) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.score > self.next_life_score {
            self.player.lives += 1;
            self.next_life_score += self.rules.bonus_life_step;
            events.push(GameEvent::BonusLife);
        }

        if !self.player.is_alive || self.time_remaining <= 0.0 {
            self.player.apply_physics(dt, FrameInput::default(), &self.grid);
        } else if self.reached_exit {
            self.convert_time_to_points(dt);
        } else {
            self.time_remaining -= dt;
            self.player.update(dt, input, &self.grid);
            self.update_gems(dt, &mut events);

            if self.player.is_alive
                && self.player.bounding_box().top() >= self.grid.pixel_height()
            {
                self.kill_player(&mut events);
            }

            self.update_enemies(dt, &mut events);

            if self.player.is_alive
                && self.player.is_on_ground
                && self.player.bounding_box().contains(self.exit)
            {
                self.reached_exit = true;
                self.player.on_reached_exit();
                events.push(GameEvent::ExitReached);
            }
        }

        if self.time_remaining < 0.0 {
            self.time_remaining = 0.0;
        }

        self.camera.follow(
            self.player.position,
            (self.grid.pixel_width(), self.grid.pixel_height()),
            viewport,
        );
        events
    }

    /// Drain the clock into the score while celebrating at the exit.
    /// Whole seconds only, at a fixed rate per frame, capped by what
    /// is actually left on the clock.
    fn convert_time_to_points(&mut self, dt: f32) {
        let rate = (dt as f64 * 100.0).round() as u32;
        let seconds = rate.min(self.time_remaining.ceil() as u32);
        self.time_remaining -= seconds as f32;
        self.score += seconds * self.rules.points_per_second;
    }

    fn update_gems(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let player_box = self.player.bounding_box();
        let mut i = 0;
        while i < self.gems.len() {
            self.gems[i].update(dt);
            if self.gems[i].bounding_box().intersects(&player_box) {
                let gem = self.gems.remove(i);
                self.score += Gem::POINT_VALUE;
                events.push(GameEvent::GemCollected);
                match gem.kind {
                    GemKind::Plain => {}
                    GemKind::PowerUp => {
                        self.player.start_power_up();
                        events.push(GameEvent::PowerUpStarted);
                    }
                    GemKind::Poison => {
                        self.player.start_poison();
                        events.push(GameEvent::Poisoned);
                    }
                }
            } else {
                i += 1;
            }
        }
    }

    fn update_enemies(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let player_box = self.player.bounding_box();
        let mut touched_player = false;

        for enemy in &mut self.enemies {
            enemy.update(dt, &self.grid);
            if !enemy.is_alive || !self.player.is_alive {
                continue;
            }
            if enemy.bounding_box().intersects(&player_box) {
                if self.player.is_powered_up() {
                    enemy.on_killed();
                    events.push(GameEvent::EnemyKilled);
                } else if !self.player.is_poisoned() {
                    touched_player = true;
                }
            }
        }

        if touched_player && self.player.is_alive {
            self.kill_player(events);
        }
    }

    fn kill_player(&mut self, events: &mut Vec<GameEvent>) {
        self.player.on_killed();
        events.push(GameEvent::PlayerKilled);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::parser;

    const DT: f32 = 1.0 / 60.0;
    const VIEW: (f32, f32) = (400.0, 320.0);

    fn level_from(rows: &[&str], lives: u32) -> Level {
        let parsed = parser::parse(&rows.join("\n")).unwrap();
        Level::new(parsed, Rules::default(), lives, 0)
    }

    fn step_until<F>(level: &mut Level, input: FrameInput, mut done: F) -> Vec<GameEvent>
    where
        F: FnMut(&Level, &[GameEvent]) -> bool,
    {
        let mut all = Vec::new();
        for _ in 0..600 {
            let events = level.update(DT, input, VIEW);
            all.extend(events.iter().copied());
            if done(level, &events) {
                return all;
            }
        }
        panic!("condition not reached in 600 frames");
    }

    fn walk_right() -> FrameInput {
        FrameInput { right: true, ..Default::default() }
    }

    #[test]
    fn gem_is_collected_once_and_scores() {
        let mut level = level_from(&["1.G..X", "######"], 3);
        let events = step_until(&mut level, walk_right(), |l, _| l.gems.is_empty());
        let collected = events.iter().filter(|e| **e == GameEvent::GemCollected).count();
        assert_eq!(collected, 1);
        assert_eq!(level.score, Gem::POINT_VALUE);
    }

    #[test]
    fn power_up_gem_grants_the_effect() {
        let mut level = level_from(&["1.P..X", "######"], 3);
        let events = step_until(&mut level, walk_right(), |l, _| l.gems.is_empty());
        assert!(events.contains(&GameEvent::PowerUpStarted));
        assert!(level.player.is_powered_up());
    }

    #[test]
    fn poison_gem_grants_the_effect() {
        let mut level = level_from(&["1.Q..X", "######"], 3);
        let events = step_until(&mut level, walk_right(), |l, _| l.gems.is_empty());
        assert!(events.contains(&GameEvent::Poisoned));
        assert!(level.player.is_poisoned());
    }

    #[test]
    fn enemy_contact_kills_a_normal_player() {
        let mut level = level_from(&["1...X", "#####"], 3);
        level.enemies.push(Enemy::new(level.player.position, "MonsterA"));
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(!level.player.is_alive);
        assert_eq!(level.player.lives, 3, "death alone costs nothing");
    }

    #[test]
    fn powered_up_player_kills_the_enemy_instead() {
        let mut level = level_from(&["1...X", "#####"], 3);
        level.enemies.push(Enemy::new(level.player.position, "MonsterB"));
        level.player.start_power_up();
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(events.contains(&GameEvent::EnemyKilled));
        assert!(level.player.is_alive);
        assert!(!level.enemies[0].is_alive);
    }

    #[test]
    fn poisoned_player_passes_through_enemies() {
        let mut level = level_from(&["1...X", "#####"], 3);
        level.enemies.push(Enemy::new(level.player.position, "MonsterC"));
        level.player.start_poison();
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(events.is_empty());
        assert!(level.player.is_alive);
        assert!(level.enemies[0].is_alive);
    }

    #[test]
    fn falling_out_of_the_level_kills() {
        let mut level = level_from(&["1..X", "..##"], 2);
        let events = step_until(&mut level, FrameInput::default(), |_, ev| {
            ev.contains(&GameEvent::PlayerKilled)
        });
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(!level.player.is_alive);
        assert_eq!(level.player.lives, 2);
    }

    #[test]
    fn reaching_the_exit_requires_no_gems() {
        let mut level = level_from(&["1.X..G", "######"], 3);
        let events = step_until(&mut level, walk_right(), |l, _| l.reached_exit);
        assert!(events.contains(&GameEvent::ExitReached));
        assert!(level.player.celebrating);
        assert_eq!(level.gems.len(), 1);
    }

    #[test]
    fn time_converts_to_points_at_the_exit() {
        let mut level = level_from(&["1.X", "###"], 3);
        level.reached_exit = true;
        level.player.on_reached_exit();
        level.time_remaining = 2.0;
        let before = level.score;

        // dt 0.1 asks for 10 seconds, the clock only holds 2.
        level.update(0.1, FrameInput::default(), VIEW);
        assert_eq!(level.score - before, 2 * Rules::default().points_per_second);
        assert_eq!(level.time_remaining, 0.0);

        // Nothing left to drain.
        level.update(0.1, FrameInput::default(), VIEW);
        assert_eq!(level.score - before, 2 * Rules::default().points_per_second);
    }

    #[test]
    fn death_freezes_the_world_but_not_physics() {
        let mut level = level_from(&["1.G.X", "#####"], 3);
        level.enemies.push(Enemy::new(Vec2::new(160.0, 32.0), "MonsterD"));
        level.player.lives = 1;
        level.update(DT, FrameInput::default(), VIEW);
        level.kill_player(&mut Vec::new());

        let time = level.time_remaining;
        let gem_pos = level.gems[0].position();
        let enemy_pos = level.enemies[0].position;
        for _ in 0..30 {
            let events = level.update(DT, walk_right(), VIEW);
            assert!(events.is_empty());
        }
        assert_eq!(level.time_remaining, time);
        assert_eq!(level.gems[0].position(), gem_pos);
        assert_eq!(level.enemies[0].position, enemy_pos);
    }

    #[test]
    fn out_of_time_freezes_the_world_too() {
        let mut level = level_from(&["1.G.X", "#####"], 3);
        level.time_remaining = 0.0;
        let gem_pos = level.gems[0].position();
        let events = level.update(DT, walk_right(), VIEW);
        assert!(events.is_empty());
        assert_eq!(level.gems[0].position(), gem_pos);
        assert_eq!(level.time_remaining, 0.0);
    }

    #[test]
    fn bonus_life_past_each_threshold() {
        let mut level = level_from(&["1.X", "###"], 3);
        level.score = 2000;
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(!events.contains(&GameEvent::BonusLife), "threshold is strict");

        level.score = 2001;
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(events.contains(&GameEvent::BonusLife));
        assert_eq!(level.player.lives, 4);

        // Same score, next threshold not yet passed.
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(!events.contains(&GameEvent::BonusLife));
    }

    #[test]
    fn carried_score_does_not_retrigger_old_thresholds() {
        let parsed = parser::parse("1.X\n###").unwrap();
        let mut level = Level::new(parsed, Rules::default(), 4, 2500);
        let events = level.update(DT, FrameInput::default(), VIEW);
        assert!(!events.contains(&GameEvent::BonusLife));
        assert_eq!(level.player.lives, 4);
    }

    #[test]
    fn new_life_restarts_at_the_spawn_point() {
        let mut level = level_from(&["1...X", "#####"], 2);
        let spawn = level.player.position;
        level.enemies.push(Enemy::new(spawn, "MonsterA"));
        level.update(DT, FrameInput::default(), VIEW);
        assert!(!level.player.is_alive);

        level.enemies.clear();
        level.start_new_life();
        assert!(level.player.is_alive);
        assert_eq!(level.player.lives, 1);
        assert_eq!(level.player.position, spawn);
    }

    #[test]
    fn last_life_plays_out_then_no_respawn() {
        let mut level = level_from(&["1...X", "#####"], 1);
        let spawn = level.player.position;
        level.enemies.push(Enemy::new(spawn, "MonsterA"));
        level.update(DT, FrameInput::default(), VIEW);
        assert!(!level.player.is_alive);
        assert_eq!(level.player.lives, 1);

        // The restart spends the last life and repositions.
        level.enemies.clear();
        level.start_new_life();
        assert!(level.player.is_alive);
        assert_eq!(level.player.lives, 0);
        assert_eq!(level.player.position, spawn);

        // Dead again with nothing left: restart is a no-op.
        level.kill_player(&mut Vec::new());
        level.start_new_life();
        assert!(!level.player.is_alive);
        assert_eq!(level.player.lives, 0);
    }

    #[test]
    fn camera_tracks_the_player() {
        let mut level = level_from(&[
            "1.................X",
            "###################",
        ], 3);
        step_until(&mut level, walk_right(), |l, _| l.camera.x > 0.0);
    }
}
