/// Entities: Player, Enemy, Gem.
///
/// All three share the same shape: a world-unit position anchored at
/// the bottom-center (gems: center), a bounding box derived from the
/// anchor, an alive/collectible flag, and a per-frame update. Behavior
/// is per-kind data plus a small state machine, no trait hierarchy.

use super::geom::{Rect, Vec2};
use super::grid::TileGrid;
use super::physics;
use super::tile::{Tile, TileCollision};

/// Pre-decoded boolean input intents for one frame. Device polling and
/// debouncing happen in the UI shell; the simulation only ever sees
/// these flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl FrameInput {
    /// Horizontal movement factor in [-1, 1].
    pub fn movement(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// The player avatar.
///
/// State machine: Normal, PoweredUp (timed), Poisoned (timed), Dead,
/// CelebratingAtExit. The timed effects are represented as countdown
/// timers; Dead and celebrating as flags. While dead or celebrating,
/// input is ignored but physics still integrates, so the avatar
/// settles onto the ground instead of freezing mid-air.
#[derive(Clone, Debug)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub lives: u32,
    pub is_alive: bool,
    pub is_on_ground: bool,
    pub celebrating: bool,
    power_up_time: f32,
    poison_time: f32,
    jump_time: f32,
    was_jumping: bool,
}

// Movement tuning, in world units and seconds.
const MOVE_ACCELERATION: f32 = 13000.0;
const MAX_MOVE_SPEED: f32 = 1750.0;
const GROUND_DRAG_FACTOR: f32 = 0.48;
const AIR_DRAG_FACTOR: f32 = 0.58;
const GRAVITY_ACCELERATION: f32 = 3400.0;
const MAX_FALL_SPEED: f32 = 550.0;

// Variable-height jump: launch velocity decays over the hold window.
const MAX_JUMP_TIME: f32 = 0.35;
const JUMP_LAUNCH_VELOCITY: f32 = -3500.0;
const JUMP_CONTROL_POWER: f32 = 0.14;

const MAX_POWER_UP_TIME: f32 = 6.0;
const MAX_POISON_TIME: f32 = 8.0;

impl Player {
    pub const WIDTH: f32 = 25.0;
    pub const HEIGHT: f32 = 51.0;

    pub fn new(start: Vec2, lives: u32) -> Self {
        Player {
            position: start,
            velocity: Vec2::ZERO,
            lives,
            is_alive: true,
            is_on_ground: false,
            celebrating: false,
            power_up_time: 0.0,
            poison_time: 0.0,
            jump_time: 0.0,
            was_jumping: false,
        }
    }

    /// Reposition at a spawn point for a fresh life.
    pub fn reset(&mut self, start: Vec2) {
        self.position = start;
        self.velocity = Vec2::ZERO;
        self.is_alive = true;
        self.celebrating = false;
        self.power_up_time = 0.0;
        self.poison_time = 0.0;
        self.jump_time = 0.0;
        self.was_jumping = false;
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_anchor(self.position, Self::WIDTH, Self::HEIGHT)
    }

    pub fn is_powered_up(&self) -> bool {
        self.power_up_time > 0.0
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison_time > 0.0
    }

    pub fn start_power_up(&mut self) {
        self.power_up_time = MAX_POWER_UP_TIME;
    }

    pub fn start_poison(&mut self) {
        self.poison_time = MAX_POISON_TIME;
    }

    pub fn on_killed(&mut self) {
        self.is_alive = false;
    }

    pub fn on_reached_exit(&mut self) {
        self.celebrating = true;
    }

    /// Normal-play update: tick effect timers, then integrate physics
    /// with input-driven movement.
    pub fn update(&mut self, dt: f32, input: FrameInput, grid: &TileGrid) {
        if self.power_up_time > 0.0 {
            self.power_up_time = (self.power_up_time - dt).max(0.0);
        }
        if self.poison_time > 0.0 {
            self.poison_time = (self.poison_time - dt).max(0.0);
        }
        self.apply_physics(dt, input, grid);
    }

    /// Integrate velocity and resolve against the grid. Input is
    /// honored only while alive and not celebrating; the dead/paused
    /// branches of the level update call this with no input so gravity
    /// keeps acting.
    pub fn apply_physics(&mut self, dt: f32, input: FrameInput, grid: &TileGrid) {
        let accepting_input = self.is_alive && !self.celebrating;
        let movement = if accepting_input { input.movement() } else { 0.0 };
        let jumping = accepting_input && input.jump;

        self.velocity.x += movement * MOVE_ACCELERATION * dt;
        self.velocity.y = (self.velocity.y + GRAVITY_ACCELERATION * dt)
            .clamp(-MAX_FALL_SPEED, MAX_FALL_SPEED);
        self.velocity.y = self.do_jump(self.velocity.y, jumping, dt);

        let drag = if self.is_on_ground { GROUND_DRAG_FACTOR } else { AIR_DRAG_FACTOR };
        self.velocity.x *= drag;
        self.velocity.x = self.velocity.x.clamp(-MAX_MOVE_SPEED, MAX_MOVE_SPEED);

        let moved = physics::move_bounds(grid, self.bounding_box(), self.velocity * dt);
        self.position += moved.delta;
        if moved.hit_x {
            self.velocity.x = 0.0;
        }
        if moved.hit_y {
            self.velocity.y = 0.0;
        }
        self.is_on_ground = moved.landed || physics::on_ground(grid, self.bounding_box());
    }

    /// Variable-height jump: launching is only possible from the
    /// ground; holding the jump intent sustains ascent up to
    /// MAX_JUMP_TIME with a power-curve falloff.
    fn do_jump(&mut self, mut velocity_y: f32, jumping: bool, dt: f32) -> f32 {
        if jumping {
            if (!self.was_jumping && self.is_on_ground) || self.jump_time > 0.0 {
                self.jump_time += dt;
            }
            if 0.0 < self.jump_time && self.jump_time <= MAX_JUMP_TIME {
                velocity_y = JUMP_LAUNCH_VELOCITY
                    * (1.0 - (self.jump_time / MAX_JUMP_TIME).powf(JUMP_CONTROL_POWER));
            } else {
                self.jump_time = 0.0;
            }
        } else {
            self.jump_time = 0.0;
        }
        self.was_jumping = jumping;
        velocity_y
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

/// A patrolling monster. Walks at constant speed, pauses briefly at a
/// wall or ledge, then reverses. Death is terminal: a dead enemy stops
/// updating and is skipped by collision checks, but stays in the
/// level's collection so the renderer can keep drawing the corpse.
#[derive(Clone, Debug)]
pub struct Enemy {
    pub position: Vec2,
    /// Patrol direction, -1 or +1.
    pub direction: i32,
    pub is_alive: bool,
    /// Which sprite set this enemy uses. Opaque to physics.
    pub sprite_set: &'static str,
    wait_time: f32,
}

const ENEMY_MOVE_SPEED: f32 = 64.0;
/// Pause at a turn point before reversing.
const MAX_WAIT_TIME: f32 = 0.5;

impl Enemy {
    pub const WIDTH: f32 = 22.0;
    pub const HEIGHT: f32 = 44.0;

    pub fn new(position: Vec2, sprite_set: &'static str) -> Self {
        Enemy {
            position,
            direction: -1,
            is_alive: true,
            sprite_set,
            wait_time: 0.0,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_anchor(self.position, Self::WIDTH, Self::HEIGHT)
    }

    pub fn on_killed(&mut self) {
        self.is_alive = false;
    }

    pub fn update(&mut self, dt: f32, grid: &TileGrid) {
        if !self.is_alive {
            return;
        }

        if self.wait_time > 0.0 {
            self.wait_time -= dt;
            if self.wait_time <= 0.0 {
                self.direction = -self.direction;
            }
            return;
        }

        // Probe one unit past the leading edge of the bounding box.
        // tile_y is the row under the feet (the supporting floor).
        let probe_x = self.position.x + (Self::WIDTH / 2.0 + 1.0) * self.direction as f32;
        let tile_x = (probe_x / Tile::WIDTH).floor() as i32;
        let tile_y = (self.position.y / Tile::HEIGHT).floor() as i32;

        if grid.collision_at(tile_x, tile_y - 1) == TileCollision::Impassable
            || !grid.collision_at(tile_x, tile_y).supports()
        {
            // Wall ahead, or the supporting floor ends: wait, then turn.
            self.wait_time = MAX_WAIT_TIME;
        } else {
            let step = Vec2::new(self.direction as f32 * ENEMY_MOVE_SPEED * dt, 0.0);
            let moved = physics::move_bounds(grid, self.bounding_box(), step);
            self.position += moved.delta;
            if moved.hit_x {
                self.wait_time = MAX_WAIT_TIME;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Gem
// ══════════════════════════════════════════════════════════════

/// What collecting a gem does to the player, beyond points.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GemKind {
    Plain,
    PowerUp,
    Poison,
}

/// A collectible gem. Bobs up and down around its base position; the
/// oscillation is cosmetic but the bounding box follows it. Collection
/// is terminal: the level removes the gem from its collection, so no
/// collected flag is needed here.
#[derive(Clone, Debug)]
pub struct Gem {
    base: Vec2,
    pub kind: GemKind,
    age: f32,
}

const BOUNCE_HEIGHT: f32 = 0.18;
const BOUNCE_RATE: f32 = 3.0;
/// Phase offset per world-unit of X, so neighboring gems ripple.
const BOUNCE_SYNC: f32 = -0.75;

impl Gem {
    pub const POINT_VALUE: u32 = 30;

    /// Half-extent of the collision box around the center.
    const EXTENT: f32 = Tile::WIDTH / 3.0;

    pub fn new(base: Vec2, kind: GemKind) -> Self {
        Gem { base, kind, age: 0.0 }
    }

    /// Current center including the bob offset.
    pub fn position(&self) -> Vec2 {
        let phase = self.age * BOUNCE_RATE + self.base.x / Tile::WIDTH * BOUNCE_SYNC;
        let bounce = phase.sin() * BOUNCE_HEIGHT * Tile::HEIGHT;
        Vec2::new(self.base.x, self.base.y + bounce)
    }

    pub fn bounding_box(&self) -> Rect {
        let p = self.position();
        Rect::new(
            p.x - Self::EXTENT,
            p.y - Self::EXTENT,
            Self::EXTENT * 2.0,
            Self::EXTENT * 2.0,
        )
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::SpriteRef;

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
                let sprite = (collision != TileCollision::Passable)
                    .then_some(SpriteRef { set: "BlockA", variant: 0 });
                tiles.push(Tile::new(sprite, collision));
            }
        }
        TileGrid::new(tiles, width, height)
    }

    /// Bottom-center of a tile cell, in world units.
    fn bottom_center(x: usize, y: usize) -> Vec2 {
        Vec2::new(
            x as f32 * Tile::WIDTH + Tile::WIDTH / 2.0,
            (y + 1) as f32 * Tile::HEIGHT,
        )
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn player_settles_onto_the_floor() {
        let g = grid_from(&["....", "....", "####"]);
        let mut p = Player::new(bottom_center(1, 0), 3);
        for _ in 0..120 {
            p.update(DT, FrameInput::default(), &g);
        }
        assert!(p.is_on_ground);
        assert!((p.position.y - 2.0 * Tile::HEIGHT).abs() < 0.5);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn player_walks_right_under_input() {
        let g = grid_from(&["......", "######"]);
        let mut p = Player::new(bottom_center(1, 0), 3);
        let right = FrameInput { right: true, ..Default::default() };
        for _ in 0..30 {
            p.update(DT, right, &g);
        }
        assert!(p.position.x > bottom_center(1, 0).x);
    }

    #[test]
    fn player_cannot_leave_the_level_horizontally() {
        let g = grid_from(&["...", "###"]);
        let mut p = Player::new(bottom_center(0, 0), 3);
        let left = FrameInput { left: true, ..Default::default() };
        for _ in 0..120 {
            p.update(DT, left, &g);
        }
        assert!(p.bounding_box().left() >= -0.001);
    }

    #[test]
    fn jump_lifts_off_only_from_the_ground() {
        let g = grid_from(&["....", "....", "####"]);
        let mut p = Player::new(bottom_center(1, 1), 3);
        // Settle first.
        for _ in 0..30 {
            p.update(DT, FrameInput::default(), &g);
        }
        let rest_y = p.position.y;
        let jump = FrameInput { jump: true, ..Default::default() };
        for _ in 0..10 {
            p.update(DT, jump, &g);
        }
        assert!(p.position.y < rest_y);
        assert!(!p.is_on_ground);
    }

    #[test]
    fn power_up_expires() {
        let g = grid_from(&["...", "###"]);
        let mut p = Player::new(bottom_center(1, 0), 3);
        p.start_power_up();
        assert!(p.is_powered_up());
        for _ in 0..(6.5 / DT) as usize {
            p.update(DT, FrameInput::default(), &g);
        }
        assert!(!p.is_powered_up());
    }

    #[test]
    fn poison_expires() {
        let g = grid_from(&["...", "###"]);
        let mut p = Player::new(bottom_center(1, 0), 3);
        p.start_poison();
        assert!(p.is_poisoned());
        for _ in 0..(8.5 / DT) as usize {
            p.update(DT, FrameInput::default(), &g);
        }
        assert!(!p.is_poisoned());
    }

    #[test]
    fn dead_player_ignores_input_but_still_falls() {
        let g = grid_from(&["....", "....", "####"]);
        let mut p = Player::new(bottom_center(1, 0), 1);
        p.on_killed();
        let start_x = p.position.x;
        let input = FrameInput { right: true, jump: true, ..Default::default() };
        for _ in 0..60 {
            p.apply_physics(DT, input, &g);
        }
        assert_eq!(p.position.x, start_x);
        assert!(p.is_on_ground); // gravity still ran
    }

    #[test]
    fn enemy_turns_at_a_wall() {
        let g = grid_from(&["#....", "#####"]);
        let mut e = Enemy::new(bottom_center(2, 0), "MonsterA");
        assert_eq!(e.direction, -1);
        // Walk left into the wall and wait out the turn pause.
        let mut frames = 0;
        while e.direction == -1 && frames < 600 {
            e.update(DT, &g);
            frames += 1;
        }
        assert_eq!(e.direction, 1);
        assert!(e.bounding_box().left() > Tile::WIDTH - 0.5);
    }

    #[test]
    fn enemy_turns_at_a_ledge() {
        let g = grid_from(&[".....", "..###"]);
        let mut e = Enemy::new(bottom_center(4, 0), "MonsterB");
        for _ in 0..(6.0 / DT) as usize {
            e.update(DT, &g);
        }
        // Never walked off the supporting run of tiles.
        let left_edge = 2.0 * Tile::WIDTH;
        assert!(e.position.x >= left_edge - Tile::WIDTH / 2.0);
    }

    #[test]
    fn dead_enemy_stops_moving() {
        let g = grid_from(&[".....", "#####"]);
        let mut e = Enemy::new(bottom_center(2, 0), "MonsterC");
        e.on_killed();
        let x = e.position.x;
        for _ in 0..60 {
            e.update(DT, &g);
        }
        assert_eq!(e.position.x, x);
    }

    #[test]
    fn gem_bobs_around_its_base() {
        let base = Vec2::new(60.0, 48.0);
        let mut gem = Gem::new(base, GemKind::Plain);
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..240 {
            gem.update(DT);
            let y = gem.position().y;
            min = min.min(y);
            max = max.max(y);
        }
        assert!(max > base.y && min < base.y);
        assert!(max - min <= 2.0 * BOUNCE_HEIGHT * Tile::HEIGHT + 0.01);
        assert_eq!(gem.position().x, base.x);
    }
}
