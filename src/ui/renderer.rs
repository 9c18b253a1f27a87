/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// Each tile maps to 2 terminal columns by 1 row, so the aspect ratio
/// of typical terminal fonts roughly matches the tile shape. The view
/// scrolls in whole tiles, driven by the level's camera.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Enemy, Gem, GemKind, Player};
use crate::domain::geom::Vec2;
use crate::domain::tile::{SpriteRef, Tile};
use crate::sim::level::Level;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, used
    /// for both Clear and per-cell backgrounds so inter-row gap pixels
    /// never show through as a different color.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 22, b: 38 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: Cell::BASE_BG }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg));
            cx += 1;
        }
    }
}

// ── Layout ──

/// Each tile occupies 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, help line below it.
const RESERVED_ROWS: usize = MAP_ROW + 1;

/// Per-frame HUD and overlay data owned by the session loop.
pub struct HudInfo<'a> {
    pub level_number: usize,
    pub high_score: u32,
    pub paused: bool,
    pub message: Option<&'a str>,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Current view extent in world units, for camera tracking.
    pub fn viewport_world(&self) -> (f32, f32) {
        let tiles_w = (self.term_w / CELL_W).max(1);
        let tiles_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        (tiles_w as f32 * Tile::WIDTH, tiles_h as f32 * Tile::HEIGHT)
    }

    pub fn render(&mut self, level: &Level, hud: &HudInfo) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(level, hud);
        self.compose_map(level);
        if let Some(msg) = hud.message {
            self.compose_banner(msg);
        }
        if hud.paused {
            self.compose_banner("PAUSED  (P to resume)");
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, level: &Level, hud: &HudInfo) {
        let time = level.time_remaining.ceil() as u32;
        let line = format!(
            " Level {:<2}  Score:{:<7}  Time:{:>3}  Lives:{}  Hi:{} ",
            hud.level_number,
            level.score,
            time,
            level.player.lives,
            hud.high_score,
        );
        let fg = if time <= 30 { Color::Red } else { Color::White };
        self.front.put_str(0, HUD_ROW, &line, fg);

        let help = " a/d or arrows: move   w/space: jump   p: pause   esc: quit ";
        let help_row = self.term_h.saturating_sub(1);
        self.front.put_str(0, help_row, help, Color::DarkGrey);
    }

    fn compose_map(&mut self, level: &Level) {
        let grid = level.grid();
        let cam = level.camera;
        let first_col = (cam.x / Tile::WIDTH).floor().max(0.0) as usize;
        let first_row = (cam.y / Tile::HEIGHT).floor().max(0.0) as usize;
        let tiles_w = (self.term_w / CELL_W).max(1);
        let tiles_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1);

        // Static tiles
        for vy in 0..tiles_h {
            let ty = first_row + vy;
            if ty >= grid.height() { break; }
            for vx in 0..tiles_w {
                let tx = first_col + vx;
                if tx >= grid.width() { break; }
                if let Some(sprite) = grid.tile(tx, ty).sprite {
                    let (ch, fg) = tile_glyph(sprite);
                    self.put_tile(vx, vy, ch, fg);
                }
            }
        }

        // Entities, painter's order: gems, enemies, player on top
        for gem in &level.gems {
            let (ch, fg) = gem_glyph(gem);
            self.put_world(gem.position(), first_col, first_row, ch, fg);
        }
        for enemy in &level.enemies {
            let (ch, fg) = enemy_glyph(enemy);
            // Anchor is bottom-center; step up one unit into the body tile.
            let feet = enemy.position + Vec2::new(0.0, -1.0);
            self.put_world(feet, first_col, first_row, ch, fg);
        }
        let player = &level.player;
        let (ch, fg) = player_glyph(player);
        let feet = player.position + Vec2::new(0.0, -1.0);
        self.put_world(feet, first_col, first_row, ch, fg);
    }

    /// Place a glyph in the double-width cell for a view-space tile.
    fn put_tile(&mut self, vx: usize, vy: usize, ch: char, fg: Color) {
        let x = vx * CELL_W;
        let y = MAP_ROW + vy;
        self.front.set(x, y, Cell::new(ch, fg));
        self.front.set(x + 1, y, Cell::new(ch, fg));
    }

    /// Place an entity glyph at a world position (single centered char).
    fn put_world(&mut self, pos: Vec2, first_col: usize, first_row: usize, ch: char, fg: Color) {
        let tx = (pos.x / Tile::WIDTH).floor() as i32;
        let ty = (pos.y / Tile::HEIGHT).floor() as i32;
        let vx = tx - first_col as i32;
        let vy = ty - first_row as i32;
        if vx < 0 || vy < 0 {
            return;
        }
        let x = vx as usize * CELL_W;
        let y = MAP_ROW + vy as usize;
        self.front.set(x, y, Cell::new(ch, fg));
        self.front.set(x + 1, y, Cell::new(' ', fg));
    }

    /// Centered single-line banner over the map area.
    fn compose_banner(&mut self, msg: &str) {
        let row = MAP_ROW + self.term_h.saturating_sub(RESERVED_ROWS) / 2;
        let text = format!("  {}  ", msg);
        let x = (self.term_w.saturating_sub(text.chars().count())) / 2;
        for (i, ch) in text.chars().enumerate() {
            self.front.set(x + i, row, Cell { ch, fg: Color::Black, bg: Color::Yellow });
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame. Not ResetColor:
        // the terminal's native default may differ from BASE_BG and
        // cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                let mut tmp = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut tmp)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Glyph tables ──

fn tile_glyph(sprite: SpriteRef) -> (char, Color) {
    match sprite.set {
        "BlockA" => {
            // Rock blocks shade per variant so runs of wall look uneven.
            let shade = 120 + (sprite.variant % 7) * 12;
            ('█', Color::Rgb { r: shade, g: shade - 30, b: 60 })
        }
        "BlockB" => ('▒', Color::Rgb { r: 90, g: 140, b: 90 }),
        "Platform" => ('▀', Color::Rgb { r: 160, g: 120, b: 70 }),
        "Exit" => ('Π', Color::Yellow),
        _ => ('?', Color::Magenta),
    }
}

fn gem_glyph(gem: &Gem) -> (char, Color) {
    let fg = match gem.kind {
        GemKind::Plain => Color::Yellow,
        GemKind::PowerUp => Color::Cyan,
        GemKind::Poison => Color::Green,
    };
    ('◆', fg)
}

fn enemy_glyph(enemy: &Enemy) -> (char, Color) {
    if !enemy.is_alive {
        return ('×', Color::DarkGrey);
    }
    let fg = match enemy.sprite_set {
        "MonsterA" => Color::Red,
        "MonsterB" => Color::Magenta,
        "MonsterC" => Color::Rgb { r: 255, g: 140, b: 0 },
        _ => Color::Rgb { r: 200, g: 80, b: 200 },
    };
    ('Ж', fg)
}

fn player_glyph(player: &Player) -> (char, Color) {
    if !player.is_alive {
        return ('@', Color::DarkGrey);
    }
    if player.celebrating {
        return ('@', Color::Yellow);
    }
    if player.is_powered_up() {
        return ('@', Color::Cyan);
    }
    if player.is_poisoned() {
        return ('@', Color::Green);
    }
    ('@', Color::White)
}
