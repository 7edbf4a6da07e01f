/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into `front`, compared cell by cell with `back`
/// (the previous frame), and only changed cells are written. Commands are
/// batched with `queue!` and flushed once, then the buffers swap.
///
/// One 16x16 tile is one terminal row by `CELL_W` columns, so the player
/// (16x32) covers two rows.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::animation::crouch_flash;
use crate::domain::entity::{AnimationState, Facing};
use crate::domain::tile::{TileKind, TILE_SIZE};
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, used for
    /// both `Clear(ClearType::All)` and every blank cell so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Text of one row, for tests.
    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Layout ──

/// Terminal columns per tile.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const SOLID_BG: Color = Color::Rgb { r: 90, g: 90, b: 110 };
const SAND_BG: Color = Color::Rgb { r: 194, g: 160, b: 90 };
const SAND_FG: Color = Color::Rgb { r: 160, g: 125, b: 60 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 255, b: 255 };
const FLASH_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const EFFECT_FG: Color = Color::Rgb { r: 230, g: 200, b: 140 };

const HELP: &str =
    " Arrows:Move  X:Jump  Z:Run/Dig  Enter:Pause  K:Step  R:Refill  Esc:Quit";

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
        // Force full repaint on first frame.
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

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, world);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ══════════════════════════════════════════════════════════════
// Compose: build front buffer content
// ══════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, w: &WorldState) {
    compose_hud(buf, w);
    compose_map(buf, w);
    compose_effects(buf, w);
    compose_player(buf, w);

    let help_row = MAP_ROW + w.tiles.height() + 1;
    if help_row < buf.height {
        buf.put_str(0, help_row, HELP, Color::DarkGrey, Color::Reset);
    }
}

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState) {
    let status = if w.frame_advance {
        "STEP"
    } else if w.paused {
        "PAUSED"
    } else {
        ""
    };
    let hud = format!(
        " {}  Text: {:<12} {:<8} {:>6}",
        w.level_name,
        w.extracted_text,
        animation_label(w.player.animation),
        status,
    );
    buf.fill_row(HUD_ROW, HUD_BG);
    buf.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
}

fn compose_map(buf: &mut FrameBuffer, w: &WorldState) {
    for ty in 0..w.tiles.height() {
        let row = MAP_ROW + ty;
        if row >= buf.height {
            break;
        }
        for tx in 0..w.tiles.width() {
            let col = tx * CELL_W;
            let (ch, fg, bg) = match w.tiles.tile(tx, ty) {
                TileKind::Air => (' ', Color::White, Color::Reset),
                TileKind::Solid => ('▓', Color::Rgb { r: 60, g: 60, b: 75 }, SOLID_BG),
                TileKind::Sand => ('░', SAND_FG, SAND_BG),
            };
            for dx in 0..CELL_W {
                buf.set(col + dx, row, Cell::new(ch, fg, bg));
            }
        }
    }
}

fn compose_effects(buf: &mut FrameBuffer, w: &WorldState) {
    for fx in &w.effects {
        let ch = match (fx.image, fx.flipped) {
            (0, false) => '*',
            (0, true) => '+',
            (_, false) => '.',
            (_, true) => '\'',
        };
        if let Some((col, row)) = tile_cell(fx.x + TILE_SIZE / 2, fx.y + TILE_SIZE / 2) {
            let bg = buf.get(col, row).bg;
            buf.set(col, row, Cell::new(ch, EFFECT_FG, bg));
            buf.set(col + 1, row, Cell::new(ch, EFFECT_FG, bg));
        }
    }
}

fn compose_player(buf: &mut FrameBuffer, w: &WorldState) {
    let p = &w.player;
    let (px, py) = p.pixel_pos();
    let fg = if crouch_flash(p, w.frame) { FLASH_FG } else { PLAYER_FG };

    let (head, body) = player_glyphs(p.animation, p.facing, p.frame_index);
    let cx = px + p.width() / 2;
    let tiles_tall = (p.height() / TILE_SIZE).max(1);
    for i in 0..tiles_tall {
        let glyph = if i == 0 { head } else { body };
        let y = py + i * TILE_SIZE + TILE_SIZE / 2;
        let Some((col, row)) = tile_cell(cx, y) else { continue };
        let bg = buf.get(col, row).bg;
        for (dx, ch) in glyph.chars().enumerate() {
            buf.set(col + dx, row, Cell::new(ch, fg, bg));
        }
    }
}

/// Screen cell of the tile containing pixel (x, y), if it is on screen.
fn tile_cell(x: i32, y: i32) -> Option<(usize, usize)> {
    if x < 0 || y < 0 {
        return None;
    }
    let col = x.div_euclid(TILE_SIZE) as usize * CELL_W;
    let row = MAP_ROW + y.div_euclid(TILE_SIZE) as usize;
    Some((col, row))
}

/// Two-column head and body glyphs for the player. Walking and running
/// alternate legs with the sprite frame.
fn player_glyphs(state: AnimationState, facing: Facing, frame_index: u8) -> (&'static str, &'static str) {
    let right = facing == Facing::Right;
    let stride = frame_index % 2 == 1;
    match state {
        AnimationState::Ducking => ("  ", if right { "o>" } else { "<o" }),
        AnimationState::Digging => (if right { "o " } else { " o" }, if right { "/v" } else { "v\\" }),
        AnimationState::Jumping => (if right { "o/" } else { "\\o" }, "/\\"),
        AnimationState::Falling => ("\\o", "/\\"),
        AnimationState::Running => (
            if right { "o>" } else { "<o" },
            match (stride, right) {
                (false, _) => "/\\",
                (true, true) => "/>",
                (true, false) => "</",
            },
        ),
        AnimationState::Walking => (if right { "o>" } else { "<o" }, if stride { "/|" } else { "||" }),
        AnimationState::Standing => (if right { "o>" } else { "<o" }, "/\\"),
    }
}

fn animation_label(state: AnimationState) -> &'static str {
    match state {
        AnimationState::Standing => "stand",
        AnimationState::Walking => "walk",
        AnimationState::Running => "run",
        AnimationState::Jumping => "jump",
        AnimationState::Falling => "fall",
        AnimationState::Ducking => "duck",
        AnimationState::Digging => "dig",
    }
}
