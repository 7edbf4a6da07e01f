/// Room building and the text level loader.
///
/// ## Sources (priority order):
///   1. `[general] level_file` from the config, if set and readable
///   2. The built-in room
///
/// ## Level format (`.txt`):
///   Optional line 1: `# Room Name` (only if it is not also a valid map row)
///   Lines: map rows, all the same length
///
/// ## Tile legend:
///   '#' = Solid                 'S' = Sand (diggable)
///   '_' / '.' / ' ' = Air       'P' = Player spawn (top-left tile of the 1x2 body)
///
/// The dig region is the bounding box of the sand at load time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, trace, warn};
use thiserror::Error;

use crate::domain::tile::{TileKind, TILE_SIZE};
use crate::domain::tilemap::{TileRect, Tilemap};
use crate::sim::world::WorldState;

// ── Built-in room ──

pub const ROOM_WIDTH: usize = 33;
pub const ROOM_HEIGHT: usize = 15;
pub const ROOM_SPAWN: (f32, f32) = (32.0, 176.0);

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("cannot read level file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("level has no map rows")]
    Empty,
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown tile '{ch}' at row {row}, column {col}")]
    UnknownTile { ch: char, row: usize, col: usize },
    #[error("level has no player spawn ('P')")]
    NoSpawn,
}

/// A parsed room, ready to become a world.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub tiles: Tilemap,
    /// Pixel position of the player's top-left corner.
    pub spawn: (f32, f32),
    pub dig_region: TileRect,
}

impl LevelDef {
    pub fn into_world(self) -> WorldState {
        let mut world = WorldState::new(self.tiles, self.spawn, self.dig_region);
        world.level_name = self.name;
        world
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// The sand-pit room: walls left and right, a one-tile ceiling, a
/// two-tile floor and a 29x7 sand pit hanging above the spawn point.
pub fn default_room() -> LevelDef {
    let mut tiles = Tilemap::new(ROOM_WIDTH, ROOM_HEIGHT);
    tiles.fill_rect(TileRect::new(0, 0, 1, ROOM_HEIGHT), TileKind::Solid);
    tiles.fill_rect(TileRect::new(ROOM_WIDTH - 1, 0, 1, ROOM_HEIGHT), TileKind::Solid);
    tiles.fill_rect(TileRect::new(0, 0, ROOM_WIDTH, 1), TileKind::Solid);
    tiles.fill_rect(TileRect::new(0, 13, ROOM_WIDTH, 2), TileKind::Solid);

    let pit = TileRect::new(2, 4, ROOM_WIDTH - 4, 7);
    tiles.fill_rect(pit, TileKind::Sand);

    LevelDef {
        name: "Sand Pit".to_string(),
        tiles,
        spawn: ROOM_SPAWN,
        dig_region: pit,
    }
}

/// Parse a level from text.
pub fn parse_level(text: &str) -> Result<LevelDef, LevelError> {
    let mut lines = text.lines().peekable();
    let mut name = String::from("Untitled");
    if let Some(first) = lines.peek() {
        if let Some(title) = title_of(first) {
            name = title;
            lines.next();
        }
    }

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let width = rows[0].chars().count();
    let mut tiles = Tilemap::new(width, rows.len());
    let mut spawn = None;

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LevelError::Ragged { row: y, expected: width, found });
        }
        for (x, ch) in row.chars().enumerate() {
            if ch == 'P' {
                if spawn.is_some() {
                    warn!("extra spawn at ({x}, {y}) ignored");
                } else {
                    spawn = Some(((x as i32 * TILE_SIZE) as f32, (y as i32 * TILE_SIZE) as f32));
                }
                continue;
            }
            let kind = TileKind::from_char(ch)
                .ok_or(LevelError::UnknownTile { ch, row: y, col: x })?;
            tiles.set(x, y, kind);
        }
    }

    let spawn = spawn.ok_or(LevelError::NoSpawn)?;
    let dig_region = tiles.bounding_box(TileKind::Sand).unwrap_or_default();
    Ok(LevelDef { name, tiles, spawn, dig_region })
}

/// `# Name` is a title only if it cannot be a map row, so a first row
/// such as `# P #` stays part of the map.
fn title_of(line: &str) -> Option<String> {
    let title = line.strip_prefix('#').filter(|t| t.starts_with(' '))?;
    let is_map_row = line.chars().all(|c| c == 'P' || TileKind::from_char(c).is_some());
    (!is_map_row).then(|| title.trim().to_string())
}

/// Read and parse a level file.
pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let def = parse_level(&text)?;
    info!(
        "loaded level '{}' from {} ({}x{} tiles)",
        def.name,
        path.display(),
        def.tiles.width(),
        def.tiles.height()
    );
    trace!("level map:\n{}", def.tiles);
    Ok(def)
}

/// Configured level if it loads, otherwise the built-in room.
pub fn load_or_default(path: Option<&Path>) -> LevelDef {
    let Some(path) = path else {
        info!("using built-in room");
        return default_room();
    };
    match load_level_file(path) {
        Ok(def) => def,
        Err(e) => {
            warn!("{e}; falling back to built-in room");
            default_room()
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
