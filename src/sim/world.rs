/// WorldState: the complete snapshot of a running room.
///
/// ## Tile layers
///
/// Two tile layers:
///   - `base_tiles`: the room as loaded. **Never mutated** after load.
///   - `tiles`     : the effective terrain (base + dug-out sand).
///
/// The physics writes into `tiles` through `TileQuery`.
/// `reset_dig_region` copies the dig region back from `base_tiles`.

use log::info;

use crate::domain::entity::{DigEffect, Player};
use crate::domain::tilemap::{TileRect, Tilemap};

/// Shown until the first extraction result arrives, and after a reset.
pub const NO_TEXT: &str = "???";

pub struct WorldState {
    // ── Tile layers ──
    pub base_tiles: Tilemap,
    pub tiles: Tilemap,

    // ── Entities ──
    pub player: Player,
    pub effects: Vec<DigEffect>,

    // ── Timing ──
    /// Wraps at FRAME_COUNTER_WRAP; drives animation cadence only.
    pub frame: u32,
    pub paused: bool,
    /// One frame was requested while paused; pause again after it runs.
    pub frame_advance: bool,

    // ── Dig pit ──
    pub dig_region: TileRect,
    /// Latest text reader result.
    pub extracted_text: String,
    pub level_name: String,
}

impl WorldState {
    pub fn new(tiles: Tilemap, spawn: (f32, f32), dig_region: TileRect) -> Self {
        WorldState {
            base_tiles: tiles.clone(),
            tiles,
            player: Player::new(spawn.0, spawn.1),
            effects: vec![],
            frame: 0,
            paused: false,
            frame_advance: false,
            dig_region,
            extracted_text: NO_TEXT.to_string(),
            level_name: String::new(),
        }
    }

    pub fn pixel_width(&self) -> i32 {
        self.tiles.pixel_width()
    }

    pub fn pixel_height(&self) -> i32 {
        self.tiles.pixel_height()
    }

    /// Refill the sand pit and forget the last reading.
    pub fn reset_dig_region(&mut self) {
        if self.dig_region.is_empty() {
            info!("level has no dig region, nothing to reset");
            return;
        }
        self.tiles.restore_rect(&self.base_tiles, self.dig_region);
        self.extracted_text = NO_TEXT.to_string();
        info!("dig region reset ({}x{} tiles)", self.dig_region.w, self.dig_region.h);
    }

    pub fn spawn_effect(&mut self, x: i32, y: i32) {
        self.effects.push(DigEffect::new(x, y));
    }

    /// Tick every effect, then drop the expired ones.
    pub fn update_effects(&mut self) {
        for fx in &mut self.effects {
            fx.tick();
        }
        self.effects.retain(|fx| fx.active);
    }

    /// Apply a text reader result. Stale results are accepted as-is.
    pub fn set_extracted_text(&mut self, text: String) {
        self.extracted_text = text;
    }
}
