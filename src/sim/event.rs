/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and text extraction;
/// the step itself never waits on any of them.

use crate::domain::tilemap::TileRect;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Sound {
    Jump,
    Bump,
    Dig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlaySound(Sound),
    /// A dig effect appeared at this pixel position.
    EffectSpawned { x: i32, y: i32 },
    SandDug { tile_x: i32, tile_y: i32 },
    /// Read the text in this region; the result arrives out of band.
    TextExtraction { region: TileRect },
    PauseChanged { paused: bool },
}
