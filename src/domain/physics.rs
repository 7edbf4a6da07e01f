/// Tile probes and collision resolution, including the dig.
///
/// ## Probes
///
/// The sprite is always 16x32 with its origin at the top-left, but the
/// collision box is not: each probe is a single pixel offset from the
/// rounded position. Four probe sets exist per size:
///
///   set        vertical probes      side probes
///   DownLeft   two feet             right edge  (checking the right wall)
///   DownRight  two feet             left edge   (checking the left wall)
///   UpLeft     head (twice)         right edge
///   UpRight    head (twice)         left edge
///
/// The set names follow the actor's position inside its tile: in the left
/// half of a tile the right wall is the one that can be touched.
///
/// ## Terrain classes
///
/// Side and head probes only see Solid. Foot probes see Solid or Sand,
/// so sand is a one-way platform: passable from below and from the sides.
///
/// ## Order inside one frame
///
///   1. horizontal push-out
///   2. vertical probes
///   3. dig check (uses footing from before step 4)
///   4. vertical resolution (landing / invariant repair / ceiling bonk)

use log::{debug, trace};

use super::constants::{BONK_VELOCITY, DIG_DURATION};
use super::entity::{Footing, Player, SizeMode};
use super::tile::{tile_index, TileKind, TileQuery, TILE_SIZE};

/// A single pixel offset from the actor's rounded top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Probe {
    pub x: i32,
    pub y: i32,
}

const fn probe(x: i32, y: i32) -> Probe {
    Probe { x, y }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProbeSet {
    /// Feet when moving down, head when moving up.
    pub vert: [Probe; 2],
    /// Side bottom, side top.
    pub horiz: [Probe; 2],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Approach {
    DownLeft,
    DownRight,
    UpLeft,
    UpRight,
}

impl Approach {
    pub fn select(moving_down: bool, checking_right_wall: bool) -> Approach {
        match (moving_down, checking_right_wall) {
            (true, true) => Approach::DownLeft,
            (true, false) => Approach::DownRight,
            (false, true) => Approach::UpLeft,
            (false, false) => Approach::UpRight,
        }
    }

    fn index(self) -> usize {
        match self {
            Approach::DownLeft => 0,
            Approach::DownRight => 1,
            Approach::UpLeft => 2,
            Approach::UpRight => 3,
        }
    }
}

const FEET: [Probe; 2] = [probe(4, 32), probe(11, 32)];

const BIG_PROBES: [ProbeSet; 4] = [
    ProbeSet { vert: FEET, horiz: [probe(13, 27), probe(13, 14)] },
    ProbeSet { vert: FEET, horiz: [probe(2, 27), probe(2, 14)] },
    ProbeSet { vert: [probe(8, 6), probe(8, 6)], horiz: [probe(13, 27), probe(13, 14)] },
    ProbeSet { vert: [probe(8, 6), probe(8, 6)], horiz: [probe(2, 27), probe(2, 14)] },
];

const SMALL_PROBES: [ProbeSet; 4] = [
    ProbeSet { vert: FEET, horiz: [probe(13, 27), probe(13, 22)] },
    ProbeSet { vert: FEET, horiz: [probe(2, 27), probe(2, 22)] },
    ProbeSet { vert: [probe(8, 16), probe(8, 16)], horiz: [probe(13, 27), probe(13, 22)] },
    ProbeSet { vert: [probe(8, 16), probe(8, 16)], horiz: [probe(2, 27), probe(2, 22)] },
];

/// Probe table lookup by collision size and approach.
pub fn probe_set(size: SizeMode, approach: Approach) -> &'static ProbeSet {
    match size {
        SizeMode::Big => &BIG_PROBES[approach.index()],
        SizeMode::Small => &SMALL_PROBES[approach.index()],
    }
}

/// Y offset of the "is my head in a ceiling" check.
pub fn head_check_offset(size: SizeMode) -> i32 {
    match size {
        SizeMode::Big => 10,
        SizeMode::Small => 20,
    }
}

/// Where a dig happened, for the collaborators that react to it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DigSite {
    /// Tile that was removed.
    pub tile_x: i32,
    pub tile_y: i32,
    /// Pixel position for the cosmetic effect.
    pub effect_x: i32,
    pub effect_y: i32,
}

/// Side effects requested by one collision pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CollisionOutcome {
    pub bumped_head: bool,
    pub dug: Option<DigSite>,
}

/// What the two vertical probes reported this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VerticalHits {
    pub first: bool,
    pub second: bool,
}

impl VerticalHits {
    pub fn any(&self) -> bool {
        self.first || self.second
    }

    pub fn both(&self) -> bool {
        self.first && self.second
    }
}

// ══════════════════════════════════════════════════════════════
// Pre-step: standing up into a one-tile-high gap
// ══════════════════════════════════════════════════════════════

/// Detect a head inside a solid tile while grounded; push the actor
/// right by one pixel and stop it. Runs before integration.
pub fn unstick_head<T: TileQuery>(p: &mut Player, tiles: &T) {
    let offset = head_check_offset(p.collision_size());
    // Unrounded position.
    let x = (p.x + 8.0).floor() as i32;
    let y = (p.y + offset as f32).floor() as i32;
    p.head_stuck = p.is_grounded() && tiles.is_solid(x, y);
    if p.head_stuck {
        trace!("head stuck at ({:.2}, {:.2}), nudging right", p.x, p.y);
        p.dx = 0.0;
        p.x += 1.0;
    }
}

// ══════════════════════════════════════════════════════════════
// Main resolver
// ══════════════════════════════════════════════════════════════

/// Probe the terrain around the actor and correct position/velocity.
///
/// `dig_pressed` is the dig button's "just pressed" edge for this frame.
/// The only terrain write is the dig itself.
pub fn resolve_collision<T: TileQuery>(p: &mut Player, tiles: &mut T, dig_pressed: bool) -> CollisionOutcome {
    let (rx, ry) = p.pixel_pos();
    let size = p.collision_size();
    let checking_right_wall = rx.rem_euclid(TILE_SIZE) < TILE_SIZE / 2;

    resolve_horizontal(p, &*tiles, rx, ry, size, checking_right_wall);

    let moving_down = p.dy >= 0.0 || p.is_grounded();
    let set = probe_set(size, Approach::select(moving_down, checking_right_wall));
    let hits = probe_vertical(&*tiles, rx, ry, set, moving_down);

    let mut outcome = CollisionOutcome::default();
    if dig_pressed {
        outcome.dug = try_dig(p, tiles, rx, ry, set, hits);
    }

    if moving_down {
        resolve_landing(p, hits, ry);
    } else {
        outcome.bumped_head = resolve_ceiling(p, hits);
    }
    outcome
}

/// Push out of a wall by one pixel per frame.
fn resolve_horizontal<T: TileQuery>(
    p: &mut Player,
    tiles: &T,
    rx: i32,
    ry: i32,
    size: SizeMode,
    checking_right_wall: bool,
) {
    let side = if checking_right_wall { Approach::DownLeft } else { Approach::DownRight };
    let [bottom, top] = probe_set(size, side).horiz;
    let hit = tiles.is_solid(rx + bottom.x, ry + bottom.y) || tiles.is_solid(rx + top.x, ry + top.y);
    if !hit || p.head_stuck {
        return;
    }

    let nudge: f32 = if checking_right_wall { -1.0 } else { 1.0 };
    // Measured from the opposite edge of the box.
    let edge_offset = if checking_right_wall {
        probe_set(size, Approach::DownRight).horiz[0].x
    } else {
        probe_set(size, Approach::DownLeft).horiz[0].x
    };
    let local_x = (rx + edge_offset).rem_euclid(TILE_SIZE);
    if local_x == 0 {
        return;
    }

    p.x += nudge;
    if (p.dx < 0.0 && nudge > 0.0) || (p.dx >= 0.0 && nudge < 0.0) {
        p.dx = 0.0;
    }
}

/// Feet probes see sand, head probes do not.
fn probe_vertical<T: TileQuery>(tiles: &T, rx: i32, ry: i32, set: &ProbeSet, moving_down: bool) -> VerticalHits {
    let hit = |pr: Probe| {
        if moving_down {
            tiles.is_solid_or_soft(rx + pr.x, ry + pr.y)
        } else {
            tiles.is_solid(rx + pr.x, ry + pr.y)
        }
    };
    VerticalHits { first: hit(set.vert[0]), second: hit(set.vert[1]) }
}

/// Dig out the sand tile under both feet. All preconditions must hold:
/// grounded, not ducking, both feet on terrain in the same tile column,
/// sand right under the left foot, dig just pressed, dig timer idle.
fn try_dig<T: TileQuery>(
    p: &mut Player,
    tiles: &mut T,
    rx: i32,
    ry: i32,
    set: &ProbeSet,
    hits: VerticalHits,
) -> Option<DigSite> {
    let [left, right] = set.vert;
    let left_col = tile_index(rx + left.x);
    let same_column = left_col == tile_index(rx + right.x);
    let under_feet = tiles.tile_at(rx + left.x, ry + left.y + 2);

    if p.is_airborne()
        || p.is_ducking()
        || !hits.both()
        || !same_column
        || under_feet != TileKind::Sand
        || p.timers.dig != 0
    {
        return None;
    }

    let (dig_x, dig_y) = (rx + 8, ry + 33);
    tiles.set_tile(dig_x, dig_y, TileKind::Air);
    p.timers.dig = DIG_DURATION;
    debug!("dug sand at tile ({}, {})", tile_index(dig_x), tile_index(dig_y));

    Some(DigSite {
        tile_x: tile_index(dig_x),
        tile_y: tile_index(dig_y),
        effect_x: left_col * TILE_SIZE,
        effect_y: ry + 32,
    })
}

/// Moving down or standing: snap onto the surface, or repair a
/// grounded actor that has nothing under its feet.
pub fn resolve_landing(p: &mut Player, hits: VerticalHits, ry: i32) {
    if hits.any() {
        let local_y = ry.rem_euclid(TILE_SIZE);
        if local_y < 6 {
            match local_y {
                0 => {}
                1 => p.y -= 1.0,
                _ => p.y -= 2.0,
            }
            p.land();
            p.dy = 0.0;
        }
    } else if p.is_grounded() {
        trace!("no floor under grounded actor at ({:.2}, {:.2})", p.x, p.y);
        p.footing = Footing::Airborne;
        p.dy = 0.0;
    }
}

/// Moving up: a head hit kills the jump buffer and bonks the actor down.
/// Returns true on a hit.
pub fn resolve_ceiling(p: &mut Player, hits: VerticalHits) -> bool {
    if !hits.any() {
        return false;
    }
    p.timers.jump_buffer = 0;
    p.dy = BONK_VELOCITY;
    debug!("bonk at ({:.2}, {:.2})", p.x, p.y);
    true
}

// ══════════════════════════════════════════════════════════════
// Play-area backstop
// ══════════════════════════════════════════════════════════════

/// Keep the actor inside the horizontal play area; respawn its position
/// if it falls out of the bottom.
pub fn clamp_to_play_area(p: &mut Player, width: i32, height: i32) {
    if p.x < 0.0 {
        p.x = 0.0;
        p.dx = 0.0;
    } else if p.x + p.width() as f32 > width as f32 {
        p.x = (width - p.width()) as f32;
        p.dx = 0.0;
    } else if p.y > height as f32 {
        debug!("fell out of the play area, back to y={}", p.y_start);
        p.y = p.y_start;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
