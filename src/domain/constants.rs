/// Gameplay constants, in pixels and frames (60 frames per second).
/// Values are exact; physics tests depend on them.

// ── Horizontal ──

pub const WALK_SPEED: f32 = 1.5;
pub const RUN_SPEED: f32 = 2.25;
pub const ACCELERATION: f32 = 0.125;
pub const DECELERATION: f32 = 0.125;
pub const DECELERATION_NO_INPUT: f32 = 0.1875;
pub const X_SPEED_LIMIT: f32 = 4.0;

// ── Vertical ──

pub const GRAVITY_JUMP_HELD: f32 = 0.25;
pub const GRAVITY_NO_JUMP_HELD: f32 = 0.4375;
pub const JUMP_FORCE_WEAK: f32 = -5.0;
pub const JUMP_FORCE_STRONG: f32 = -5.625;
pub const JUMP_FORCE_CROUCH: f32 = -6.5;
/// Compared against `floor(|dx|)` at liftoff.
pub const X_SPEED_NEEDED_FOR_HIGH_JUMP: f32 = 0.5;
pub const TERMINAL_VELOCITY: f32 = 3.75;
/// Downward speed after hitting a ceiling.
pub const BONK_VELOCITY: f32 = 2.0;

// ── Timers (frames) ──

/// A jump press is remembered this long while airborne.
pub const JUMP_BUFFER_WINDOW: u32 = 6;
pub const CROUCH_JUMP_BUILDUP_TIME: u32 = 60;
pub const DIG_DURATION: u32 = 14;

// ── Actor box ──

pub const PLAYER_WIDTH: i32 = 16;
pub const PLAYER_HEIGHT: i32 = 32;

// ── Animation cadence (frames per image) ──

pub const WALK_FRAME_TIME: u32 = 5;
pub const RUN_FRAME_TIME: u32 = 3;
/// The frame counter wraps at this value.
pub const FRAME_COUNTER_WRAP: u32 = 60;

// ── Dig effect ──

pub const EFFECT_LIFETIME: u32 = 32;
pub const EFFECT_IMAGE_SWITCH: u32 = 16;
