/// The player actor and the per-frame input snapshot.
///
/// Grounded/ducking/airborne are one tagged record (`Footing`) so that
/// "ducking while airborne" cannot be represented. The movement lock after
/// a dig is derived from the dig timer instead of being a separate flag.

use super::constants::{
    CROUCH_JUMP_BUILDUP_TIME, EFFECT_IMAGE_SWITCH, EFFECT_LIFETIME, PLAYER_HEIGHT, PLAYER_WIDTH,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Collision box size. Only `Big` is reachable today, but the probe
/// tables are keyed on both.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SizeMode {
    Big,
    Small,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Footing {
    /// Standing on a surface this frame.
    Grounded { ducking: bool },
    Airborne,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationState {
    Standing,
    Walking,
    Running,
    Jumping,
    Falling,
    Ducking,
    Digging,
}

/// Countdown / count-up timers, all in frames.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Timers {
    /// Counts down from JUMP_BUFFER_WINDOW after a jump press.
    pub jump_buffer: u32,
    /// Counts up to CROUCH_JUMP_BUILDUP_TIME while ducking on the ground.
    pub crouch_charge: u32,
    /// Counts down from DIG_DURATION after a dig.
    pub dig: u32,
}

/// Logical buttons. Anything not reported reads as "not held".
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Buttons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,      // jump
    pub b: bool,      // run / dig
    pub start: bool,  // pause
    pub select: bool, // frame advance
}

impl Buttons {
    /// Horizontal direction: -1, 0 or 1.
    pub fn direction(&self) -> i32 {
        self.right as i32 - self.left as i32
    }

    /// Per-button OR, used to accumulate presses between ticks.
    pub fn merge(&mut self, other: Buttons) {
        self.up |= other.up;
        self.down |= other.down;
        self.left |= other.left;
        self.right |= other.right;
        self.a |= other.a;
        self.b |= other.b;
        self.start |= other.start;
        self.select |= other.select;
    }
}

/// Frame input: held state plus the "just pressed this frame" edges.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub held: Buttons,
    pub pressed: Buttons,
}

#[derive(Clone, Debug)]
pub struct Player {
    /// Sub-pixel position of the sprite's top-left corner.
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    /// Spawn height, restored when the actor falls out of the play area.
    pub y_start: f32,
    pub size: SizeMode,
    pub footing: Footing,
    /// Recomputed every movable frame before integration.
    pub head_stuck: bool,
    pub timers: Timers,
    pub facing: Facing,
    pub animation: AnimationState,
    /// Sprite image index, presentation only.
    pub frame_index: u8,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            dx: 0.0,
            dy: 0.0,
            y_start: y,
            size: SizeMode::Big,
            footing: Footing::Airborne,
            head_stuck: false,
            timers: Timers::default(),
            facing: Facing::Right,
            animation: AnimationState::Standing,
            frame_index: 0,
        }
    }

    pub fn is_airborne(&self) -> bool {
        self.footing == Footing::Airborne
    }

    pub fn is_grounded(&self) -> bool {
        !self.is_airborne()
    }

    pub fn is_ducking(&self) -> bool {
        matches!(self.footing, Footing::Grounded { ducking: true })
    }

    /// Land, keeping the current duck if already on the ground.
    pub fn land(&mut self) {
        if self.is_airborne() {
            self.footing = Footing::Grounded { ducking: false };
        }
    }

    /// Movement and collision are suspended while the dig timer is in
    /// its active window; the last tick already frees the actor.
    pub fn is_dig_locked(&self) -> bool {
        self.timers.dig > 1
    }

    pub fn can_move(&self) -> bool {
        !self.is_dig_locked()
    }

    pub fn crouch_charged(&self) -> bool {
        self.timers.crouch_charge == CROUCH_JUMP_BUILDUP_TIME
    }

    /// Probe tables use the small box when small or ducking.
    pub fn collision_size(&self) -> SizeMode {
        if self.size == SizeMode::Small || self.is_ducking() {
            SizeMode::Small
        } else {
            SizeMode::Big
        }
    }

    /// Integer position used for tile probes and drawing.
    pub fn pixel_pos(&self) -> (i32, i32) {
        (round_px(self.x), round_px(self.y))
    }

    pub fn width(&self) -> i32 { PLAYER_WIDTH }
    pub fn height(&self) -> i32 { PLAYER_HEIGHT }
}

/// Cosmetic puff of sand left behind by a dig. Never read by the physics.
#[derive(Clone, Debug, PartialEq)]
pub struct DigEffect {
    pub x: i32,
    pub y: i32,
    pub timer: u32,
    /// 0 while fresh, 1 once it starts to fade.
    pub image: u8,
    pub flipped: bool,
    pub active: bool,
}

impl DigEffect {
    pub fn new(x: i32, y: i32) -> Self {
        DigEffect { x, y, timer: 0, image: 0, flipped: false, active: true }
    }

    /// Advance one frame: drift up and flip on even frames, switch image
    /// halfway, expire at the end of its lifetime.
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        if self.timer == EFFECT_LIFETIME {
            self.active = false;
            return;
        }
        if self.timer > EFFECT_IMAGE_SWITCH {
            self.image = 1;
        }
        if self.timer % 2 == 0 {
            self.y -= 1;
            self.flipped = !self.flipped;
        }
        self.timer += 1;
    }
}

/// Round half up (`-0.5` rounds to `0`, not `-1`).
#[inline]
pub fn round_px(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_spawns_airborne_and_free() {
        let p = Player::new(32.0, 176.0);
        assert!(p.is_airborne());
        assert!(!p.is_ducking());
        assert!(p.can_move());
        assert_eq!(p.timers, Timers::default());
        assert_eq!(p.y_start, 176.0);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn dig_lock_releases_on_last_tick() {
        let mut p = Player::new(0.0, 0.0);
        p.timers.dig = 2;
        assert!(p.is_dig_locked());
        p.timers.dig = 1;
        assert!(p.can_move());
        p.timers.dig = 0;
        assert!(p.can_move());
    }

    #[test]
    fn ducking_uses_small_box() {
        let mut p = Player::new(0.0, 0.0);
        assert_eq!(p.collision_size(), SizeMode::Big);
        p.footing = Footing::Grounded { ducking: true };
        assert_eq!(p.collision_size(), SizeMode::Small);
        p.footing = Footing::Grounded { ducking: false };
        p.size = SizeMode::Small;
        assert_eq!(p.collision_size(), SizeMode::Small);
    }

    #[test]
    fn land_keeps_existing_duck() {
        let mut p = Player::new(0.0, 0.0);
        p.land();
        assert_eq!(p.footing, Footing::Grounded { ducking: false });
        p.footing = Footing::Grounded { ducking: true };
        p.land();
        assert!(p.is_ducking());
    }

    #[test]
    fn round_px_rounds_half_up() {
        assert_eq!(round_px(1.5), 2);
        assert_eq!(round_px(1.49), 1);
        assert_eq!(round_px(-0.5), 0);
        assert_eq!(round_px(-0.75), -1);
    }

    #[test]
    fn direction_from_buttons() {
        let mut b = Buttons::default();
        assert_eq!(b.direction(), 0);
        b.right = true;
        assert_eq!(b.direction(), 1);
        b.left = true;
        assert_eq!(b.direction(), 0);
        b.right = false;
        assert_eq!(b.direction(), -1);
    }

    #[test]
    fn merge_accumulates_presses() {
        let mut acc = Buttons::default();
        acc.merge(Buttons { a: true, ..Buttons::default() });
        acc.merge(Buttons { b: true, ..Buttons::default() });
        assert!(acc.a && acc.b);
        assert!(!acc.start);
    }

    #[test]
    fn dig_effect_drifts_and_expires() {
        let mut fx = DigEffect::new(32, 208);
        fx.tick();
        assert_eq!((fx.y, fx.flipped, fx.timer), (207, true, 1));
        fx.tick();
        assert_eq!((fx.y, fx.flipped), (207, true));
        for _ in 2..=EFFECT_IMAGE_SWITCH {
            fx.tick();
        }
        assert_eq!(fx.image, 0);
        fx.tick();
        assert_eq!(fx.image, 1);
        while fx.active {
            fx.tick();
        }
        assert_eq!(fx.timer, EFFECT_LIFETIME);
        // 16 rises over the even frames 0, 2, ..., 30.
        assert_eq!(fx.y, 208 - 16);
    }
}
