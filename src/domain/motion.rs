/// Velocity models and position integration.
///
/// Everything here is pure arithmetic on the player; terrain is never
/// consulted. Within a movable frame the order is:
///   integrate → horizontal model → vertical model
/// so integration always uses last frame's velocity and the models
/// prepare velocity for the next frame.

use log::debug;

use super::constants::*;
use super::entity::{Buttons, Facing, FrameInput, Footing, Player};

/// Which launch a jump used.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Weak,
    Strong,
    Crouch,
}

impl JumpKind {
    pub fn force(self) -> f32 {
        match self {
            JumpKind::Weak => JUMP_FORCE_WEAK,
            JumpKind::Strong => JUMP_FORCE_STRONG,
            JumpKind::Crouch => JUMP_FORCE_CROUCH,
        }
    }
}

/// Ducking and crouch-charge buildup. Only grounded actors change posture.
///
/// A full charge survives releasing down; a partial one does not.
pub fn update_ducking(p: &mut Player, held: &Buttons) {
    let Footing::Grounded { .. } = p.footing else { return };

    p.footing = Footing::Grounded { ducking: held.down };
    if held.down {
        p.timers.crouch_charge = (p.timers.crouch_charge + 1).min(CROUCH_JUMP_BUILDUP_TIME);
    } else if !p.crouch_charged() {
        p.timers.crouch_charge = 0;
    }
}

/// Count the dig lock down. Runs whether or not the actor can move.
pub fn tick_dig_timer(p: &mut Player) {
    p.timers.dig = p.timers.dig.saturating_sub(1);
}

/// position += velocity, with the fall speed capped at application time only.
pub fn integrate(p: &mut Player) {
    p.x += p.dx;
    p.y += p.dy.min(TERMINAL_VELOCITY);
}

/// Horizontal velocity from directional input and the run modifier.
pub fn update_horizontal(p: &mut Player, held: &Buttons) {
    let top_speed = if held.b { RUN_SPEED } else { WALK_SPEED };
    // Sampled before any change this frame; the run-release snap below
    // reads these.
    let abs_dx = p.dx.abs();
    let sign_dx = sign(p.dx);
    let grounded = p.is_grounded();

    let dir = if p.is_ducking() { 0 } else { held.direction() };
    if dir != 0 {
        p.facing = if dir > 0 { Facing::Right } else { Facing::Left };
        p.timers.crouch_charge = 0;
    }

    if dir == 0 {
        if grounded {
            if p.dx < 0.0 {
                p.dx = (p.dx + DECELERATION_NO_INPUT).min(0.0);
            } else if p.dx > 0.0 {
                p.dx = (p.dx - DECELERATION_NO_INPUT).max(0.0);
            }
        }
    } else {
        let dir = dir as f32;
        if (p.dx > 0.0 && dir < 0.0) || (p.dx < 0.0 && dir > 0.0) {
            // Turning around
            p.dx += dir * DECELERATION;
        } else if abs_dx < top_speed {
            p.dx += dir * ACCELERATION;
        } else if abs_dx > top_speed && grounded {
            // Overspeed bleeds off on the ground only
            p.dx -= sign_dx * DECELERATION;
        }
    }

    // Letting go of run drops straight to walk speed, in the air too.
    if abs_dx > WALK_SPEED && top_speed == WALK_SPEED {
        p.dx = sign_dx * WALK_SPEED;
    }

    if p.dx.abs() > X_SPEED_LIMIT {
        p.dx = sign(p.dx) * X_SPEED_LIMIT;
    }
}

/// Gravity, jump buffering and jump launch.
/// Returns the launch used, if the actor jumped this frame.
pub fn update_vertical(p: &mut Player, input: &FrameInput) -> Option<JumpKind> {
    if p.is_airborne() {
        let gravity = if input.held.a { GRAVITY_JUMP_HELD } else { GRAVITY_NO_JUMP_HELD };
        p.dy = (p.dy + gravity).min(TERMINAL_VELOCITY);
    }

    if input.pressed.a {
        p.timers.jump_buffer = JUMP_BUFFER_WINDOW;
    } else {
        p.timers.jump_buffer = p.timers.jump_buffer.saturating_sub(1);
    }

    if p.is_airborne() || !input.held.a || p.timers.jump_buffer == 0 {
        return None;
    }

    let kind = if p.crouch_charged() {
        JumpKind::Crouch
    } else if p.dx.abs().floor() < X_SPEED_NEEDED_FOR_HIGH_JUMP {
        JumpKind::Weak
    } else {
        JumpKind::Strong
    };
    p.dy = kind.force();
    p.footing = Footing::Airborne;
    p.timers.jump_buffer = 0;
    p.timers.crouch_charge = 0;
    debug!("jump {:?} from ({:.2}, {:.2}) dx={:.3}", kind, p.x, p.y, p.dx);
    Some(kind)
}

/// Sign as -1/0/1 (zero stays zero, unlike `f32::signum`).
#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
