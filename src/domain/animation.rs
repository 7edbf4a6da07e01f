/// Animation state derivation and sprite frame selection.
/// Presentation only: nothing in here feeds back into the physics.

use super::constants::{RUN_FRAME_TIME, WALK_FRAME_TIME, WALK_SPEED};
use super::entity::{AnimationState, Buttons, Player};

/// Highest-priority state wins:
/// Digging > Ducking > Jumping/Falling > Standing > Walking/Running.
pub fn derive_state(p: &Player, held: &Buttons) -> AnimationState {
    if p.timers.dig != 0 {
        AnimationState::Digging
    } else if p.is_ducking() {
        AnimationState::Ducking
    } else if p.is_airborne() {
        if p.dy < 0.0 { AnimationState::Jumping } else { AnimationState::Falling }
    } else if p.dx == 0.0 && held.direction() == 0 {
        AnimationState::Standing
    } else if p.dx.abs() > WALK_SPEED {
        AnimationState::Running
    } else {
        AnimationState::Walking
    }
}

/// Sprite image for a state at the given frame counter. Falling keeps
/// whatever image was showing.
pub fn frame_index(state: AnimationState, frame: u32, previous: u8, dig_timer: u32) -> u8 {
    match state {
        AnimationState::Standing => 0,
        AnimationState::Walking => ((frame / WALK_FRAME_TIME) % 2) as u8,
        AnimationState::Running => ((frame / RUN_FRAME_TIME) % 2) as u8,
        AnimationState::Falling => previous,
        AnimationState::Jumping => 2,
        AnimationState::Ducking => 6,
        AnimationState::Digging => if dig_timer > 7 { 3 } else { 7 },
    }
}

/// A fully charged crouch blinks every other frame.
pub fn crouch_flash(p: &Player, frame: u32) -> bool {
    p.crouch_charged() && frame % 2 == 0
}

/// Derive the state, pick the frame and store both on the player.
pub fn animate(p: &mut Player, held: &Buttons, frame: u32) {
    let state = derive_state(p, held);
    p.frame_index = frame_index(state, frame, p.frame_index, p.timers.dig);
    p.animation = state;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::CROUCH_JUMP_BUILDUP_TIME;
    use crate::domain::entity::Footing;

    fn grounded() -> Player {
        let mut p = Player::new(0.0, 0.0);
        p.footing = Footing::Grounded { ducking: false };
        p
    }

    #[test]
    fn digging_beats_everything() {
        let mut p = grounded();
        p.footing = Footing::Grounded { ducking: true };
        p.timers.dig = 1;
        p.dx = 3.0;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Digging);
    }

    #[test]
    fn ducking_beats_motion() {
        let mut p = grounded();
        p.footing = Footing::Grounded { ducking: true };
        p.dx = 2.0;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Ducking);
    }

    #[test]
    fn airborne_splits_on_vertical_velocity() {
        let mut p = Player::new(0.0, 0.0);
        p.dy = -1.0;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Jumping);
        p.dy = 0.0;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Falling);
    }

    #[test]
    fn standing_needs_no_motion_and_no_input() {
        let mut p = grounded();
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Standing);
        let right = Buttons { right: true, ..Buttons::default() };
        assert_eq!(derive_state(&p, &right), AnimationState::Walking);
        p.dx = -0.125;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Walking);
    }

    #[test]
    fn running_above_walk_speed() {
        let mut p = grounded();
        p.dx = WALK_SPEED;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Walking);
        p.dx = WALK_SPEED + 0.125;
        assert_eq!(derive_state(&p, &Buttons::default()), AnimationState::Running);
    }

    #[test]
    fn frame_cadence() {
        assert_eq!(frame_index(AnimationState::Walking, 4, 0, 0), 0);
        assert_eq!(frame_index(AnimationState::Walking, 5, 0, 0), 1);
        assert_eq!(frame_index(AnimationState::Walking, 10, 0, 0), 0);
        assert_eq!(frame_index(AnimationState::Running, 3, 0, 0), 1);
        assert_eq!(frame_index(AnimationState::Running, 6, 0, 0), 0);
        assert_eq!(frame_index(AnimationState::Falling, 9, 2, 0), 2);
        assert_eq!(frame_index(AnimationState::Digging, 0, 0, 8), 3);
        assert_eq!(frame_index(AnimationState::Digging, 0, 0, 7), 7);
    }

    #[test]
    fn flash_only_at_full_charge_on_even_frames() {
        let mut p = grounded();
        p.timers.crouch_charge = CROUCH_JUMP_BUILDUP_TIME - 1;
        assert!(!crouch_flash(&p, 0));
        p.timers.crouch_charge = CROUCH_JUMP_BUILDUP_TIME;
        assert!(crouch_flash(&p, 0));
        assert!(!crouch_flash(&p, 1));
    }

    #[test]
    fn animate_stores_state_and_frame() {
        let mut p = Player::new(0.0, 0.0);
        p.dy = -2.0;
        animate(&mut p, &Buttons::default(), 0);
        assert_eq!(p.animation, AnimationState::Jumping);
        assert_eq!(p.frame_index, 2);
    }
}
