/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Pause / frame-advance control
///   2. Frame counter
///   3. Player (ducking → dig timer → movement and collision → clamp → animation)
///   4. Effect requests from the player pass (dig effect spawn, text extraction)
///   5. Dig effects
///
/// Physics never performs side effects itself; anything external is
/// returned as a `GameEvent` for the caller to carry out.

use log::{debug, info};

use crate::domain::animation::animate;
use crate::domain::constants::FRAME_COUNTER_WRAP;
use crate::domain::entity::{FrameInput, Player};
use crate::domain::motion::{integrate, tick_dig_timer, update_ducking, update_horizontal, update_vertical};
use crate::domain::physics::{clamp_to_play_area, resolve_collision, unstick_head};
use crate::domain::tile::TileQuery;
use super::event::{GameEvent, Sound};
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if !resolve_pause(world, &input, &mut events) {
        return events;
    }

    world.frame = (world.frame + 1) % FRAME_COUNTER_WRAP;

    let (width, height) = (world.pixel_width(), world.pixel_height());
    let first_new = events.len();
    step_player(&mut world.player, &mut world.tiles, &input, world.frame, (width, height), &mut events);

    let mut requests = Vec::new();
    for event in &events[first_new..] {
        match *event {
            GameEvent::EffectSpawned { x, y } => world.spawn_effect(x, y),
            GameEvent::SandDug { .. } => {
                requests.push(GameEvent::TextExtraction { region: world.dig_region });
            }
            _ => {}
        }
    }
    events.extend(requests);

    world.update_effects();
    events
}

/// Pause and single-frame stepping. Returns true if this frame runs.
fn resolve_pause(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) -> bool {
    if world.frame_advance {
        world.frame_advance = false;
        world.paused = true;
    }

    if input.pressed.start {
        world.paused = !world.paused;
        world.frame_advance = false;
        info!("{}", if world.paused { "paused" } else { "resumed" });
        events.push(GameEvent::PauseChanged { paused: world.paused });
    }

    if input.pressed.select && world.paused {
        debug!("frame advance at frame {}", world.frame);
        world.frame_advance = true;
        world.paused = false;
    }

    !world.paused
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// One frame of the player core, in the fixed per-frame order.
/// While dig-locked only ducking, timers, the clamp and animation run.
pub fn step_player<T: TileQuery>(
    p: &mut Player,
    tiles: &mut T,
    input: &FrameInput,
    frame: u32,
    (width, height): (i32, i32),
    events: &mut Vec<GameEvent>,
) {
    update_ducking(p, &input.held);
    tick_dig_timer(p);

    if p.can_move() {
        unstick_head(p, tiles);
        integrate(p);
        update_horizontal(p, &input.held);
        if update_vertical(p, input).is_some() {
            events.push(GameEvent::PlaySound(Sound::Jump));
        }

        let outcome = resolve_collision(p, tiles, input.pressed.b);
        if outcome.bumped_head {
            events.push(GameEvent::PlaySound(Sound::Bump));
        }
        if let Some(site) = outcome.dug {
            events.push(GameEvent::SandDug { tile_x: site.tile_x, tile_y: site.tile_y });
            events.push(GameEvent::PlaySound(Sound::Dig));
            events.push(GameEvent::EffectSpawned { x: site.effect_x, y: site.effect_y });
        }
    }

    clamp_to_play_area(p, width, height);
    animate(p, &input.held, frame);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::*;
    use crate::domain::entity::{AnimationState, Buttons, Footing};
    use crate::domain::tile::TileKind;
    use crate::domain::tilemap::TileRect;
    use crate::sim::level::default_room;

    fn room_world() -> WorldState {
        default_room().into_world()
    }

    /// Player standing on the room floor at spawn.
    fn grounded_world() -> WorldState {
        let mut w = room_world();
        w.player.y = 176.0;
        w.player.footing = Footing::Grounded { ducking: false };
        w
    }

    fn press(f: impl Fn(&mut Buttons)) -> FrameInput {
        let mut held = Buttons::default();
        f(&mut held);
        FrameInput { held, pressed: held }
    }

    fn hold(f: impl Fn(&mut Buttons)) -> FrameInput {
        let mut held = Buttons::default();
        f(&mut held);
        FrameInput { held, pressed: Buttons::default() }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    // ── Spawn / landing ──

    #[test]
    fn spawn_lands_on_floor_first_frame() {
        let mut w = room_world();
        assert!(w.player.is_airborne());
        step(&mut w, idle());
        assert!(w.player.is_grounded());
        assert_eq!(w.player.y, 176.0);
        assert_eq!(w.player.animation, AnimationState::Standing);
    }

    // ── Jumping ──

    #[test]
    fn jump_from_standstill_is_weak() {
        let mut w = grounded_world();
        let events = step(&mut w, press(|b| b.a = true));
        assert!(w.player.is_airborne());
        assert_eq!(w.player.dy, JUMP_FORCE_WEAK);
        assert!(events.contains(&GameEvent::PlaySound(Sound::Jump)));
        assert_eq!(w.player.animation, AnimationState::Jumping);
    }

    #[test]
    fn jump_while_moving_is_strong() {
        let mut w = grounded_world();
        w.player.dx = 1.0;
        step(&mut w, press(|b| { b.a = true; b.right = true; }));
        assert_eq!(w.player.dy, JUMP_FORCE_STRONG);
    }

    #[test]
    fn jump_pressed_before_landing_fires_on_landing() {
        let mut w = room_world();
        w.player.y = 173.0;
        let mut jumped_on = None;
        for frame in 1..=JUMP_BUFFER_WINDOW {
            let input = if frame == 1 { press(|b| b.a = true) } else { hold(|b| b.a = true) };
            let events = step(&mut w, input);
            if events.contains(&GameEvent::PlaySound(Sound::Jump)) {
                jumped_on = Some(frame);
                break;
            }
        }
        assert_eq!(jumped_on, Some(6));
        assert!(w.player.is_airborne());
        assert_eq!(w.player.dy, JUMP_FORCE_WEAK);
    }

    #[test]
    fn buffer_expires_without_a_press() {
        let mut w = room_world();
        w.player.y = 100.0; // beside the pit, far above the floor
        w.player.x = 16.0;
        step(&mut w, press(|b| b.a = true));
        for _ in 0..JUMP_BUFFER_WINDOW {
            step(&mut w, idle());
        }
        assert_eq!(w.player.timers.jump_buffer, 0);
    }

    #[test]
    fn full_crouch_charge_gives_crouch_jump() {
        let mut w = grounded_world();
        for _ in 0..CROUCH_JUMP_BUILDUP_TIME {
            step(&mut w, hold(|b| b.down = true));
        }
        assert!(w.player.is_ducking());
        assert_eq!(w.player.timers.crouch_charge, CROUCH_JUMP_BUILDUP_TIME);
        assert_eq!(w.player.animation, AnimationState::Ducking);

        step(&mut w, press(|b| { b.a = true; b.down = true; }));
        assert_eq!(w.player.dy, JUMP_FORCE_CROUCH);
        assert!(!w.player.is_ducking());
        assert_eq!(w.player.timers.crouch_charge, 0);
    }

    #[test]
    fn partial_charge_is_lost_on_release() {
        let mut w = grounded_world();
        for _ in 0..30 {
            step(&mut w, hold(|b| b.down = true));
        }
        step(&mut w, idle());
        assert_eq!(w.player.timers.crouch_charge, 0);
        step(&mut w, press(|b| b.a = true));
        assert_eq!(w.player.dy, JUMP_FORCE_WEAK);
    }

    #[test]
    fn jumping_into_sand_from_below_never_bumps() {
        let mut w = grounded_world();
        let mut bumped = false;
        step(&mut w, press(|b| b.a = true));
        for _ in 0..20 {
            let events = step(&mut w, hold(|b| b.a = true));
            bumped |= events.contains(&GameEvent::PlaySound(Sound::Bump));
        }
        assert!(!bumped);
    }

    #[test]
    fn ceiling_bonk_plays_bump() {
        let mut w = room_world();
        w.tiles.fill_rect(TileRect::new(1, 10, 5, 1), TileKind::Solid);
        w.player.y = 176.0;
        w.player.footing = Footing::Grounded { ducking: false };
        let mut events = step(&mut w, press(|b| b.a = true));
        for _ in 0..10 {
            events.extend(step(&mut w, hold(|b| b.a = true)));
        }
        assert!(events.contains(&GameEvent::PlaySound(Sound::Bump)));
        assert_eq!(w.player.timers.jump_buffer, 0);
    }

    // ── Digging ──

    /// Player standing on top of the pit, over sand column 2.
    fn on_pit() -> WorldState {
        let mut w = room_world();
        w.player.y = 32.0;
        w.player.footing = Footing::Grounded { ducking: false };
        w
    }

    #[test]
    fn dig_emits_every_request() {
        let mut w = on_pit();
        let events = step(&mut w, press(|b| b.b = true));
        assert_eq!(w.tiles.tile(2, 4), TileKind::Air);
        assert_eq!(events, vec![
            GameEvent::SandDug { tile_x: 2, tile_y: 4 },
            GameEvent::PlaySound(Sound::Dig),
            GameEvent::EffectSpawned { x: 32, y: 64 },
            GameEvent::TextExtraction { region: TileRect::new(2, 4, 29, 7) },
        ]);
        assert_eq!(w.effects.len(), 1);
        assert_eq!(w.effects[0].timer, 1);
        assert_eq!(w.player.animation, AnimationState::Digging);
    }

    #[test]
    fn dig_lock_freezes_then_releases() {
        let mut w = on_pit();
        step(&mut w, press(|b| b.b = true));

        // Locked: no falling into the fresh hole, no walking.
        for _ in 0..DIG_DURATION - 2 {
            step(&mut w, hold(|b| b.right = true));
            assert!(w.player.is_grounded());
            assert_eq!((w.player.x, w.player.y), (32.0, 32.0));
            assert_eq!(w.player.animation, AnimationState::Digging);
        }

        // Timer reaches 1: movement resumes, nothing underfoot.
        step(&mut w, idle());
        assert_eq!(w.player.timers.dig, 1);
        assert!(w.player.is_airborne());
        assert_eq!(w.player.animation, AnimationState::Digging);

        step(&mut w, idle());
        assert_eq!(w.player.animation, AnimationState::Falling);
    }

    #[test]
    fn dig_while_ducking_does_nothing() {
        let mut w = on_pit();
        step(&mut w, hold(|b| b.down = true));
        let events = step(&mut w, press(|b| { b.b = true; b.down = true; }));
        assert!(events.is_empty());
        assert_eq!(w.tiles.tile(2, 4), TileKind::Sand);
        assert!(w.player.can_move());
    }

    #[test]
    fn holding_dig_does_not_repeat() {
        let mut w = on_pit();
        step(&mut w, press(|b| b.b = true));
        let mut digs = 0;
        for _ in 0..40 {
            let events = step(&mut w, hold(|b| b.b = true));
            digs += events.iter().filter(|e| matches!(e, GameEvent::SandDug { .. })).count();
        }
        assert_eq!(digs, 0);
    }

    // ── Pause ──

    #[test]
    fn paused_world_does_not_move() {
        let mut w = room_world();
        let events = step(&mut w, press(|b| b.start = true));
        assert_eq!(events, vec![GameEvent::PauseChanged { paused: true }]);
        let before = (w.player.x, w.player.y, w.frame);
        for _ in 0..5 {
            assert!(step(&mut w, idle()).is_empty());
        }
        assert_eq!((w.player.x, w.player.y, w.frame), before);

        step(&mut w, press(|b| b.start = true));
        assert!(!w.paused);
        assert_eq!(w.frame, before.2 + 1);
    }

    #[test]
    fn select_advances_exactly_one_frame() {
        let mut w = room_world();
        step(&mut w, press(|b| b.start = true));
        let frame = w.frame;

        step(&mut w, press(|b| b.select = true));
        assert_eq!(w.frame, frame + 1);
        step(&mut w, idle());
        step(&mut w, idle());
        assert!(w.paused);
        assert_eq!(w.frame, frame + 1);
    }

    #[test]
    fn select_is_ignored_while_running() {
        let mut w = room_world();
        step(&mut w, press(|b| b.select = true));
        assert!(!w.paused);
        step(&mut w, idle());
        assert!(!w.paused);
        assert_eq!(w.frame, 2);
    }

    #[test]
    fn frame_counter_wraps() {
        let mut w = grounded_world();
        for _ in 0..FRAME_COUNTER_WRAP {
            step(&mut w, idle());
        }
        assert_eq!(w.frame, 0);
    }

    // ── Invariants under arbitrary input ──

    #[test]
    fn timers_and_speed_stay_bounded() {
        let mut w = room_world();
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..3000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let bits = seed >> 8;
            let buttons = Buttons {
                up: false,
                down: bits & 1 != 0 && bits & 64 != 0,
                left: bits & 2 != 0,
                right: bits & 4 != 0,
                a: bits & 8 != 0,
                b: bits & 16 != 0,
                start: false,
                select: false,
            };
            let pressed = Buttons { a: buttons.a && bits & 32 != 0, b: buttons.b && bits & 128 != 0, ..Buttons::default() };
            step(&mut w, FrameInput { held: buttons, pressed });

            let p = &w.player;
            assert!(p.timers.jump_buffer <= JUMP_BUFFER_WINDOW);
            assert!(p.timers.crouch_charge <= CROUCH_JUMP_BUILDUP_TIME);
            assert!(p.timers.dig <= DIG_DURATION);
            assert!(p.dx.abs() <= X_SPEED_LIMIT);
            assert!(!(p.is_airborne() && p.is_ducking()));
            assert!(p.x >= 0.0 && p.x + 16.0 <= w.pixel_width() as f32);
        }
    }
}
