/// Keyboard state tracker.
///
/// Tracks which keys are currently held down and which logical buttons
/// were pressed since the last tick:
///   - Held state drives walking, running and jump height
///   - Presses are edge-triggered and accumulate between ticks, so a tap
///     that lands between two frames is never lost
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// Key map:
///   Arrows → directions    X → a (jump)    Z → b (run / dig)
///   Enter  → start (pause) K → select (frame advance)
///   R → reset the sand pit     Esc / Q / Ctrl-C → quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{Buttons, FrameInput};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Keys handled outside the game buttons.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MetaAction {
    Quit,
    ResetPit,
}

/// The game button a key drives, if any.
fn button_for(buttons: &mut Buttons, code: KeyCode) -> Option<&mut bool> {
    match code {
        KeyCode::Up => Some(&mut buttons.up),
        KeyCode::Down => Some(&mut buttons.down),
        KeyCode::Left => Some(&mut buttons.left),
        KeyCode::Right => Some(&mut buttons.right),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(&mut buttons.a),
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(&mut buttons.b),
        KeyCode::Enter => Some(&mut buttons.start),
        KeyCode::Char('k') | KeyCode::Char('K') => Some(&mut buttons.select),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Buttons that went from "not held" to "held" since the last
    /// `take_frame_input()`.
    pending: Buttons,

    /// Meta actions seen during the most recent `drain_events()`.
    meta: Vec<MetaAction>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            pending: Buttons::default(),
            meta: Vec::with_capacity(4),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call as often as convenient; presses are kept until the next tick.
    pub fn drain_events(&mut self) {
        self.meta.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Rely on timeout-based expiry instead
            }
            _ => {
                if let Some(action) = meta_action(&key) {
                    self.meta.push(action);
                    return;
                }
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    if let Some(flag) = button_for(&mut self.pending, key.code) {
                        *flag = true;
                    }
                }
            }
        }
    }

    /// Buttons currently held down.
    pub fn held(&self) -> Buttons {
        let mut buttons = Buttons::default();
        for code in self.last_active.keys() {
            if !self.is_held(*code) {
                continue;
            }
            if let Some(flag) = button_for(&mut buttons, *code) {
                *flag = true;
            }
        }
        buttons
    }

    /// Input for one tick. Consumes the accumulated presses; a button
    /// pressed and released between ticks still reads as held this tick.
    pub fn take_frame_input(&mut self) -> FrameInput {
        let pressed = std::mem::take(&mut self.pending);
        let mut held = self.held();
        held.merge(pressed);
        FrameInput { held, pressed }
    }

    pub fn meta_actions(&self) -> &[MetaAction] {
        &self.meta
    }

    // ── Internal ──

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

fn meta_action(key: &KeyEvent) -> Option<MetaAction> {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(MetaAction::Quit)
        }
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(MetaAction::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(MetaAction::ResetPit),
        _ => None,
    }
}
