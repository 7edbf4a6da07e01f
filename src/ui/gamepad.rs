/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Directions
///   A (South)             →  a (jump)
///   X (West) / B (East)   →  b (run / dig)
///   Start                 →  start (pause)
///   Select                →  select (frame advance)
///
/// Without the `gamepad` feature this compiles to a tracker that never
/// reports anything.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use log::info;
use log::warn;

use crate::config::GamepadConfig;
use crate::domain::entity::{Buttons, FrameInput};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Game-button-to-pad-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    a: Vec<Btn>,
    b: Vec<Btn>,
    start: Vec<Btn>,
    select: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            a:      vec![Btn::A],
            b:      vec![Btn::X, Btn::B],
            start:  vec![Btn::Start],
            select: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // D-pad: up, down, left, right
    dpad: [BtnState; 4],

    // Stick: up, down, left, right
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

const UP: usize = 0;
const DOWN: usize = 1;
const LEFT: usize = 2;
const RIGHT: usize = 3;

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    if has_pad {
                        info!("gamepad connected");
                    }
                    (Some(g), has_pad)
                }
                Err(e) => {
                    warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep
    /// the default for that button.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        warn!("unknown gamepad button name '{s}' in config");
                    }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        for (target, names) in [
            (&mut map.a, &cfg.a),
            (&mut map.b, &cfg.b),
            (&mut map.start, &cfg.start),
            (&mut map.select, &cfg.select),
        ] {
            let parsed = parse_list(names);
            if !parsed.is_empty() {
                *target = parsed;
            }
        }
    }

    /// Poll the pad. Call once per tick; edges from the previous tick are cleared.
    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states
        let (x, y) = (self.stick_x, self.stick_y);
        for (dir, now_held) in [
            (UP, y > STICK_DEADZONE),
            (DOWN, y < -STICK_DEADZONE),
            (LEFT, x < -STICK_DEADZONE),
            (RIGHT, x > STICK_DEADZONE),
        ] {
            let s = &mut self.stick[dir];
            if now_held && !s.held {
                s.just_pressed = true;
            }
            s.held = now_held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        let dpad = match gilrs_btn {
            Button::DPadUp    => Some(UP),
            Button::DPadDown  => Some(DOWN),
            Button::DPadLeft  => Some(LEFT),
            Button::DPadRight => Some(RIGHT),
            _ => None,
        };
        let state = match (dpad, Btn::from_gilrs(gilrs_btn)) {
            (Some(dir), _) => &mut self.dpad[dir],
            (None, Some(btn)) => &mut self.buttons[btn_index(btn)],
            (None, None) => return,
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    // ── Button queries (config-driven) ──

    fn any(&self, btns: &[Btn], f: impl Fn(&BtnState) -> bool) -> bool {
        btns.iter().any(|&b| f(&self.buttons[btn_index(b)]))
    }

    fn collect(&self, f: impl Fn(&BtnState) -> bool) -> Buttons {
        let dir = |i: usize| f(&self.dpad[i]) || f(&self.stick[i]);
        let map = &self.action_map;
        Buttons {
            up: dir(UP),
            down: dir(DOWN),
            left: dir(LEFT),
            right: dir(RIGHT),
            a: self.any(&map.a, &f),
            b: self.any(&map.b, &f),
            start: self.any(&map.start, &f),
            select: self.any(&map.select, &f),
        }
    }

    /// Current pad state as game buttons.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            held: self.collect(|s| s.held),
            pressed: self.collect(|s| s.just_pressed),
        }
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for s in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            s.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for s in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *s = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
