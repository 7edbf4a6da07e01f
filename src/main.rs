/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use log::{debug, error, info, warn};

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::load_or_default;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, MetaAction};
use ui::reader::TextReader;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let (config, config_error) = match GameConfig::load() {
        Ok(cfg) => (cfg, None),
        Err(e) => (GameConfig::default(), Some(e)),
    };

    init_logging(&config);
    if let Some(e) = config_error {
        warn!("{e}; using default settings");
    }
    info!("starting, tick rate {} ms", config.timing.tick_rate_ms);

    let mut world = load_or_default(config.general.level_file.as_deref()).into_world();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let mut sound = if config.sound.enabled { SoundEngine::new() } else { None };
    if config.sound.music {
        if let Some(sfx) = sound.as_mut() {
            sfx.start_music();
        }
    }

    let result = game_loop(&mut world, &mut renderer, sound.as_mut(), &config, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }
    info!("bye");
}

/// Log to the configured file; `RUST_LOG` overrides the configured level.
/// If the file cannot be created, logging stays off.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.general.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open log file {}: {e}", config.general.log_file.display());
            return;
        }
    };
    let _ = env_logger::Builder::new()
        .parse_filters(&config.general.log_level)
        .parse_env("RUST_LOG")
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
}

/// Ask the terminal for Release events. Returns true when they will arrive.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        info!("keyboard enhancement unavailable, using hold timeout");
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if !gp.connected {
        info!("no gamepad at startup, keyboard only until one connects");
    }
    let reader = TextReader::spawn();

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();

        let mut quit = false;
        for action in kb.meta_actions() {
            match action {
                MetaAction::Quit => quit = true,
                MetaAction::ResetPit => world.reset_dig_region(),
            }
        }
        if quit {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            gp.update();
            let mut input = kb.take_frame_input();
            let pad = gp.frame_input();
            input.held.merge(pad.held);
            input.pressed.merge(pad.pressed);

            let events = step::step(world, input);
            for event in &events {
                match event {
                    GameEvent::PlaySound(s) => {
                        if let Some(sfx) = sound.as_deref_mut() {
                            sfx.play(*s);
                        }
                    }
                    GameEvent::TextExtraction { region } => {
                        reader.request(world.tiles.read_rect(*region));
                    }
                    GameEvent::SandDug { tile_x, tile_y } => {
                        debug!("frame {}: sand dug at ({tile_x}, {tile_y})", world.frame);
                    }
                    GameEvent::PauseChanged { paused } => {
                        if let Some(sfx) = sound.as_deref_mut() {
                            sfx.set_music_paused(*paused);
                        }
                    }
                    GameEvent::EffectSpawned { .. } => {}
                }
            }

            last_tick = Instant::now();
        }

        if let Some(text) = reader.poll() {
            world.set_extracted_text(text);
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
