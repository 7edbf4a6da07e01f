/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
/// Physics constants are not configurable.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub sound: SoundConfig,
    pub gamepad: GamepadConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Looping background track, paused with the game.
    pub music: bool,
}

/// Pad button names per game button (see `ui::gamepad::Btn`).
#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub a: Vec<String>,
    pub b: Vec<String>,
    pub start: Vec<String>,
    pub select: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Text level to load instead of the built-in room.
    pub level_file: Option<PathBuf>,
    pub log_file: PathBuf,
    /// `log` level filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} parse error: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    music: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_a")]
    a: Vec<String>,
    #[serde(default = "default_pad_b")]
    b: Vec<String>,
    #[serde(default = "default_pad_start")]
    start: Vec<String>,
    #[serde(default = "default_pad_select")]
    select: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 } // ~60 frames per second
fn default_true() -> bool { true }

fn default_pad_a() -> Vec<String> { vec!["A".into()] }
fn default_pad_b() -> Vec<String> { vec!["X".into(), "B".into()] }
fn default_pad_start() -> Vec<String> { vec!["Start".into()] }
fn default_pad_select() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "sandpit.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_true(), music: default_true() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            a: default_pad_a(),
            b: default_pad_b(),
            start: default_pad_start(),
            select: default_pad_select(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A missing file or missing keys fall back to defaults; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs)?;
        Ok(GameConfig::from_toml(toml_cfg, &search_dirs))
    }

    /// Parse config text directly; relative paths are kept as written.
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("config.toml"),
            source,
        })?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: cfg.timing.tick_rate_ms.max(1),
            },
            sound: SoundConfig {
                enabled: cfg.sound.enabled,
                music: cfg.sound.music,
            },
            gamepad: GamepadConfig {
                a: cfg.gamepad.a,
                b: cfg.gamepad.b,
                start: cfg.gamepad.start,
                select: cfg.gamepad.select,
            },
            general: GeneralConfig {
                level_file: cfg.general.level_file.map(|f| resolve_path(&f, search_dirs)),
                log_file: PathBuf::from(cfg.general.log_file),
                log_level: cfg.general.log_level,
            },
        }
    }
}

/// Absolute paths as-is; relative ones are looked up in the search dirs
/// and otherwise left relative to the CWD.
fn resolve_path(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> Result<TomlConfig, ConfigError> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        return toml::from_str::<TomlConfig>(&text).map_err(|source| ConfigError::Parse { path, source });
    }
    Ok(TomlConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 16);
        assert!(cfg.sound.enabled);
        assert!(cfg.sound.music);
        assert_eq!(cfg.gamepad.b, vec!["X".to_string(), "B".to_string()]);
        assert_eq!(cfg.general.level_file, None);
        assert_eq!(cfg.general.log_file, PathBuf::from("sandpit.log"));
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[timing]\ntick_rate_ms = 0\n\n[sound]\nenabled = false\nmusic = false\n\n[general]\nlevel_file = \"/tmp/room.txt\"\n",
        )
        .unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 1);
        assert!(!cfg.sound.enabled);
        assert!(!cfg.sound.music);
        assert_eq!(cfg.general.level_file, Some(PathBuf::from("/tmp/room.txt")));
        assert_eq!(cfg.general.log_level, "info");
        assert_eq!(cfg.gamepad.start, vec!["Start".to_string()]);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = GameConfig::parse("[timing\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = GameConfig::parse("[sound]\nenabled = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
