//! Configuration – reads/writes `~/.mazelink/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use mazelink_kernel::MazeGrid;
use mazelink_runtime::{SessionConfig, TiltInput};
use mazelink_types::{Direction, GridPosition, WorldPos};

/// Maze used when no `maze_path` is configured.
pub const DEMO_MAZE: &str = "\
#.....#
#.##..#
#..#.##
##.#...
...#.#.
.#...#.
.#.#...";

/// Persisted user configuration stored in `~/.mazelink/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text maze file (`#` obstacle, `.` empty).  The demo maze otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maze_path: Option<PathBuf>,

    /// Edge length of one cell in world units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,

    /// World position of cell `(0, 0)`.
    #[serde(default)]
    pub origin: [f32; 3],

    /// Duration of one forward step, in seconds.
    #[serde(default = "default_travel_time")]
    pub travel_time_secs: f32,

    /// Simulated frame rate used to animate steps.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    #[serde(default)]
    pub spawn: [i32; 2],

    /// `north`, `west`, `south` or `east`.
    #[serde(default = "default_spawn_direction")]
    pub spawn_direction: String,

    /// Pool the rotation cue is drawn from.  Must not be empty.
    #[serde(default = "default_audio_clips")]
    pub audio_clips: Vec<String>,

    #[serde(default = "default_pan_strength")]
    pub pan_strength: f32,

    /// Tilt (in g) that fires an intent.
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f32,

    /// Tolerance (in g) for the device to count as upright again.
    #[serde(default = "default_centered_sensitivity")]
    pub centered_sensitivity: f32,
}

fn default_cell_size() -> f32 {
    2.0
}
fn default_travel_time() -> f32 {
    0.5
}
fn default_tick_hz() -> u32 {
    60
}
fn default_spawn_direction() -> String {
    "north".to_string()
}
fn default_audio_clips() -> Vec<String> {
    vec![
        "rustle_1".to_string(),
        "rustle_2".to_string(),
        "rustle_3".to_string(),
    ]
}
fn default_pan_strength() -> f32 {
    1.0
}
fn default_movement_threshold() -> f32 {
    0.5
}
fn default_centered_sensitivity() -> f32 {
    0.2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maze_path: None,
            cell_size: default_cell_size(),
            origin: [0.0; 3],
            travel_time_secs: default_travel_time(),
            tick_hz: default_tick_hz(),
            spawn: [0, 0],
            spawn_direction: default_spawn_direction(),
            audio_clips: default_audio_clips(),
            pan_strength: default_pan_strength(),
            movement_threshold: default_movement_threshold(),
            centered_sensitivity: default_centered_sensitivity(),
        }
    }
}

impl Config {
    /// Load the configured maze, or the demo maze.
    pub fn load_grid(&self) -> Result<MazeGrid, String> {
        let [x, y, z] = self.origin;
        let origin = WorldPos::new(x, y, z);
        let text = match &self.maze_path {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("Failed to read maze at {}: {}", path.display(), e))?,
            None => DEMO_MAZE.to_string(),
        };
        MazeGrid::from_ascii(&text, self.cell_size, origin).map_err(|e| e.to_string())
    }

    /// Session tunables.  Fails on an unknown direction, an empty clip pool
    /// or a non-positive travel time.
    pub fn session_config(&self) -> Result<SessionConfig, String> {
        if self.audio_clips.is_empty() {
            return Err("audio_clips must name at least one clip".to_string());
        }
        if !(self.travel_time_secs > 0.0) {
            return Err(format!(
                "travel_time_secs must be positive, got {}",
                self.travel_time_secs
            ));
        }
        let spawn_direction: Direction = self.spawn_direction.parse().map_err(|e| format!("{e}"))?;
        Ok(SessionConfig {
            travel_time: self.travel_time_secs,
            spawn: GridPosition::new(self.spawn[0], self.spawn[1]),
            spawn_direction,
            clips: self.audio_clips.clone(),
            pan_strength: self.pan_strength,
        })
    }

    pub fn tilt_input(&self) -> TiltInput {
        TiltInput::new(self.centered_sensitivity, self.movement_threshold)
    }

    /// Seconds per simulated frame.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}

/// Return the path to `~/.mazelink/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mazelink").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MAZELINK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MAZELINK_MAZE` | `maze_path` |
/// | `MAZELINK_TRAVEL_TIME` | `travel_time_secs` |
/// | `MAZELINK_TICK_HZ` | `tick_hz` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MAZELINK_MAZE") {
        cfg.maze_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("MAZELINK_TRAVEL_TIME")
        && let Ok(secs) = v.parse::<f32>()
    {
        cfg.travel_time_secs = secs;
    }
    if let Ok(v) = std::env::var("MAZELINK_TICK_HZ")
        && let Ok(hz) = v.parse::<u32>()
    {
        cfg.tick_hz = hz;
    }
}

/// Save the config, creating `~/.mazelink/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
