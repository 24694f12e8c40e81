//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [physics]
//! time_step = 0.0333
//! gravity_x = 0
//! gravity_y = -9.8
//!
//! [view]
//! width = 640
//! height = 360
//! distance = 0.05
//!
//! [demo]
//! frames = 240
//! delta = 0.0166
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::{EngineError, Result};
use crate::math::Vec2;

/// Default safe values for startup
const DEFAULT_TIME_STEP: f32 = 1.0 / 30.0;
const DEFAULT_GRAVITY_X: f32 = 0.0;
const DEFAULT_GRAVITY_Y: f32 = 0.0;
const DEFAULT_VIEW_WIDTH: u32 = 640;
const DEFAULT_VIEW_HEIGHT: u32 = 360;
const DEFAULT_VIEW_DISTANCE: f32 = 0.05;
const DEFAULT_DEMO_FRAMES: u32 = 240;
const DEFAULT_DEMO_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Engine configuration resource.
///
/// Stores physics, view and demo settings. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fixed physics step in seconds; 0 runs one step per frame.
    pub time_step: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
    /// Viewport width in pixels.
    pub view_width: u32,
    /// Viewport height in pixels.
    pub view_height: u32,
    /// Camera zoom; the projection scales world units by `2 / distance` pixels.
    pub view_distance: f32,
    /// Frames the demo binary simulates.
    pub demo_frames: u32,
    /// Frame delta the demo binary feeds the scene manager.
    pub demo_delta: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            gravity_x: DEFAULT_GRAVITY_X,
            gravity_y: DEFAULT_GRAVITY_Y,
            view_width: DEFAULT_VIEW_WIDTH,
            view_height: DEFAULT_VIEW_HEIGHT,
            view_distance: DEFAULT_VIEW_DISTANCE,
            demo_frames: DEFAULT_DEMO_FRAMES,
            demo_delta: DEFAULT_DEMO_DELTA,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity_x, self.gravity_y)
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<()> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|e| {
            EngineError::Config(format!("failed to load {:?}: {}", self.config_path, e))
        })?;

        // [physics] section
        if let Some(step) = get_f32(&config, "physics", "time_step")? {
            self.time_step = step;
        }
        if let Some(x) = get_f32(&config, "physics", "gravity_x")? {
            self.gravity_x = x;
        }
        if let Some(y) = get_f32(&config, "physics", "gravity_y")? {
            self.gravity_y = y;
        }

        // [view] section
        if let Some(width) = config.getuint("view", "width").ok().flatten() {
            self.view_width = width as u32;
        }
        if let Some(height) = config.getuint("view", "height").ok().flatten() {
            self.view_height = height as u32;
        }
        if let Some(distance) = get_f32(&config, "view", "distance")? {
            self.view_distance = distance;
        }

        // [demo] section
        if let Some(frames) = config.getuint("demo", "frames").ok().flatten() {
            self.demo_frames = frames as u32;
        }
        if let Some(delta) = get_f32(&config, "demo", "delta")? {
            self.demo_delta = delta;
        }

        info!(
            "Loaded config: time_step={}, gravity=({}, {}), view={}x{} @ {}, demo={} frames @ {}",
            self.time_step,
            self.gravity_x,
            self.gravity_y,
            self.view_width,
            self.view_height,
            self.view_distance,
            self.demo_frames,
            self.demo_delta
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<()> {
        let mut config = Ini::new();

        config.set("physics", "time_step", Some(self.time_step.to_string()));
        config.set("physics", "gravity_x", Some(self.gravity_x.to_string()));
        config.set("physics", "gravity_y", Some(self.gravity_y.to_string()));

        config.set("view", "width", Some(self.view_width.to_string()));
        config.set("view", "height", Some(self.view_height.to_string()));
        config.set("view", "distance", Some(self.view_distance.to_string()));

        config.set("demo", "frames", Some(self.demo_frames.to_string()));
        config.set("demo", "delta", Some(self.demo_delta.to_string()));

        config.write(&self.config_path).map_err(|e| {
            EngineError::Config(format!("failed to save {:?}: {}", self.config_path, e))
        })?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Set the viewport size.
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn view_size(&self) -> (u32, u32) {
        (self.view_width, self.view_height)
    }
}

/// A present but unparsable value is an error; a missing one is `None`.
fn get_f32(config: &Ini, section: &str, key: &str) -> Result<Option<f32>> {
    config
        .getfloat(section, key)
        .map(|v| v.map(|v| v as f32))
        .map_err(|e| EngineError::Config(format!("[{}] {}: {}", section, key, e)))
}
