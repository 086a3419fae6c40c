use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::GestureError,
    trigger::{Activation, DEFAULT_COOLDOWN_TICKS, DEFAULT_COUNTDOWN_TICKS, TriggerTimings},
    types::Gesture,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gesture ids (`victory`) or emoji code points (`0x270C`).
    #[serde(default = "default_activation")]
    pub activation: Vec<Gesture>,
    #[serde(default = "default_countdown_ticks")]
    pub countdown_ticks: u32,
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Playback rate for recorded landmark streams.
    #[serde(default = "default_replay_fps")]
    pub replay_fps: u32,
}

fn default_activation() -> Vec<Gesture> { vec![Gesture::Victory] }
fn default_countdown_ticks() -> u32 { DEFAULT_COUNTDOWN_TICKS }
fn default_cooldown_ticks() -> u32 { DEFAULT_COOLDOWN_TICKS }
fn default_tick_interval_ms() -> u64 { 1_000 }
fn default_replay_fps() -> u32 { 30 }

impl Default for Config {
    fn default() -> Self {
        Self {
            activation: default_activation(),
            countdown_ticks: default_countdown_ticks(),
            cooldown_ticks: default_cooldown_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            replay_fps: default_replay_fps(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("failed to write config {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        self.activation()?;
        self.timings()?;
        if self.tick_interval_ms == 0 {
            return Err(GestureError::InvalidTimings("tick interval must be non-zero"));
        }
        if self.replay_fps == 0 {
            return Err(GestureError::InvalidTimings("replay fps must be non-zero"));
        }
        Ok(())
    }

    pub fn activation(&self) -> Result<Activation, GestureError> {
        Activation::new(self.activation.iter().copied())
    }

    pub fn timings(&self) -> Result<TriggerTimings, GestureError> {
        TriggerTimings::new(self.countdown_ticks, self.cooldown_ticks)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.replay_fps.max(1)))
    }
}
