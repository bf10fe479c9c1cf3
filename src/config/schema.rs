use serde::Deserialize;

use crate::state::RepeatMode;

/// Top-level engine settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/waveroom/config.toml` or `~/.config/waveroom/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `WAVEROOM__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub effects: EffectsSettings,
    pub telemetry: TelemetrySettings,
    pub engine: EngineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            effects: EffectsSettings::default(),
            telemetry: TelemetrySettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Repeat mode the engine starts in.
    pub repeat_mode: RepeatMode,
    /// Initial output volume; clamped to `[0, 1]` when applied.
    pub volume: f64,
    /// Pause between a navigation call and the actual track load
    /// (milliseconds). Overlaps perceived load latency with the transition
    /// sound. Set to 0 to load immediately.
    pub navigation_delay_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatMode::None,
            volume: 1.0,
            navigation_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EffectsSettings {
    /// Whether the transition static burst is played between tracks.
    pub enabled: bool,
    /// Length of the generated noise buffer (milliseconds).
    pub noise_ms: u64,
    /// Peak gain of the burst relative to full scale.
    pub gain: f32,
}

impl Default for EffectsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_ms: 1500,
            gain: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Base URL of the play-count service. Telemetry is skipped when unset.
    pub endpoint: Option<String>,
    /// Request timeout for play reports (milliseconds).
    pub timeout_ms: u64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How often the engine thread polls the device between commands
    /// (milliseconds). Bounds progress-update granularity and end-of-track
    /// detection latency.
    pub poll_interval_ms: u64,
    /// Timeout for pulling media bytes over HTTP (milliseconds).
    pub fetch_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            fetch_timeout_ms: 15_000,
        }
    }
}
