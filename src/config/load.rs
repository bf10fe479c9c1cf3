use std::{env, path::PathBuf};

use super::schema::Settings;

impl Settings {
    /// Load settings for an embedding application.
    ///
    /// Sources, lowest to highest precedence: struct defaults, an optional
    /// TOML file (`WAVEROOM_CONFIG_PATH` or the XDG default location), then
    /// `WAVEROOM__`-prefixed environment variables.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder
            .add_source(
                ::config::Environment::with_prefix("WAVEROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.engine.poll_interval_ms == 0 {
            return Err("engine.poll_interval_ms must be >= 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err("playback.volume must be within [0, 1]".to_string());
        }
        if self.effects.enabled && self.effects.noise_ms == 0 {
            return Err("effects.noise_ms must be >= 1 when effects are enabled".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `WAVEROOM_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os("WAVEROOM_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// Compute the default config path under `$XDG_CONFIG_HOME/waveroom/config.toml`
/// or `~/.config/waveroom/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;

    Some(config_home.join("waveroom").join("config.toml"))
}
