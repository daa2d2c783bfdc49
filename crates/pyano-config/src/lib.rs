mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Returns the config directory: <platform config dir>/myo-pyano/
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("myo-pyano");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the config file path: <platform config dir>/myo-pyano/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from the default location, or return default if not found.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

/// Load config from `path`, or return default if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!(?path, "No config found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Save config to the default location.
pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

/// Save config to `path`.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(?path, "Saved config");
    Ok(())
}

impl AppConfig {
    /// Check values that would make the main loop misbehave.
    ///
    /// Zone tables are checked when the zone map is built from them.
    pub fn validate(&self) -> Result<()> {
        let gesture = &self.gesture;
        if !(1..=1000).contains(&gesture.tick_hz) {
            bail!("gesture.tick_hz must be in 1..=1000, got {}", gesture.tick_hz);
        }
        if gesture.fire_below > gesture.arm_above {
            bail!(
                "gesture.fire_below ({}) must not exceed gesture.arm_above ({})",
                gesture.fire_below,
                gesture.arm_above
            );
        }

        let sensor = &self.sensor;
        if !sensor.replay_speed.is_finite() || sensor.replay_speed < 0.0 {
            bail!("sensor.replay_speed must be a non-negative number");
        }
        match sensor.source {
            SensorSource::Replay if sensor.replay_path.is_none() => {
                bail!("sensor.source = \"replay\" needs sensor.replay_path")
            }
            SensorSource::Tcp if sensor.address.trim().is_empty() => {
                bail!("sensor.source = \"tcp\" needs sensor.address")
            }
            _ => {}
        }

        if self.audio.extension.is_empty() {
            bail!("audio.extension must not be empty");
        }
        Ok(())
    }
}
