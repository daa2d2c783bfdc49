pub mod bank;
pub mod log_player;

#[cfg(feature = "rodio")]
pub mod rodio_player;

pub use bank::SampleBank;
pub use log_player::LogPlayer;

use pyano_config::{AudioBackend, AudioConfig};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Sample {name:?} not found at {}", .path.display())]
    MissingSample { name: String, path: PathBuf },
    #[error("Failed to read sample {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown sample {0:?}")]
    UnknownSample(String),
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Failed to decode sample {name:?}: {reason}")]
    Decode { name: String, reason: String },
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Something that can start a named sample and forget about it.
pub trait SamplePlayer {
    /// Start playback and return immediately.
    fn play(&mut self, name: &str) -> Result<(), AudioError>;
}

/// Open the configured backend for the given sample names.
pub fn open_player(
    config: &AudioConfig,
    names: &[String],
) -> Result<Box<dyn SamplePlayer>, AudioError> {
    match config.backend {
        AudioBackend::Log => Ok(Box::new(LogPlayer::new(names.iter().cloned()))),
        AudioBackend::Rodio => open_rodio(config, names),
    }
}

#[cfg(feature = "rodio")]
fn open_rodio(config: &AudioConfig, names: &[String]) -> Result<Box<dyn SamplePlayer>, AudioError> {
    let bank = SampleBank::load(
        &config.sample_dir,
        &config.extension,
        names.iter().map(String::as_str),
    )?;
    Ok(Box::new(rodio_player::RodioPlayer::open(bank)?))
}

#[cfg(not(feature = "rodio"))]
fn open_rodio(_config: &AudioConfig, _names: &[String]) -> Result<Box<dyn SamplePlayer>, AudioError> {
    Err(AudioError::DeviceUnavailable(
        "built without the `rodio` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_backend_needs_no_files() {
        let config = AudioConfig {
            sample_dir: PathBuf::from("/definitely/not/here"),
            ..AudioConfig::default()
        };
        let mut player = open_player(&config, &["snare".to_string()]).unwrap();
        player.play("snare").unwrap();
        assert!(matches!(player.play("cowbell"), Err(AudioError::UnknownSample(_))));
    }

    #[cfg(not(feature = "rodio"))]
    #[test]
    fn rodio_backend_unavailable_without_feature() {
        let config = AudioConfig {
            backend: AudioBackend::Rodio,
            ..AudioConfig::default()
        };
        assert!(matches!(
            open_player(&config, &[]),
            Err(AudioError::DeviceUnavailable(_))
        ));
    }
}
