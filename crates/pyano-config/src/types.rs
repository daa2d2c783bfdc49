use pyano_sensor::Pose;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where armband events come from.
    pub sensor: SensorConfig,
    /// Sample playback.
    pub audio: AudioConfig,
    /// Trigger thresholds and loop timing.
    pub gesture: GestureConfig,
    /// Yaw bands per arm.
    pub zones: ZoneConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    /// Newline-delimited JSON over TCP.
    Tcp,
    /// Recorded feed file.
    Replay,
    /// No events at all.
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub source: SensorSource,
    /// Bridge address for the `tcp` source.
    pub address: String,
    /// Recording for the `replay` source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_path: Option<PathBuf>,
    /// Replay speed multiplier. 0 replays without pacing.
    pub replay_speed: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: SensorSource::Tcp,
            address: pyano_sensor::DEFAULT_FEED_ADDR.to_string(),
            replay_path: None,
            replay_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// Log each strike instead of playing it.
    Log,
    /// Default output device via rodio (needs the `rodio` feature).
    Rodio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
    /// Directory holding one file per sample name.
    pub sample_dir: PathBuf,
    /// File extension of sample files.
    pub extension: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::Log,
            sample_dir: PathBuf::from("Sounds"),
            extension: "wav".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Main loop rate. Events are drained and gates evaluated once per tick.
    pub tick_hz: u32,
    /// Pitch deviation above which a device is armed.
    pub arm_above: i32,
    /// Pitch deviation below which an armed device strikes.
    pub fire_below: i32,
    /// Pose that clears the origin so it is recaptured.
    pub reset_pose: Pose,
    /// Ignore devices that are locked.
    pub require_unlocked: bool,
    /// Log device status every N ticks. 0 logs only once.
    pub status_every_ticks: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            arm_above: 45,
            fire_below: 30,
            reset_pose: Pose::Fist,
            require_unlocked: false,
            status_every_ticks: 20,
        }
    }
}

/// One yaw band: covers `start` up to the next band's start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBandConfig {
    pub start: u16,
    pub sample: String,
}

impl ZoneBandConfig {
    pub fn new(start: u16, sample: &str) -> Self {
        Self {
            start,
            sample: sample.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub left: Vec<ZoneBandConfig>,
    pub right: Vec<ZoneBandConfig>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        // The last band of each arm wraps through 0, so straight ahead
        // (corrected yaw near 0) lands on the snare for both arms.
        Self {
            left: vec![
                ZoneBandConfig::new(40, "tom_high"),
                ZoneBandConfig::new(140, "tom_low"),
                ZoneBandConfig::new(220, "kick"),
                ZoneBandConfig::new(300, "snare"),
            ],
            right: vec![
                ZoneBandConfig::new(30, "hihat"),
                ZoneBandConfig::new(100, "ride"),
                ZoneBandConfig::new(200, "crash"),
                ZoneBandConfig::new(320, "snare"),
            ],
        }
    }
}
