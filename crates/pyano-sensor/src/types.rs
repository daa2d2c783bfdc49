use glam::Quat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque device identity as reported by the feed.
pub type DeviceHandle = u64;

/// Hand gesture recognized by the armband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    Rest,
    Fist,
    WaveIn,
    WaveOut,
    FingersSpread,
    DoubleTap,
    #[default]
    Unknown,
}

impl Pose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pose::Rest => "rest",
            Pose::Fist => "fist",
            Pose::WaveIn => "wave_in",
            Pose::WaveOut => "wave_out",
            Pose::FingersSpread => "fingers_spread",
            Pose::DoubleTap => "double_tap",
            Pose::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so that width/alignment flags work in status lines.
        f.pad(self.as_str())
    }
}

/// Which arm the device reports being worn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Left,
    Right,
    #[default]
    Unknown,
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Arm::Left => "left",
            Arm::Right => "right",
            Arm::Unknown => "unknown",
        })
    }
}

/// Direction the device's +x axis faces on the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XDirection {
    TowardWrist,
    TowardElbow,
    #[default]
    Unknown,
}

/// What happened on a device.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Paired { firmware: Vec<u32> },
    Unpaired,
    /// Absolute orientation as a unit quaternion.
    Orientation(Quat),
    Pose(Pose),
    ArmSynced { arm: Arm, x_direction: XDirection },
    ArmUnsynced,
    Locked,
    Unlocked,
}

/// A single event delivered by the sensor feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub device: DeviceHandle,
    /// Device timestamp in microseconds (0 when the feed omits it).
    pub timestamp: u64,
    pub kind: EventKind,
}

impl DeviceEvent {
    pub fn new(device: DeviceHandle, kind: EventKind) -> Self {
        Self {
            device,
            timestamp: 0,
            kind,
        }
    }
}
