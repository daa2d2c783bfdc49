use crate::angles::Angles;
use pyano_sensor::{Arm, DeviceEvent, DeviceHandle, EventKind, Pose};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// Position of a device in pairing order.
pub type DeviceIndex = usize;

/// Everything known about one paired device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub handle: DeviceHandle,
    /// Latest orientation.
    pub angles: Angles,
    /// Zero reference, captured from the first orientation sample while unset.
    pub origin: Option<Angles>,
    pub unlocked: bool,
    pub on_arm: bool,
    pub arm: Arm,
    pub pose: Pose,
}

impl DeviceState {
    fn new(handle: DeviceHandle) -> Self {
        Self {
            handle,
            angles: Angles::default(),
            origin: None,
            unlocked: false,
            on_arm: false,
            arm: Arm::Unknown,
            pose: Pose::Unknown,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.handle);
    }

    /// One-line summary: angles, then lock, arm and pose when worn.
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "[ Roll: {} ] [ Pitch: {} ] [ Yaw: {} ]",
            self.angles.roll, self.angles.pitch, self.angles.yaw
        );

        if self.on_arm {
            let lock = if self.unlocked { "unlocked" } else { "locked  " };
            let arm = match self.arm {
                Arm::Left => 'L',
                Arm::Right => 'R',
                Arm::Unknown => '?',
            };
            let _ = write!(line, "[{lock}][{arm}][{:<14}]", self.pose);
        } else {
            let _ = write!(line, "[{:8}][?][{:14}]", "", "");
        }
        line
    }
}

/// Tracks per-device state from the event feed.
///
/// Devices get an index on first pairing and keep it for the lifetime of
/// the collector, even across unpair/re-pair.
#[derive(Debug, Clone)]
pub struct Collector {
    devices: Vec<DeviceState>,
    reset_pose: Pose,
}

impl Collector {
    pub fn new(reset_pose: Pose) -> Self {
        Self {
            devices: Vec::new(),
            reset_pose,
        }
    }

    pub fn identify(&self, handle: DeviceHandle) -> Option<DeviceIndex> {
        self.devices.iter().position(|d| d.handle == handle)
    }

    pub fn devices(&self) -> &[DeviceState] {
        &self.devices
    }

    pub fn device(&self, index: DeviceIndex) -> Option<&DeviceState> {
        self.devices.get(index)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Apply one event. Returns the index of the device it touched, or
    /// `None` when it came from a device that never paired.
    pub fn handle(&mut self, event: &DeviceEvent) -> Option<DeviceIndex> {
        if let EventKind::Paired { firmware } = &event.kind {
            let index = match self.identify(event.device) {
                Some(index) => {
                    self.devices[index].reset();
                    index
                }
                None => {
                    self.devices.push(DeviceState::new(event.device));
                    self.devices.len() - 1
                }
            };
            info!(index, handle = event.device, ?firmware, "Paired with {index}");
            return Some(index);
        }

        let Some(index) = self.identify(event.device) else {
            warn!(handle = event.device, kind = ?event.kind, "Event from unpaired device dropped");
            return None;
        };
        let reset_pose = self.reset_pose;
        let device = &mut self.devices[index];

        match &event.kind {
            // Handled above.
            EventKind::Paired { .. } => {}
            EventKind::Unpaired => {
                info!(index, "Unpaired");
                device.reset();
            }
            EventKind::Orientation(quat) => {
                let angles = Angles::from_quaternion(*quat);
                if device.origin.is_none() {
                    debug!(index, ?angles, "Origin captured");
                    device.origin = Some(angles);
                }
                device.angles = angles;
            }
            EventKind::Pose(pose) => {
                device.pose = *pose;
                debug!(index, %pose, "Pose");
                if *pose == reset_pose {
                    info!(index, %pose, "Origin reset");
                    device.origin = None;
                }
            }
            EventKind::ArmSynced { arm, x_direction } => {
                info!(index, %arm, ?x_direction, "Arm synced");
                device.on_arm = true;
                device.arm = *arm;
            }
            EventKind::ArmUnsynced => {
                info!(index, "Arm unsynced");
                device.on_arm = false;
            }
            EventKind::Unlocked => device.unlocked = true,
            EventKind::Locked => device.unlocked = false,
        }

        Some(index)
    }

    pub fn status_lines(&self) -> Vec<String> {
        self.devices.iter().map(DeviceState::status_line).collect()
    }
}
