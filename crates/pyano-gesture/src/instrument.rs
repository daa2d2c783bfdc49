use crate::angles::{correction, deviation};
use crate::collector::{Collector, DeviceIndex};
use crate::gate::TriggerGate;
use crate::zones::{ZoneError, ZoneMap};
use pyano_config::{AppConfig, GestureConfig};
use pyano_sensor::{Arm, DeviceEvent};
use tracing::debug;

/// One fired trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strike {
    pub device: DeviceIndex,
    pub arm: Arm,
    /// Band index within the arm's zone table.
    pub zone: usize,
    /// Corrected yaw that selected the band.
    pub yaw: u16,
    pub sample: String,
}

/// Collector, per-device gates and zone tables, evaluated once per tick.
pub struct Instrument {
    collector: Collector,
    gates: Vec<TriggerGate>,
    zones: ZoneMap,
    arm_above: i32,
    fire_below: i32,
    require_unlocked: bool,
}

impl Instrument {
    pub fn new(config: &GestureConfig, zones: ZoneMap) -> Self {
        Self {
            collector: Collector::new(config.reset_pose),
            gates: Vec::new(),
            zones,
            arm_above: config.arm_above,
            fire_below: config.fire_below,
            require_unlocked: config.require_unlocked,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ZoneError> {
        Ok(Self::new(&config.gesture, ZoneMap::from_config(&config.zones)?))
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    /// Every sample a strike can name.
    pub fn sample_names(&self) -> Vec<String> {
        self.zones.sample_names()
    }

    pub fn handle(&mut self, event: &DeviceEvent) {
        let Some(index) = self.collector.handle(event) else {
            return;
        };
        if self.gates.len() <= index {
            self.gates
                .resize(index + 1, TriggerGate::new(self.arm_above, self.fire_below));
        }
        // Pairing, unpairing and the reset pose clear the origin. The next
        // sample recaptures it before any tick, so disarm now.
        if self.collector.device(index).is_some_and(|d| d.origin.is_none()) {
            self.gates[index].disarm();
        }
    }

    /// Evaluate every device's gate against its latest orientation.
    pub fn tick(&mut self) -> Vec<Strike> {
        let mut strikes = Vec::new();

        for (index, device) in self.collector.devices().iter().enumerate() {
            let Some(gate) = self.gates.get_mut(index) else {
                continue;
            };
            // No reference yet (fresh pairing or reset pose): nothing to compare.
            let Some(origin) = device.origin else {
                gate.disarm();
                continue;
            };
            if self.require_unlocked && !device.unlocked {
                gate.disarm();
                continue;
            }

            if gate.update(deviation(device.angles.pitch, origin.pitch)) {
                let yaw = correction(device.angles.yaw, origin.yaw);
                let zone = self.zones.table(device.arm).classify(yaw);
                debug!(index, yaw, zone = zone.index, sample = zone.sample, "Gate fired");
                strikes.push(Strike {
                    device: index,
                    arm: device.arm,
                    zone: zone.index,
                    yaw,
                    sample: zone.sample.to_string(),
                });
            }
        }

        strikes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use pyano_sensor::{DeviceHandle, EventKind, Pose, XDirection};
    use std::f32::consts::FRAC_PI_2;

    fn instrument() -> Instrument {
        Instrument::from_config(&AppConfig::default()).unwrap()
    }

    fn send(instrument: &mut Instrument, device: DeviceHandle, kind: EventKind) {
        instrument.handle(&DeviceEvent::new(device, kind));
    }

    /// Arm swung `yaw` radians to the side, then raised `pitch` radians.
    fn pose(yaw: f32, pitch: f32) -> EventKind {
        EventKind::Orientation(Quat::from_rotation_z(yaw) * Quat::from_rotation_y(pitch))
    }

    fn sync(instrument: &mut Instrument, device: DeviceHandle, arm: Arm) {
        send(instrument, device, EventKind::Paired { firmware: vec![] });
        send(
            instrument,
            device,
            EventKind::ArmSynced {
                arm,
                x_direction: XDirection::TowardWrist,
            },
        );
        send(instrument, device, pose(0.0, 0.0));
    }

    #[test]
    fn raise_and_lower_straight_ahead_hits_snare() {
        let mut inst = instrument();
        sync(&mut inst, 1, Arm::Right);
        assert!(inst.tick().is_empty());

        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());

        send(&mut inst, 1, pose(0.0, 0.0));
        let strikes = inst.tick();
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].device, 0);
        assert_eq!(strikes[0].arm, Arm::Right);
        assert_eq!(strikes[0].yaw, 0);
        assert_eq!(strikes[0].sample, "snare");

        // Staying down does not strike again.
        assert!(inst.tick().is_empty());
    }

    #[test]
    fn swing_selects_the_arm_specific_zone() {
        let mut inst = instrument();
        sync(&mut inst, 1, Arm::Right);
        sync(&mut inst, 2, Arm::Left);

        // Swing both arms a third of a turn around, raise, lower.
        let swing = -FRAC_PI_2 * 4.0 / 3.0;
        send(&mut inst, 1, pose(swing, FRAC_PI_2 / 3.0));
        send(&mut inst, 2, pose(swing, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());

        send(&mut inst, 1, pose(swing, 0.0));
        send(&mut inst, 2, pose(swing, 0.0));
        let strikes = inst.tick();
        assert_eq!(strikes.len(), 2);

        // Yaw 179 - 120 units: corrected into the upper half of the circle.
        assert!(strikes.iter().all(|s| (230..250).contains(&s.yaw)), "{strikes:?}");
        assert_eq!(strikes[0].sample, "crash");
        assert_eq!(strikes[1].sample, "kick");
    }

    #[test]
    fn unknown_arm_plays_right_table() {
        let mut inst = instrument();
        send(&mut inst, 5, EventKind::Paired { firmware: vec![] });
        send(&mut inst, 5, pose(0.0, 0.0));
        send(&mut inst, 5, pose(FRAC_PI_2 / 2.0, FRAC_PI_2 / 3.0));
        inst.tick();
        send(&mut inst, 5, pose(FRAC_PI_2 / 2.0, 0.0));

        let strikes = inst.tick();
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].arm, Arm::Unknown);
        assert_eq!(strikes[0].sample, "hihat");
    }

    #[test]
    fn reset_pose_cancels_a_raised_arm() {
        let mut inst = instrument();
        sync(&mut inst, 1, Arm::Right);
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        inst.tick();

        send(&mut inst, 1, EventKind::Pose(Pose::Fist));
        assert!(inst.tick().is_empty());

        // New origin is captured with the arm raised; lowering is a negative
        // deviation but the gate was disarmed by the reset.
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        send(&mut inst, 1, pose(0.0, 0.0));
        assert!(inst.tick().is_empty());
    }

    #[test]
    fn reset_between_ticks_does_not_strike() {
        let mut inst = instrument();
        sync(&mut inst, 1, Arm::Right);
        inst.tick();
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());

        // Reset and a fresh sample, still raised, land in the same tick.
        send(&mut inst, 1, EventKind::Pose(Pose::Fist));
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());

        // The raised pitch is the new origin; a full raise/lower from it strikes.
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 * 2.0 / 3.0));
        assert!(inst.tick().is_empty());
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert_eq!(inst.tick().len(), 1);
    }

    #[test]
    fn repairing_a_raised_device_does_not_strike() {
        let mut inst = instrument();
        sync(&mut inst, 1, Arm::Right);
        inst.tick();
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());

        send(&mut inst, 1, EventKind::Paired { firmware: vec![] });
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());
        assert_eq!(inst.collector().len(), 1);
    }

    #[test]
    fn locked_devices_can_be_ignored() {
        let mut config = AppConfig::default();
        config.gesture.require_unlocked = true;
        let mut inst = Instrument::from_config(&config).unwrap();
        sync(&mut inst, 1, Arm::Right);

        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        inst.tick();
        send(&mut inst, 1, pose(0.0, 0.0));
        assert!(inst.tick().is_empty());

        send(&mut inst, 1, EventKind::Unlocked);
        send(&mut inst, 1, pose(0.0, FRAC_PI_2 / 3.0));
        inst.tick();
        send(&mut inst, 1, pose(0.0, 0.0));
        assert_eq!(inst.tick().len(), 1);
    }

    #[test]
    fn bundled_session_plays_a_short_groove() {
        let session = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../demos/drum_session.jsonl"
        ));
        let mut inst = instrument();
        let mut strikes = Vec::new();

        // 20 Hz ticks over the recorded timestamps.
        let tick_us = 50_000;
        let mut window_end = tick_us;
        for line in session.lines() {
            let event = pyano_sensor::protocol::parse_line(line).unwrap();
            while event.timestamp >= window_end {
                strikes.extend(inst.tick());
                window_end += tick_us;
            }
            inst.handle(&event);
        }
        strikes.extend(inst.tick());

        let played: Vec<(DeviceIndex, u16, &str)> = strikes
            .iter()
            .map(|s| (s.device, s.yaw, s.sample.as_str()))
            .collect();
        assert_eq!(
            played,
            [
                (0, 0, "snare"),
                (0, 60, "hihat"),
                (1, 240, "kick"),
                (1, 90, "tom_high"),
            ]
        );
    }

    #[test]
    fn events_from_strangers_are_ignored() {
        let mut inst = instrument();
        send(&mut inst, 9, pose(0.0, FRAC_PI_2 / 3.0));
        assert!(inst.tick().is_empty());
        assert!(inst.collector().is_empty());
    }
}
