//! Turns armband orientation into drum strikes.
//!
//! Orientation quaternions become integer roll/pitch/yaw angles measured
//! against a per-device origin. Raising the arm past a pitch threshold arms
//! a trigger; lowering it fires, and the yaw swing picks the sample.

pub mod angles;
pub mod collector;
pub mod gate;
pub mod instrument;
pub mod zones;

pub use angles::{correction, deviation, Angles};
pub use collector::{Collector, DeviceIndex, DeviceState};
pub use gate::TriggerGate;
pub use instrument::{Instrument, Strike};
pub use zones::{Zone, ZoneError, ZoneMap, ZoneTable};
