use crate::angles::ANGLE_MAX;
use pyano_config::{ZoneBandConfig, ZoneConfig};
use pyano_sensor::Arm;
use thiserror::Error;

/// Bands per arm.
pub const BANDS_PER_ARM: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("{arm} arm needs {} zone bands, got {count}", BANDS_PER_ARM)]
    BandCount { arm: &'static str, count: usize },
    #[error("{arm} arm band {index} starts at {start}, beyond {}", ANGLE_MAX)]
    StartOutOfRange {
        arm: &'static str,
        index: usize,
        start: u16,
    },
    #[error("{arm} arm band {index} must start after the band before it")]
    NotIncreasing { arm: &'static str, index: usize },
    #[error("{arm} arm band {index} has no sample")]
    EmptySample { arm: &'static str, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Band {
    start: u16,
    sample: String,
}

/// Result of classifying a corrected yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone<'a> {
    pub index: usize,
    pub sample: &'a str,
}

/// Partition of the corrected-yaw circle into sample bands for one arm.
///
/// A yaw belongs to the band with the greatest start not above it. Values
/// below the first start belong to the last band, which wraps through 0, so
/// every angle on the scale lands in exactly one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTable {
    bands: [Band; BANDS_PER_ARM],
}

impl ZoneTable {
    pub fn from_config(arm: &'static str, bands: &[ZoneBandConfig]) -> Result<Self, ZoneError> {
        if bands.len() != BANDS_PER_ARM {
            return Err(ZoneError::BandCount {
                arm,
                count: bands.len(),
            });
        }

        for (index, band) in bands.iter().enumerate() {
            if band.start > ANGLE_MAX {
                return Err(ZoneError::StartOutOfRange {
                    arm,
                    index,
                    start: band.start,
                });
            }
            if index > 0 && band.start <= bands[index - 1].start {
                return Err(ZoneError::NotIncreasing { arm, index });
            }
            if band.sample.trim().is_empty() {
                return Err(ZoneError::EmptySample { arm, index });
            }
        }

        let bands = std::array::from_fn(|i| Band {
            start: bands[i].start,
            sample: bands[i].sample.clone(),
        });
        Ok(Self { bands })
    }

    pub fn classify(&self, corrected_yaw: u16) -> Zone<'_> {
        let index = self
            .bands
            .iter()
            .rposition(|band| band.start <= corrected_yaw)
            .unwrap_or(BANDS_PER_ARM - 1);
        Zone {
            index,
            sample: &self.bands[index].sample,
        }
    }

    /// Sample names in band order.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|band| band.sample.as_str())
    }
}

/// Zone tables for both arms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMap {
    left: ZoneTable,
    right: ZoneTable,
}

impl ZoneMap {
    pub fn from_config(config: &ZoneConfig) -> Result<Self, ZoneError> {
        Ok(Self {
            left: ZoneTable::from_config("left", &config.left)?,
            right: ZoneTable::from_config("right", &config.right)?,
        })
    }

    /// Devices that have not reported their arm play the right-arm table.
    pub fn table(&self, arm: Arm) -> &ZoneTable {
        match arm {
            Arm::Left => &self.left,
            Arm::Right | Arm::Unknown => &self.right,
        }
    }

    /// Every distinct sample name, in first-use order.
    pub fn sample_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for sample in self.left.samples().chain(self.right.samples()) {
            if !names.iter().any(|n| n == sample) {
                names.push(sample.to_string());
            }
        }
        names
    }
}
