use crate::{AudioError, SamplePlayer};
use std::collections::HashMap;
use tracing::info;

/// Player that only logs strikes. Useful without speakers or sample files.
#[derive(Debug, Default)]
pub struct LogPlayer {
    plays: HashMap<String, u64>,
}

impl LogPlayer {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            plays: names.into_iter().map(|name| (name, 0)).collect(),
        }
    }

    /// How many times `name` has been played.
    pub fn play_count(&self, name: &str) -> u64 {
        self.plays.get(name).copied().unwrap_or(0)
    }

    pub fn total_plays(&self) -> u64 {
        self.plays.values().sum()
    }
}

impl SamplePlayer for LogPlayer {
    fn play(&mut self, name: &str) -> Result<(), AudioError> {
        let count = self
            .plays
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownSample(name.to_string()))?;
        *count += 1;
        info!(sample = name, count = *count, "Play (log backend)");
        Ok(())
    }
}
