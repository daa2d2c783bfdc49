use crate::AudioError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Sample files held in memory so a strike never waits on the disk.
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: HashMap<String, Arc<[u8]>>,
}

impl SampleBank {
    /// Read `<dir>/<name>.<extension>` for every name.
    pub fn load<'a>(
        dir: &Path,
        extension: &str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, AudioError> {
        let mut samples = HashMap::new();
        for name in names {
            if samples.contains_key(name) {
                continue;
            }
            let path = dir.join(format!("{name}.{extension}"));
            if !path.is_file() {
                return Err(AudioError::MissingSample {
                    name: name.to_string(),
                    path,
                });
            }
            let data = std::fs::read(&path).map_err(|source| AudioError::Read {
                path: path.clone(),
                source,
            })?;
            info!(name, path = %path.display(), bytes = data.len(), "Loaded sample");
            samples.insert(name.to_string(), Arc::from(data));
        }
        Ok(Self { samples })
    }

    pub fn get(&self, name: &str) -> Result<Arc<[u8]>, AudioError> {
        self.samples
            .get(name)
            .cloned()
            .ok_or_else(|| AudioError::UnknownSample(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
