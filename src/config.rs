use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub audio: AudioConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Single-slot scratch file for the in-progress take.
    pub scratch_path: String,
    /// Directory saved memos are copied into.
    pub recordings_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// JSON catalog of saved recordings.
    pub catalog_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig {
                scratch_path: ".dictaphone/scratch.wav".to_string(),
                recordings_dir: ".dictaphone/recordings".to_string(),
            },
            store: StoreConfig {
                catalog_path: ".dictaphone/catalog.json".to_string(),
            },
        }
    }
}
