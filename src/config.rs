use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub audio: AudioConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub tick_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub unlocks_path: String,
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
                recordings_path: std::env::temp_dir().display().to_string(),
                tick_interval_ms: 50,
            },
            storage: StorageConfig {
                unlocks_path: "voicenote-unlocks.json".to_string(),
            },
        }
    }
}
