use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, io};

use dewguard_embedded::ControlConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    pub tick_millis: u64,
    pub settle_ticks: u8,
}

impl Control {
    pub fn to_config(&self) -> ControlConfig {
        ControlConfig {
            tick_period: Duration::from_millis(self.tick_millis),
            settle_ticks: self.settle_ticks,
        }
    }
}

/// Air the simulated hygrometer sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ambient {
    pub temperature: f32,
    pub humidity: f32,
    pub temperature_noise: f32,
    pub humidity_noise: f32,
    pub seed: Option<u64>,
}

/// First-order thermal model of the heated optics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub heater_gain: f32,
    pub loss: f32,
    pub sink_offset: f32,
    pub noise: f32,
    #[serde(default)]
    pub disconnected: Vec<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub control: Control,
    pub ambient: Ambient,
    pub plant: Plant,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut settings = Self::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        settings.storage.path = Self::normalize_path(&settings.storage.path)?
            .to_string_lossy()
            .to_string();

        Ok(settings)
    }

    pub fn from_toml(source: &str) -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(source)?;
        if settings.control.tick_millis == 0 {
            return Err("control.tick_millis must be positive".into());
        }
        Ok(settings)
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf
        } else {
            env::current_dir()?.join(path_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [logger]
        level = "debug"

        [control]
        tick_millis = 250
        settle_ticks = 5

        [ambient]
        temperature = 12.5
        humidity = 70.0
        temperature_noise = 0.0
        humidity_noise = 0.0

        [plant]
        heater_gain = 2.0
        loss = 0.2
        sink_offset = -3.0
        noise = 0.0

        [storage]
        path = "/tmp/dewguard.bin"
    "#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(SAMPLE).unwrap();
        assert_eq!(settings.logger.level, "debug");
        assert!(settings.plant.disconnected.is_empty());
        assert_eq!(settings.ambient.seed, None);

        let control = settings.control.to_config();
        assert_eq!(control.tick_period, Duration::from_millis(250));
        assert_eq!(control.settle_ticks, 5);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let source = SAMPLE.replace("tick_millis = 250", "tick_millis = 0");
        assert!(Settings::from_toml(&source).is_err());
    }

    #[test]
    fn test_bundled_settings() {
        let settings = Settings::new().unwrap();
        assert!(PathBuf::from(&settings.storage.path).is_absolute());
    }
}
