use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Fixed;

use super::{AmbientInput, AmbientSample};

/// Lowest humidity fed into the dew point formula, `ln(0)` is undefined.
const MIN_HUMIDITY: f32 = 0.1;
const MAX_HUMIDITY: f32 = 100.0;

const MAGNUS_A: f32 = 17.271;
const MAGNUS_B: f32 = 237.7;

/// Dew point (°C) from temperature (°C) and relative humidity (%) using the
/// Magnus approximation. Within ~0.65 ℃ of the NOAA reference formula.
pub fn dew_point(temperature: f32, humidity: f32) -> f32 {
    let rh = humidity.clamp(MIN_HUMIDITY, MAX_HUMIDITY);
    let alpha = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + libm::logf(rh / 100.0);
    let dew = (MAGNUS_B * alpha) / (MAGNUS_A - alpha);

    // Saturated air can round a hair above the dry bulb
    dew.min(temperature)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Added to the sampled temperature (hundredths of ℃)
    pub temp_offset: Fixed,
    /// Added to the sampled relative humidity (hundredths of %)
    pub rh_offset: Fixed,
}

#[derive(Debug, Clone, Default)]
pub struct AmbientSensor {
    config: AmbientConfig,
    sample: Option<AmbientSample>,
}

impl AmbientSensor {
    pub fn new(config: AmbientConfig) -> Self {
        Self {
            config,
            sample: None,
        }
    }

    /// Re-samples the external sensor. A failed or implausible sample clears
    /// the previous one so nothing downstream regulates against stale air data.
    pub fn refresh<I: AmbientInput>(&mut self, input: &mut I) -> Result<()> {
        match input.read().and_then(AmbientSample::validated) {
            Ok(sample) => {
                self.sample = Some(sample);
                Ok(())
            }
            Err(e) => {
                if self.sample.take().is_some() {
                    log::warn!("Ambient sensor lost: {}", e);
                }
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.sample.is_some()
    }

    /// Calibrated temperature (°C), zero while no sample is available.
    pub fn temperature(&self) -> f32 {
        self.sample
            .map(|s| s.temperature + self.config.temp_offset.to_f32())
            .unwrap_or(0.0)
    }

    /// Calibrated relative humidity (%), clamped to the physical range.
    pub fn humidity(&self) -> f32 {
        self.sample
            .map(|s| (s.humidity + self.config.rh_offset.to_f32()).clamp(0.0, MAX_HUMIDITY))
            .unwrap_or(0.0)
    }

    /// Always derived from the current sample and offsets, never cached.
    pub fn dew_point(&self) -> f32 {
        dew_point(self.temperature(), self.humidity())
    }

    pub fn import_config(&mut self, config: AmbientConfig) {
        log::info!(
            "Ambient calibration set: temp {} rh {}",
            config.temp_offset,
            config.rh_offset
        );
        self.config = config;
    }

    pub fn export_config(&self) -> AmbientConfig {
        self.config
    }
}

impl AmbientSample {
    const MIN_TEMPERATURE: f32 = -40.0;
    const MAX_TEMPERATURE: f32 = 80.0;

    fn validated(self) -> Result<Self> {
        if !(Self::MIN_TEMPERATURE..=Self::MAX_TEMPERATURE).contains(&self.temperature)
            || !(0.0..=MAX_HUMIDITY).contains(&self.humidity)
        {
            return Err(Error::SensorDisconnected);
        }
        Ok(self)
    }
}
