use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const KELVIN_OFFSET: f32 = 273.15;

/// Plausible probe temperatures (°C); anything outside is treated as a broken probe.
pub const MIN_PLAUSIBLE_TEMPERATURE: f32 = -55.0;
pub const MAX_PLAUSIBLE_TEMPERATURE: f32 = 150.0;

/// NTC thermistor wired as the low side of a voltage divider, with the series
/// resistor to the reference voltage. A rising reading means a rising
/// resistance and therefore a falling temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermistorConfig {
    /// Temperature at which `nominal_resistance` is specified (°C)
    pub nominal_temperature: f32,
    /// Thermistor resistance at `nominal_temperature` (ohm)
    pub nominal_resistance: u32,
    /// Beta coefficient (K)
    pub b_coefficient: u16,
    /// Voltage divider series resistor (ohm)
    pub series_resistor: u32,
    /// ADC full-scale reading, 1023 for a 10-bit converter
    pub adc_max: u16,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            nominal_temperature: 25.0,
            nominal_resistance: 10000,
            b_coefficient: 3950,
            series_resistor: 10000,
            adc_max: 1023,
        }
    }
}

impl ThermistorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nominal_resistance == 0
            || self.series_resistor == 0
            || self.b_coefficient == 0
            || self.adc_max < 2
            || !self.nominal_temperature.is_finite()
            || self.nominal_temperature <= -KELVIN_OFFSET
        {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Converts a raw ADC reading into °C using the Beta equation
    /// `1/T = 1/T0 + (1/B) * ln(R/R0)`.
    ///
    /// A shorted probe (reading 0), an open probe (reading at full scale) and
    /// anything that lands outside the plausible temperature window are all
    /// reported as [`Error::SensorDisconnected`].
    pub fn temperature_from_reading(&self, raw: u16) -> Result<f32> {
        if raw == 0 || raw >= self.adc_max {
            return Err(Error::SensorDisconnected);
        }

        let raw = raw as f32;
        let adc_max = self.adc_max as f32;

        // Voltage divider inversion: R = R_series * raw / (max - raw)
        let resistance = self.series_resistor as f32 * raw / (adc_max - raw);

        let ln_ratio = libm::logf(resistance / self.nominal_resistance as f32);
        let inv_temp = 1.0 / (self.nominal_temperature + KELVIN_OFFSET)
            + ln_ratio / self.b_coefficient as f32;

        if !inv_temp.is_finite() || inv_temp <= 0.0 {
            return Err(Error::SensorDisconnected);
        }

        let celsius = 1.0 / inv_temp - KELVIN_OFFSET;

        if !(MIN_PLAUSIBLE_TEMPERATURE..=MAX_PLAUSIBLE_TEMPERATURE).contains(&celsius) {
            return Err(Error::SensorDisconnected);
        }

        Ok(celsius)
    }

    /// Inverse of [`Self::temperature_from_reading`], rounded to the nearest count.
    pub fn reading_from_temperature(&self, celsius: f32) -> u16 {
        let inv_temp = 1.0 / (celsius + KELVIN_OFFSET);
        let inv_nominal = 1.0 / (self.nominal_temperature + KELVIN_OFFSET);
        let resistance = self.nominal_resistance as f32
            * libm::expf(self.b_coefficient as f32 * (inv_temp - inv_nominal));

        let adc_max = self.adc_max as f32;
        let raw = adc_max * resistance / (self.series_resistor as f32 + resistance);

        libm::roundf(raw).clamp(0.0, adc_max) as u16
    }
}
