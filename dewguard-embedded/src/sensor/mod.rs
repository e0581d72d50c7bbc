mod adc;
mod ambient;
mod thermistor;

pub use adc::AdcStream;
pub use ambient::*;
pub use thermistor::*;

use crate::error::Result;
use crate::types::ChannelIndex;

/// One humidity/temperature pair as delivered by the acquisition layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSample {
    /// Temperature value (℃)
    pub temperature: f32,
    /// Relative humidity (%)
    pub humidity: f32,
}

/// Source of ambient air readings, e.g. a DHT22 driver.
pub trait AmbientInput {
    /// Must return promptly; a sensor that does not answer in time reports
    /// [`crate::Error::SensorTimeout`] instead of blocking the tick.
    fn read(&mut self) -> Result<AmbientSample>;
}

/// Source of raw thermistor ADC counts, one per output channel.
pub trait ThermistorInput {
    fn read_raw(&mut self, channel: ChannelIndex) -> Result<u16>;
}
