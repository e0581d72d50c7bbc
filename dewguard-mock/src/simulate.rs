use dewguard_embedded::{
    AmbientInput, AmbientSample, CHANNEL_COUNT, ChannelIndex, Error, ThermistorConfig,
    ThermistorInput,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, NormalError};

use crate::settings::{Ambient, Plant};

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Hygrometer reading a slowly wandering air mass.
pub struct SimulatedAir {
    temperature: f32,
    humidity: f32,
    temperature_noise: Normal<f32>,
    humidity_noise: Normal<f32>,
    rng: StdRng,
}

impl SimulatedAir {
    pub fn new(settings: &Ambient) -> Result<Self, NormalError> {
        Ok(Self {
            temperature: settings.temperature,
            humidity: settings.humidity.clamp(0.0, 100.0),
            temperature_noise: Normal::new(0.0, settings.temperature_noise)?,
            humidity_noise: Normal::new(0.0, settings.humidity_noise)?,
            rng: seeded(settings.seed),
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl AmbientInput for SimulatedAir {
    fn read(&mut self) -> dewguard_embedded::Result<AmbientSample> {
        self.temperature += self.temperature_noise.sample(&mut self.rng);
        self.humidity = (self.humidity + self.humidity_noise.sample(&mut self.rng)).clamp(0.0, 100.0);

        Ok(AmbientSample {
            temperature: self.temperature,
            humidity: self.humidity,
        })
    }
}

/// One heated probe per output. Each tick the heater lifts the probe by
/// `heater_gain * duty` and the probe loses `loss` of its distance to the
/// sink, which sits `sink_offset` away from the air temperature.
pub struct SimulatedProbes {
    temperatures: [f32; CHANNEL_COUNT],
    connected: [bool; CHANNEL_COUNT],
    thermistor: ThermistorConfig,
    heater_gain: f32,
    loss: f32,
    sink_offset: f32,
    noise: Normal<f32>,
    rng: StdRng,
}

impl SimulatedProbes {
    pub fn new(settings: &Plant, air_temperature: f32) -> Result<Self, NormalError> {
        let mut connected = [true; CHANNEL_COUNT];
        for &index in &settings.disconnected {
            match connected.get_mut(index) {
                Some(slot) => *slot = false,
                None => tracing::warn!("Ignoring unknown probe {} in plant.disconnected", index),
            }
        }

        Ok(Self {
            temperatures: [air_temperature + settings.sink_offset; CHANNEL_COUNT],
            connected,
            thermistor: ThermistorConfig::default(),
            heater_gain: settings.heater_gain,
            loss: settings.loss,
            sink_offset: settings.sink_offset,
            noise: Normal::new(0.0, settings.noise)?,
            rng: seeded(settings.seed),
        })
    }

    /// Applies one tick worth of heater output.
    pub fn advance(&mut self, outputs: &[u8; CHANNEL_COUNT], air_temperature: f32) {
        let sink = air_temperature + self.sink_offset;
        for (temperature, &output) in self.temperatures.iter_mut().zip(outputs) {
            let duty = output as f32 / u8::MAX as f32;
            *temperature += self.heater_gain * duty - self.loss * (*temperature - sink);
        }
    }

    pub fn set_connected(&mut self, channel: ChannelIndex, connected: bool) {
        self.connected[channel.as_usize()] = connected;
    }

    pub fn temperature(&self, channel: ChannelIndex) -> f32 {
        self.temperatures[channel.as_usize()]
    }
}

impl ThermistorInput for SimulatedProbes {
    fn read_raw(&mut self, channel: ChannelIndex) -> dewguard_embedded::Result<u16> {
        let slot = channel.as_usize();
        if !self.connected[slot] {
            // Open input floats to the rail
            return Ok(self.thermistor.adc_max);
        }

        let measured = self.temperatures[slot] + self.noise.sample(&mut self.rng);
        if !measured.is_finite() {
            return Err(Error::SensorDisconnected);
        }
        Ok(self.thermistor.reading_from_temperature(measured))
    }
}
