use crate::error::{Error, Result};
use crate::sensor::{AmbientInput, AmbientSensor, ThermistorInput};
use crate::storage::{CONFIG_IMAGE_VERSION, ConfigImage};
use crate::types::{CHANNEL_COUNT, ChannelIndex};

use super::{ChannelRegistry, ControlConfig};

/// The single engine context: ambient sensor plus channel registry. The tick
/// loop and the command handler both borrow it mutably, never at the same time.
#[derive(Debug)]
pub struct DewController {
    config: ControlConfig,
    ambient: AmbientSensor,
    channels: ChannelRegistry,
}

impl DewController {
    pub fn new(config: ControlConfig) -> Self {
        let image = ConfigImage::default();
        Self::with_image(config, &image)
    }

    pub fn with_image(config: ControlConfig, image: &ConfigImage) -> Self {
        let sample_time = config.tick_period.as_secs_f32();
        Self {
            ambient: AmbientSensor::new(image.ambient),
            channels: ChannelRegistry::new(image.channels, image.thermistors, sample_time),
            config,
        }
    }

    /// One control period: sample every probe, refresh the air reading, then
    /// advance each channel. Returns the actuator command per channel.
    pub fn tick<A, T>(&mut self, ambient_input: &mut A, thermistors: &mut T) -> [u8; CHANNEL_COUNT]
    where
        A: AmbientInput,
        T: ThermistorInput,
    {
        let mut readings = [Err(Error::SensorTimeout); CHANNEL_COUNT];
        for (index, reading) in ChannelIndex::all().zip(readings.iter_mut()) {
            *reading = thermistors.read_raw(index);
        }

        if let Err(e) = self.ambient.refresh(ambient_input) {
            log::debug!("Ambient refresh failed: {}", e);
        }

        let mut outputs = [0u8; CHANNEL_COUNT];
        let settle_ticks = self.config.settle_ticks;
        for ((channel, reading), output) in self
            .channels
            .iter_mut()
            .zip(readings)
            .zip(outputs.iter_mut())
        {
            *output = channel.update(reading, &self.ambient, settle_ticks);
        }

        outputs
    }

    pub fn ambient(&self) -> &AmbientSensor {
        &self.ambient
    }

    pub fn ambient_mut(&mut self) -> &mut AmbientSensor {
        &mut self.ambient
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelRegistry {
        &mut self.channels
    }

    pub fn control_config(&self) -> &ControlConfig {
        &self.config
    }

    /// Snapshot of every persisted block.
    pub fn export_config(&self) -> ConfigImage {
        let mut image = ConfigImage {
            version: CONFIG_IMAGE_VERSION,
            ambient: self.ambient.export_config(),
            ..Default::default()
        };
        for (slot, channel) in self.channels.iter().enumerate() {
            image.channels[slot] = channel.export_config();
            image.thermistors[slot] = *channel.thermistor();
        }
        image
    }

    /// Applies a persisted image. Every block is validated before the first
    /// one is written, so a bad image changes nothing.
    pub fn import_config(&mut self, image: &ConfigImage) -> Result<()> {
        if image.version != CONFIG_IMAGE_VERSION {
            return Err(Error::StorageError);
        }
        for (channel, thermistor) in image.channels.iter().zip(image.thermistors.iter()) {
            channel.validate()?;
            thermistor.validate()?;
        }

        self.ambient.import_config(image.ambient);
        for ((channel, config), thermistor) in self
            .channels
            .iter_mut()
            .zip(image.channels)
            .zip(image.thermistors)
        {
            channel.import_config(config)?;
            channel.set_thermistor(thermistor)?;
        }
        Ok(())
    }
}

impl Default for DewController {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ChannelState;
    use crate::sensor::{AmbientSample, ThermistorConfig};
    use crate::types::Fixed;

    #[derive(Clone, Copy)]
    struct Rig {
        air: Result<AmbientSample>,
        probes: [Result<u16>; CHANNEL_COUNT],
    }

    impl Rig {
        fn new(probe_celsius: f32) -> Self {
            let raw = ThermistorConfig::default().reading_from_temperature(probe_celsius);
            Self {
                air: Ok(AmbientSample {
                    temperature: 10.0,
                    humidity: 85.0,
                }),
                probes: [Ok(raw); CHANNEL_COUNT],
            }
        }
    }

    impl AmbientInput for Rig {
        fn read(&mut self) -> Result<AmbientSample> {
            self.air
        }
    }

    impl ThermistorInput for Rig {
        fn read_raw(&mut self, channel: ChannelIndex) -> Result<u16> {
            self.probes[channel.as_usize()]
        }
    }

    fn tick(controller: &mut DewController, rig: &mut Rig) -> [u8; CHANNEL_COUNT] {
        let mut thermistors = *rig;
        controller.tick(rig, &mut thermistors)
    }

    #[test]
    fn test_tick_drives_autostart_channels() {
        let mut image = ConfigImage::default();
        image.channels[1].autostart = true;
        let mut controller = DewController::with_image(ControlConfig::default(), &image);
        let mut rig = Rig::new(4.0);

        let mut outputs = [0; CHANNEL_COUNT];
        for _ in 0..3 {
            outputs = tick(&mut controller, &mut rig);
        }

        assert!(outputs[1] > 0);
        assert_eq!(outputs[0], 0);
        let states: [ChannelState; CHANNEL_COUNT] =
            core::array::from_fn(|i| controller.channels().get(ChannelIndex::new(i).unwrap()).state());
        assert_eq!(
            states,
            [
                ChannelState::Ready,
                ChannelState::Enabled,
                ChannelState::Ready,
                ChannelState::Ready
            ]
        );
    }

    #[test]
    fn test_tick_isolates_probe_faults() {
        let mut controller = DewController::default();
        let mut rig = Rig::new(4.0);
        rig.probes[2] = Ok(0);

        for _ in 0..3 {
            tick(&mut controller, &mut rig);
        }

        let registry = controller.channels();
        assert!(registry.get(ChannelIndex::new(0).unwrap()).is_ready());
        assert!(!registry.get(ChannelIndex::new(2).unwrap()).is_connected());
    }

    #[test]
    fn test_config_image_round_trip() {
        let mut controller = DewController::default();
        let mut image = controller.export_config();
        image.ambient.rh_offset = Fixed(-300);
        image.channels[0].setpoint_offset = Fixed(450);
        image.thermistors[3].series_resistor = 4700;

        controller.import_config(&image).unwrap();
        assert_eq!(controller.export_config(), image);
    }

    #[test]
    fn test_bad_image_changes_nothing() {
        let mut controller = DewController::default();
        let before = controller.export_config();

        let mut image = before.clone();
        image.ambient.temp_offset = Fixed(100);
        image.channels[0].kp = Fixed(1);
        image.thermistors[3].b_coefficient = 0;

        assert_eq!(controller.import_config(&image), Err(Error::InvalidArgument));
        assert_eq!(controller.export_config(), before);
    }
}
