use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensor::{AmbientSensor, ThermistorConfig};
use crate::types::{ChannelIndex, Fixed};

use super::{PidController, PidParams, PidRuntime};

/// Configuration block of one heater output, as exchanged by the `D`
/// command and persisted in the configuration image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub min_output: u8,
    pub max_output: u8,
    pub autostart: bool,
    /// Probe calibration added to the measured temperature
    pub temp_offset: Fixed,
    /// Target distance above the dew point
    pub setpoint_offset: Fixed,
    pub kp: Fixed,
    pub ki: Fixed,
    pub kd: Fixed,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            min_output: 0,
            max_output: 255,
            autostart: false,
            temp_offset: Fixed(0),
            setpoint_offset: Fixed(200),
            kp: Fixed(2500),
            ki: Fixed(50),
            kd: Fixed(100),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_output > self.max_output {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    pub fn pid_params(&self) -> PidParams {
        PidParams {
            kp: self.kp.to_f32(),
            ki: self.ki.to_f32(),
            kd: self.kd.to_f32(),
            min_output: self.min_output,
            max_output: self.max_output,
        }
    }
}

/// Ordered so that `state >= ChannelState::Ready` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelState {
    Disconnected,
    Connected,
    Ready,
    Enabled,
}

#[derive(Debug)]
pub struct OutputChannel {
    index: ChannelIndex,
    config: ChannelConfig,
    thermistor: ThermistorConfig,
    pid: PidController,
    state: ChannelState,
    valid_samples: u8,
    temperature: f32,
    setpoint: f32,
    output_value: u8,
}

impl OutputChannel {
    pub fn new(
        index: ChannelIndex,
        config: ChannelConfig,
        thermistor: ThermistorConfig,
        sample_time: f32,
    ) -> Self {
        Self {
            index,
            config,
            thermistor,
            pid: PidController::new(config.pid_params(), sample_time),
            state: ChannelState::Disconnected,
            valid_samples: 0,
            temperature: 0.0,
            setpoint: 0.0,
            output_value: 0,
        }
    }

    /// Runs one control tick with this channel's raw probe reading and
    /// returns the actuator command.
    pub fn update(&mut self, reading: Result<u16>, ambient: &AmbientSensor, settle_ticks: u8) -> u8 {
        let measured = reading.and_then(|raw| self.thermistor.temperature_from_reading(raw));
        let temperature = match measured {
            Ok(t) => t + self.config.temp_offset.to_f32(),
            Err(e) => {
                self.force_disconnected(e);
                return self.output_value;
            }
        };

        self.temperature = temperature;
        self.valid_samples = self.valid_samples.saturating_add(1);

        if self.state == ChannelState::Disconnected {
            self.transition(ChannelState::Connected);
        }

        if !ambient.is_ready() {
            // No dew point to regulate against
            if self.state > ChannelState::Connected {
                self.transition(ChannelState::Connected);
            }
            self.idle();
            return self.output_value;
        }

        self.setpoint = ambient.dew_point() + self.config.setpoint_offset.to_f32();

        if self.state == ChannelState::Connected && self.valid_samples >= settle_ticks {
            self.transition(ChannelState::Ready);
            if self.config.autostart {
                self.transition(ChannelState::Enabled);
            }
        }

        if self.state == ChannelState::Enabled {
            self.output_value = self.pid.step(self.temperature, self.setpoint);
        } else {
            self.idle();
        }

        self.output_value
    }

    /// Only a ready channel can be enabled; enabling twice is a no-op.
    pub fn enable(&mut self) -> Result<()> {
        match self.state {
            ChannelState::Ready => {
                self.pid.reset();
                self.transition(ChannelState::Enabled);
                Ok(())
            }
            ChannelState::Enabled => Ok(()),
            ChannelState::Disconnected | ChannelState::Connected => Err(Error::InvalidState),
        }
    }

    pub fn disable(&mut self) {
        if self.state == ChannelState::Enabled {
            self.transition(ChannelState::Ready);
            self.idle();
        }
    }

    /// Replaces the whole configuration block or nothing.
    pub fn import_config(&mut self, config: ChannelConfig) -> Result<()> {
        config.validate()?;

        self.pid.set_params(config.pid_params());
        self.config = config;
        log::info!("Channel {} configured: {:?}", self.index, config);
        Ok(())
    }

    pub fn export_config(&self) -> ChannelConfig {
        self.config
    }

    pub fn set_thermistor(&mut self, thermistor: ThermistorConfig) -> Result<()> {
        thermistor.validate()?;
        self.thermistor = thermistor;
        Ok(())
    }

    pub fn thermistor(&self) -> &ThermistorConfig {
        &self.thermistor
    }

    pub fn export_runtime(&self) -> PidRuntime {
        self.pid.export_runtime()
    }

    pub fn index(&self) -> ChannelIndex {
        self.index
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state >= ChannelState::Connected
    }

    pub fn is_ready(&self) -> bool {
        self.state >= ChannelState::Ready
    }

    pub fn is_enabled(&self) -> bool {
        self.state == ChannelState::Enabled
    }

    pub fn is_autostart(&self) -> bool {
        self.config.autostart
    }

    /// Calibrated probe temperature (℃), zero while disconnected.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn output_value(&self) -> u8 {
        self.output_value
    }

    fn force_disconnected(&mut self, reason: Error) {
        if self.state != ChannelState::Disconnected {
            log::warn!("Channel {} probe lost: {}", self.index, reason);
            self.transition(ChannelState::Disconnected);
        }
        self.valid_samples = 0;
        self.temperature = 0.0;
        self.idle();
    }

    fn idle(&mut self) {
        self.output_value = 0;
        self.pid.reset();
    }

    fn transition(&mut self, next: ChannelState) {
        log::debug!("Channel {} {:?} -> {:?}", self.index, self.state, next);
        self.state = next;
    }
}
