use core::fmt;

use crate::control::DewController;
use crate::error::{Error, Result};
use crate::types::{ChannelIndex, FIRMWARE_VERSION, Fixed};

use super::codec::{FrameBuf, FrameWriter};
use super::command::Command;

pub const BANNER: &str = concat!("Dewguard ", env!("CARGO_PKG_VERSION"), " ['$' for help]");

pub const HELP: &str = "\
+n enable | -n disable | ? status | A ambient | Bn channel | Cn pid\n\
Dn / Dn,min,max,auto,toff,soff,kp,ki,kd output config | Fn sensor config\n\
G / Gtoff,rhoff ambient config | V version";

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Frame(FrameBuf),
    Text(&'static str),
    /// Accepted, nothing to report
    Silent,
}

impl Response {
    pub fn from_error(error: Error) -> Self {
        let frame = FrameWriter::new('E').and_then(|mut frame| {
            frame.field(error.code() as i32)?;
            frame.finish()
        });
        frame.map(Response::Frame).unwrap_or(Response::Silent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Response::Frame(frame) => Some(frame.as_str()),
            Response::Text(text) => Some(text),
            Response::Silent => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or_default())
    }
}

fn fixed(value: f32) -> i32 {
    Fixed::from_f32(value).raw()
}

fn index_field(index: ChannelIndex) -> i32 {
    index.as_usize() as i32
}

impl DewController {
    /// Decodes and runs one command line. Rejections come back as an
    /// `:E<code>#` frame and leave the engine untouched.
    pub fn process_line(&mut self, line: &str) -> Response {
        match Command::parse(line).and_then(|command| self.execute(command)) {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Rejected command {:?}: {}", line, e);
                Response::from_error(e)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Response> {
        let response = match command {
            Command::Banner => Response::Text(BANNER),
            Command::Help => Response::Text(HELP),
            Command::Enable(index) => {
                self.channels_mut().get_mut(index).enable()?;
                Response::Silent
            }
            Command::Disable(index) => {
                self.channels_mut().get_mut(index).disable();
                Response::Silent
            }
            Command::Status => {
                let mut frame = FrameWriter::new('?')?;
                for channel in self.channels().iter() {
                    frame.flag(channel.is_connected())?;
                }
                for channel in self.channels().iter() {
                    frame.flag(channel.is_ready())?;
                }
                for channel in self.channels().iter() {
                    frame.flag(channel.is_enabled())?;
                }
                Response::Frame(frame.finish()?)
            }
            Command::Ambient => {
                let ambient = self.ambient();
                if !ambient.is_ready() {
                    return Err(Error::SensorDisconnected);
                }
                let mut frame = FrameWriter::new('A')?;
                frame
                    .field(fixed(ambient.temperature()))?
                    .field(fixed(ambient.humidity()))?
                    .field(fixed(ambient.dew_point()))?;
                Response::Frame(frame.finish()?)
            }
            Command::ChannelData(index) => {
                let channel = self.channels().get(index);
                let mut frame = FrameWriter::new('B')?;
                frame
                    .field(index_field(index))?
                    .field(fixed(channel.temperature()))?
                    .field(fixed(channel.setpoint()))?
                    .field(channel.output_value() as i32)?;
                Response::Frame(frame.finish()?)
            }
            Command::PidData(index) => {
                let runtime = self.channels().get(index).export_runtime();
                let mut frame = FrameWriter::new('C')?;
                frame
                    .field(index_field(index))?
                    .field(fixed(runtime.p_term))?
                    .field(fixed(runtime.i_term))?
                    .field(fixed(runtime.d_term))?
                    .field(runtime.output as i32)?;
                Response::Frame(frame.finish()?)
            }
            Command::QueryOutputConfig(index) => {
                let config = self.channels().get(index).export_config();
                let mut frame = FrameWriter::new('D')?;
                frame
                    .field(index_field(index))?
                    .field(config.min_output as i32)?
                    .field(config.max_output as i32)?
                    .flag(config.autostart)?
                    .field(config.temp_offset.raw())?
                    .field(config.setpoint_offset.raw())?
                    .field(config.kp.raw())?
                    .field(config.ki.raw())?
                    .field(config.kd.raw())?;
                Response::Frame(frame.finish()?)
            }
            Command::SetOutputConfig(index, config) => {
                self.channels_mut().get_mut(index).import_config(config)?;
                Response::Silent
            }
            Command::QuerySensorConfig(index) => {
                let thermistor = self.channels().get(index).thermistor();
                let mut frame = FrameWriter::new('F')?;
                frame
                    .field(index_field(index))?
                    .field(fixed(thermistor.nominal_temperature))?
                    .field(saturating_i32(thermistor.series_resistor))?
                    .field(thermistor.b_coefficient as i32)?
                    .field(saturating_i32(thermistor.nominal_resistance))?;
                Response::Frame(frame.finish()?)
            }
            Command::QueryAmbientConfig => {
                let config = self.ambient().export_config();
                let mut frame = FrameWriter::new('G')?;
                frame
                    .field(config.temp_offset.raw())?
                    .field(config.rh_offset.raw())?;
                Response::Frame(frame.finish()?)
            }
            Command::SetAmbientConfig(config) => {
                self.ambient_mut().import_config(config);
                Response::Silent
            }
            Command::Version => {
                let mut frame = FrameWriter::new('V')?;
                frame.text(FIRMWARE_VERSION)?;
                Response::Frame(frame.finish()?)
            }
            Command::Reserved => Response::Silent,
        };

        Ok(response)
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
