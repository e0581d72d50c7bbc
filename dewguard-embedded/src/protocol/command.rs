use crate::control::ChannelConfig;
use crate::error::{Error, Result};
use crate::sensor::AmbientConfig;
use crate::types::{ChannelIndex, Fixed};

use super::codec::{FIELD_SEPARATOR, parse_field, parse_fields, strip_frame};

/// A decoded command line. Decoding validates everything, so executing a
/// command never has to undo a partial change.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Banner,
    Help,
    Enable(ChannelIndex),
    Disable(ChannelIndex),
    Status,
    Ambient,
    ChannelData(ChannelIndex),
    PidData(ChannelIndex),
    QueryOutputConfig(ChannelIndex),
    SetOutputConfig(ChannelIndex, ChannelConfig),
    QuerySensorConfig(ChannelIndex),
    QueryAmbientConfig,
    SetAmbientConfig(AmbientConfig),
    Version,
    /// `I`, `E` and `W` belong to unsolicited status messages
    Reserved,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = strip_frame(line);
        let mut chars = line.chars();
        let Some(code) = chars.next() else {
            return Ok(Command::Banner);
        };
        let args = chars.as_str();

        match code {
            '$' => no_args(args, Command::Help),
            '+' => Ok(Command::Enable(parse_index(args)?)),
            '-' => Ok(Command::Disable(parse_index(args)?)),
            '?' => no_args(args, Command::Status),
            'A' => no_args(args, Command::Ambient),
            'B' => Ok(Command::ChannelData(parse_index(args)?)),
            'C' => Ok(Command::PidData(parse_index(args)?)),
            'D' if args.contains(FIELD_SEPARATOR) => parse_output_config(args),
            'D' => Ok(Command::QueryOutputConfig(parse_index(args)?)),
            'F' => Ok(Command::QuerySensorConfig(parse_index(args)?)),
            'G' if args.is_empty() => Ok(Command::QueryAmbientConfig),
            'G' => {
                let [temp_offset, rh_offset] = parse_fields::<2>(args)?;
                Ok(Command::SetAmbientConfig(AmbientConfig {
                    temp_offset: Fixed(temp_offset),
                    rh_offset: Fixed(rh_offset),
                }))
            }
            'V' => no_args(args, Command::Version),
            'I' | 'E' | 'W' => Ok(Command::Reserved),
            _ => Err(Error::InvalidCommand),
        }
    }
}

fn no_args(args: &str, command: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(Error::ArityMismatch {
            expected: 0,
            found: args.split(FIELD_SEPARATOR).count(),
        })
    }
}

fn parse_index(args: &str) -> Result<ChannelIndex> {
    if args.contains(FIELD_SEPARATOR) {
        return Err(Error::ArityMismatch {
            expected: 1,
            found: args.split(FIELD_SEPARATOR).count(),
        });
    }
    ChannelIndex::try_from(parse_field(args)?)
}

/// `D<index>,<min>,<max>,<autostart>,<temp_off>,<setpoint_off>,<kp>,<ki>,<kd>`
fn parse_output_config(args: &str) -> Result<Command> {
    let [index, min_output, max_output, autostart, temp_offset, setpoint_offset, kp, ki, kd] =
        parse_fields::<9>(args)?;

    let index = ChannelIndex::try_from(index)?;
    let config = ChannelConfig {
        min_output: to_u8(min_output)?,
        max_output: to_u8(max_output)?,
        autostart: match autostart {
            0 => false,
            1 => true,
            _ => return Err(Error::InvalidArgument),
        },
        temp_offset: Fixed(temp_offset),
        setpoint_offset: Fixed(setpoint_offset),
        kp: Fixed(kp),
        ki: Fixed(ki),
        kd: Fixed(kd),
    };
    config.validate()?;

    Ok(Command::SetOutputConfig(index, config))
}

fn to_u8(value: i32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::InvalidArgument)
}
