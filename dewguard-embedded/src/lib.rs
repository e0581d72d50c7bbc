//! Channel control engine for a telescope dew heater.
//!
//! Reads ambient air and one NTC probe per heater output, derives the dew
//! point and regulates each output with its own PID loop so the optics stay
//! a configurable distance above it. A line-oriented ASCII protocol exposes
//! live state and configuration.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod control;
pub mod error;
pub mod protocol;
pub mod sensor;
pub mod storage;
pub mod types;

pub use control::*;
pub use error::*;
pub use protocol::{Command, Response, SerialConsole};
pub use sensor::{AdcStream, AmbientInput, AmbientSample, AmbientSensor, ThermistorConfig, ThermistorInput};
pub use storage::{ConfigImage, ConfigStore, MemoryStore};
pub use types::*;
