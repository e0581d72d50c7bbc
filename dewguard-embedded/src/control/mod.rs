mod channel;
mod pid;
mod registry;
mod system;

pub use channel::*;
pub use pid::*;
pub use registry::*;
pub use system::*;

use core::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PidParams {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub min_output: u8,
    pub max_output: u8,
}

impl Default for PidParams {
    fn default() -> Self {
        ChannelConfig::default().pid_params()
    }
}

#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Period between two calls of [`DewController::tick`]
    pub tick_period: Duration,
    /// Consecutive valid probe samples before a channel reports ready
    pub settle_ticks: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            settle_ticks: 3,
        }
    }
}
