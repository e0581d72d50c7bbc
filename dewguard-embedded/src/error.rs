use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidCommand,
    InvalidArgument,
    ArityMismatch { expected: usize, found: usize },
    ChannelOutOfRange,
    InvalidState,
    SensorDisconnected,
    SensorTimeout,
    SerializationError,
    StorageError,
    NotConnected,
    FrameOverflow,
}

impl Error {
    /// Numeric code carried by the `:E<code>#` error frame.
    pub fn code(&self) -> u8 {
        match self {
            Error::InvalidCommand => 1,
            Error::ChannelOutOfRange => 2,
            Error::ArityMismatch { .. } => 3,
            Error::InvalidArgument | Error::FrameOverflow => 4,
            Error::InvalidState => 5,
            Error::SensorDisconnected | Error::SensorTimeout => 6,
            Error::SerializationError | Error::StorageError | Error::NotConnected => 7,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCommand => write!(f, "Invalid command"),
            Error::InvalidArgument => write!(f, "Invalid argument"),
            Error::ArityMismatch { expected, found } => {
                write!(f, "Expected {expected} fields, found {found}")
            }
            Error::ChannelOutOfRange => write!(f, "Channel index out of range"),
            Error::InvalidState => write!(f, "Invalid state"),
            Error::SensorDisconnected => write!(f, "Sensor disconnected"),
            Error::SensorTimeout => write!(f, "Sensor read timed out"),
            Error::SerializationError => write!(f, "Serialization error"),
            Error::StorageError => write!(f, "Storage error"),
            Error::NotConnected => write!(f, "Not connected"),
            Error::FrameOverflow => write!(f, "Frame exceeds buffer capacity"),
        }
    }
}

impl embedded_hal_nb::serial::Error for Error {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        match self {
            Error::FrameOverflow => embedded_hal_nb::serial::ErrorKind::Overrun,
            _ => embedded_hal_nb::serial::ErrorKind::Other,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
