mod memory;

pub use memory::*;

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::control::ChannelConfig;
use crate::error::{Error, Result};
use crate::sensor::{AmbientConfig, ThermistorConfig};
use crate::types::CHANNEL_COUNT;

/// Bumped whenever the layout of [`ConfigImage`] changes.
pub const CONFIG_IMAGE_VERSION: u8 = 1;

/// Everything that survives a power cycle, as one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigImage {
    pub version: u8,
    pub ambient: AmbientConfig,
    pub channels: [ChannelConfig; CHANNEL_COUNT],
    pub thermistors: [ThermistorConfig; CHANNEL_COUNT],
}

impl Default for ConfigImage {
    fn default() -> Self {
        Self {
            version: CONFIG_IMAGE_VERSION,
            ambient: AmbientConfig::default(),
            channels: [ChannelConfig::default(); CHANNEL_COUNT],
            thermistors: [ThermistorConfig::default(); CHANNEL_COUNT],
        }
    }
}

impl ConfigImage {
    pub fn encode(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::SerializationError)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image: Self = postcard::from_bytes(bytes).map_err(|_| Error::SerializationError)?;
        if image.version != CONFIG_IMAGE_VERSION {
            log::warn!(
                "Config image version {} does not match {}",
                image.version,
                CONFIG_IMAGE_VERSION
            );
            return Err(Error::StorageError);
        }
        Ok(image)
    }
}

/// Byte-level persistence backend (EEPROM page, flash sector, file).
pub trait ConfigStore {
    type Error;

    /// `None` when nothing has been written yet.
    fn read(&mut self) -> core::result::Result<Option<Vec<u8>>, Self::Error>;

    fn write(&mut self, data: &[u8]) -> core::result::Result<(), Self::Error>;
}

pub fn load_image<S: ConfigStore>(store: &mut S) -> Result<Option<ConfigImage>> {
    match store.read().map_err(|_| Error::StorageError)? {
        Some(bytes) => ConfigImage::decode(&bytes).map(Some),
        None => Ok(None),
    }
}

pub fn save_image<S: ConfigStore>(store: &mut S, image: &ConfigImage) -> Result<()> {
    let bytes = image.encode()?;
    store.write(&bytes).map_err(|_| Error::StorageError)
}
