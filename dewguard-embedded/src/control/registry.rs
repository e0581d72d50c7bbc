use crate::sensor::ThermistorConfig;
use crate::types::{CHANNEL_COUNT, ChannelIndex};

use super::{ChannelConfig, OutputChannel};

/// Fixed slots, one per physical output. The slot number is the channel's
/// identity on the wire.
#[derive(Debug)]
pub struct ChannelRegistry {
    channels: [OutputChannel; CHANNEL_COUNT],
}

impl ChannelRegistry {
    pub fn new(
        configs: [ChannelConfig; CHANNEL_COUNT],
        thermistors: [ThermistorConfig; CHANNEL_COUNT],
        sample_time: f32,
    ) -> Self {
        let channels = core::array::from_fn(|slot| {
            let index = ChannelIndex::from_slot(slot);
            OutputChannel::new(index, configs[slot], thermistors[slot], sample_time)
        });

        Self { channels }
    }

    pub fn get(&self, index: ChannelIndex) -> &OutputChannel {
        &self.channels[index.as_usize()]
    }

    pub fn get_mut(&mut self, index: ChannelIndex) -> &mut OutputChannel {
        &mut self.channels[index.as_usize()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputChannel> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutputChannel> {
        self.channels.iter_mut()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(
            [ChannelConfig::default(); CHANNEL_COUNT],
            [ThermistorConfig::default(); CHANNEL_COUNT],
            1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_keep_their_index() {
        let registry = ChannelRegistry::default();
        for (slot, channel) in registry.iter().enumerate() {
            assert_eq!(channel.index().as_usize(), slot);
        }
        assert_eq!(registry.iter().count(), CHANNEL_COUNT);
    }

    #[test]
    fn test_get_mut_targets_one_slot() {
        let mut registry = ChannelRegistry::default();
        let index = ChannelIndex::new(2).unwrap();
        let config = ChannelConfig {
            autostart: true,
            ..Default::default()
        };

        registry.get_mut(index).import_config(config).unwrap();

        for channel in registry.iter() {
            assert_eq!(channel.is_autostart(), channel.index() == index);
        }
    }
}
