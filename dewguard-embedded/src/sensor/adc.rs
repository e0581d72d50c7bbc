use embedded_io::Read;

use crate::error::{Error, Result};
use crate::types::{CHANNEL_COUNT, ChannelIndex};

use super::ThermistorInput;

const FRAME_LEN: usize = CHANNEL_COUNT * 2;

/// Thermistor readings delivered by a sampling co-processor as frames of
/// big-endian `u16` counts, one per channel in index order.
///
/// Reading channel 0 pulls a fresh frame; the other channels are served from
/// that frame so one tick sees a consistent snapshot.
pub struct AdcStream<IO>
where
    IO: Read,
{
    io_device: IO,
    frame: Option<[u16; CHANNEL_COUNT]>,
}

impl<IO> AdcStream<IO>
where
    IO: Read,
{
    pub fn new(io_device: IO) -> Self {
        Self {
            io_device,
            frame: None,
        }
    }

    fn fetch_frame(&mut self) -> Result<[u16; CHANNEL_COUNT]> {
        // A failed fetch must not leave the previous frame servable
        self.frame = None;

        let mut buffer = [0u8; FRAME_LEN];
        self.io_device
            .read_exact(&mut buffer)
            .map_err(|_| Error::SensorTimeout)?;

        let mut frame = [0u16; CHANNEL_COUNT];
        for (value, bytes) in frame.iter_mut().zip(buffer.chunks_exact(2)) {
            *value = u16::from_be_bytes([bytes[0], bytes[1]]);
        }

        self.frame = Some(frame);
        Ok(frame)
    }
}

impl<IO> ThermistorInput for AdcStream<IO>
where
    IO: Read,
{
    fn read_raw(&mut self, channel: ChannelIndex) -> Result<u16> {
        let frame = match self.frame {
            Some(frame) if channel.as_usize() != 0 => frame,
            _ => self.fetch_frame()?,
        };
        Ok(frame[channel.as_usize()])
    }
}

#[cfg(test)]
pub mod mock {
    use alloc::collections::VecDeque;
    use alloc::vec::Vec;

    use super::*;

    #[derive(Debug)]
    pub struct MockIO {
        pub frames: Vec<[u16; CHANNEL_COUNT]>,
    }

    impl embedded_io::ErrorType for MockIO {
        type Error = embedded_io::ErrorKind;
    }

    impl Read for MockIO {
        fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
            if self.frames.is_empty() || buf.len() < FRAME_LEN {
                return Ok(0);
            }

            let frame = self.frames.remove(0);
            for (i, value) in frame.iter().enumerate() {
                let bytes = value.to_be_bytes();
                buf[i * 2] = bytes[0];
                buf[i * 2 + 1] = bytes[1];
            }

            Ok(FRAME_LEN)
        }
    }

    /// Byte stream handing out at most `chunk` bytes per read, failing once
    /// drained when `fail_when_empty` is set.
    #[derive(Debug)]
    pub struct ChunkedIO {
        pub bytes: VecDeque<u8>,
        pub chunk: usize,
        pub fail_when_empty: bool,
    }

    impl ChunkedIO {
        pub fn new(frames: &[[u16; CHANNEL_COUNT]], chunk: usize) -> Self {
            let bytes = frames
                .iter()
                .flat_map(|frame| frame.iter().flat_map(|value| value.to_be_bytes()))
                .collect();
            Self {
                bytes,
                chunk,
                fail_when_empty: false,
            }
        }
    }

    impl embedded_io::ErrorType for ChunkedIO {
        type Error = embedded_io::ErrorKind;
    }

    impl Read for ChunkedIO {
        fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
            if self.bytes.is_empty() && self.fail_when_empty {
                return Err(embedded_io::ErrorKind::Other);
            }

            let count = buf.len().min(self.chunk).min(self.bytes.len());
            for slot in buf.iter_mut().take(count) {
                if let Some(byte) = self.bytes.pop_front() {
                    *slot = byte;
                }
            }
            Ok(count)
        }
    }

    fn channel(index: usize) -> ChannelIndex {
        ChannelIndex::new(index).unwrap()
    }

    #[test]
    fn test_adc_stream_snapshot() {
        let io = MockIO {
            frames: alloc::vec![[512, 600, 700, 1023], [100, 200, 300, 400]],
        };
        let mut stream = AdcStream::new(io);

        assert_eq!(stream.read_raw(channel(0)), Ok(512));
        assert_eq!(stream.read_raw(channel(3)), Ok(1023));
        assert_eq!(stream.read_raw(channel(1)), Ok(600));

        // Channel 0 starts the next frame
        assert_eq!(stream.read_raw(channel(0)), Ok(100));
        assert_eq!(stream.read_raw(channel(2)), Ok(300));
    }

    #[test]
    fn test_adc_stream_starved() {
        let mut stream = AdcStream::new(MockIO { frames: Vec::new() });
        assert_eq!(stream.read_raw(channel(0)), Err(Error::SensorTimeout));
        assert_eq!(stream.read_raw(channel(2)), Err(Error::SensorTimeout));
    }

    #[test]
    fn test_adc_stream_reassembles_partial_reads() {
        let io = ChunkedIO::new(&[[10, 20, 30, 40], [11, 21, 31, 41], [12, 22, 32, 42]], 6);
        let mut stream = AdcStream::new(io);

        for frame in 0..3u16 {
            assert_eq!(stream.read_raw(channel(0)), Ok(10 + frame));
            assert_eq!(stream.read_raw(channel(1)), Ok(20 + frame));
            assert_eq!(stream.read_raw(channel(3)), Ok(40 + frame));
        }
        assert_eq!(stream.read_raw(channel(0)), Err(Error::SensorTimeout));
    }

    #[test]
    fn test_adc_stream_drops_frame_on_io_error() {
        let mut io = ChunkedIO::new(&[[500, 501, 502, 503]], FRAME_LEN);
        io.fail_when_empty = true;
        let mut stream = AdcStream::new(io);

        assert_eq!(stream.read_raw(channel(0)), Ok(500));
        assert_eq!(stream.read_raw(channel(1)), Ok(501));

        assert_eq!(stream.read_raw(channel(0)), Err(Error::SensorTimeout));
        for index in 1..CHANNEL_COUNT {
            assert_eq!(stream.read_raw(channel(index)), Err(Error::SensorTimeout));
        }
    }
}
