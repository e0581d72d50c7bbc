use embedded_hal_nb::nb::{self, block};
use embedded_hal_nb::serial::{Read, Write};

use crate::control::DewController;
use crate::error::{Error, Result};

use super::handler::Response;

/// Longest accepted command line, terminator excluded.
pub const LINE_CAPACITY: usize = 64;

fn write_all<S>(serial: &mut S, buffer: &[u8]) -> Result<()>
where
    S: Write<u8>,
{
    for &byte in buffer {
        block!(serial.write(byte)).map_err(|_| Error::NotConnected)?;
    }
    Ok(())
}

/// Line discipline between a UART and the command handler. Lines end on
/// `\r`, `\n` or `\r\n`.
pub struct SerialConsole<S>
where
    S: Read<u8> + Write<u8>,
{
    serial: S,
    line: heapless::Vec<u8, LINE_CAPACITY>,
    overflowed: bool,
    last_was_cr: bool,
}

impl<S> SerialConsole<S>
where
    S: Read<u8> + Write<u8>,
{
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            line: heapless::Vec::new(),
            overflowed: false,
            last_was_cr: false,
        }
    }

    /// Drains every byte the UART has buffered without blocking and answers
    /// each completed line. Returns the number of lines handled.
    pub fn poll(&mut self, controller: &mut DewController) -> Result<usize> {
        let mut handled = 0;
        loop {
            let byte = match self.serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => return Err(Error::NotConnected),
            };

            if self.feed(byte) {
                let response = self.dispatch(controller);
                self.write_response(&response)?;
                handled += 1;
            }
        }
        Ok(handled)
    }

    pub fn write_response(&mut self, response: &Response) -> Result<()> {
        if let Some(text) = response.as_str() {
            write_all(&mut self.serial, text.as_bytes())?;
            write_all(&mut self.serial, b"\n")?;
            block!(self.serial.flush()).map_err(|_| Error::NotConnected)?;
        }
        Ok(())
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Returns true when `byte` completed a line.
    fn feed(&mut self, byte: u8) -> bool {
        let was_cr = core::mem::replace(&mut self.last_was_cr, byte == b'\r');
        match byte {
            b'\n' if was_cr => false,
            b'\r' | b'\n' => true,
            _ => {
                if self.line.push(byte).is_err() {
                    self.overflowed = true;
                }
                false
            }
        }
    }

    fn dispatch(&mut self, controller: &mut DewController) -> Response {
        let overflowed = core::mem::take(&mut self.overflowed);
        let response = if overflowed {
            log::warn!("Discarding command line longer than {} bytes", LINE_CAPACITY);
            Response::from_error(Error::FrameOverflow)
        } else {
            match core::str::from_utf8(&self.line) {
                Ok(line) => controller.process_line(line),
                Err(_) => Response::from_error(Error::InvalidArgument),
            }
        };
        self.line.clear();
        response
    }
}
