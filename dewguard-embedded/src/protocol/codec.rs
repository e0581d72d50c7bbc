use core::fmt::Write;

use crate::error::{Error, Result};

pub const FRAME_START: char = ':';
pub const FRAME_END: char = '#';
pub const FIELD_SEPARATOR: char = ',';

/// Nine `i32` fields plus separators and framing fit with room to spare.
pub const FRAME_CAPACITY: usize = 128;

pub type FrameBuf = heapless::String<FRAME_CAPACITY>;

/// Builds one `:<code><field>,<field>...#` response frame.
pub struct FrameWriter {
    buf: FrameBuf,
    fields: usize,
}

impl FrameWriter {
    pub fn new(code: char) -> Result<Self> {
        let mut buf = FrameBuf::new();
        buf.push(FRAME_START).map_err(|_| Error::FrameOverflow)?;
        buf.push(code).map_err(|_| Error::FrameOverflow)?;
        Ok(Self { buf, fields: 0 })
    }

    pub fn field(&mut self, value: i32) -> Result<&mut Self> {
        self.separator()?;
        write!(self.buf, "{value}").map_err(|_| Error::FrameOverflow)?;
        Ok(self)
    }

    pub fn flag(&mut self, value: bool) -> Result<&mut Self> {
        self.field(value as i32)
    }

    pub fn text(&mut self, value: &str) -> Result<&mut Self> {
        self.separator()?;
        self.buf.push_str(value).map_err(|_| Error::FrameOverflow)?;
        Ok(self)
    }

    pub fn finish(mut self) -> Result<FrameBuf> {
        self.buf.push(FRAME_END).map_err(|_| Error::FrameOverflow)?;
        Ok(self.buf)
    }

    fn separator(&mut self) -> Result<()> {
        if self.fields > 0 {
            self.buf.push(FIELD_SEPARATOR).map_err(|_| Error::FrameOverflow)?;
        }
        self.fields += 1;
        Ok(())
    }
}

/// Removes an optional `:`...`#` wrapper so a response frame can be sent
/// back as a command.
pub fn strip_frame(line: &str) -> &str {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_prefix(FRAME_START).unwrap_or(line);
    line.strip_suffix(FRAME_END).unwrap_or(line)
}

/// Parses one field: an optional leading minus followed by decimal digits.
pub fn parse_field(field: &str) -> Result<i32> {
    let digits = field.strip_prefix('-').unwrap_or(field);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidArgument);
    }
    field.parse::<i32>().map_err(|_| Error::InvalidArgument)
}

/// Splits `args` on commas into exactly `N` integers. The field count is
/// checked before any field is parsed.
pub fn parse_fields<const N: usize>(args: &str) -> Result<[i32; N]> {
    let found = args.split(FIELD_SEPARATOR).count();
    if found != N {
        return Err(Error::ArityMismatch { expected: N, found });
    }

    let mut values = [0i32; N];
    for (value, field) in values.iter_mut().zip(args.split(FIELD_SEPARATOR)) {
        *value = parse_field(field)?;
    }
    Ok(values)
}
