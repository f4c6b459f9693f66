use std::io::Cursor;
use std::mem::size_of;

use binrw::{BinRead, Endian};

use crate::error::DecodeError;

const LINE_FEED: u8 = b'\n';

/// Sequential little-endian cursor over an in-memory dump.
///
/// Every read checks the remaining length before touching the buffer, so a failed read leaves the
/// cursor where it was.
#[derive(Debug)]
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated {
                offset: self.position(),
                needed,
                remaining,
            });
        }

        Ok(())
    }

    /// Reads any fixed-size record without arguments, such as a scalar or a transform record.
    pub fn read_le<T>(&mut self) -> Result<T, DecodeError>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        self.ensure(size_of::<T>())?;
        Ok(T::read_options(&mut self.cursor, Endian::Little, ())?)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.read_le()
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_le()
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_le()
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.read_le()
    }

    fn read_terminated(&mut self, terminator: u8) -> Result<String, DecodeError> {
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        let rest = &data[start.min(data.len())..];
        let Some(length) = rest.iter().position(|&byte| byte == terminator) else {
            return Err(DecodeError::Truncated {
                offset: start,
                needed: rest.len() + 1,
                remaining: rest.len(),
            });
        };

        let bytes = &rest[..length];
        if let Some(index) = bytes.iter().position(|byte| !byte.is_ascii()) {
            return Err(DecodeError::InvalidEncoding {
                offset: start + index,
                byte: bytes[index],
            });
        }

        let text = bytes.iter().map(|&byte| byte as char).collect();
        self.cursor.set_position((start + length + 1) as u64);
        Ok(text)
    }

    /// Reads a null-terminated ASCII string. The terminator is consumed but not returned.
    pub fn read_cstring(&mut self) -> Result<String, DecodeError> {
        self.read_terminated(0)
    }

    /// Reads the free-text header line that opens every dump.
    pub fn read_header_string(&mut self) -> Result<String, DecodeError> {
        self.read_terminated(LINE_FEED)
    }

    /// Checks an array length against the remaining input, given the smallest possible size of one
    /// element on the wire.
    pub fn check_count(&self, field: &'static str, count: i32, element_size: usize) -> Result<usize, DecodeError> {
        let remaining = self.remaining();
        let error = || DecodeError::UnexpectedCount {
            field,
            count: count as i64,
            remaining,
        };

        let length = usize::try_from(count).map_err(|_| error())?;
        match length.checked_mul(element_size) {
            Some(size) if size <= remaining => Ok(length),
            _ => Err(error()),
        }
    }

    /// Reads a 4-byte count prefix and validates it with [`Reader::check_count`].
    pub fn read_count(&mut self, field: &'static str, element_size: usize) -> Result<usize, DecodeError> {
        let count = self.read_i32()?;
        self.check_count(field, count, element_size)
    }

    pub fn read_vec<T>(&mut self, count: usize, mut read: impl FnMut(&mut Self) -> Result<T, DecodeError>) -> Result<Vec<T>, DecodeError> {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read(self)?);
        }

        Ok(items)
    }
}
