use crate::error::{InspectError, Result};

/// MSB-first bit cursor used for the container's packed RECT header.
///
/// The cursor only moves forward. A read that would run past the end of the
/// buffer fails without moving it.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitCursor<'a> {
    pub const fn new(data: &'a [u8], byte_pos: usize) -> Self {
        Self {
            data,
            byte_pos,
            bit_pos: 0,
        }
    }

    #[inline]
    pub const fn byte_position(&self) -> usize {
        self.byte_pos
    }

    #[inline]
    pub const fn bit_position(&self) -> u8 {
        self.bit_pos
    }

    fn bits_available(&self) -> usize {
        self.data
            .len()
            .saturating_sub(self.byte_pos)
            .saturating_mul(8)
            .saturating_sub(self.bit_pos as usize)
    }

    /// Reads `count` (at most 32) bits as an unsigned value.
    pub fn read_ubits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32);
        let count = count.min(32);
        if (count as usize) > self.bits_available() {
            return Err(InspectError::ShortBuffer {
                offset: self.byte_pos,
                needed: (self.bit_pos as usize + count as usize).div_ceil(8),
                available: self.data.len().saturating_sub(self.byte_pos),
            });
        }

        let mut value: u32 = 0;
        for _ in 0..count {
            let byte = self.data[self.byte_pos];
            let bit = (byte >> (7 - self.bit_pos)) & 1;
            value = (value << 1) | bit as u32;
            self.bit_pos += 1;
            if self.bit_pos == 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
        }
        Ok(value)
    }

    /// Reads `count` bits as a two's-complement signed value.
    pub fn read_sbits(&mut self, count: u8) -> Result<i32> {
        let raw = self.read_ubits(count)?;
        if count == 0 || count >= 32 {
            return Ok(raw as i32);
        }
        let shift = 32 - count as u32;
        Ok(((raw << shift) as i32) >> shift)
    }

    /// Moves to the next byte boundary if mid-byte.
    pub fn align(&mut self) {
        if self.bit_pos != 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_across_byte_boundary() {
        let data = [0b1010_1100, 0b0111_0000];
        let mut c = BitCursor::new(&data, 0);
        assert_eq!(c.read_ubits(5).unwrap(), 0b10101);
        assert_eq!(c.read_ubits(6).unwrap(), 0b100011);
        assert_eq!(c.byte_position(), 1);
        assert_eq!(c.bit_position(), 3);
    }

    #[test]
    fn sign_extends() {
        let data = [0b1110_0000];
        let mut c = BitCursor::new(&data, 0);
        assert_eq!(c.read_sbits(3).unwrap(), -1);
        let data = [0b0110_0000];
        let mut c = BitCursor::new(&data, 0);
        assert_eq!(c.read_sbits(3).unwrap(), 3);
    }

    #[test]
    fn zero_width_read_is_zero() {
        let mut c = BitCursor::new(&[], 0);
        assert_eq!(c.read_sbits(0).unwrap(), 0);
        c.align();
        assert_eq!(c.byte_position(), 0);
    }

    #[test]
    fn overrun_fails_without_moving() {
        let data = [0xFF];
        let mut c = BitCursor::new(&data, 0);
        c.read_ubits(4).unwrap();
        assert!(c.read_ubits(5).is_err());
        assert_eq!(c.byte_position(), 0);
        assert_eq!(c.bit_position(), 4);
    }

    #[test]
    fn align_rounds_up() {
        let data = [0xFF, 0xFF];
        let mut c = BitCursor::new(&data, 0);
        c.read_ubits(1).unwrap();
        c.align();
        assert_eq!(c.byte_position(), 1);
        assert_eq!(c.bit_position(), 0);
    }
}
