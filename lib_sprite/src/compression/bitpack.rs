use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BitPackError {
    #[error("Truncated data: needed {needed} bits, only {available} available")]
    TruncatedData { needed: usize, available: usize },
}

/// Accumulates values MSB-first into a byte buffer without alignment between them.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    current_byte: u8,
    bit_count: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bit(&mut self, bit: bool) {
        self.current_byte = (self.current_byte << 1) | (bit as u8);
        self.bit_count += 1;

        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the low `width` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u32, width: u32) {
        debug_assert!(width <= u32::BITS, "bit width {} exceeds 32", width);
        for shift in (0..width).rev() {
            self.push_bit((value >> shift) & 1 == 1);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the partial byte, zero-padded on the low end.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            let padding = 8 - self.bit_count;
            self.bytes.push(self.current_byte << padding);
        }
        self.bytes
    }
}

#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    pub fn read_bit(&mut self) -> Result<bool, BitPackError> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn read_bits(&mut self, width: u32) -> Result<u32, BitPackError> {
        debug_assert!(width <= u32::BITS, "bit width {} exceeds 32", width);
        let width = width as usize;
        if width > self.remaining() {
            return Err(BitPackError::TruncatedData {
                needed: width,
                available: self.remaining(),
            });
        }

        let mut value = 0u32;
        for _ in 0..width {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.position += 1;
        }

        Ok(value)
    }
}

/// Packs every value as exactly `bit_width` bits, in sequence order.
pub fn pack<I>(values: I, bit_width: u32) -> Vec<u8>
where
    I: IntoIterator<Item = u32>,
{
    let mut writer = BitWriter::new();
    for value in values {
        writer.push_bits(value, bit_width);
    }
    writer.finish()
}

/// Inverse of [`pack`]: reads `count` values of `bit_width` bits each.
pub fn unpack(data: &[u8], bit_width: u32, count: usize) -> Result<Vec<u32>, BitPackError> {
    let needed = count * bit_width as usize;
    if needed > data.len() * 8 {
        return Err(BitPackError::TruncatedData {
            needed,
            available: data.len() * 8,
        });
    }

    let mut reader = BitReader::new(data);
    (0..count).map(|_| reader.read_bits(bit_width)).collect()
}
