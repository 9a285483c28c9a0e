use super::bitpack::{BitPackError, BitReader, BitWriter};
use thiserror::Error;

/// Longest run a single run token can describe; its count field holds `length - 1`.
pub const MAX_RUN_LENGTH: usize = 0x100;
const RUN_COUNT_BITS: u32 = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RleError {
    #[error("Truncated run-length data")]
    TruncatedData(#[from] BitPackError),
    #[error("Run of {run} values at position {position} overflows expected length {expected}")]
    RunOverflow {
        run: usize,
        position: usize,
        expected: usize,
    },
}

/// Splits a sequence into maximal runs of equal consecutive values.
pub struct Repetitions<I: Iterator> {
    inner: I,
    current: Option<I::Item>,
}

pub fn repetitions<I>(values: I) -> Repetitions<I::IntoIter>
where
    I: IntoIterator,
    I::Item: PartialEq,
{
    let mut inner = values.into_iter();
    let current = inner.next();
    Repetitions { inner, current }
}

impl<I> Iterator for Repetitions<I>
where
    I: Iterator,
    I::Item: PartialEq,
{
    type Item = (I::Item, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.current.take()?;
        let mut count = 1;

        for item in self.inner.by_ref() {
            if item == value {
                count += 1;
            } else {
                self.current = Some(item);
                break;
            }
        }

        Some((value, count))
    }
}

/// Run length at or below which literal tokens are no larger than a run token.
pub fn break_even(bit_width: u32) -> usize {
    (8 + bit_width as usize) / (bit_width as usize + 1)
}

/// Run-length encodes palette indices into an escape-tagged bitstream.
///
/// Literal token: `0` followed by the value in `bit_width` bits.
/// Run token: `1`, an 8 bit `length - 1` field, then the value in `bit_width` bits.
pub fn rle_encode(indices: &[u8], bit_width: u32) -> Vec<u8> {
    let break_even = break_even(bit_width);
    let mut writer = BitWriter::new();

    for (value, mut count) in repetitions(indices.iter().copied()) {
        while count > break_even {
            let chunk = count.min(MAX_RUN_LENGTH);
            writer.push_bit(true);
            writer.push_bits((chunk - 1) as u32, RUN_COUNT_BITS);
            writer.push_bits(value as u32, bit_width);
            count -= chunk;
        }
        for _ in 0..count {
            writer.push_bit(false);
            writer.push_bits(value as u32, bit_width);
        }
    }

    writer.finish()
}

/// Expands a stream produced by [`rle_encode`] back to exactly `count` indices.
/// Trailing pad bits are ignored.
pub fn rle_decode(data: &[u8], bit_width: u32, count: usize) -> Result<Vec<u8>, RleError> {
    let mut reader = BitReader::new(data);
    let mut decoded = Vec::with_capacity(count);

    while decoded.len() < count {
        if reader.read_bit()? {
            let run = reader.read_bits(RUN_COUNT_BITS)? as usize + 1;
            let value = reader.read_bits(bit_width)? as u8;

            if decoded.len() + run > count {
                return Err(RleError::RunOverflow {
                    run,
                    position: decoded.len(),
                    expected: count,
                });
            }
            decoded.resize(decoded.len() + run, value);
        } else {
            decoded.push(reader.read_bits(bit_width)? as u8);
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetitions_runs() {
        let runs: Vec<_> = repetitions([1, 1, 2, 3, 3, 3, 1]).collect();
        assert_eq!(runs, vec![(1, 2), (2, 1), (3, 3), (1, 1)]);
    }

    #[test]
    fn test_repetitions_empty() {
        assert_eq!(repetitions(Vec::<u8>::new()).count(), 0);
    }

    #[test]
    fn test_break_even_values() {
        assert_eq!(break_even(1), 4);
        assert_eq!(break_even(2), 3);
        assert_eq!(break_even(3), 2);
        assert_eq!(break_even(6), 2);
        assert_eq!(break_even(7), 1);
        assert_eq!(break_even(8), 1);
    }

    #[test]
    fn test_rle_break_even_literals() {
        // Four literal tokens "01"
        let encoded = rle_encode(&[1, 1, 1, 1], 1);
        assert_eq!(encoded, vec![0b0101_0101]);
    }

    #[test]
    fn test_rle_break_even_run_token() {
        // 1, count field 4, value 1
        let encoded = rle_encode(&[1, 1, 1, 1, 1], 1);
        assert_eq!(encoded, vec![0b1000_0010, 0b0100_0000]);
    }

    #[test]
    fn test_rle_long_run_splits_at_256() {
        let input = vec![0u8; 1000];
        let encoded = rle_encode(&input, 1);
        // 256 + 256 + 256 + 232, ten bits each
        assert_eq!(encoded.len(), 5);
        assert_eq!(rle_decode(&encoded, 1, input.len()).unwrap(), input);
    }

    #[test]
    fn test_rle_run_remainder_below_break_even() {
        // 259 = one full run token plus three literals
        let input = vec![2u8; 259];
        let encoded = rle_encode(&input, 2);
        assert_eq!(encoded.len(), (11 + 3 * 3 + 7) / 8);
        assert_eq!(rle_decode(&encoded, 2, input.len()).unwrap(), input);
    }

    #[test]
    fn test_rle_alternating_pattern() {
        let input: Vec<u8> = (0..100).map(|i| (i % 2) as u8).collect();
        let encoded = rle_encode(&input, 1);
        assert_eq!(encoded.len(), 25);
        assert_eq!(rle_decode(&encoded, 1, input.len()).unwrap(), input);
    }

    #[test]
    fn test_rle_single_value() {
        let encoded = rle_encode(&[9], 4);
        assert_eq!(encoded, vec![0b0100_1000]);
        assert_eq!(rle_decode(&encoded, 4, 1).unwrap(), vec![9]);
    }

    #[test]
    fn test_rle_mixed_widths() {
        for bit_width in 1..=8u32 {
            let max = 1u32 << bit_width;
            let mut input = Vec::new();
            for i in 0..40u32 {
                let value = ((i * 5 + 1) % max) as u8;
                input.extend(std::iter::repeat(value).take((i % 7) as usize + 1));
            }
            input.extend(std::iter::repeat(0).take(600));

            let encoded = rle_encode(&input, bit_width);
            let decoded = rle_decode(&encoded, bit_width, input.len()).unwrap();
            assert_eq!(decoded, input, "bit width {}", bit_width);
        }
    }

    #[test]
    fn test_rle_decode_truncated() {
        let encoded = rle_encode(&[1, 0, 1, 0], 1);
        let result = rle_decode(&encoded, 1, 8);
        assert!(matches!(result, Err(RleError::TruncatedData(_))));
    }

    #[test]
    fn test_rle_decode_run_overflow() {
        let encoded = rle_encode(&[1; 10], 1);
        let result = rle_decode(&encoded, 1, 6);
        assert!(matches!(
            result,
            Err(RleError::RunOverflow {
                run: 10,
                position: 0,
                expected: 6
            })
        ));
    }

    #[test]
    fn test_rle_empty() {
        assert!(rle_encode(&[], 3).is_empty());
        assert!(rle_decode(&[], 3, 0).unwrap().is_empty());
    }
}
