//! # Overview
//!
//! Variable-length unsigned integers carry every packet type, string length,
//! and version number in the ClickHouse native protocol. The encoding is
//! little-endian base-128: seven value bits per byte with the high bit set
//! while more bytes follow, at most ten bytes for a full `u64`.
//!
//! # Design
//!
//! [`VarUIntReader`] is resumable: it remembers how many bytes it has
//! absorbed so a value split across deliveries decodes identically to one
//! arriving whole. [`encode_varuint_to_vec`] produces the canonical encoding
//! so fixtures and round-trip tests never hand-write byte strings.

use crate::cursor::Cursor;
use crate::error::WireError;
use crate::reader::Reader;

/// Longest valid encoding of a variable-length unsigned integer, in bytes.
pub const MAX_VARUINT_LEN: usize = 10;

/// Resumable decoder for a variable-length unsigned integer.
#[derive(Clone, Debug, Default)]
pub struct VarUIntReader {
    value: u64,
    i: u8,
}

impl VarUIntReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0, i: 0 }
    }

    /// The decoded value. Meaningful once the reader is complete.
    #[must_use]
    #[inline]
    pub const fn value(&self) -> u64 {
        self.value
    }
}

impl Reader for VarUIntReader {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        while self.i < 10 && data.has_remaining() {
            let byte = data.next_byte();
            self.value |= u64::from(byte & 0x7F) << (7 * u32::from(self.i));
            if byte & 0x80 == 0 {
                self.i = 10;
            } else {
                self.i += 1;
                if self.i == 10 {
                    return Err(WireError::MalformedVarUInt);
                }
            }
        }
        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.i == 10
    }

    fn reset(&mut self) {
        self.value = 0;
        self.i = 0;
    }
}

/// Appends the canonical encoding of `value` to `out`.
///
/// Produces between one and [`MAX_VARUINT_LEN`] bytes; zero encodes as a
/// single `0x00`.
pub fn encode_varuint_to_vec(value: u64, out: &mut Vec<u8>) {
    let mut rest = value;
    loop {
        let mut byte = (rest & 0x7F) as u8;
        rest >>= 7;
        if rest != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rest == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_one_shot(bytes: &[u8]) -> (u64, usize) {
        let slices = [bytes];
        let mut data = Cursor::new(&slices);
        let mut reader = VarUIntReader::new();
        assert!(reader.feed(&mut data).expect("encoding is well formed"));
        (reader.value(), data.position())
    }

    #[test]
    fn encode_matches_known_examples() {
        let cases: [(u64, &[u8]); 6] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
            (54470, &[0xC6, 0xA9, 0x03]),
        ];

        for (value, expected) in cases {
            let mut encoded = Vec::new();
            encode_varuint_to_vec(value, &mut encoded);
            assert_eq!(encoded, expected, "encoding of {value}");
            assert_eq!(decode_one_shot(expected), (value, expected.len()));
        }
    }

    #[test]
    fn single_zero_byte_completes_with_value_zero() {
        assert_eq!(decode_one_shot(&[0x00]), (0, 1));
    }

    #[test]
    fn resumes_across_byte_at_a_time_deliveries() {
        let mut encoded = Vec::new();
        encode_varuint_to_vec(u64::MAX, &mut encoded);
        assert_eq!(encoded.len(), MAX_VARUINT_LEN);

        let mut reader = VarUIntReader::new();
        for (index, byte) in encoded.iter().enumerate() {
            let slice = [*byte];
            let slices: [&[u8]; 1] = [&slice];
            let mut data = Cursor::new(&slices);
            let complete = reader.feed(&mut data).expect("encoding is well formed");
            assert_eq!(complete, index + 1 == encoded.len());
        }
        assert_eq!(reader.value(), u64::MAX);
    }

    #[test]
    fn ten_continuation_bytes_are_malformed() {
        let bytes = [0x80u8; 10];
        let slices: [&[u8]; 1] = [&bytes];
        let mut data = Cursor::new(&slices);
        let mut reader = VarUIntReader::new();
        assert_eq!(reader.feed(&mut data), Err(WireError::MalformedVarUInt));
    }

    #[test]
    fn completed_reader_leaves_later_bytes_untouched() {
        let bytes = [0x05u8, 0xAA, 0xBB];
        let slices: [&[u8]; 1] = [&bytes];
        let mut data = Cursor::new(&slices);
        let mut reader = VarUIntReader::new();

        assert!(reader.feed(&mut data).expect("encoding is well formed"));
        assert_eq!(reader.value(), 5);
        assert_eq!(data.position(), 1);

        // Feeding again must not consume more bytes or lose completion.
        assert!(reader.feed(&mut data).expect("no bytes are read"));
        assert_eq!(data.position(), 1);
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(value in any::<u64>()) {
            let mut encoded = Vec::new();
            encode_varuint_to_vec(value, &mut encoded);
            prop_assert!((1..=MAX_VARUINT_LEN).contains(&encoded.len()));

            let (decoded, consumed) = decode_one_shot(&encoded);
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
        }

        #[test]
        fn split_decoding_matches_one_shot(value in any::<u64>(), split in 0usize..MAX_VARUINT_LEN) {
            let mut encoded = Vec::new();
            encode_varuint_to_vec(value, &mut encoded);
            let cut = split.min(encoded.len());
            let (head, tail) = encoded.split_at(cut);

            let mut reader = VarUIntReader::new();
            let head_slices = [head];
            let mut data = Cursor::new(&head_slices);
            let complete = reader.feed(&mut data).expect("encoding is well formed");
            prop_assert_eq!(complete, tail.is_empty());

            if !tail.is_empty() {
                let tail_slices = [tail];
                let mut data = Cursor::new(&tail_slices);
                prop_assert!(reader.feed(&mut data).expect("encoding is well formed"));
            }
            prop_assert_eq!(reader.value(), value);
        }
    }
}
