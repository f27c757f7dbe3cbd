use crate::core::base64::decode_base64_url;
use bitstream_io::{BigEndian, BitRead, BitReader};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::iter::repeat_with;

pub(crate) mod base64;

pub use base64::DecodeError;

/// A single entry of a range section: either one ID (`start == end`) or an inclusive
/// group of IDs. Entries are kept as read; validation happens where the bounds are known.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RangeEntry {
    pub start: u16,
    pub end: u16,
}

impl RangeEntry {
    pub fn contains(&self, id: u16) -> bool {
        self.start <= id && id <= self.end
    }
}

pub trait DataRead {
    fn read_string(&mut self, chars: usize) -> io::Result<String>;

    fn read_datetime_as_unix_timestamp(&mut self) -> io::Result<u64>;

    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<BTreeSet<u16>>;

    fn read_integer_range(&mut self) -> io::Result<Vec<RangeEntry>>;
}

impl<T> DataRead for T
where
    T: BitRead,
{
    fn read_string(&mut self, chars: usize) -> io::Result<String> {
        repeat_with(|| self.read_unsigned::<6, u8>())
            .take(chars)
            .map(|r| r.map(|n| (n + 65) as char))
            .collect::<Result<String, _>>()
    }

    fn read_datetime_as_unix_timestamp(&mut self) -> io::Result<u64> {
        Ok(self.read_unsigned::<36, u64>()? / 10) // seconds
    }

    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<BTreeSet<u16>> {
        let mut result = BTreeSet::new();
        for i in 1..=bits {
            let b = self.read_bit()?;
            if b {
                result.insert(i as u16);
            }
        }

        Ok(result)
    }

    fn read_integer_range(&mut self) -> io::Result<Vec<RangeEntry>> {
        let n = self.read_unsigned::<12, u16>()?;
        let mut range = vec![];

        for _ in 0..n {
            let is_group = self.read_bit()?;
            let start = self.read_unsigned::<16, u16>()?;
            let end = if is_group {
                self.read_unsigned::<16, u16>()?
            } else {
                start
            };
            range.push(RangeEntry { start, end });
        }

        Ok(range)
    }
}

/// Decodes a Base64-URL segment and returns a big endian bit reader over its content.
pub(crate) fn base64_bit_reader(
    s: &str,
) -> Result<BitReader<io::Cursor<Vec<u8>>, BigEndian>, DecodeError> {
    let bytes = decode_base64_url(s)?;
    Ok(BitReader::endian(io::Cursor::new(bytes), BigEndian))
}
