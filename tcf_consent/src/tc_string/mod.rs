//! Decoding of IAB TCF v2 consent strings.
//!
//! A TC string is made of a mandatory core segment optionally followed by other segments,
//! all separated by `.` characters. Each segment is a bit stream encoded in URL-safe Base64.
//!
//! ```text
//! COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA.ZAAgH9794ulA
//! ```
//!
//! The example above contains a core segment and a publisher TC segment.
//!
//! Optional segments start with a 3-bit segment type. A given segment type may only
//! appear once.
//!
//! # Example
//!
//! ```
//! use tcf_consent::tc_string::TcString;
//!
//! # fn main() -> Result<(), tcf_consent::ConsentError> {
//! let tc: TcString = "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA".parse()?;
//!
//! assert!(tc.core.purpose_consents.contains(&1));
//! assert!(tc.core.vendor_consents.contains(6));
//! # Ok(())
//! # }
//! ```
use crate::core::{DataRead, DecodeError, base64_bit_reader};
use bitstream_io::BitRead;
use fnv::FnvHashSet;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::str::FromStr;
use strum_macros::Display;
use thiserror::Error;

mod core_segment;
mod publisher_tc;

pub use crate::core::RangeEntry;
pub use core_segment::{Core, PublisherRestriction, RestrictionType, TCF_VERSION};
pub use publisher_tc::PublisherTc;

pub type IdSet = BTreeSet<u16>;

/// The error type for consent string decoding operations.
///
/// Callers deciding whether consent is granted should treat every variant as "not granted".
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConsentError {
    /// No consent string is available yet, consent has not been collected.
    #[error("no consent string stored")]
    MissingConsentString,
    /// The string uses a TCF version this crate cannot decode.
    #[error("unsupported TC string version (expected {expected}, found {found})")]
    UnsupportedVersion { expected: u8, found: u8 },
    /// The string is structurally invalid.
    #[error("malformed consent string: {0}")]
    Malformed(#[from] MalformedError),
}

impl From<io::Error> for ConsentError {
    fn from(e: io::Error) -> Self {
        Self::Malformed(MalformedError::Read(e))
    }
}

impl From<DecodeError> for ConsentError {
    fn from(e: DecodeError) -> Self {
        Self::Malformed(MalformedError::DecodeSegment(e))
    }
}

/// Reasons for which a consent string is considered malformed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MalformedError {
    /// An I/O error occured while reading the bit stream.
    ///
    /// This usually occurs if the input string is truncated.
    #[error("unable to read string: {0}")]
    Read(#[from] io::Error),
    #[error("unable to decode segment: {0}")]
    DecodeSegment(#[from] DecodeError),
    #[error("empty segment")]
    EmptySegment,
    #[error("vendor id {id} out of range (max vendor id {max_vendor_id})")]
    VendorIdOutOfRange { id: u16, max_vendor_id: u16 },
    #[error("invalid id range {start}-{end}")]
    InvalidRange { start: u16, end: u16 },
    #[error("unknown segment type {segment_type}")]
    UnknownSegmentType { segment_type: u8 },
    #[error("duplicate {segment_type} segment")]
    DuplicateSegmentType { segment_type: SegmentType },
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, FromPrimitive)]
pub enum SegmentType {
    Core = 0,
    DisclosedVendors = 1,
    AllowedVendors = 2,
    PublisherTc = 3,
}

/// Types that can be read from a segment bit stream.
pub(crate) trait FromBitStream: Sized {
    fn from_bit_stream<R: BitRead>(r: &mut R) -> Result<Self, ConsentError>;
}

/// A decoded TC string.
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub struct TcString {
    pub core: Core,
    pub disclosed_vendors: Option<VendorSection>,
    pub allowed_vendors: Option<VendorSection>,
    pub publisher_tc: Option<PublisherTc>,
}

impl FromStr for TcString {
    type Err = ConsentError;

    /// Parses a string and returns a [`TcString`] if successful.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::MissingConsentString`] for an empty string,
    /// [`ConsentError::UnsupportedVersion`] if the core segment is not a TCF v2 segment, and
    /// [`ConsentError::Malformed`] if any segment cannot be fully decoded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ConsentError::MissingConsentString);
        }

        let mut segments = s.split('.');

        // first mandatory segment is the core segment
        let core = segments.next().unwrap_or_default();
        let mut output = Self {
            core: Core::from_bit_stream(&mut base64_bit_reader(core)?)?,
            disclosed_vendors: None,
            allowed_vendors: None,
            publisher_tc: None,
        };

        let mut seen = FnvHashSet::default();
        for segment in segments {
            if segment.is_empty() {
                return Err(MalformedError::EmptySegment.into());
            }

            let mut r = base64_bit_reader(segment)?;
            let segment_type = r.read_unsigned::<3, u8>()?;

            match SegmentType::from_u8(segment_type) {
                // already present, duplicate segments is an error
                Some(t) if !seen.insert(t) => {
                    return Err(MalformedError::DuplicateSegmentType { segment_type: t }.into());
                }
                Some(SegmentType::DisclosedVendors) => {
                    output.disclosed_vendors = Some(VendorSection::from_bit_stream(&mut r)?);
                }
                Some(SegmentType::AllowedVendors) => {
                    output.allowed_vendors = Some(VendorSection::from_bit_stream(&mut r)?);
                }
                Some(SegmentType::PublisherTc) => {
                    output.publisher_tc = Some(PublisherTc::from_bit_stream(&mut r)?);
                }
                _ => {
                    return Err(MalformedError::UnknownSegmentType { segment_type }.into());
                }
            }
        }

        Ok(output)
    }
}

/// A set of vendor IDs along with the maximum vendor ID declared for it.
///
/// Encoded as a 16-bit max vendor ID, then an encoding flag, then either a bitfield of
/// `max_vendor_id` bits or a range section.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct VendorSection {
    pub max_vendor_id: u16,
    pub ids: IdSet,
}

impl VendorSection {
    pub fn contains(&self, vendor_id: u16) -> bool {
        self.ids.contains(&vendor_id)
    }

    /// Renders the section as a string of `'1'` and `'0'` characters, one per vendor ID
    /// from 1 to `max_vendor_id`.
    pub fn to_bit_string(&self) -> String {
        bit_string(&self.ids, usize::from(self.max_vendor_id))
    }
}

impl FromBitStream for VendorSection {
    fn from_bit_stream<R: BitRead>(r: &mut R) -> Result<Self, ConsentError> {
        let max_vendor_id = r.read_unsigned::<16, u16>()?;
        let is_range_encoding = r.read_bit()?;
        let ids = if is_range_encoding {
            expand_range(r.read_integer_range()?, Some(max_vendor_id))?
        } else {
            r.read_fixed_bitfield(usize::from(max_vendor_id))?
        };

        Ok(Self { max_vendor_id, ids })
    }
}

/// Validates range entries, then sorts and merges overlapping or adjacent ones.
///
/// IDs start at 1, and groups must be ordered. When `max_id` is known, no ID may exceed it.
pub(crate) fn merge_ranges(
    mut entries: Vec<RangeEntry>,
    max_id: Option<u16>,
) -> Result<Vec<RangeEntry>, MalformedError> {
    for &RangeEntry { start, end } in &entries {
        if start == 0 || end < start {
            return Err(MalformedError::InvalidRange { start, end });
        }
        if let Some(max_vendor_id) = max_id.filter(|&m| end > m) {
            return Err(MalformedError::VendorIdOutOfRange {
                id: end,
                max_vendor_id,
            });
        }
    }

    entries.sort_unstable_by_key(|e| e.start);
    let mut merged: Vec<RangeEntry> = Vec::with_capacity(entries.len());
    for e in entries {
        match merged.last_mut() {
            Some(last) if e.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(e.end);
            }
            _ => merged.push(e),
        }
    }

    Ok(merged)
}

/// Expands range entries into a set of IDs, each ID being inserted once.
pub(crate) fn expand_range(
    entries: Vec<RangeEntry>,
    max_id: Option<u16>,
) -> Result<IdSet, MalformedError> {
    Ok(merge_ranges(entries, max_id)?
        .into_iter()
        .flat_map(|RangeEntry { start, end }| start..=end)
        .collect())
}

/// Renders a set of 1-based IDs as `'1'`/`'0'` characters over `len` positions.
pub(crate) fn bit_string(ids: &IdSet, len: usize) -> String {
    (1..=len)
        .map(|i| {
            if u16::try_from(i).is_ok_and(|id| ids.contains(&id)) {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}
