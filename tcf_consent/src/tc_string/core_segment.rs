use crate::core::{DataRead, RangeEntry};
use crate::tc_string::{ConsentError, FromBitStream, IdSet, VendorSection, merge_ranges};
use bitstream_io::BitRead;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;

/// The only core segment version this crate decodes.
pub const TCF_VERSION: u8 = 2;

// See https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework/blob/master/TCFv2/IAB%20Tech%20Lab%20-%20Consent%20string%20and%20vendor%20list%20formats%20v2.md#the-core-string
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub struct Core {
    pub created: u64,
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_stacks: bool,
    pub special_feature_optins: IdSet,
    pub purpose_consents: IdSet,
    pub purpose_legitimate_interests: IdSet,
    pub purpose_one_treatment: bool,
    pub publisher_country_code: String,
    pub vendor_consents: VendorSection,
    pub vendor_legitimate_interests: VendorSection,
    pub publisher_restrictions: Vec<PublisherRestriction>,
}

impl FromBitStream for Core {
    fn from_bit_stream<R: BitRead>(r: &mut R) -> Result<Self, ConsentError> {
        let version = r.read_unsigned::<6, u8>()?;
        if version != TCF_VERSION {
            return Err(ConsentError::UnsupportedVersion {
                expected: TCF_VERSION,
                found: version,
            });
        }

        let created = r.read_datetime_as_unix_timestamp()?;
        let last_updated = r.read_datetime_as_unix_timestamp()?;
        let cmp_id = r.read_unsigned::<12, u16>()?;
        let cmp_version = r.read_unsigned::<12, u16>()?;
        let consent_screen = r.read_unsigned::<6, u8>()?;
        let consent_language = r.read_string(2)?;
        let vendor_list_version = r.read_unsigned::<12, u16>()?;
        let policy_version = r.read_unsigned::<6, u8>()?;
        let is_service_specific = r.read_bit()?;
        let use_non_standard_stacks = r.read_bit()?;
        let special_feature_optins = r.read_fixed_bitfield(12)?;
        let purpose_consents = r.read_fixed_bitfield(24)?;
        let purpose_legitimate_interests = r.read_fixed_bitfield(24)?;
        let purpose_one_treatment = r.read_bit()?;
        let publisher_country_code = r.read_string(2)?;
        let vendor_consents = VendorSection::from_bit_stream(r)?;
        let vendor_legitimate_interests = VendorSection::from_bit_stream(r)?;
        let publisher_restrictions = read_publisher_restrictions(r)?;

        Ok(Self {
            created,
            last_updated,
            cmp_id,
            cmp_version,
            consent_screen,
            consent_language,
            vendor_list_version,
            policy_version,
            is_service_specific,
            use_non_standard_stacks,
            special_feature_optins,
            purpose_consents,
            purpose_legitimate_interests,
            purpose_one_treatment,
            publisher_country_code,
            vendor_consents,
            vendor_legitimate_interests,
            publisher_restrictions,
        })
    }
}

fn read_publisher_restrictions<R: BitRead>(
    r: &mut R,
) -> Result<Vec<PublisherRestriction>, ConsentError> {
    let n = r.read_unsigned::<12, u16>()?;
    let mut restrictions = Vec::with_capacity(usize::from(n));

    for _ in 0..n {
        let purpose_id = r.read_unsigned::<6, u8>()?;
        let restriction_type = RestrictionType::from_u8(r.read_unsigned::<2, u8>()?)
            .unwrap_or(RestrictionType::Undefined);
        let vendor_ids = merge_ranges(r.read_integer_range()?, None)?;

        restrictions.push(PublisherRestriction {
            purpose_id,
            restriction_type,
            vendor_ids,
        });
    }

    Ok(restrictions)
}

/// A publisher restriction on the legal basis vendors may use for a purpose.
///
/// Vendor IDs are kept as sorted, non-overlapping ranges and are never expanded.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PublisherRestriction {
    pub purpose_id: u8,
    pub restriction_type: RestrictionType,
    pub vendor_ids: Vec<RangeEntry>,
}

impl PublisherRestriction {
    pub fn applies_to(&self, vendor_id: u16, purpose_id: u8) -> bool {
        self.purpose_id == purpose_id && self.vendor_ids.iter().any(|r| r.contains(vendor_id))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RestrictionType {
    NotAllowed = 0,
    RequireConsent = 1,
    RequireLegitimateInterest = 2,
    Undefined = 3,
}
