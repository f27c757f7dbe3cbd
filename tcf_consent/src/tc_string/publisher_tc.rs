use crate::core::DataRead;
use crate::tc_string::{ConsentError, FromBitStream, IdSet};
use bitstream_io::BitRead;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Purposes the publisher itself asks consent or legitimate interest for, including
/// custom purposes that are not part of the IAB purpose list.
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub struct PublisherTc {
    pub consents: IdSet,
    pub legitimate_interests: IdSet,
    pub custom_consents: IdSet,
    pub custom_legitimate_interests: IdSet,
}

impl FromBitStream for PublisherTc {
    fn from_bit_stream<R: BitRead>(r: &mut R) -> Result<Self, ConsentError> {
        let consents = r.read_fixed_bitfield(24)?;
        let legitimate_interests = r.read_fixed_bitfield(24)?;
        let custom_purposes_num = usize::from(r.read_unsigned::<6, u8>()?);
        let custom_consents = r.read_fixed_bitfield(custom_purposes_num)?;
        let custom_legitimate_interests = r.read_fixed_bitfield(custom_purposes_num)?;

        Ok(Self {
            consents,
            legitimate_interests,
            custom_consents,
            custom_legitimate_interests,
        })
    }
}
