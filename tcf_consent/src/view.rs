//! Read-only view of the consent granted by a user.
//!
//! A [`ConsentView`] is built once from a decoded [`TcString`] and never changes afterwards.
//! A new consent string always produces a new view.
//!
//! Publisher restrictions are kept as decoded and applied when querying a vendor for a purpose,
//! so raw vendor consent remains available through [`ConsentView::vendor_consent`].
use crate::tc_string::{
    ConsentError, IdSet, PublisherRestriction, RestrictionType, TcString, VendorSection,
    bit_string,
};
#[cfg(feature = "serde")]
use serde::Serialize;

/// Number of purposes encoded in the purpose bitfields of a TC string.
pub const PURPOSE_COUNT: usize = 24;

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConsentView {
    gdpr_applies: bool,
    created: u64,
    last_updated: u64,
    policy_version: u8,
    purpose_consents: IdSet,
    purpose_legitimate_interests: IdSet,
    vendor_consents: VendorSection,
    vendor_legitimate_interests: VendorSection,
    publisher_restrictions: Vec<PublisherRestriction>,
    additional_consent: String,
}

impl ConsentView {
    pub fn new(tc: &TcString, gdpr_applies: bool, additional_consent: &str) -> Self {
        Self {
            gdpr_applies,
            created: tc.core.created,
            last_updated: tc.core.last_updated,
            policy_version: tc.core.policy_version,
            purpose_consents: tc.core.purpose_consents.clone(),
            purpose_legitimate_interests: tc.core.purpose_legitimate_interests.clone(),
            vendor_consents: tc.core.vendor_consents.clone(),
            vendor_legitimate_interests: tc.core.vendor_legitimate_interests.clone(),
            publisher_restrictions: tc.core.publisher_restrictions.clone(),
            additional_consent: additional_consent.to_string(),
        }
    }

    /// Decodes a TC string and builds its view.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsentError`] if the string is empty, uses an unsupported version or cannot be
    /// decoded.
    ///
    /// # Example
    ///
    /// ```
    /// use tcf_consent::ConsentView;
    ///
    /// # fn main() -> Result<(), tcf_consent::ConsentError> {
    /// let view = ConsentView::parse("COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA", true, "")?;
    ///
    /// assert!(view.has_consent_for_purposes(&[1, 2, 3]));
    /// assert!(!view.has_consent_for_purposes(&[1, 4]));
    /// assert_eq!(view.vendor_consents_bits(), "01000101");
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(
        raw: &str,
        gdpr_applies: bool,
        additional_consent: &str,
    ) -> Result<Self, ConsentError> {
        let tc: TcString = raw.parse()?;
        Ok(Self::new(&tc, gdpr_applies, additional_consent))
    }

    pub fn is_gdpr_applicable(&self) -> bool {
        self.gdpr_applies
    }

    /// Creation time of the consent string, in seconds since the Unix epoch.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    pub fn policy_version(&self) -> u8 {
        self.policy_version
    }

    /// The raw additional consent string, as stored by the CMP.
    pub fn additional_consent(&self) -> &str {
        &self.additional_consent
    }

    pub fn publisher_restrictions(&self) -> &[PublisherRestriction] {
        &self.publisher_restrictions
    }

    pub fn purpose_consent(&self, purpose_id: u8) -> bool {
        self.purpose_consents.contains(&u16::from(purpose_id))
    }

    pub fn purpose_legitimate_interest(&self, purpose_id: u8) -> bool {
        self.purpose_legitimate_interests
            .contains(&u16::from(purpose_id))
    }

    pub fn vendor_consent(&self, vendor_id: u16) -> bool {
        self.vendor_consents.contains(vendor_id)
    }

    pub fn vendor_legitimate_interest(&self, vendor_id: u16) -> bool {
        self.vendor_legitimate_interests.contains(vendor_id)
    }

    /// Returns the restriction the publisher put on a vendor for a purpose, if any.
    ///
    /// If several restrictions match, the most restrictive one is returned.
    pub fn restriction_for(&self, vendor_id: u16, purpose_id: u8) -> Option<RestrictionType> {
        let mut found = None;
        for r in self
            .publisher_restrictions
            .iter()
            .filter(|r| r.applies_to(vendor_id, purpose_id))
        {
            match r.restriction_type {
                RestrictionType::NotAllowed => return Some(RestrictionType::NotAllowed),
                RestrictionType::Undefined => {}
                t => found = Some(t),
            }
        }
        found
    }

    pub fn is_vendor_allowed_for_purpose(&self, vendor_id: u16, purpose_id: u8) -> bool {
        self.restriction_for(vendor_id, purpose_id) != Some(RestrictionType::NotAllowed)
    }

    /// Whether the vendor may process data for the purpose on the basis of consent.
    pub fn vendor_has_consent_for_purpose(&self, vendor_id: u16, purpose_id: u8) -> bool {
        match self.restriction_for(vendor_id, purpose_id) {
            Some(RestrictionType::NotAllowed | RestrictionType::RequireLegitimateInterest) => false,
            _ => self.purpose_consent(purpose_id) && self.vendor_consent(vendor_id),
        }
    }

    /// Whether the vendor may process data for the purpose on the basis of legitimate interest.
    pub fn vendor_has_legitimate_interest_for_purpose(
        &self,
        vendor_id: u16,
        purpose_id: u8,
    ) -> bool {
        match self.restriction_for(vendor_id, purpose_id) {
            Some(RestrictionType::NotAllowed | RestrictionType::RequireConsent) => false,
            _ => {
                self.purpose_legitimate_interest(purpose_id)
                    && self.vendor_legitimate_interest(vendor_id)
            }
        }
    }

    /// Returns true if every purpose has consent.
    ///
    /// An empty list of purposes is always satisfied.
    pub fn has_consent_for_purposes(&self, purposes: &[u8]) -> bool {
        purposes.iter().all(|&p| self.purpose_consent(p))
    }

    /// Returns true if every purpose has either consent or legitimate interest.
    ///
    /// An empty list of purposes is always satisfied.
    pub fn has_consent_or_legitimate_interest_for_purposes(&self, purposes: &[u8]) -> bool {
        purposes
            .iter()
            .all(|&p| self.purpose_consent(p) || self.purpose_legitimate_interest(p))
    }

    /// Vendor scoped version of [`has_consent_for_purposes`](Self::has_consent_for_purposes).
    pub fn vendor_has_consent_for_purposes(&self, vendor_id: u16, purposes: &[u8]) -> bool {
        purposes
            .iter()
            .all(|&p| self.vendor_has_consent_for_purpose(vendor_id, p))
    }

    /// Vendor scoped version of
    /// [`has_consent_or_legitimate_interest_for_purposes`](Self::has_consent_or_legitimate_interest_for_purposes).
    pub fn vendor_has_consent_or_legitimate_interest_for_purposes(
        &self,
        vendor_id: u16,
        purposes: &[u8],
    ) -> bool {
        purposes.iter().all(|&p| {
            self.vendor_has_consent_for_purpose(vendor_id, p)
                || self.vendor_has_legitimate_interest_for_purpose(vendor_id, p)
        })
    }

    pub fn purpose_consents_bits(&self) -> String {
        bit_string(&self.purpose_consents, PURPOSE_COUNT)
    }

    pub fn purpose_legitimate_interests_bits(&self) -> String {
        bit_string(&self.purpose_legitimate_interests, PURPOSE_COUNT)
    }

    pub fn vendor_consents_bits(&self) -> String {
        self.vendor_consents.to_bit_string()
    }

    pub fn vendor_legitimate_interests_bits(&self) -> String {
        self.vendor_legitimate_interests.to_bit_string()
    }
}
