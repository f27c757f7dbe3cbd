//! Configuration of the purposes required by ad serving and analytics.
//!
//! Which purposes are needed to serve ads is decided by the ad-serving platform rather than by
//! the TCF itself, so it is configuration. The defaults follow Google's published requirements
//! for TCF v2.2:
//!
//! * non-personalized ads need consent for purpose 1, and consent or legitimate interest for
//!   purposes 2, 7, 9 and 10,
//! * personalized ads need consent for purposes 1, 3 and 4, and consent or legitimate interest
//!   for purposes 2, 7, 9 and 10.
//!
//! With these defaults, a user granting consent for purpose 1 only can see neither kind of ads.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered list of purpose IDs.
pub type PurposeSet = Vec<u8>;

/// The default TCF policy version, TCF v2.2.
pub const DEFAULT_POLICY_VERSION: u8 = 4;

/// Consent strings older than this are considered outdated by default.
pub const DEFAULT_MAX_AGE_DAYS: u64 = 365;

/// Purposes required for a given kind of ads.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdsPolicy {
    /// Purposes that must be granted through consent.
    pub consent_purposes: PurposeSet,
    /// Purposes that may be granted either through consent or legitimate interest.
    pub flexible_purposes: PurposeSet,
}

impl AdsPolicy {
    pub fn non_personalized() -> Self {
        Self {
            consent_purposes: vec![1],
            flexible_purposes: vec![2, 7, 9, 10],
        }
    }

    pub fn personalized() -> Self {
        Self {
            consent_purposes: vec![1, 3, 4],
            flexible_purposes: vec![2, 7, 9, 10],
        }
    }
}

impl Default for AdsPolicy {
    fn default() -> Self {
        Self::non_personalized()
    }
}

/// Purposes mapped to each analytics consent flag.
///
/// Every flag is granted when all its purposes have either consent or legitimate interest.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyticsPolicy {
    pub ad_storage: PurposeSet,
    pub ad_personalization: PurposeSet,
    pub ad_user_data: PurposeSet,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        Self {
            ad_storage: vec![1],
            ad_personalization: vec![1, 3, 4],
            ad_user_data: vec![1, 3, 4, 9, 10],
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsentPolicy {
    pub non_personalized_ads: AdsPolicy,
    pub personalized_ads: AdsPolicy,
    /// When set, ad checks also require this vendor to be granted the purposes, with
    /// publisher restrictions applied.
    pub vendor_id: Option<u16>,
    /// Purposes checked by vendor authorization.
    pub vendor_purposes: PurposeSet,
    pub analytics: AnalyticsPolicy,
    /// Stored strings with a lower policy version are considered outdated.
    pub current_policy_version: u8,
    pub max_age_days: u64,
    /// Whether GDPR applies when the platform has not stored the information.
    pub gdpr_applies_when_unknown: bool,
}

impl ConsentPolicy {
    pub fn with_vendor(mut self, vendor_id: u16) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }
}

impl Default for ConsentPolicy {
    fn default() -> Self {
        Self {
            non_personalized_ads: AdsPolicy::non_personalized(),
            personalized_ads: AdsPolicy::personalized(),
            vendor_id: None,
            vendor_purposes: vec![1, 2, 3, 4, 7, 9, 10],
            analytics: AnalyticsPolicy::default(),
            current_policy_version: DEFAULT_POLICY_VERSION,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            gdpr_applies_when_unknown: true,
        }
    }
}
