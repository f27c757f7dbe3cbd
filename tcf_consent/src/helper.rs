//! Host-facing consent queries.
//!
//! [`ConsentHelper`] is constructed once at application startup with the platform preference
//! store and a [`ConsentPolicy`], and passed to every place that needs to know what the user
//! agreed to.
//!
//! Every query is total: decoding failures never reach the caller. Boolean queries return
//! `false` and string queries return an empty string whenever the consent data is missing or
//! cannot be decoded, so that an error is never mistaken for granted consent. The only exception
//! are bit-string queries, which return the values published by the CMP when no consent string
//! is stored at all.
//!
//! # Example
//!
//! ```
//! use tcf_consent::{ConsentHelper, ConsentPolicy};
//! use tcf_consent::store::{self, MemoryStore};
//!
//! let store = MemoryStore::new().with(store::GDPR_APPLIES, "1");
//! let helper = ConsentHelper::new(store, ConsentPolicy::default());
//!
//! // no consent collected yet
//! assert!(helper.is_gdpr());
//! assert!(!helper.can_show_ads());
//! assert_eq!(helper.purpose_consents(), "");
//! ```
use crate::additional_consent::AdditionalConsent;
use crate::policy::{AdsPolicy, ConsentPolicy};
use crate::store::{
    ADDITIONAL_CONSENT, POLICY_VERSION, PURPOSE_CONSENTS, PURPOSE_LEGITIMATE_INTERESTS,
    PreferenceStore, TC_STRING, VENDOR_CONSENTS, VENDOR_LEGITIMATE_INTERESTS,
};
use crate::tc_string::{ConsentError, TcString};
use crate::view::ConsentView;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Eq, PartialEq)]
struct CacheKey {
    tc_string: String,
    gdpr_applies: bool,
    additional_consent: String,
}

#[derive(Debug)]
struct CachedView {
    key: CacheKey,
    view: Arc<ConsentView>,
}

#[derive(Debug)]
pub struct ConsentHelper<S> {
    store: S,
    policy: ConsentPolicy,
    cache: Mutex<Option<CachedView>>,
}

impl<S> ConsentHelper<S>
where
    S: PreferenceStore,
{
    pub fn new(store: S, policy: ConsentPolicy) -> Self {
        Self {
            store,
            policy,
            cache: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives mutable access to the underlying store. The cached view is dropped.
    pub fn store_mut(&mut self) -> &mut S {
        self.invalidate();
        &mut self.store
    }

    pub fn policy(&self) -> &ConsentPolicy {
        &self.policy
    }

    /// Drops the cached consent view, the next query decodes the stored string again.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether GDPR applies to the current user.
    ///
    /// When the platform has not stored the information,
    /// [`ConsentPolicy::gdpr_applies_when_unknown`] is returned.
    pub fn is_gdpr(&self) -> bool {
        self.store
            .gdpr_applies()
            .unwrap_or(self.policy.gdpr_applies_when_unknown)
    }

    /// Returns the view of the currently stored consent string.
    ///
    /// The view is cached until the stored values change or [`invalidate`](Self::invalidate) is
    /// called.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::MissingConsentString`] if no string is stored, or another
    /// [`ConsentError`] if the stored string cannot be decoded.
    pub fn consent_view(&self) -> Result<Arc<ConsentView>, ConsentError> {
        let key = CacheKey {
            tc_string: self.store.read(TC_STRING).unwrap_or_default(),
            gdpr_applies: self.is_gdpr(),
            additional_consent: self.store.read(ADDITIONAL_CONSENT).unwrap_or_default(),
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref().filter(|c| c.key == key) {
            return Ok(Arc::clone(&cached.view));
        }

        debug!("decoding stored consent string");
        let view = Arc::new(ConsentView::parse(
            &key.tc_string,
            key.gdpr_applies,
            &key.additional_consent,
        )?);
        *cache = Some(CachedView {
            key,
            view: Arc::clone(&view),
        });

        Ok(view)
    }

    fn query<T>(&self, query: &str, f: impl FnOnce(&ConsentView) -> T) -> Option<T> {
        match self.consent_view() {
            Ok(view) => Some(f(&view)),
            Err(ConsentError::MissingConsentString) => {
                debug!(query, "no consent string stored");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "unable to decode stored consent string");
                None
            }
        }
    }

    // Some CMPs also publish the decoded bit strings, they are only used when no consent
    // string is stored.
    fn bits_query(
        &self,
        query: &str,
        key: &str,
        f: impl FnOnce(&ConsentView) -> String,
    ) -> String {
        match self.consent_view() {
            Ok(view) => f(&view),
            Err(ConsentError::MissingConsentString) => {
                debug!(query, key, "no consent string stored, reading published value");
                self.store
                    .read(key)
                    .filter(|v| v.bytes().all(|b| b == b'0' || b == b'1'))
                    .unwrap_or_default()
            }
            Err(e) => {
                warn!(query, error = %e, "unable to decode stored consent string");
                String::new()
            }
        }
    }

    fn ads_allowed(&self, view: &ConsentView, ads: &AdsPolicy) -> bool {
        match self.policy.vendor_id {
            Some(vendor_id) => {
                view.vendor_has_consent_for_purposes(vendor_id, &ads.consent_purposes)
                    && view.vendor_has_consent_or_legitimate_interest_for_purposes(
                        vendor_id,
                        &ads.flexible_purposes,
                    )
            }
            None => {
                view.has_consent_for_purposes(&ads.consent_purposes)
                    && view.has_consent_or_legitimate_interest_for_purposes(&ads.flexible_purposes)
            }
        }
    }

    /// Whether at least non-personalized ads can be shown.
    pub fn can_show_ads(&self) -> bool {
        if !self.is_gdpr() {
            return true;
        }
        self.query("can_show_ads", |v| {
            self.ads_allowed(v, &self.policy.non_personalized_ads)
        })
        .unwrap_or(false)
    }

    pub fn can_show_personalized_ads(&self) -> bool {
        if !self.is_gdpr() {
            return true;
        }
        self.query("can_show_personalized_ads", |v| {
            self.ads_allowed(v, &self.policy.personalized_ads)
        })
        .unwrap_or(false)
    }

    /// Whether an IAB registered vendor has consent, and is not excluded by the publisher from
    /// any of the [`ConsentPolicy::vendor_purposes`].
    pub fn is_vendor_authorized(&self, vendor_id: u16) -> bool {
        if !self.is_gdpr() {
            return true;
        }
        self.query("is_vendor_authorized", |v| {
            v.vendor_consent(vendor_id)
                && self
                    .policy
                    .vendor_purposes
                    .iter()
                    .all(|&p| v.is_vendor_allowed_for_purpose(vendor_id, p))
        })
        .unwrap_or(false)
    }

    /// Whether an ad technology provider outside of the IAB framework has consent, according
    /// to the additional consent string.
    pub fn is_external_authorized(&self, provider_id: u16) -> bool {
        if !self.is_gdpr() {
            return true;
        }
        self.query("is_external_authorized", |v| {
            match v.additional_consent().parse::<AdditionalConsent>() {
                Ok(ac) => ac.is_consented(provider_id),
                Err(e) => {
                    warn!(error = %e, "unable to decode additional consent string");
                    false
                }
            }
        })
        .unwrap_or(false)
    }

    fn analytics_flag(&self, query: &str, purposes: &[u8]) -> bool {
        if !self.is_gdpr() {
            return true;
        }
        self.query(query, |v| {
            v.has_consent_or_legitimate_interest_for_purposes(purposes)
        })
        .unwrap_or(false)
    }

    pub fn ad_storage(&self) -> bool {
        self.analytics_flag("ad_storage", &self.policy.analytics.ad_storage)
    }

    pub fn ad_personalization(&self) -> bool {
        self.analytics_flag(
            "ad_personalization",
            &self.policy.analytics.ad_personalization,
        )
    }

    pub fn ad_user_data(&self) -> bool {
        self.analytics_flag("ad_user_data", &self.policy.analytics.ad_user_data)
    }

    /// Purpose consents as a `'1'`/`'0'` string, one character per purpose.
    ///
    /// When no consent string is stored, the value published by the CMP under
    /// `IABTCF_PurposeConsents` is returned instead.
    pub fn purpose_consents(&self) -> String {
        self.bits_query(
            "purpose_consents",
            PURPOSE_CONSENTS,
            ConsentView::purpose_consents_bits,
        )
    }

    pub fn purpose_legitimate_interests(&self) -> String {
        self.bits_query(
            "purpose_legitimate_interests",
            PURPOSE_LEGITIMATE_INTERESTS,
            ConsentView::purpose_legitimate_interests_bits,
        )
    }

    pub fn vendor_consents(&self) -> String {
        self.bits_query(
            "vendor_consents",
            VENDOR_CONSENTS,
            ConsentView::vendor_consents_bits,
        )
    }

    pub fn vendor_legitimate_interests(&self) -> String {
        self.bits_query(
            "vendor_legitimate_interests",
            VENDOR_LEGITIMATE_INTERESTS,
            ConsentView::vendor_legitimate_interests_bits,
        )
    }

    pub fn additional_consent(&self) -> String {
        self.query("additional_consent", |v| v.additional_consent().to_string())
            .unwrap_or_default()
    }

    /// Deletes the stored consent string if it is outdated, so that consent is collected again.
    ///
    /// Returns whether the string was deleted. This uses the system clock, so a string with the
    /// current policy version is still deleted once it is older than
    /// [`ConsentPolicy::max_age_days`].
    pub fn delete_outdated_tc_string(&mut self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.delete_outdated_tc_string_at(now)
    }

    /// Same as [`delete_outdated_tc_string`](Self::delete_outdated_tc_string), with the current
    /// time given in seconds since the Unix epoch.
    ///
    /// A string is outdated if its policy version, or the `IABTCF_PolicyVersion` value published
    /// by the CMP, is lower than [`ConsentPolicy::current_policy_version`], if it was created more
    /// than [`ConsentPolicy::max_age_days`] days before `now`, or if it cannot be decoded.
    ///
    /// The age rule applies even when the policy versions match.
    pub fn delete_outdated_tc_string_at(&mut self, now: u64) -> bool {
        let Some(raw) = self.store.read(TC_STRING).filter(|s| !s.is_empty()) else {
            return false;
        };
        let published_version = self
            .store
            .read(POLICY_VERSION)
            .and_then(|v| v.trim().parse::<u8>().ok());

        let outdated = match raw.parse::<TcString>() {
            Ok(tc) => {
                let days = now.saturating_sub(tc.core.created) / SECONDS_PER_DAY;
                let policy_version = published_version
                    .map_or(tc.core.policy_version, |v| v.min(tc.core.policy_version));
                if policy_version < self.policy.current_policy_version {
                    info!(
                        policy_version,
                        current_policy_version = self.policy.current_policy_version,
                        "stored consent string uses an outdated policy version"
                    );
                    true
                } else if days > self.policy.max_age_days {
                    info!(
                        created = tc.core.created,
                        days, "stored consent string is too old"
                    );
                    true
                } else {
                    false
                }
            }
            Err(e) => {
                warn!(error = %e, "stored consent string cannot be decoded");
                true
            }
        };

        if outdated {
            self.store.delete(TC_STRING);
            self.invalidate();
        }

        outdated
    }
}
