#![allow(dead_code)]

use tcf_consent::store::{ADDITIONAL_CONSENT, GDPR_APPLIES, MemoryStore, TC_STRING};

/// Creation time of the `CP6ywk` test strings, 2024-03-01T00:00:00Z.
pub const CREATED: u64 = 1709251200;
pub const DAY: u64 = 24 * 60 * 60;

/// Policy version 2, consent for purposes 1-3, vendors 2, 6 and 8 have consent and LI.
pub const BITFIELD: &str = "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA";

/// Policy version 4, consent for purpose 1 only, vendor 755 has consent.
pub const PURPOSE_ONE_ONLY: &str = "CP6ywkAP6ywkAAfABBENB-EgAIAAAAAAAAYgF5gAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAgAAAA";

/// Policy version 4, consent for purposes 1, 3 and 4, LI for purposes 2, 7, 9 and 10,
/// vendor 755 has consent and LI.
pub const PERSONALIZED: &str = "CP6ywkAP6ywkAAfABBENB-EgALAAAELAAAYgF5gAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAgXmAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAACAA";

/// Policy version 4, consent for purposes 1-10, LI for purposes 2, 7, 9 and 10,
/// vendors 42, 100-110 and 755 have consent (range encoded), vendors 42 and 755 have LI,
/// vendor 42 is not allowed for purpose 3.
pub const RESTRICTED: &str = "CP6ywkAP6ywkAAfABBENB-EgAP_AAELAAAYgF5wAwAVQBkAG4BeYF5gAAAAAAQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAgAhgAIAKg";

pub fn store(gdpr_applies: Option<&str>, tc_string: Option<&str>) -> MemoryStore {
    let mut s = MemoryStore::new();
    if let Some(gdpr) = gdpr_applies {
        s = s.with(GDPR_APPLIES, gdpr);
    }
    if let Some(tc) = tc_string {
        s = s.with(TC_STRING, tc);
    }
    s
}

pub fn store_with_ac(tc_string: &str, additional_consent: &str) -> MemoryStore {
    store(Some("1"), Some(tc_string)).with(ADDITIONAL_CONSENT, additional_consent)
}
