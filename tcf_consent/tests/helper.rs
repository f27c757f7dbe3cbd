use tcf_consent::store::{
    GDPR_APPLIES, MemoryStore, POLICY_VERSION, PURPOSE_CONSENTS, PURPOSE_LEGITIMATE_INTERESTS,
    PreferenceStore, TC_STRING, VENDOR_CONSENTS, VENDOR_LEGITIMATE_INTERESTS,
};
use tcf_consent::{ConsentHelper, ConsentPolicy};
use test_case::test_case;

mod common;

use common::*;

fn helper(gdpr_applies: Option<&str>, tc_string: Option<&str>) -> ConsentHelper<MemoryStore> {
    ConsentHelper::new(store(gdpr_applies, tc_string), ConsentPolicy::default())
}

#[test]
fn gdpr_not_applicable_without_consent_string() {
    let h = helper(Some("0"), None);

    assert!(!h.is_gdpr());
    assert!(h.can_show_ads());
    assert!(h.can_show_personalized_ads());
    assert!(h.ad_storage());
    assert!(h.ad_personalization());
    assert!(h.ad_user_data());
    assert!(h.is_vendor_authorized(755));
    assert!(h.is_external_authorized(89));
    assert_eq!(h.purpose_consents(), "");
}

#[test]
fn gdpr_applicable_without_consent_string() {
    let h = helper(Some("1"), None);

    assert!(h.is_gdpr());
    assert!(!h.can_show_ads());
    assert!(!h.can_show_personalized_ads());
    assert!(!h.ad_storage());
    assert!(!h.is_vendor_authorized(755));
}

#[test]
fn unknown_gdpr_applicability_fails_closed() {
    let h = helper(None, None);

    assert!(h.is_gdpr());
    assert!(!h.can_show_ads());
    assert!(!h.can_show_personalized_ads());
}

// Non-personalized ads need consent for purpose 1 and consent or LI for 2, 7, 9 and 10.
#[test]
fn purpose_one_consent_only() {
    let h = helper(Some("1"), Some(PURPOSE_ONE_ONLY));

    assert!(!h.can_show_ads());
    assert!(!h.can_show_personalized_ads());
    assert!(h.ad_storage());
    assert!(!h.ad_personalization());
    assert!(!h.ad_user_data());
    assert!(h.is_vendor_authorized(755));
}

#[test]
fn personalized_ads_granted() {
    let h = helper(Some("1"), Some(PERSONALIZED));

    assert!(h.can_show_ads());
    assert!(h.can_show_personalized_ads());
    assert!(h.ad_storage());
    assert!(h.ad_personalization());
    assert!(h.ad_user_data());
}

#[test_case(755 => (true, true) ; "vendor with consent and legitimate interest")]
#[test_case(42 => (false, false) ; "vendor without any signal")]
fn ads_for_vendor(vendor_id: u16) -> (bool, bool) {
    let policy = ConsentPolicy::default().with_vendor(vendor_id);
    let h = ConsentHelper::new(store(Some("1"), Some(PERSONALIZED)), policy);

    (h.can_show_ads(), h.can_show_personalized_ads())
}

#[test]
fn publisher_restriction_applies_to_vendor_policy() {
    let policy = ConsentPolicy::default().with_vendor(42);
    let h = ConsentHelper::new(store(Some("1"), Some(RESTRICTED)), policy);

    // purpose 3 is not allowed for vendor 42
    assert!(h.can_show_ads());
    assert!(!h.can_show_personalized_ads());
}

#[test_case(42 => false ; "restricted for purpose 3")]
#[test_case(755 => true ; "unrestricted")]
#[test_case(100 => true ; "range start")]
#[test_case(110 => true ; "range end")]
#[test_case(111 => false ; "after range")]
#[test_case(0 => false ; "vendor zero")]
fn vendor_authorized(vendor_id: u16) -> bool {
    helper(Some("1"), Some(RESTRICTED)).is_vendor_authorized(vendor_id)
}

#[test]
fn vendor_purposes_are_configurable() {
    let policy = ConsentPolicy {
        vendor_purposes: vec![1, 2],
        ..Default::default()
    };
    let h = ConsentHelper::new(store(Some("1"), Some(RESTRICTED)), policy);

    assert!(h.is_vendor_authorized(42));
}

#[test_case("2~89.2577~dv.43", 89 => true ; "consented provider")]
#[test_case("2~89.2577~dv.43", 43 => false ; "disclosed provider")]
#[test_case("1~89", 2577 => false ; "unknown provider")]
#[test_case("x~89", 89 => false ; "malformed additional consent")]
#[test_case("", 89 => false ; "no additional consent")]
fn external_authorized(ac: &str, provider_id: u16) -> bool {
    let h = ConsentHelper::new(store_with_ac(PERSONALIZED, ac), ConsentPolicy::default());
    h.is_external_authorized(provider_id)
}

#[test]
fn external_authorization_requires_valid_consent_string() {
    let h = ConsentHelper::new(store_with_ac("CPX", "1~89"), ConsentPolicy::default());
    assert!(!h.is_external_authorized(89));
    assert_eq!(h.additional_consent(), "");
}

#[test]
fn string_queries() {
    let h = ConsentHelper::new(store_with_ac(PERSONALIZED, "1~89"), ConsentPolicy::default());

    assert_eq!(h.purpose_consents(), "101100000000000000000000");
    assert_eq!(h.purpose_legitimate_interests(), "010000101100000000000000");
    assert_eq!(h.additional_consent(), "1~89");

    let vendors = h.vendor_consents();
    assert_eq!(vendors.len(), 755);
    assert!(vendors.ends_with('1'));
    assert_eq!(vendors.matches('1').count(), 1);
    assert_eq!(h.vendor_legitimate_interests(), vendors);
}

#[test]
fn published_bit_strings_without_consent_string() {
    let store = store(Some("1"), None)
        .with(PURPOSE_CONSENTS, "1011")
        .with(PURPOSE_LEGITIMATE_INTERESTS, "0100001011")
        .with(VENDOR_CONSENTS, "01")
        .with(VENDOR_LEGITIMATE_INTERESTS, "0x1");
    let h = ConsentHelper::new(store, ConsentPolicy::default());

    assert_eq!(h.purpose_consents(), "1011");
    assert_eq!(h.purpose_legitimate_interests(), "0100001011");
    assert_eq!(h.vendor_consents(), "01");
    // not a bit string
    assert_eq!(h.vendor_legitimate_interests(), "");
    // decisions still need a consent string
    assert!(!h.can_show_ads());
    assert!(!h.ad_storage());
}

#[test]
fn decoded_consent_string_takes_precedence_over_published_bits() {
    let store = store(Some("1"), Some(PERSONALIZED)).with(PURPOSE_CONSENTS, "1111");
    let h = ConsentHelper::new(store, ConsentPolicy::default());

    assert_eq!(h.purpose_consents(), "101100000000000000000000");
}

#[test]
fn published_bits_are_ignored_for_malformed_consent_string() {
    let store = store(Some("1"), Some("CPX")).with(PURPOSE_CONSENTS, "1111");
    let h = ConsentHelper::new(store, ConsentPolicy::default());

    assert_eq!(h.purpose_consents(), "");
}

#[test_case("CPX" ; "truncated")]
#[test_case("CP6ywkAP6ywkAAfABBEN" ; "truncated header")]
#[test_case("CP6ywk=" ; "invalid character")]
#[test_case("BP6ywkAAAAAAAAAAAAAAAAAA" ; "unsupported version")]
#[test_case("CP6ywkAP6ywkAAfABBENB-EgAIAAAAAAAAYgAFQAQAKAAAAA" ; "vendor beyond max vendor id")]
#[test_case("CP6ywkAP6ywkAAfABBENB-EgAIAAAAAAAAYgAPQAYAKAAUAAAAA" ; "reversed range")]
fn malformed_string_fails_closed(tc_string: &str) {
    let h = ConsentHelper::new(store_with_ac(tc_string, "1~89"), ConsentPolicy::default());

    assert!(h.consent_view().is_err());
    assert!(!h.can_show_ads());
    assert!(!h.can_show_personalized_ads());
    assert!(!h.ad_storage());
    assert!(!h.ad_personalization());
    assert!(!h.ad_user_data());
    assert!(!h.is_vendor_authorized(755));
    assert!(!h.is_external_authorized(89));
    assert_eq!(h.purpose_consents(), "");
    assert_eq!(h.purpose_legitimate_interests(), "");
    assert_eq!(h.vendor_consents(), "");
    assert_eq!(h.vendor_legitimate_interests(), "");
    assert_eq!(h.additional_consent(), "");
}

#[test]
fn outdated_policy_version_is_deleted() {
    let mut h = helper(Some("1"), Some(BITFIELD));
    assert!(h.consent_view().is_ok());

    assert!(h.delete_outdated_tc_string_at(1582243059 + DAY));
    assert_eq!(h.store().read(TC_STRING), None);
    assert_eq!(h.store().read(GDPR_APPLIES).as_deref(), Some("1"));
    assert!(h.consent_view().is_err());
}

#[test]
fn current_policy_version_is_kept() {
    let mut h = helper(Some("1"), Some(PERSONALIZED));
    assert!(h.can_show_personalized_ads());

    assert!(!h.delete_outdated_tc_string_at(CREATED + 10 * DAY));
    assert_eq!(h.store().read(TC_STRING).as_deref(), Some(PERSONALIZED));
    assert!(h.can_show_personalized_ads());
}

#[test_case(CREATED + 365 * DAY => false ; "one year old")]
#[test_case(CREATED + 366 * DAY => true ; "older than a year")]
#[test_case(CREATED - DAY => false ; "created in the future")]
fn outdated_by_age(now: u64) -> bool {
    helper(Some("1"), Some(PERSONALIZED)).delete_outdated_tc_string_at(now)
}

#[test_case(None => false ; "not published")]
#[test_case(Some("4") => false ; "current")]
#[test_case(Some("2") => true ; "outdated")]
#[test_case(Some("five") => false ; "not a number")]
fn published_policy_version(version: Option<&str>) -> bool {
    let mut s = store(Some("1"), Some(PERSONALIZED));
    if let Some(v) = version {
        s = s.with(POLICY_VERSION, v);
    }
    ConsentHelper::new(s, ConsentPolicy::default()).delete_outdated_tc_string_at(CREATED + DAY)
}

// The age rule deletes strings with a current policy version too.
#[test]
fn system_clock_age_applies_to_current_policy_version() {
    let mut h = helper(Some("1"), Some(PERSONALIZED));
    assert!(!h.delete_outdated_tc_string_at(CREATED + DAY));

    // created on 2024-03-01, more than a year ago
    assert!(h.delete_outdated_tc_string());
    assert_eq!(h.store().read(TC_STRING), None);
}

#[test]
fn deleting_clears_cached_view() {
    let mut h = helper(Some("1"), Some(PERSONALIZED));
    assert!(h.can_show_ads());

    assert!(h.delete_outdated_tc_string_at(CREATED + 400 * DAY));
    assert!(!h.can_show_ads());
}

#[test_case(None => false ; "missing")]
#[test_case(Some("") => false ; "empty")]
#[test_case(Some("CPX") => true ; "malformed")]
#[test_case(Some("BP6ywkAAAAAAAAAAAAAAAAAA") => true ; "unsupported version")]
fn delete_undecodable(tc_string: Option<&str>) -> bool {
    let mut h = helper(Some("1"), tc_string);
    let deleted = h.delete_outdated_tc_string_at(CREATED);
    if deleted {
        assert_eq!(h.store().read(TC_STRING), None);
    }
    deleted
}

#[test]
fn out_of_band_update_is_picked_up() {
    let mut h = helper(Some("1"), Some(PURPOSE_ONE_ONLY));
    assert!(!h.can_show_personalized_ads());

    h.store_mut().write(TC_STRING, PERSONALIZED.to_string());
    assert!(h.can_show_personalized_ads());
}
