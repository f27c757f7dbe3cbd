//! Access to the platform preference store where CMPs persist consent data.
//!
//! On Android this is the default `SharedPreferences`, on iOS the standard `UserDefaults`.
//! Key names are defined by the IAB CMP API specification for in-app consent.
use fnv::FnvHashMap;

pub const TC_STRING: &str = "IABTCF_TCString";
pub const GDPR_APPLIES: &str = "IABTCF_gdprApplies";
pub const ADDITIONAL_CONSENT: &str = "IABTCF_AddtlConsent";
pub const POLICY_VERSION: &str = "IABTCF_PolicyVersion";
pub const PURPOSE_CONSENTS: &str = "IABTCF_PurposeConsents";
pub const PURPOSE_LEGITIMATE_INTERESTS: &str = "IABTCF_PurposeLegitimateInterests";
pub const VENDOR_CONSENTS: &str = "IABTCF_VendorConsents";
pub const VENDOR_LEGITIMATE_INTERESTS: &str = "IABTCF_VendorLegitimateInterests";

/// A key-value store holding the values written by the consent management platform.
///
/// Implementations are expected to be fast and non-blocking.
pub trait PreferenceStore {
    fn read(&self, key: &str) -> Option<String>;

    fn write(&mut self, key: &str, value: String);

    fn delete(&mut self, key: &str);

    /// Reads the GDPR applicability flag.
    ///
    /// Returns [`None`] when the flag is absent or holds anything but `0` or `1`.
    fn gdpr_applies(&self) -> Option<bool> {
        match self.read(GDPR_APPLIES)?.trim() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        }
    }
}

/// An in-memory [`PreferenceStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: FnvHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.write(key, value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }
}
