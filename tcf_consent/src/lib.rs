//! This crate decodes IAB Transparency & Consent Framework (TCF) v2 consent strings and answers
//! the questions an app needs to ask before serving ads or collecting analytics.
//!
//! NOTE: This is not an official IAB library.
//!
//! # Decoding TC strings
//!
//! The [`TcString`](tc_string::TcString) type gives access to every field of a consent string,
//! including optional segments.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use tcf_consent::tc_string::TcString;
//!
//! let tc: TcString = "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA".parse()?;
//!
//! assert_eq!(tc.core.cmp_id, 27);
//! assert_eq!(tc.core.consent_language, "EN");
//! # Ok(())
//! # }
//! ```
//!
//! # Querying consent
//!
//! A [`ConsentView`] is a read-only view of the purposes and vendors granted by a consent
//! string. It answers per purpose and per vendor questions, applying publisher restrictions.
//!
//! The following example checks that vendor 6 can use consent to store information on a device
//! (purpose 1) and to select basic ads (purpose 2).
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use tcf_consent::ConsentView;
//!
//! let view = ConsentView::parse("COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA", true, "")?;
//!
//! assert!(view.vendor_has_consent_for_purposes(6, &[1, 2]));
//! # Ok(())
//! # }
//! ```
//!
//! # Reading platform preferences
//!
//! In apps, the consent management platform stores the TC string in the platform preferences.
//! [`ConsentHelper`] reads it through a [`PreferenceStore`](store::PreferenceStore) and applies
//! a configurable [`ConsentPolicy`] to decide whether ads can be shown.
//!
//! # Error handling
//!
//! This crate is conservative with regard to how it handles parsing failure. If a string cannot be
//! fully decoded, then it is considered as an error.
//!
//! [`ConsentHelper`] never returns these errors: any failure results in consent being denied.
//! This is done to avoid obtaining erroneous user consent information from potentially corrupted
//! payloads.
//!
pub(crate) mod core;
pub mod additional_consent;
pub mod helper;
pub mod policy;
pub mod store;
pub mod tc_string;
pub mod view;

pub use crate::core::DecodeError;
pub use helper::ConsentHelper;
pub use policy::ConsentPolicy;
pub use tc_string::{ConsentError, MalformedError};
pub use view::ConsentView;
