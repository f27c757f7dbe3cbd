//! Google Additional Consent ("AC") strings.
//!
//! The AC string lists ad technology providers which are not registered with the IAB and
//! therefore cannot appear in the TC string vendor sections. It is stored next to the TC string
//! under the `IABTCF_AddtlConsent` key.
//!
//! ```text
//! 1~1.35.41.101
//! 2~1.35.41.101~dv.9.21.81
//! ```
//!
//! Version 1 only lists consented provider IDs. Version 2 adds a `dv.` prefixed part listing
//! providers that were disclosed to the user but did not receive consent.
use crate::tc_string::IdSet;
use std::str::FromStr;
use thiserror::Error;

const DISCLOSED_PREFIX: &str = "dv.";

#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum AdditionalConsentError {
    #[error("unexpected end of string in {0:?}")]
    UnexpectedEndOfString(String),
    #[error("unsupported additional consent version {0:?}")]
    UnsupportedVersion(String),
    #[error("invalid provider id {id:?} in {s:?}")]
    InvalidProviderId { id: String, s: String },
    #[error("unexpected part {part:?} in {s:?}")]
    UnexpectedPart { part: String, s: String },
}

#[derive(Debug, Eq, PartialEq)]
pub struct AdditionalConsent {
    pub version: u8,
    pub consented: IdSet,
    pub disclosed: IdSet,
}

impl AdditionalConsent {
    pub fn is_consented(&self, provider_id: u16) -> bool {
        self.consented.contains(&provider_id)
    }
}

impl FromStr for AdditionalConsent {
    type Err = AdditionalConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('~');

        let version = match parts.next() {
            Some("1") => 1,
            Some("2") => 2,
            Some("") | None => {
                return Err(AdditionalConsentError::UnexpectedEndOfString(s.to_string()));
            }
            Some(v) => return Err(AdditionalConsentError::UnsupportedVersion(v.to_string())),
        };

        let consented = parts
            .next()
            .ok_or_else(|| AdditionalConsentError::UnexpectedEndOfString(s.to_string()))
            .and_then(|p| parse_ids(p, s))?;

        let disclosed = match (version, parts.next()) {
            (2, Some(p)) => match p.strip_prefix(DISCLOSED_PREFIX) {
                Some(ids) => parse_ids(ids, s)?,
                None if p == "dv" => IdSet::new(),
                None => {
                    return Err(AdditionalConsentError::UnexpectedPart {
                        part: p.to_string(),
                        s: s.to_string(),
                    });
                }
            },
            (_, None) => IdSet::new(),
            (_, Some(p)) => {
                return Err(AdditionalConsentError::UnexpectedPart {
                    part: p.to_string(),
                    s: s.to_string(),
                });
            }
        };

        if let Some(p) = parts.next() {
            return Err(AdditionalConsentError::UnexpectedPart {
                part: p.to_string(),
                s: s.to_string(),
            });
        }

        Ok(Self {
            version,
            consented,
            disclosed,
        })
    }
}

fn parse_ids(ids: &str, original_str: &str) -> Result<IdSet, AdditionalConsentError> {
    ids.split('.')
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u16>()
                .map_err(|_| AdditionalConsentError::InvalidProviderId {
                    id: id.to_string(),
                    s: original_str.to_string(),
                })
        })
        .collect()
}
