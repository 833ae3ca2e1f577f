use serde::{Deserialize, Serialize};

use crate::api;

/// The status of an [`api::Challenge`].
///
/// Updated asynchronously by the server as it probes the proof artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

/// A server's offer to validate possession of an identifier in a specific
/// way.
///
/// See [RFC 8555 §7.1.5](https://datatracker.ietf.org/doc/html/rfc8555#section-7.1.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge type tag; this crate handles `http-01` and `dns-01`.
    #[serde(rename = "type")]
    pub _type: String,

    /// URL to which the confirmation POST goes.
    pub url: String,

    pub status: ChallengeStatus,

    /// Time at which the server validated this challenge. RFC 3339 format.
    pub validated: Option<String>,

    /// Error that occurred while the server was validating, if any.
    pub error: Option<api::Problem>,

    /// Opaque single-use token the proof is derived from.
    pub token: String,
}
