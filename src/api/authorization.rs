use serde::{Deserialize, Serialize};

use crate::api;

/// The status of an [`api::Authorization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Valid,
    Invalid,
    Deactivated,
    Expired,
    Revoked,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Deactivated => "deactivated",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

/// Server-side record of domain-control proof status for one identifier.
///
/// See [RFC 8555 §7.1.4](https://datatracker.ietf.org/doc/html/rfc8555#section-7.1.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub identifier: api::Identifier,

    pub status: AuthorizationStatus,

    /// Timestamp after which the server considers this authorization
    /// invalid. RFC 3339 format.
    pub expires: Option<String>,

    /// Challenges the client can fulfill to prove control of the
    /// identifier. Any one of them is sufficient.
    pub challenges: Vec<api::Challenge>,

    pub wildcard: Option<bool>,
}

impl Authorization {
    /// Returns the challenge of the given type (`http-01`, `dns-01`), if
    /// the server offered one.
    pub fn challenge(&self, challenge_type: &str) -> Option<&api::Challenge> {
        self.challenges.iter().find(|c| c._type == challenge_type)
    }

    pub fn http_challenge(&self) -> Option<&api::Challenge> {
        self.challenge("http-01")
    }

    pub fn dns_challenge(&self) -> Option<&api::Challenge> {
        self.challenge("dns-01")
    }
}
