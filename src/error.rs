use std::{
    error::Error as StdError,
    fmt::{Display, Formatter},
    io,
    path::PathBuf,
};

use crate::api;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort an issuance or revocation run.
///
/// A failed run is not resumable; callers restart from the directory fetch.
#[derive(Debug)]
pub enum Error {
    /// The server answered with an unexpected status code.
    ///
    /// Carries the full response for diagnosis. When the body was
    /// `application/problem+json`, the decoded problem document is attached.
    Transport {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
        problem: Option<api::Problem>,
    },

    /// A required response header (`Replay-Nonce`, `Location`) was absent.
    MissingHeader(&'static str),

    /// An authorization or order never reached the required status within
    /// the retry budget.
    ValidationTimeout {
        resource: String,
        want: &'static str,
        last: String,
    },

    /// Malformed key material or a failed DER/JSON construction.
    ///
    /// Indicates a local bug or misconfiguration, not a server condition.
    Encoding(String),

    /// Could not materialize a challenge proof or the certificate store.
    Filesystem { path: PathBuf, source: io::Error },

    /// Error in the HTTP layer before any status code was received.
    Http(reqwest::Error),

    /// Failed (de)serializing a protocol message.
    Json(serde_json::Error),
}

impl Error {
    pub(crate) fn encoding(msg: impl Display) -> Self {
        Self::Encoding(msg.to_string())
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the server rejected our anti-replay nonce.
    pub fn is_bad_nonce(&self) -> bool {
        match self {
            Self::Transport {
                problem: Some(problem),
                ..
            } => problem.is_bad_nonce(),
            _ => false,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport {
                status,
                body,
                problem,
                ..
            } => match problem {
                Some(problem) => write!(f, "server returned {status}: {problem}"),
                None => write!(f, "server returned {status}: {body}"),
            },
            Self::MissingHeader(name) => write!(f, "the `{name}` header was missing"),
            Self::ValidationTimeout {
                resource,
                want,
                last,
            } => write!(
                f,
                "{resource} never became {want} (last observed status: {last})"
            ),
            Self::Encoding(msg) => write!(f, "encoding failed: {msg}"),
            Self::Filesystem { path, .. } => write!(f, "filesystem error at {}", path.display()),
            Self::Http(_) => write!(f, "http request failed"),
            Self::Json(_) => write!(f, "failed (de)serializing a protocol message"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Filesystem { source, .. } => Some(source),
            Self::Http(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
