//! Challenge executors.
//!
//! Both variants materialize proof artifacts on the local filesystem where
//! the externally-running challenge responders pick them up; neither
//! touches protocol state. The write is a single create-then-close so the
//! responder never observes a partial file.

use std::path::PathBuf;

use sha2::{Digest as _, Sha256};

use crate::{
    error::{Error, Result},
    util::base64url,
};

/// Relative directory the HTTP responder serves tokens from.
const HTTP01_CHALLENGE_DIR: &str = ".well-known/acme-challenge";

/// Fixed subdirectory under a reversed domain path holding TXT proofs.
const DNS01_CHALLENGE_DIR: &str = "_acme-challenge";

/// The two supported domain-validation mechanisms.
///
/// Selected once per issuance run; the orchestrator asks every
/// authorization for the challenge of this one kind.
pub enum Solver {
    Http01(Http01Solver),
    Dns01(Dns01Solver),
}

impl Solver {
    /// The protocol type tag of the challenges this solver fulfills.
    pub(crate) fn challenge_type(&self) -> &'static str {
        match self {
            Self::Http01(_) => "http-01",
            Self::Dns01(_) => "dns-01",
        }
    }

    /// Computes the proof artifact for one challenge and writes it where
    /// the external responder serves it.
    pub(crate) async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<()> {
        match self {
            Self::Http01(solver) => solver.present(token, key_auth).await,
            Self::Dns01(solver) => solver.present(domain, token, key_auth).await,
        }
    }
}

/// Materializes `http-01` proofs.
///
/// The proof is the raw key authorization, served verbatim at
/// `http://<domain>/.well-known/acme-challenge/<token>`.
pub struct Http01Solver {
    root: PathBuf,
}

impl Http01Solver {
    /// `root` is the document root of the external HTTP responder.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn present(&self, token: &str, key_auth: &str) -> Result<()> {
        let dir = self.root.join(HTTP01_CHALLENGE_DIR);
        let path = dir.join(token);
        log::info!("writing http-01 proof: {}", path.display());

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| Error::fs(&dir, err))?;
        tokio::fs::write(&path, key_auth)
            .await
            .map_err(|err| Error::fs(&path, err))
    }
}

/// Materializes `dns-01` proofs.
///
/// The proof is the base64url SHA-256 digest of the key authorization,
/// answered by the external name server as a TXT record for
/// `_acme-challenge.<domain>`. Files are token-named so multiple proofs
/// for the same name coexist as separate TXT answers.
pub struct Dns01Solver {
    root: PathBuf,
}

impl Dns01Solver {
    /// `root` is the zone-data root of the external name server.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<()> {
        let dir = self
            .root
            .join(reversed_domain_path(domain))
            .join(DNS01_CHALLENGE_DIR);
        let path = dir.join(token);
        log::info!("writing dns-01 proof: {}", path.display());

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| Error::fs(&dir, err))?;
        tokio::fs::write(&path, dns_txt_digest(key_auth))
            .await
            .map_err(|err| Error::fs(&path, err))
    }
}

/// TXT record content: base64url (no padding) SHA-256 of the key
/// authorization.
pub(crate) fn dns_txt_digest(key_auth: &str) -> String {
    base64url(&Sha256::digest(key_auth))
}

/// `example.com` becomes `com/example`, the lookup path the name server
/// walks label by label.
fn reversed_domain_path(domain: &str) -> PathBuf {
    domain.split('.').rev().collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn domain_labels_reverse_into_a_path() {
        assert_eq!(
            reversed_domain_path("www.example.com"),
            Path::new("com/example/www")
        );
        assert_eq!(reversed_domain_path("localhost"), Path::new("localhost"));
    }

    #[tokio::test]
    async fn http01_writes_raw_key_authorization() {
        let root = tempfile::tempdir().unwrap();
        let solver = Http01Solver::new(root.path());

        solver
            .present("abc123", "abc123.THUMBPRINT")
            .await
            .unwrap();

        let content =
            std::fs::read_to_string(root.path().join(".well-known/acme-challenge/abc123"))
                .unwrap();
        assert_eq!(content, "abc123.THUMBPRINT");
    }

    #[tokio::test]
    async fn dns01_writes_hashed_proof_under_reversed_domain() {
        let root = tempfile::tempdir().unwrap();
        let solver = Dns01Solver::new(root.path());

        solver
            .present("example.com", "tok1", "tok1.THUMBPRINT")
            .await
            .unwrap();

        let path = root.path().join("com/example/_acme-challenge/tok1");
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, dns_txt_digest("tok1.THUMBPRINT"));
        assert!(!content.contains('='));
    }

    #[tokio::test]
    async fn dns01_proofs_for_one_domain_coexist() {
        let root = tempfile::tempdir().unwrap();
        let solver = Dns01Solver::new(root.path());

        solver
            .present("example.com", "tok1", "tok1.THUMBPRINT")
            .await
            .unwrap();
        solver
            .present("example.com", "tok2", "tok2.THUMBPRINT")
            .await
            .unwrap();

        let dir = root.path().join("com/example/_acme-challenge");
        assert!(dir.join("tok1").exists());
        assert!(dir.join("tok2").exists());
    }
}
