//! One-call issuance and revocation pipelines.

use std::{path::PathBuf, time::Duration};

use crate::{
    acc::RevocationReason,
    dir::{Directory, DirectoryUrl},
    error::{Error, Result},
    key::create_p256_key,
    poll::{DEFAULT_MAX_POLL_RETRIES, DEFAULT_POLL_DELAY},
    solver::Solver,
    store::CertificateBundle,
};

/// Keystore file name: private key followed by the chain, one PEM file.
pub const DEFAULT_KEYSTORE_FILE: &str = "keystore.pem";

/// Bare certificate chain file name.
pub const DEFAULT_CERT_CHAIN_FILE: &str = "certchain.pem";

/// Everything one issuance (or revocation) run needs.
pub struct IssueConfig {
    /// Directory URL of the ACME provider.
    pub directory_url: String,

    /// Contact URIs for the account, such as `mailto:admin@example.org`.
    pub contact: Option<Vec<String>>,

    /// Domains the certificate covers. The first becomes the primary name.
    pub domains: Vec<String>,

    /// How domain-control proofs are materialized.
    pub solver: Solver,

    /// Directory the keystore and chain files are written under.
    pub https_root: PathBuf,

    pub keystore_file: String,
    pub cert_chain_file: String,

    /// Per-resource budget of status poll attempts.
    pub max_poll_retries: u32,

    /// Pause before each poll attempt.
    pub poll_delay: Duration,
}

impl IssueConfig {
    pub fn new(
        directory_url: impl Into<String>,
        domains: Vec<String>,
        solver: Solver,
        https_root: impl Into<PathBuf>,
    ) -> Self {
        IssueConfig {
            directory_url: directory_url.into(),
            contact: None,
            domains,
            solver,
            https_root: https_root.into(),
            keystore_file: DEFAULT_KEYSTORE_FILE.to_owned(),
            cert_chain_file: DEFAULT_CERT_CHAIN_FILE.to_owned(),
            max_poll_retries: DEFAULT_MAX_POLL_RETRIES,
            poll_delay: DEFAULT_POLL_DELAY,
        }
    }
}

/// Obtains a certificate for the configured domains and persists it under
/// `https_root`.
///
/// Runs the full protocol: account setup, order creation, one challenge
/// per not-yet-valid authorization, finalization with a fresh certificate
/// key, download and storage. The returned bundle is the same data that
/// was written to disk.
pub async fn issue(config: &IssueConfig) -> Result<CertificateBundle> {
    let dir = Directory::fetch(DirectoryUrl::Other(&config.directory_url)).await?;
    let acc = dir.register_account(config.contact.clone()).await?;

    let domains: Vec<&str> = config.domains.iter().map(String::as_str).collect();
    let new_order = acc.new_order(&domains).await?;

    if !new_order.is_validated() {
        let auths = new_order.authorizations().await?;

        // Present all proofs before confirming any; the server may probe
        // the moment a confirmation arrives.
        let mut confirmed = Vec::new();
        for auth in &auths {
            if !auth.need_challenge() {
                log::debug!("{} already authorized", auth.domain_name());
                continue;
            }

            let challenge_type = config.solver.challenge_type();
            let challenge = auth.challenge(challenge_type).ok_or_else(|| {
                Error::encoding(format!(
                    "no {challenge_type} challenge offered for {}",
                    auth.domain_name(),
                ))
            })?;

            let key_auth = challenge.key_authorization()?;
            config
                .solver
                .present(auth.domain_name(), challenge.token(), &key_auth)
                .await?;

            challenge.confirm().await?;
            confirmed.push(auth);
        }

        for auth in confirmed {
            auth.poll_valid(config.max_poll_retries, config.poll_delay)
                .await?;
        }
    }

    let csr_order = new_order
        .poll_ready(config.max_poll_retries, config.poll_delay)
        .await?;

    // The certificate gets its own key; the account key only ever signs
    // protocol requests.
    let cert_order = csr_order
        .finalize_signing_key(create_p256_key(), config.max_poll_retries, config.poll_delay)
        .await?;

    let bundle = cert_order.download_cert().await?;
    bundle
        .persist(&config.https_root, &config.keystore_file, &config.cert_chain_file)
        .await?;

    log::info!(
        "issued certificate for {:?}, valid {} more days",
        config.domains,
        bundle.valid_days_left()?,
    );

    Ok(bundle)
}

/// Revokes the certificate previously persisted under `https_root`.
pub async fn revoke(config: &IssueConfig, reason: RevocationReason) -> Result<()> {
    let bundle = CertificateBundle::load(&config.https_root, &config.keystore_file).await?;

    let dir = Directory::fetch(DirectoryUrl::Other(&config.directory_url)).await?;
    let acc = dir.register_account(config.contact.clone()).await?;

    acc.revoke_certificate(&bundle, reason).await
}
