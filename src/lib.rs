//! Obtain, store and revoke TLS certificates from ACME providers.
//!
//! Certificates are requested over the protocol defined in
//! [RFC 8555](https://datatracker.ietf.org/doc/html/rfc8555). Domain
//! control is proven with `http-01` or `dns-01` challenges whose proof
//! artifacts are written to the filesystem, where separately running
//! challenge responders serve them. The issued certificate lands on disk
//! as a combined key + chain PEM keystore ready for an HTTPS server.
//!
//! # One-call usage
//!
//! ```no_run
//! use acme_provision::{issue, Http01Solver, IssueConfig, Solver};
//!
//! # async fn run() -> acme_provision::Result<()> {
//! let config = IssueConfig::new(
//!     "https://acme-staging-v02.api.letsencrypt.org/directory",
//!     vec!["example.org".to_owned(), "www.example.org".to_owned()],
//!     Solver::Http01(Http01Solver::new("/var/www")),
//!     "/etc/https",
//! );
//!
//! let bundle = issue(&config).await?;
//! println!("valid for {} more days", bundle.valid_days_left()?);
//! # Ok(()) }
//! ```
//!
//! # Step-by-step usage
//!
//! The pipeline behind [`issue`] is public for callers that need to hook
//! into individual steps:
//!
//! 1. [`Directory::fetch`] discovers the provider's endpoints.
//! 2. [`Directory::register_account`] (or
//!    [`load_account`](Directory::load_account) with a saved key) yields an
//!    [`Account`].
//! 3. [`Account::new_order`] starts an order; its
//!    [`authorizations`](order::NewOrder::authorizations) name the
//!    challenges to fulfill.
//! 4. Present each proof, [`confirm`](order::Challenge::confirm) it and
//!    poll the authorization.
//! 5. [`poll_ready`](order::NewOrder::poll_ready),
//!    [`finalize_signing_key`](order::CsrOrder::finalize_signing_key) and
//!    [`download_cert`](order::CertOrder::download_cert) finish the run.

#![deny(rust_2018_idioms, nonstandard_style, future_incompatible)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod acc;
pub mod api;
mod csr;
mod dir;
mod error;
mod issue;
mod jws;
mod key;
pub mod order;
mod poll;
mod req;
mod solver;
mod store;
mod trans;
mod util;

#[cfg(test)]
mod test;

pub use self::{
    acc::{Account, RevocationReason},
    dir::{Directory, DirectoryUrl},
    error::{Error, Result},
    issue::{issue, revoke, IssueConfig, DEFAULT_CERT_CHAIN_FILE, DEFAULT_KEYSTORE_FILE},
    key::create_p256_key,
    poll::{DEFAULT_MAX_POLL_RETRIES, DEFAULT_POLL_DELAY},
    solver::{Dns01Solver, Http01Solver, Solver},
    store::CertificateBundle,
};
