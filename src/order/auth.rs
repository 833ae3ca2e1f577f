//! Authorization and challenge handles.

use std::{sync::Arc, time::Duration};

use crate::{
    acc::AccountInner,
    api,
    error::Result,
    jws,
    poll::poll_status,
    util::read_json,
};

/// One domain's proof-of-control requirement within an order.
pub struct Auth {
    inner: Arc<AccountInner>,
    api_auth: api::Authorization,
    url: String,
}

impl Auth {
    pub(crate) fn new(inner: Arc<AccountInner>, api_auth: api::Authorization, url: String) -> Self {
        Auth {
            inner,
            api_auth,
            url,
        }
    }

    /// Access the underlying JSON object.
    pub fn api_auth(&self) -> &api::Authorization {
        &self.api_auth
    }

    /// The domain this authorization covers.
    pub fn domain_name(&self) -> &str {
        &self.api_auth.identifier.value
    }

    /// True unless control was already proven by a recent order.
    pub fn need_challenge(&self) -> bool {
        self.api_auth.status != api::AuthorizationStatus::Valid
    }

    /// The offered challenge of the given type (`http-01`, `dns-01`), if
    /// the server supports it for this identifier.
    pub fn challenge(&self, challenge_type: &str) -> Option<Challenge> {
        self.api_auth
            .challenge(challenge_type)
            .map(|api_challenge| Challenge {
                inner: Arc::clone(&self.inner),
                api_challenge: api_challenge.clone(),
            })
    }

    pub fn http_challenge(&self) -> Option<Challenge> {
        self.challenge("http-01")
    }

    pub fn dns_challenge(&self) -> Option<Challenge> {
        self.challenge("dns-01")
    }

    /// Waits for the server to observe the proof and mark this
    /// authorization `valid`.
    pub async fn poll_valid(
        &self,
        max_retries: u32,
        delay: Duration,
    ) -> Result<api::Authorization> {
        poll_status(&self.inner.transport, &self.url, "valid", max_retries, delay).await
    }
}

/// One way of proving control of a domain.
pub struct Challenge {
    inner: Arc<AccountInner>,
    api_challenge: api::Challenge,
}

impl Challenge {
    /// Access the underlying JSON object.
    pub fn api_challenge(&self) -> &api::Challenge {
        &self.api_challenge
    }

    /// The single-use token the proof artifact is derived from.
    pub fn token(&self) -> &str {
        &self.api_challenge.token
    }

    pub fn url(&self) -> &str {
        &self.api_challenge.url
    }

    /// True until the server has validated (or failed) this challenge.
    pub fn need_validate(&self) -> bool {
        matches!(self.api_challenge.status, api::ChallengeStatus::Pending)
    }

    /// `token || "." || account key thumbprint`; the content of every proof
    /// artifact.
    pub fn key_authorization(&self) -> Result<String> {
        jws::key_authorization(&self.api_challenge.token, self.inner.transport.key())
    }

    /// Tells the server the proof is in place and validation may start.
    pub async fn confirm(&self) -> Result<()> {
        let res = self
            .inner
            .transport
            .call(&self.api_challenge.url, &api::EmptyObject)
            .await?;

        let updated: api::Challenge = read_json(res).await?;
        log::debug!(
            "challenge {} confirmed, status {:?}",
            updated.url,
            updated.status,
        );
        Ok(())
    }
}
