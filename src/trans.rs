//! Signed request issuance and nonce threading.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    error::Result,
    jws::{self, Jwk, JwsProtected},
    key::AccountKey,
    req::{expect_header, expect_status, req_head, req_post},
};

/// JWS signing and nonce handling for requests to the API.
///
/// Setup is:
///
/// 1. `Transport::new()`
/// 2. `call_jwk()` against the newAccount URL
/// 3. `set_key_id()` from the returned `Location` header
/// 4. `call()` / `call_post_as_get()` for everything after that.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    key: AccountKey,
    nonce: Arc<NonceSlot>,
}

impl Transport {
    pub(crate) fn new(nonce: Arc<NonceSlot>, key: AccountKey) -> Self {
        Transport { key, nonce }
    }

    /// Update the key ID once it is known (part of setting up the transport).
    pub(crate) fn set_key_id(&mut self, kid: String) {
        self.key.set_key_id(kid);
    }

    /// The account key used for signing.
    pub(crate) fn key(&self) -> &AccountKey {
        &self.key
    }

    /// Make a call identifying the account by its full JWK.
    ///
    /// Only needed for the newAccount request, before a key ID exists.
    pub(crate) async fn call_jwk<T>(&self, url: &str, body: &T) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(body)?;
        self.do_call(url, Some(payload), true).await
    }

    /// Make a call identifying the account by key ID.
    pub(crate) async fn call<T>(&self, url: &str, body: &T) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(body)?;
        self.do_call(url, Some(payload), false).await
    }

    /// Read a resource with an empty-payload signed POST ("POST-as-GET").
    pub(crate) async fn call_post_as_get(&self, url: &str) -> Result<reqwest::Response> {
        self.do_call(url, None, false).await
    }

    async fn do_call(
        &self,
        url: &str,
        payload: Option<String>,
        use_jwk: bool,
    ) -> Result<reqwest::Response> {
        let mut retried = false;

        loop {
            // Consume the current nonce; the response's replacement becomes
            // current before the next request is built.
            let nonce = self.nonce.take().await?;

            let protected = if use_jwk {
                JwsProtected::new_jwk(Jwk::from(&self.key), url, nonce)
            } else {
                JwsProtected::new_kid(self.key.key_id(), url, nonce)
            };
            let body = jws::sign(&protected, &self.key, payload.as_deref())?;

            log::debug!("call endpoint: {url}");
            let res = req_post(url, body).await?;

            // Success or not, the response may carry the next nonce.
            self.nonce.refill(&res);

            match expect_status(res).await {
                Err(err) if err.is_bad_nonce() && !retried => {
                    // The server may invalidate outstanding nonces at any
                    // time; re-sign once with the fresh one it returned.
                    log::debug!("nonce rejected, re-signing with fresh nonce");
                    retried = true;
                }
                result => return result,
            }
        }
    }
}

/// Holder of the single current nonce.
///
/// Exactly one nonce is current at any time: `take` consumes it (fetching a
/// fresh one from newNonce when the slot is empty) and `refill` installs
/// the replacement from a response header. A consumed nonce is never
/// reused.
#[derive(Debug, Default)]
pub(crate) struct NonceSlot {
    new_nonce_url: String,
    current: Mutex<Option<String>>,
}

impl NonceSlot {
    pub(crate) fn new(new_nonce_url: &str) -> Self {
        NonceSlot {
            new_nonce_url: new_nonce_url.to_owned(),
            ..Default::default()
        }
    }

    async fn take(&self) -> Result<String> {
        if let Some(nonce) = self.current.lock().take() {
            log::trace!("consuming stored nonce");
            return Ok(nonce);
        }

        log::debug!("requesting new nonce");
        let res = expect_status(req_head(&self.new_nonce_url).await?).await?;
        expect_header(&res, "replay-nonce")
    }

    fn refill(&self, res: &reqwest::Response) {
        if let Some(nonce) = res.headers().get("replay-nonce") {
            if let Ok(nonce) = nonce.to_str() {
                log::trace!("storing replacement nonce");
                *self.current.lock() = Some(nonce.to_owned());
            }
        }
    }
}
