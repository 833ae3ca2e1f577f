//! Order lifecycle, expressed as a typestate chain.
//!
//! [`NewOrder`] (proofs outstanding) becomes [`CsrOrder`] (ready for the
//! CSR) becomes [`CertOrder`] (certificate downloadable). Each step
//! consumes the previous handle, so a finalize can never be submitted
//! before the authorizations went through.

use std::{sync::Arc, time::Duration};

use pkcs8::EncodePrivateKey as _;

use crate::{
    acc::AccountInner,
    api,
    csr::{create_csr, csr_base64_der},
    error::{Error, Result},
    poll::poll_status,
    store::CertificateBundle,
    util::read_json,
};

mod auth;

pub use self::auth::{Auth, Challenge};

/// Server-side order state plus the account it belongs to.
pub struct Order {
    pub(crate) inner: Arc<AccountInner>,
    pub(crate) api_order: api::Order,
    pub(crate) url: String,
}

impl Order {
    pub(crate) fn new(inner: Arc<AccountInner>, api_order: api::Order, url: String) -> Self {
        Order {
            inner,
            api_order,
            url,
        }
    }
}

/// A created order whose domain-control proofs may still be outstanding.
pub struct NewOrder {
    order: Order,
}

impl NewOrder {
    pub(crate) fn new(order: Order) -> Self {
        NewOrder { order }
    }

    /// Access the underlying JSON object.
    pub fn api_order(&self) -> &api::Order {
        &self.order.api_order
    }

    /// True if every authorization is already fulfilled.
    ///
    /// Happens when a recent order proved control of the same domains; no
    /// challenges need solving then.
    pub fn is_validated(&self) -> bool {
        self.order.api_order.is_status_ready() || self.order.api_order.is_status_valid()
    }

    /// Fetches the authorizations this order requires, one per domain.
    pub async fn authorizations(&self) -> Result<Vec<Auth>> {
        let mut auths = Vec::new();

        if let Some(urls) = &self.order.api_order.authorizations {
            for url in urls {
                let res = self.order.inner.transport.call_post_as_get(url).await?;
                let api_auth = read_json(res).await?;
                auths.push(Auth::new(
                    Arc::clone(&self.order.inner),
                    api_auth,
                    url.clone(),
                ));
            }
        }

        Ok(auths)
    }

    /// Waits for the order to become `ready`, then moves to the CSR step.
    ///
    /// Returns immediately when the order is already validated.
    pub async fn poll_ready(mut self, max_retries: u32, delay: Duration) -> Result<CsrOrder> {
        if !self.is_validated() {
            let fetched = poll_status::<api::Order>(
                &self.order.inner.transport,
                &self.order.url,
                "ready",
                max_retries,
                delay,
            )
            .await?;
            self.order.api_order.overwrite(fetched)?;
        }

        Ok(CsrOrder { order: self.order })
    }
}

/// An order with all proofs fulfilled, awaiting the CSR.
pub struct CsrOrder {
    order: Order,
}

impl CsrOrder {
    /// Access the underlying JSON object.
    pub fn api_order(&self) -> &api::Order {
        &self.order.api_order
    }

    /// Builds a CSR over the order's domains signed by `signing_key`,
    /// submits it and waits for the order to become `valid`.
    ///
    /// `signing_key` is the certificate's key, a separate key from the
    /// account's.
    pub async fn finalize_signing_key(
        mut self,
        signing_key: p256::ecdsa::SigningKey,
        max_retries: u32,
        delay: Duration,
    ) -> Result<CertOrder> {
        let csr = create_csr(&signing_key, &self.order.api_order.domains())?;

        let finalize_url = self
            .order
            .api_order
            .finalize
            .clone()
            .ok_or_else(|| Error::encoding("order carries no finalize URL"))?;

        let body = api::Finalize::new(csr_base64_der(&csr)?);
        self.order.inner.transport.call(&finalize_url, &body).await?;

        // The server signs asynchronously; the certificate URL appears once
        // the order is valid.
        let fetched = poll_status::<api::Order>(
            &self.order.inner.transport,
            &self.order.url,
            "valid",
            max_retries,
            delay,
        )
        .await?;
        self.order.api_order.overwrite(fetched)?;

        Ok(CertOrder {
            signing_key,
            order: self.order,
        })
    }
}

/// A valid order whose certificate is ready for download.
pub struct CertOrder {
    signing_key: p256::ecdsa::SigningKey,
    order: Order,
}

impl CertOrder {
    /// Access the underlying JSON object.
    pub fn api_order(&self) -> &api::Order {
        &self.order.api_order
    }

    /// Downloads the certificate chain and pairs it with the private key
    /// into a validated bundle.
    pub async fn download_cert(self) -> Result<CertificateBundle> {
        let url = self
            .order
            .api_order
            .certificate
            .as_deref()
            .ok_or_else(|| Error::encoding("valid order carries no certificate URL"))?;

        let res = self.order.inner.transport.call_post_as_get(url).await?;
        let chain_pem = res.text().await?;

        let private_key_pem = self
            .signing_key
            .to_pkcs8_pem(pem::LineEnding::LF)
            .map_err(|err| Error::encoding(format!("certificate key to PEM: {err}")))?;

        CertificateBundle::new(private_key_pem, chain_pem)
    }
}
