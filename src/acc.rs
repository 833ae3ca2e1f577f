//! Account handle and account-scoped operations.

use std::{collections::HashSet, sync::Arc};

use zeroize::Zeroizing;

use crate::{
    api,
    error::Result,
    order::{NewOrder, Order},
    req::expect_header,
    store::CertificateBundle,
    trans::Transport,
    util::{base64url, read_json},
};

/// Why a certificate is being revoked.
///
/// The subset of RFC 5280 reasonCodes that makes sense for an end-entity
/// TLS certificate; value 7 is unused by the RFC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    /// The wire code; `Unspecified` is expressed by omitting the field.
    fn code(self) -> Option<usize> {
        match self {
            Self::Unspecified => None,
            Self::KeyCompromise => Some(1),
            Self::CaCompromise => Some(2),
            Self::AffiliationChanged => Some(3),
            Self::Superseded => Some(4),
            Self::CessationOfOperation => Some(5),
            Self::CertificateHold => Some(6),
            Self::RemoveFromCrl => Some(8),
            Self::PrivilegeWithdrawn => Some(9),
            Self::AaCompromise => Some(10),
        }
    }
}

/// Shared state behind [`Account`] and every handle derived from it.
pub(crate) struct AccountInner {
    pub(crate) transport: Transport,
    pub(crate) api_account: api::Account,
    pub(crate) api_directory: api::Directory,
}

/// A registered account with an ACME provider.
///
/// Cheap to clone; all derived order and authorization handles share this
/// account's transport.
#[derive(Clone)]
pub struct Account {
    pub(crate) inner: Arc<AccountInner>,
}

impl Account {
    pub(crate) fn new(
        transport: Transport,
        api_account: api::Account,
        api_directory: api::Directory,
    ) -> Self {
        Account {
            inner: Arc::new(AccountInner {
                transport,
                api_account,
                api_directory,
            }),
        }
    }

    /// Access the underlying JSON object.
    pub fn api_account(&self) -> &api::Account {
        &self.inner.api_account
    }

    /// The account's private key in PKCS#8 PEM.
    ///
    /// Save this to reuse the account in later runs via
    /// [`Directory::load_account`](crate::Directory::load_account).
    pub fn acme_private_key_pem(&self) -> Result<Zeroizing<String>> {
        self.inner.transport.key().to_pem()
    }

    /// Creates a new order for a certificate covering `domains`.
    ///
    /// The first domain becomes the certificate's primary name; duplicates
    /// are dropped, keeping the first occurrence's position.
    pub async fn new_order(&self, domains: &[&str]) -> Result<NewOrder> {
        let mut seen = HashSet::new();
        let identifiers: Vec<_> = domains
            .iter()
            .filter(|domain| seen.insert(**domain))
            .map(|domain| api::Identifier::dns(domain))
            .collect();

        let mut api_order = api::Order::from_identifiers(identifiers);

        let res = self
            .inner
            .transport
            .call(&self.inner.api_directory.new_order, &api_order)
            .await?;
        let url = expect_header(&res, "location")?;
        log::debug!("order URL: {url}");

        api_order.overwrite(read_json(res).await?)?;

        Ok(NewOrder::new(Order::new(
            Arc::clone(&self.inner),
            api_order,
            url,
        )))
    }

    /// Revokes the bundle's end-entity certificate.
    ///
    /// The certificate must have been issued to this account.
    pub async fn revoke_certificate(
        &self,
        bundle: &CertificateBundle,
        reason: RevocationReason,
    ) -> Result<()> {
        let body = api::Revocation::new(base64url(bundle.leaf_der()), reason.code());

        self.inner
            .transport
            .call(&self.inner.api_directory.revoke_cert, &body)
            .await?;

        log::info!("certificate revoked ({reason:?})");
        Ok(())
    }
}
