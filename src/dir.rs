//! Directory discovery and account setup.

use std::sync::Arc;

use crate::{
    acc::Account,
    api,
    error::Result,
    key::AccountKey,
    req::{expect_header, expect_status, req_get},
    trans::{NonceSlot, Transport},
    util::read_json,
};

/// Where to find the directory document of an ACME provider.
pub enum DirectoryUrl<'a> {
    /// Let's Encrypt production.
    ///
    /// Issues real certificates, with rate limits that make it unsuitable
    /// for experimentation.
    LetsEncrypt,

    /// Let's Encrypt staging.
    ///
    /// Generous rate limits, but issues certificates signed by a CA that
    /// browsers do not trust.
    LetsEncryptStaging,

    /// Any other provider's directory URL.
    Other(&'a str),
}

impl DirectoryUrl<'_> {
    fn to_url(&self) -> &str {
        match self {
            Self::LetsEncrypt => "https://acme-v02.api.letsencrypt.org/directory",
            Self::LetsEncryptStaging => "https://acme-staging-v02.api.letsencrypt.org/directory",
            Self::Other(url) => url,
        }
    }
}

/// Entry point to one ACME provider.
///
/// Fetched once per run; every subsequent request goes to an endpoint this
/// document names.
pub struct Directory {
    nonce: Arc<NonceSlot>,
    api_directory: api::Directory,
}

impl Directory {
    /// Fetches the directory document from the provider.
    pub async fn fetch(url: DirectoryUrl<'_>) -> Result<Directory> {
        let res = expect_status(req_get(url.to_url()).await?).await?;
        let api_directory: api::Directory = read_json(res).await?;

        let nonce = Arc::new(NonceSlot::new(&api_directory.new_nonce));

        Ok(Directory {
            nonce,
            api_directory,
        })
    }

    /// Access the underlying JSON object.
    pub fn api_directory(&self) -> &api::Directory {
        &self.api_directory
    }

    /// Creates an account with a fresh key.
    ///
    /// `contact` is a list of contact URIs such as `mailto:admin@example.org`.
    /// Registering implies agreement with the provider's terms of service.
    pub async fn register_account(&self, contact: Option<Vec<String>>) -> Result<Account> {
        self.upsert_account(AccountKey::new(), contact).await
    }

    /// Accesses an account using an existing key.
    ///
    /// The server treats newAccount with a known key as a lookup, so this
    /// also works for accounts registered by earlier runs.
    pub async fn load_account(
        &self,
        private_key_pem: &str,
        contact: Option<Vec<String>>,
    ) -> Result<Account> {
        self.upsert_account(AccountKey::from_pem(private_key_pem)?, contact)
            .await
    }

    async fn upsert_account(
        &self,
        key: AccountKey,
        contact: Option<Vec<String>>,
    ) -> Result<Account> {
        let mut transport = Transport::new(Arc::clone(&self.nonce), key);

        let body = api::Account {
            contact,
            terms_of_service_agreed: Some(true),
            ..Default::default()
        };

        // The only JWK-identified request; everything after uses the key ID
        // the Location header assigns here.
        let res = transport
            .call_jwk(&self.api_directory.new_account, &body)
            .await?;
        let kid = expect_header(&res, "location")?;
        log::debug!("account URL: {kid}");

        let api_account: api::Account = read_json(res).await?;
        transport.set_key_id(kid);

        Ok(Account::new(transport, api_account, self.api_directory.clone()))
    }
}
