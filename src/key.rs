use pkcs8::{DecodePrivateKey as _, EncodePrivateKey as _};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Make a P-256 private key (from which we can derive a public key).
///
/// Used both for the account key that signs every protocol request and for
/// the certificate key bound into the CSR.
pub fn create_p256_key() -> p256::ecdsa::SigningKey {
    let csprng = &mut rand::thread_rng();
    ecdsa::SigningKey::from(p256::SecretKey::random(csprng))
}

/// The account key together with the key ID the server assigns to it.
#[derive(Clone, Debug)]
pub(crate) struct AccountKey {
    signing_key: p256::ecdsa::SigningKey,

    /// Set once the newAccount response's `Location` header is known.
    key_id: Option<String>,
}

impl AccountKey {
    pub(crate) fn new() -> AccountKey {
        Self::from_key(create_p256_key())
    }

    pub(crate) fn from_pem(pem: &str) -> Result<AccountKey> {
        let signing_key = ecdsa::SigningKey::<p256::NistP256>::from_pkcs8_pem(pem)
            .map_err(|err| Error::encoding(format!("failed to read account key PEM: {err}")))?;
        Ok(Self::from_key(signing_key))
    }

    fn from_key(signing_key: p256::ecdsa::SigningKey) -> AccountKey {
        AccountKey {
            signing_key,
            key_id: None,
        }
    }

    pub(crate) fn to_pem(&self) -> Result<Zeroizing<String>> {
        self.signing_key
            .to_pkcs8_pem(pem::LineEnding::LF)
            .map_err(|err| Error::encoding(format!("account key to PEM: {err}")))
    }

    pub(crate) fn signing_key(&self) -> &p256::ecdsa::SigningKey {
        &self.signing_key
    }

    /// The account URL. Only available after account registration.
    pub(crate) fn key_id(&self) -> &str {
        self.key_id.as_deref().unwrap()
    }

    pub(crate) fn set_key_id(&mut self, kid: String) {
        self.key_id = Some(kid)
    }
}
