//! Request signing: protected headers, JWK encoding, key authorizations.
//!
//! See [RFC 8555 §6.2](https://datatracker.ietf.org/doc/html/rfc8555#section-6.2).

use ecdsa::signature::Signer as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{
    error::{Error, Result},
    key::AccountKey,
    util::base64url,
};

/// JWS protected header.
///
/// > For newAccount requests, and for revokeCert requests authenticated by a
/// > certificate key, there MUST be a "jwk" field. For all other requests,
/// > the request is signed using an existing account, and there MUST be a
/// > "kid" field containing the account URL.
#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct JwsProtected {
    /// Always "ES256"; the account key is a fixed P-256 key.
    alg: String,

    /// Single-use anti-replay token; consumed by this request.
    nonce: String,

    /// Target URL this JWS is directed at.
    url: String,

    /// Mutually exclusive with `kid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    jwk: Option<Jwk>,

    /// Mutually exclusive with `jwk`.
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

impl JwsProtected {
    pub(crate) fn new_jwk(jwk: Jwk, url: &str, nonce: String) -> Self {
        JwsProtected {
            alg: "ES256".to_owned(),
            nonce,
            url: url.to_owned(),
            jwk: Some(jwk),
            ..Default::default()
        }
    }

    pub(crate) fn new_kid(kid: &str, url: &str, nonce: String) -> Self {
        JwsProtected {
            alg: "ES256".to_owned(),
            nonce,
            url: url.to_owned(),
            kid: Some(kid.to_owned()),
            ..Default::default()
        }
    }
}

/// JWK encoding of the account's public key.
///
/// FIELD ORDER MATTERS: the thumbprint is the digest of this exact
/// serialization with keys in lexical order and no insignificant
/// whitespace (RFC 7638).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct Jwk {
    crv: String,
    kty: String,
    x: String,
    y: String,
}

impl From<&AccountKey> for Jwk {
    fn from(key: &AccountKey) -> Self {
        // The uncompressed SEC1 point carries both coordinates as exactly
        // 32 big-endian bytes each, the fixed-length form the JWK needs.
        // A bignum-based conversion would intermittently drop or add a
        // leading byte.
        let point = key.signing_key().verifying_key().to_encoded_point(false);

        let x = point.x().unwrap();
        let y = point.y().unwrap();

        Jwk {
            crv: "P-256".to_owned(),
            kty: "EC".to_owned(),
            x: base64url(x),
            y: base64url(y),
        }
    }
}

/// Computes the RFC 7638 thumbprint of the account public key.
pub(crate) fn thumbprint(key: &AccountKey) -> Result<String> {
    let jwk = Jwk::from(key);
    let jwk_json = serde_json::to_string(&jwk)?;
    Ok(base64url(&Sha256::digest(jwk_json)))
}

/// Computes the key authorization for a challenge token:
/// `token || "." || thumbprint(account public key)`.
pub(crate) fn key_authorization(token: &str, key: &AccountKey) -> Result<String> {
    Ok(format!("{token}.{}", thumbprint(key)?))
}

/// Flattened JSON JWS serialization.
///
/// See [RFC 7515 §7.2.2](https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.2).
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Jws {
    protected: String,
    payload: String,
    signature: String,
}

/// Signs a payload into the flattened JWS serialization.
///
/// `payload` is the JSON text of the request body, or `None` for a
/// POST-as-GET whose payload is the empty string (not base64url-encoded
/// further).
pub(crate) fn sign(
    protected: &JwsProtected,
    key: &AccountKey,
    payload: Option<&str>,
) -> Result<String> {
    let protected = {
        let json = serde_json::to_string(protected)?;
        base64url(&json)
    };

    let payload = match payload {
        Some(json) => base64url(json),
        None => String::new(),
    };

    let to_sign = format!("{protected}.{payload}");
    let signature: p256::ecdsa::Signature = key
        .signing_key()
        .try_sign(to_sign.as_bytes())
        .map_err(|err| Error::encoding(format!("ES256 signing failed: {err}")))?;

    let jws = Jws {
        protected,
        payload,
        signature: base64url(&signature.to_bytes()),
    };

    Ok(serde_json::to_string(&jws)?)
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;
    use ecdsa::signature::Verifier as _;

    use super::*;

    #[test]
    fn jwk_coordinates_are_fixed_length() {
        // P-256 coordinates must always encode to ceil(256 / 8) = 32 bytes,
        // including keys whose raw big-integer form would be shorter.
        for _ in 0..64 {
            let key = AccountKey::new();
            let jwk = Jwk::from(&key);

            let x = BASE64_URL_SAFE_NO_PAD.decode(&jwk.x).unwrap();
            let y = BASE64_URL_SAFE_NO_PAD.decode(&jwk.y).unwrap();
            assert_eq!(x.len(), 32);
            assert_eq!(y.len(), 32);
        }
    }

    #[test]
    fn jwk_round_trips_coordinates() {
        let key = AccountKey::new();
        let jwk = Jwk::from(&key);

        let point = key.signing_key().verifying_key().to_encoded_point(false);
        let x = BASE64_URL_SAFE_NO_PAD.decode(&jwk.x).unwrap();
        let y = BASE64_URL_SAFE_NO_PAD.decode(&jwk.y).unwrap();
        assert_eq!(x.as_slice(), point.x().unwrap().as_slice());
        assert_eq!(y.as_slice(), point.y().unwrap().as_slice());
    }

    #[test]
    fn thumbprint_is_deterministic_and_coordinate_sensitive() {
        let key = AccountKey::new();
        assert_eq!(thumbprint(&key).unwrap(), thumbprint(&key).unwrap());

        let jwk = Jwk::from(&key);
        let mut x = BASE64_URL_SAFE_NO_PAD.decode(&jwk.x).unwrap();
        x[7] ^= 0xff;
        let tampered = Jwk {
            x: base64url(&x),
            ..jwk.clone()
        };

        let digest_of = |jwk: &Jwk| {
            let json = serde_json::to_string(jwk).unwrap();
            base64url(&Sha256::digest(json))
        };
        assert_eq!(thumbprint(&key).unwrap(), digest_of(&jwk));
        assert_ne!(digest_of(&jwk), digest_of(&tampered));
    }

    #[test]
    fn key_authorization_concatenates_token_and_thumbprint() {
        let key = AccountKey::new();
        let key_auth = key_authorization("abc123", &key).unwrap();
        assert_eq!(
            key_auth,
            format!("abc123.{}", thumbprint(&key).unwrap())
        );
    }

    #[test]
    fn envelope_is_well_formed_and_verifies() {
        let mut key = AccountKey::new();
        key.set_key_id("https://ca.example/acct/1".to_owned());

        let protected = JwsProtected::new_kid(
            key.key_id(),
            "https://ca.example/order",
            "nonce-1".to_owned(),
        );
        let jws_json = sign(&protected, &key, Some(r#"{"csr":"zzz"}"#)).unwrap();

        let jws: Jws = serde_json::from_str(&jws_json).unwrap();

        let header_json = BASE64_URL_SAFE_NO_PAD.decode(&jws.protected).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header_json).unwrap();
        let object = header.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(object["alg"], "ES256");
        assert_eq!(object["nonce"], "nonce-1");
        assert_eq!(object["url"], "https://ca.example/order");
        assert_eq!(object["kid"], "https://ca.example/acct/1");
        assert!(!object.contains_key("jwk"));

        let payload = BASE64_URL_SAFE_NO_PAD.decode(&jws.payload).unwrap();
        assert_eq!(payload, br#"{"csr":"zzz"}"#);

        let to_sign = format!("{}.{}", jws.protected, jws.payload);
        let sig_bytes = BASE64_URL_SAFE_NO_PAD.decode(&jws.signature).unwrap();
        let signature = p256::ecdsa::Signature::from_slice(&sig_bytes).unwrap();
        key.signing_key()
            .verifying_key()
            .verify(to_sign.as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn post_as_get_payload_is_empty_string() {
        let key = AccountKey::new();
        let jwk = Jwk::from(&key);
        let protected = JwsProtected::new_jwk(jwk, "https://ca.example/authz/1", "n".to_owned());

        let jws_json = sign(&protected, &key, None).unwrap();
        let jws: Jws = serde_json::from_str(&jws_json).unwrap();
        assert_eq!(jws.payload, "");

        let header_json = BASE64_URL_SAFE_NO_PAD.decode(&jws.protected).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header_json).unwrap();
        assert!(header.as_object().unwrap().contains_key("jwk"));
        assert!(!header.as_object().unwrap().contains_key("kid"));
    }
}
