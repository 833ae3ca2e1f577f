//! Certificate signing request construction.

use der::{asn1::Ia5String, Encode as _};
use x509_cert::{
    builder::{Builder as _, RequestBuilder},
    ext::pkix::{name::GeneralName, SubjectAltName},
    name::Name,
    request::CertReq,
};

use crate::{
    error::{Error, Result},
    util::base64url,
};

/// Placeholder subject; the enforced identity is the SAN list only.
const CSR_SUBJECT: &str = "CN=acme-provision";

/// Creates a CSR for `domains` and signs it with `signer`.
///
/// Every domain ends up in the Subject Alternative Name extension as a DNS
/// name, including the single-domain case. The common name is a fixed
/// placeholder, not one of the domains.
pub(crate) fn create_csr(
    signer: &p256::ecdsa::SigningKey,
    domains: &[&str],
) -> Result<CertReq> {
    if domains.is_empty() {
        return Err(Error::encoding("cannot build a CSR for zero domains"));
    }

    let subject = CSR_SUBJECT
        .parse::<Name>()
        .map_err(|err| Error::encoding(format!("CSR subject: {err}")))?;

    let mut builder = RequestBuilder::new(subject, signer)
        .map_err(|err| Error::encoding(format!("CSR builder: {err}")))?;

    let san = domains
        .iter()
        .map(|domain| {
            Ia5String::new(domain)
                .map(GeneralName::DnsName)
                .map_err(|err| Error::encoding(format!("domain {domain} as IA5String: {err}")))
        })
        .collect::<Result<Vec<_>>>()?;

    builder
        .add_extension(&SubjectAltName(san))
        .map_err(|err| Error::encoding(format!("SAN extension: {err}")))?;

    builder
        .build::<p256::ecdsa::DerSignature>()
        .map_err(|err| Error::encoding(format!("CSR signing: {err}")))
}

/// The transport encoding the finalize request wants: base64url (no
/// padding) over the DER bytes. Note: not PEM.
pub(crate) fn csr_base64_der(csr: &CertReq) -> Result<String> {
    let der = csr
        .to_der()
        .map_err(|err| Error::encoding(format!("CSR to DER: {err}")))?;
    Ok(base64url(&der))
}
