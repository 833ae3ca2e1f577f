//! Plain HTTP plumbing shared by every protocol step.
//!
//! Status validation and required-header extraction are the single
//! error-detection primitive all other modules lean on.

use std::time::Duration;

use crate::error::{Error, Result};

fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

pub(crate) async fn req_get(url: &str) -> Result<reqwest::Response> {
    log::trace!("GET {url}");
    Ok(client()?.get(url).send().await?)
}

pub(crate) async fn req_head(url: &str) -> Result<reqwest::Response> {
    log::trace!("HEAD {url}");
    Ok(client()?.head(url).send().await?)
}

pub(crate) async fn req_post(url: &str, body: String) -> Result<reqwest::Response> {
    log::trace!("POST {url} {body}");
    Ok(client()?
        .post(url)
        .header("content-type", "application/jose+json")
        .body(body)
        .send()
        .await?)
}

/// Passes 2xx responses through; anything else becomes a transport error
/// carrying status, headers and body for diagnosis.
pub(crate) async fn expect_status(res: reqwest::Response) -> Result<reqwest::Response> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status().as_u16();

    let headers = res
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let is_problem_json = res
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/problem+json"));

    // The CA sometimes closes the connection abruptly; keep whatever body
    // we managed to read.
    let body = res.text().await.unwrap_or_default();

    let problem = is_problem_json
        .then(|| serde_json::from_str(&body).ok())
        .flatten();

    Err(Error::Transport {
        status,
        headers,
        body,
        problem,
    })
}

/// Extracts a required response header (`Replay-Nonce`, `Location`).
pub(crate) fn expect_header(res: &reqwest::Response, name: &'static str) -> Result<String> {
    res.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
        .ok_or(Error::MissingHeader(name))
}
