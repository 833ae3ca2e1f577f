//! Bounded status polling.
//!
//! The server validates challenges out of band, so authorizations and
//! orders advance asynchronously; this is the one retry loop that awaits
//! both kinds of transition.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{api, error::Error, error::Result, trans::Transport, util::read_json};

/// How many POST-as-GET attempts before a transition counts as failed.
pub const DEFAULT_MAX_POLL_RETRIES: u32 = 10;

/// Fixed pause before every attempt.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);

/// A resource whose `status` field we can await.
pub(crate) trait PollTarget: DeserializeOwned {
    fn status_str(&self) -> &'static str;
}

impl PollTarget for api::Authorization {
    fn status_str(&self) -> &'static str {
        self.status.as_str()
    }
}

impl PollTarget for api::Order {
    fn status_str(&self) -> &'static str {
        match self.status {
            Some(status) => status.as_str(),
            None => "unknown",
        }
    }
}

/// Re-fetches `url` until its status equals `want`.
///
/// Sleeps `delay`, POST-as-GETs, compares; gives the server `max_retries`
/// chances in total. On exhaustion fails with a validation timeout naming
/// the resource and the last status observed.
pub(crate) async fn poll_status<T: PollTarget>(
    transport: &Transport,
    url: &str,
    want: &'static str,
    max_retries: u32,
    delay: Duration,
) -> Result<T> {
    let mut last = "unknown".to_owned();

    for attempt in 1..=max_retries {
        // Sleep first: the server has just been told to go probe the proof
        // artifact and will practically never be done immediately.
        tokio::time::sleep(delay).await;

        let res = transport.call_post_as_get(url).await?;
        let target: T = read_json(res).await?;

        if target.status_str() == want {
            log::debug!("{url} reached {want} on attempt {attempt}");
            return Ok(target);
        }

        last = target.status_str().to_owned();
        log::debug!("attempt {attempt}/{max_retries}: {url} is {last}, want {want}");
    }

    Err(Error::ValidationTimeout {
        resource: url.to_owned(),
        want,
        last,
    })
}
