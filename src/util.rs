use base64::prelude::*;
use serde::de;

use crate::error::Result;

pub(crate) fn base64url<T: ?Sized + AsRef<[u8]>>(input: &T) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

pub(crate) async fn read_json<T: de::DeserializeOwned>(res: reqwest::Response) -> Result<T> {
    let body = res.text().await?;
    log::debug!("{body}");
    Ok(serde_json::from_str(&body)?)
}
