use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

use super::error::SpeedTestError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the shared async client, optionally bound to a local address.
///
/// Every request asks intermediaries not to serve cached bodies.
pub fn build_client(local_addr: Option<IpAddr>) -> Result<Client, SpeedTestError> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .default_headers(no_cache_headers());

    if let Some(addr) = local_addr {
        builder = builder.local_address(addr);
    }

    Ok(builder.build()?)
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}
