use serde_json::Value;
use tracing::{debug, warn};

use super::context::RunContext;
use super::error::SpeedTestError;
use super::types::ConnectionMetadata;

const UNKNOWN: &str = "Unknown";

/// Look up the client's address, provider and location.
///
/// Providers are tried in order. If none of them answers, every field reads
/// "Failed to retrieve"; only cancellation is returned as an error.
pub async fn fetch_connection_info(ctx: &RunContext) -> Result<ConnectionMetadata, SpeedTestError> {
    for url in &ctx.config.metadata_urls {
        ctx.checkpoint()?;
        match lookup(ctx, url).await {
            Ok(meta) => {
                debug!("Connection info from {url}: {}", meta.ip);
                return Ok(meta);
            }
            Err(SpeedTestError::Cancelled) => return Err(SpeedTestError::Cancelled),
            Err(e) => warn!("Connection info lookup via {url} failed: {e}"),
        }
    }
    Ok(ConnectionMetadata::failed())
}

async fn lookup(ctx: &RunContext, url: &str) -> Result<ConnectionMetadata, SpeedTestError> {
    let request = ctx.client.get(url).timeout(ctx.config.probe_timeout());
    let body = ctx
        .guard(async move {
            let resp = request.send().await?;
            if !resp.status().is_success() {
                return Err(SpeedTestError::Status(resp.status()));
            }
            Ok(resp.text().await?)
        })
        .await?;
    let value: Value = serde_json::from_str(&body)?;
    parse_lookup(&value)
}

/// Understands both the ipinfo.io and the ipapi.co response shapes.
fn parse_lookup(body: &Value) -> Result<ConnectionMetadata, SpeedTestError> {
    let obj = body
        .as_object()
        .ok_or_else(|| SpeedTestError::MetadataParse("expected a JSON object".to_string()))?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip = field("ip").unwrap_or(UNKNOWN).to_string();
    let isp = field("org")
        .map(strip_asn)
        .unwrap_or(UNKNOWN)
        .to_string();
    let location = match (field("city"), field("country_name").or_else(|| field("country"))) {
        (Some(city), Some(country)) => format!("{city}, {country}"),
        _ => UNKNOWN.to_string(),
    };

    Ok(ConnectionMetadata { ip, isp, location })
}

/// `AS13335 Cloudflare, Inc.` -> `Cloudflare, Inc.`
fn strip_asn(org: &str) -> &str {
    org.strip_prefix("AS")
        .and_then(|rest| rest.split_once(' '))
        .filter(|(number, _)| !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()))
        .map(|(_, name)| name)
        .unwrap_or(org)
}
