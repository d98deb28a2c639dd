use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::context::RunContext;
use super::endpoint::Endpoint;
use super::error::SpeedTestError;

/// Probe every configured endpoint once and pick the quickest responder.
///
/// Endpoints that error, time out or answer with a non-success status are
/// skipped. With no responders the first configured endpoint is returned.
pub async fn select_server(ctx: &RunContext) -> Result<Endpoint, SpeedTestError> {
    let endpoints = &ctx.config.endpoints;
    let fallback = endpoints
        .first()
        .cloned()
        .ok_or_else(|| SpeedTestError::InvalidConfig("no endpoints configured".to_string()))?;

    let mut round_trips = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        ctx.checkpoint()?;
        round_trips.push(probe(ctx, endpoint).await?);
    }

    match fastest(&round_trips) {
        Some(index) => {
            let chosen = endpoints[index].clone();
            info!("Selected {chosen} ({:.1?})", round_trips[index].unwrap_or_default());
            Ok(chosen)
        }
        None => {
            warn!("No endpoint responded, falling back to {fallback}");
            Ok(fallback)
        }
    }
}

/// Round trip to the endpoint's latency resource, `None` if it did not answer
/// successfully. Only cancellation is an error.
async fn probe(ctx: &RunContext, endpoint: &Endpoint) -> Result<Option<Duration>, SpeedTestError> {
    let url = endpoint.ping_url();
    let request = ctx.client.get(&url).timeout(ctx.config.probe_timeout());

    let start = Instant::now();
    let resp = ctx
        .guard(async move { request.send().await.map_err(SpeedTestError::from) })
        .await;

    match resp {
        Ok(resp) if resp.status().is_success() => {
            let rtt = start.elapsed();
            debug!("{endpoint} answered in {rtt:.2?}");
            Ok(Some(rtt))
        }
        Ok(resp) => {
            debug!("{endpoint} answered with {}, skipping", resp.status());
            Ok(None)
        }
        Err(SpeedTestError::Cancelled) => Err(SpeedTestError::Cancelled),
        Err(e) => {
            debug!("{endpoint} probe failed: {e}");
            Ok(None)
        }
    }
}

/// Index of the smallest round trip; earlier entries win ties.
pub(crate) fn fastest(round_trips: &[Option<Duration>]) -> Option<usize> {
    let mut best: Option<(usize, Duration)> = None;
    for (index, rtt) in round_trips.iter().enumerate() {
        match (best, *rtt) {
            (Some((_, b)), Some(rtt)) if rtt >= b => {}
            (_, Some(rtt)) => best = Some((index, rtt)),
            (_, None) => {}
        }
    }
    best.map(|(index, _)| index)
}
