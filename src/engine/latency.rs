use std::time::Instant;
use tracing::{debug, info, warn};

use super::context::RunContext;
use super::endpoint::Endpoint;
use super::error::SpeedTestError;
use super::types::{LatencyResult, Metric, Stage};

/// Run the configured number of sequential latency probes.
///
/// A failed probe contributes the fallback value so the series always has
/// full length. A running average is reported after every sample.
pub async fn sample_latency(
    ctx: &RunContext,
    endpoint: &Endpoint,
) -> Result<LatencyResult, SpeedTestError> {
    let count = ctx.config.latency_probes;
    let fallback = ctx.config.fallback_latency_ms;
    let mut samples = Vec::with_capacity(count as usize);
    let mut failed_probes = 0;

    info!("Running {count} latency probes against {endpoint}");
    for i in 0..count {
        ctx.checkpoint()?;
        let sample = match test_latency(ctx, endpoint).await {
            Ok(ms) => ms,
            Err(SpeedTestError::Cancelled) => return Err(SpeedTestError::Cancelled),
            Err(e) => {
                warn!("Latency probe {} failed ({e}), using {fallback}ms", i + 1);
                failed_probes += 1;
                fallback
            }
        };
        samples.push(sample);

        let running_avg = samples.iter().sum::<f64>() / samples.len() as f64;
        ctx.events
            .progress(f64::from(i + 1) / f64::from(count) * 100.0, Stage::Latency);
        ctx.events.realtime(Metric::Ping, running_avg);
    }

    let (ping_ms, jitter_ms) = summarize(&samples);
    ctx.events.realtime(Metric::Ping, ping_ms);
    ctx.events.realtime(Metric::Jitter, jitter_ms);
    info!("Latency {ping_ms}ms, jitter {jitter_ms}ms ({failed_probes} failed probes)");

    Ok(LatencyResult {
        ping_ms,
        jitter_ms,
        samples,
        failed_probes,
    })
}

/// Run a single latency measurement.
///
/// Times the round trip up to the response head, then drains the body so the
/// connection can be reused by the next probe.
pub async fn test_latency(ctx: &RunContext, endpoint: &Endpoint) -> Result<f64, SpeedTestError> {
    let url = endpoint.ping_url();
    let request = ctx.client.get(&url).timeout(ctx.config.probe_timeout());

    let start = Instant::now();
    let resp = ctx
        .guard(async move { request.send().await.map_err(SpeedTestError::from) })
        .await?;
    let latency = start.elapsed().as_secs_f64() * 1000.0;

    // Consume body
    let _ = ctx
        .guard(async move { resp.bytes().await.map_err(SpeedTestError::from) })
        .await?;

    debug!("Latency: {latency:.2}ms");
    Ok(latency)
}

/// Mean latency and jitter (mean absolute successive difference), each
/// rounded to whole milliseconds. Jitter needs at least two samples.
pub fn summarize(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let jitter = if samples.len() < 2 {
        0.0
    } else {
        let diffs: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        diffs / (samples.len() - 1) as f64
    };
    (mean.round(), jitter.round())
}
