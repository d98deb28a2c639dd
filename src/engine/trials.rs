use tracing::{info, warn};

use super::context::RunContext;
use super::endpoint::Endpoint;
use super::error::SpeedTestError;
use super::transfer::{run_transfer, TransferBatch};
use super::types::{Metric, SessionEvent, TestType, ThroughputResult, TrialResult};
use super::units::{format_mb, round_to};

impl TrialResult {
    /// Record a trial, weighting it by its size relative to the first
    /// configured size.
    pub fn new(size_mb: f64, first_size_mb: f64, batch: &TransferBatch) -> Self {
        Self {
            size_mb,
            mbps: batch.mbps(),
            weight: size_mb / first_size_mb,
            bytes: batch.credited_bytes(),
            elapsed_ms: batch.elapsed.as_secs_f64() * 1000.0,
            connections: batch.outcomes.len() as u32,
        }
    }
}

/// Run one multi-connection trial per configured size, in order.
///
/// Trials that credit no bytes are dropped. The result is the weighted mean
/// of the rest, rounded to two decimals, or 0 when nothing was usable.
pub async fn run_trials(
    ctx: &RunContext,
    endpoint: &Endpoint,
    test_type: TestType,
) -> Result<ThroughputResult, SpeedTestError> {
    let sizes = ctx.config.sizes(test_type);
    let connections = ctx.config.connections(test_type);
    let first_size = *sizes.first().ok_or_else(|| {
        SpeedTestError::InvalidConfig(format!("no {test_type} trial sizes configured"))
    })?;
    let total = sizes.len() as u32;

    info!("Running {total} {test_type} trials with {connections} connections each");
    let mut trials = Vec::with_capacity(sizes.len());
    let mut discarded = 0;

    for (i, &size_mb) in sizes.iter().enumerate() {
        ctx.checkpoint()?;
        let batch = run_transfer(ctx, endpoint, test_type, size_mb, connections).await?;
        let mbps = batch.mbps();

        ctx.events.emit(SessionEvent::TrialFinished {
            test_type,
            size_mb,
            mbps,
            index: i as u32 + 1,
            total,
        });

        if mbps > 0.0 {
            trials.push(TrialResult::new(size_mb, first_size, &batch));
        } else {
            warn!("{test_type} trial {} moved no data, discarding", format_mb(size_mb));
            discarded += 1;
        }
    }

    let mbps = round_to(weighted_average(&trials), 2);
    if !trials.is_empty() {
        ctx.events.realtime(Metric::from(test_type), mbps);
    }
    info!("{test_type}: {mbps} Mbps from {} trials", trials.len());

    Ok(ThroughputResult {
        mbps,
        trials,
        discarded,
    })
}

/// Weighted mean of trial rates; 0 for an empty set.
pub fn weighted_average(trials: &[TrialResult]) -> f64 {
    let total_weight: f64 = trials.iter().map(|t| t.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    trials.iter().map(|t| t.mbps * t.weight).sum::<f64>() / total_weight
}
