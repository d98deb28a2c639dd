use bytes::Bytes;
use futures::future::{join_all, BoxFuture};
use futures::{FutureExt, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use super::context::RunContext;
use super::endpoint::Endpoint;
use super::error::SpeedTestError;
use super::payload::generate_payload;
use super::types::{Metric, Stage, TestType};
use super::units::{bytes_to_mbps, format_bytes, mb_to_bytes};

/// Result of one sub-transfer of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Bytes moved; always 0 for a failed sub-transfer.
    pub bytes: u64,
    pub succeeded: bool,
}

impl TransferOutcome {
    pub fn success(bytes: u64) -> Self {
        Self {
            bytes,
            succeeded: true,
        }
    }

    pub fn failure() -> Self {
        Self {
            bytes: 0,
            succeeded: false,
        }
    }
}

/// A settled batch of parallel sub-transfers.
#[derive(Debug, Clone)]
pub struct TransferBatch {
    pub outcomes: Vec<TransferOutcome>,
    /// Wall-clock time of the whole batch.
    pub elapsed: Duration,
}

impl TransferBatch {
    /// Bytes credited to the batch: successful sub-transfers only.
    pub fn credited_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.bytes)
            .sum()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn mbps(&self) -> f64 {
        bytes_to_mbps(self.credited_bytes(), self.elapsed)
    }
}

/// Shared counters for the sub-transfers of one batch.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    bytes: AtomicU64,
    completed: AtomicU32,
}

impl Tally {
    pub(crate) fn add_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Marks a sub-transfer done and returns how many are done so far.
    pub(crate) fn complete(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Move `size_mb` across `connections` parallel requests and wait for all of
/// them to settle.
///
/// The size is split evenly per connection. A failed connection only lowers
/// the credited byte count; it never fails the batch.
pub async fn run_transfer(
    ctx: &RunContext,
    endpoint: &Endpoint,
    test_type: TestType,
    size_mb: f64,
    connections: u32,
) -> Result<TransferBatch, SpeedTestError> {
    ctx.checkpoint()?;
    let connections = connections.max(1);
    let share = mb_to_bytes(size_mb / f64::from(connections));
    let tally = Tally::default();

    debug!(
        "{test_type} batch: {connections} x {} against {endpoint}",
        format_bytes(share)
    );

    let transfers: Vec<BoxFuture<'_, TransferOutcome>> = match test_type {
        TestType::Download => (0..connections)
            .map(|conn| {
                let url = endpoint.download_url(share, conn);
                let transfer = download(ctx, url, &tally);
                sub_transfer(ctx, test_type, conn, connections, &tally, transfer).boxed()
            })
            .collect(),
        TestType::Upload => {
            let payload = generate_payload(share as usize);
            (0..connections)
                .map(|conn| {
                    let url = endpoint.upload_url(conn);
                    let transfer = upload(ctx, url, payload.clone(), &tally);
                    sub_transfer(ctx, test_type, conn, connections, &tally, transfer).boxed()
                })
                .collect()
        }
    };

    let batch = settle(ctx, test_type, transfers, &tally).await?;
    debug!(
        "{test_type} {}: {}/{connections} connections ok, {} in {:.2?} -> {:.2} Mbps",
        format_bytes(mb_to_bytes(size_mb)),
        batch.succeeded(),
        format_bytes(batch.credited_bytes()),
        batch.elapsed,
        batch.mbps()
    );
    Ok(batch)
}

/// Wait for every sub-transfer to reach a terminal state.
///
/// A ticker emits the live rate while the batch is in flight. It lives in
/// this future's frame, so it stops on every exit path.
pub(crate) async fn settle<F>(
    ctx: &RunContext,
    test_type: TestType,
    transfers: Vec<F>,
    tally: &Tally,
) -> Result<TransferBatch, SpeedTestError>
where
    F: Future<Output = TransferOutcome>,
{
    let period = ctx.config.update_interval;
    let start = time::Instant::now();
    let mut ticker = time::interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let all = join_all(transfers);
    tokio::pin!(all);

    let outcomes = loop {
        tokio::select! {
            outcomes = &mut all => break outcomes,
            _ = ticker.tick() => {
                let bytes = tally.bytes();
                if bytes > 0 {
                    let mbps = bytes_to_mbps(bytes, start.elapsed());
                    ctx.events.realtime(Metric::from(test_type), mbps);
                }
            }
        }
    };
    let elapsed = start.elapsed();

    ctx.checkpoint()?;
    Ok(TransferBatch { outcomes, elapsed })
}

/// Run one sub-transfer to a terminal state, reporting batch progress.
async fn sub_transfer<F>(
    ctx: &RunContext,
    test_type: TestType,
    conn: u32,
    connections: u32,
    tally: &Tally,
    transfer: F,
) -> TransferOutcome
where
    F: Future<Output = Result<u64, SpeedTestError>>,
{
    match ctx.guard(transfer).await {
        Ok(bytes) => {
            let done = tally.complete();
            ctx.events.progress(
                f64::from(done) / f64::from(connections) * 100.0,
                Stage::from(test_type),
            );
            TransferOutcome::success(bytes)
        }
        Err(SpeedTestError::Cancelled) => TransferOutcome::failure(),
        Err(e) => {
            warn!("{test_type} connection {conn} failed: {e}");
            TransferOutcome::failure()
        }
    }
}

async fn download(ctx: &RunContext, url: String, tally: &Tally) -> Result<u64, SpeedTestError> {
    let resp = ctx.client.get(&url).send().await?;
    if !resp.status().is_success() {
        return Err(SpeedTestError::Status(resp.status()));
    }

    let mut total_bytes: u64 = 0;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        total_bytes += chunk.len() as u64;
        tally.add_bytes(chunk.len() as u64);
    }
    Ok(total_bytes)
}

async fn upload(
    ctx: &RunContext,
    url: String,
    body: Bytes,
    tally: &Tally,
) -> Result<u64, SpeedTestError> {
    let size = body.len() as u64;
    let resp = ctx.client.post(&url).body(body).send().await?;
    if !resp.status().is_success() {
        return Err(SpeedTestError::Status(resp.status()));
    }
    // Drain response body
    let _ = resp.bytes().await?;

    tally.add_bytes(size);
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::Events;
    use crate::engine::types::{SessionEvent, SpeedTestConfig};
    use reqwest::Client;
    use std::sync::Arc;

    const MB: u64 = 1_048_576;

    fn ctx(update_interval: Duration) -> RunContext {
        let config = SpeedTestConfig {
            update_interval,
            ..Default::default()
        };
        RunContext::new(Client::new(), Arc::new(config), Events::new())
    }

    #[test]
    fn test_credited_bytes_skip_failures() {
        let batch = TransferBatch {
            outcomes: vec![
                TransferOutcome::success(MB),
                TransferOutcome::failure(),
                TransferOutcome::success(MB),
                TransferOutcome::failure(),
            ],
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(batch.credited_bytes(), 2 * MB);
        assert_eq!(batch.succeeded(), 2);
        // 2 MiB over the 2s batch, not over any single connection's time
        assert!((batch.mbps() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_failed_batch_has_zero_rate() {
        let batch = TransferBatch {
            outcomes: vec![TransferOutcome::failure(); 4],
            elapsed: Duration::from_millis(300),
        };
        assert_eq!(batch.mbps(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_slowest_transfer() {
        let ctx = ctx(Duration::from_millis(200));
        let tally = Tally::default();
        let delays = [100u64, 400, 700, 1_000];
        let transfers: Vec<_> = delays
            .iter()
            .enumerate()
            .map(|(i, &ms)| {
                let tally = &tally;
                async move {
                    time::sleep(Duration::from_millis(ms)).await;
                    if i % 2 == 0 {
                        tally.add_bytes(MB);
                        TransferOutcome::success(MB)
                    } else {
                        TransferOutcome::failure()
                    }
                }
            })
            .collect();

        let batch = settle(&ctx, TestType::Download, transfers, &tally)
            .await
            .unwrap();
        assert_eq!(batch.outcomes.len(), 4);
        assert_eq!(batch.credited_bytes(), 2 * MB);
        assert!(batch.elapsed >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_emits_live_rate() {
        let ctx = ctx(Duration::from_millis(200));
        let mut rx = ctx.events.subscribe();
        let tally = Tally::default();
        let transfers = vec![async {
            tally.add_bytes(MB);
            time::sleep(Duration::from_millis(900)).await;
            TransferOutcome::success(MB)
        }];

        settle(&ctx, TestType::Upload, transfers, &tally)
            .await
            .unwrap();

        let mut live = 0;
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::Realtime { metric, value } = event {
                assert_eq!(metric, Metric::Upload);
                assert!(value > 0.0);
                live += 1;
            }
        }
        assert!(live >= 3, "expected ticks at 200/400/600/800ms, got {live}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_batch_settles() {
        let ctx = ctx(Duration::from_millis(200));
        let mut rx = ctx.events.subscribe();
        let tally = Tally::default();
        let transfers = vec![async {
            tally.add_bytes(MB);
            time::sleep(Duration::from_millis(500)).await;
            TransferOutcome::success(MB)
        }];
        settle(&ctx, TestType::Download, transfers, &tally)
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}

        time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_settle_reports_cancellation() {
        let ctx = ctx(Duration::from_millis(200));
        let tally = Tally::default();
        ctx.token.cancel();
        let transfers = vec![async { TransferOutcome::failure() }];
        let err = settle(&ctx, TestType::Download, transfers, &tally)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_sub_transfer_reports_progress() {
        let ctx = ctx(Duration::from_millis(200));
        let mut rx = ctx.events.subscribe();
        let tally = Tally::default();

        let ok = sub_transfer(&ctx, TestType::Download, 0, 4, &tally, async { Ok(MB) }).await;
        let failed = sub_transfer(&ctx, TestType::Download, 1, 4, &tally, async {
            Err(SpeedTestError::Other("reset".into()))
        })
        .await;

        assert_eq!(ok, TransferOutcome::success(MB));
        assert_eq!(failed, TransferOutcome::failure());
        match rx.try_recv() {
            Ok(SessionEvent::Progress { percent, stage }) => {
                assert_eq!(percent, 25.0);
                assert_eq!(stage, Stage::Download);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
