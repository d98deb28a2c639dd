use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::error::SpeedTestError;
use super::events::Events;
use super::types::SpeedTestConfig;

/// Per-session state handed to every phase.
///
/// Phases read the configuration and report through `events`; the token is the
/// only way a session is stopped.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub client: Client,
    pub config: Arc<SpeedTestConfig>,
    pub events: Events,
    pub token: CancellationToken,
}

impl RunContext {
    pub fn new(client: Client, config: Arc<SpeedTestConfig>, events: Events) -> Self {
        Self {
            client,
            config,
            events,
            token: CancellationToken::new(),
        }
    }

    /// Fails with `Cancelled` once the session has been asked to stop.
    pub fn checkpoint(&self) -> Result<(), SpeedTestError> {
        if self.token.is_cancelled() {
            Err(SpeedTestError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Drive `fut` unless the session is cancelled first.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, SpeedTestError>
    where
        F: Future<Output = Result<T, SpeedTestError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SpeedTestError::Cancelled),
            res = fut => res,
        }
    }
}
