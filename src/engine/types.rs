use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::endpoint::Endpoint;
use super::error::SpeedTestError;
use super::quality::QualityAssessment;

/// Which direction a throughput test measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Download,
    Upload,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Download => write!(f, "Download"),
            TestType::Upload => write!(f, "Upload"),
        }
    }
}

/// Metric carried by a real-time update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Download,
    Upload,
    Ping,
    Jitter,
}

impl From<TestType> for Metric {
    fn from(test_type: TestType) -> Self {
        match test_type {
            TestType::Download => Metric::Download,
            TestType::Upload => Metric::Upload,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Download => write!(f, "download"),
            Metric::Upload => write!(f, "upload"),
            Metric::Ping => write!(f, "ping"),
            Metric::Jitter => write!(f, "jitter"),
        }
    }
}

/// Phase announced to observers through stage/progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ServerSelection,
    Latency,
    Download,
    Upload,
    ConnectionInfo,
}

impl Stage {
    pub fn description(self) -> &'static str {
        match self {
            Stage::ServerSelection => "Selecting best server...",
            Stage::Latency => "Testing ping...",
            Stage::Download => "Testing download speed (multi-connection)...",
            Stage::Upload => "Testing upload speed (multi-connection)...",
            Stage::ConnectionInfo => "Fetching connection info...",
        }
    }
}

impl From<TestType> for Stage {
    fn from(test_type: TestType) -> Self {
        match test_type {
            TestType::Download => Stage::Download,
            TestType::Upload => Stage::Upload,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ServerSelection => write!(f, "server"),
            Stage::Latency => write!(f, "ping"),
            Stage::Download => write!(f, "download"),
            Stage::Upload => write!(f, "upload"),
            Stage::ConnectionInfo => write!(f, "info"),
        }
    }
}

/// Lifecycle of the session orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Selecting,
    Latency,
    Downloading,
    Uploading,
    MetadataLookup,
    Complete,
    Aborted,
    Failed,
}

impl SessionState {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SessionState::Selecting
                | SessionState::Latency
                | SessionState::Downloading
                | SessionState::Uploading
                | SessionState::MetadataLookup
        )
    }
}

/// Final numbers of a session: rates in Mbps, latency and jitter in ms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
    pub jitter: f64,
}

/// Who the client appears to be, as reported by a lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionMetadata {
    pub ip: String,
    pub isp: String,
    pub location: String,
}

impl ConnectionMetadata {
    pub fn failed() -> Self {
        let failed = "Failed to retrieve".to_string();
        Self {
            ip: failed.clone(),
            isp: failed.clone(),
            location: failed,
        }
    }
}

impl fmt::Display for ConnectionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IP Address: {}\nISP: {}\nLocation: {}",
            self.ip, self.isp, self.location
        )
    }
}

/// Latency phase output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyResult {
    pub ping_ms: f64,
    pub jitter_ms: f64,
    pub samples: Vec<f64>,
    /// Probes that failed and were replaced by the fallback value.
    pub failed_probes: u32,
}

/// One multi-connection trial that produced a usable rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub size_mb: f64,
    pub mbps: f64,
    /// `size_mb` relative to the first configured trial size.
    pub weight: f64,
    pub bytes: u64,
    pub elapsed_ms: f64,
    pub connections: u32,
}

/// Aggregated throughput for one direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputResult {
    pub mbps: f64,
    pub trials: Vec<TrialResult>,
    /// Trials that moved no bytes and were left out of the average.
    pub discarded: u32,
}

/// Everything a completed session produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub timestamp: DateTime<Utc>,
    pub endpoint: Endpoint,
    pub results: ResultSet,
    pub latency: LatencyResult,
    pub download: ThroughputResult,
    pub upload: ThroughputResult,
    pub connection_info: Option<ConnectionMetadata>,
    pub quality: QualityAssessment,
}

/// Events emitted by the engine for real-time consumption.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StageChanged(Stage),
    Progress {
        percent: f64,
        stage: Stage,
    },
    Realtime {
        metric: Metric,
        value: f64,
    },
    ServerSelected(Endpoint),
    TrialFinished {
        test_type: TestType,
        size_mb: f64,
        mbps: f64,
        index: u32,
        total: u32,
    },
    Complete(Box<SessionReport>),
    Error(String),
    Aborted,
}

/// How a session ended.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Completed(Box<SessionReport>),
    Aborted,
    Failed(String),
}

pub const MIN_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for a speed test session.
#[derive(Debug, Clone)]
pub struct SpeedTestConfig {
    /// Candidate servers; the first one is the fallback.
    pub endpoints: Vec<Endpoint>,
    pub latency_probes: u32,
    /// Substituted for a failed latency probe.
    pub fallback_latency_ms: f64,
    pub download_sizes_mb: Vec<f64>,
    pub upload_sizes_mb: Vec<f64>,
    pub download_connections: u32,
    pub upload_connections: u32,
    pub probe_timeout: Duration,
    /// Period of live rate updates while a batch is in flight.
    pub update_interval: Duration,
    pub lookup_metadata: bool,
    /// Lookup services, tried in order.
    pub metadata_urls: Vec<String>,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoint::defaults(),
            latency_probes: 10,
            fallback_latency_ms: 100.0,
            download_sizes_mb: vec![1.0, 2.0, 5.0, 10.0],
            upload_sizes_mb: vec![1.0, 2.0, 5.0],
            download_connections: 8,
            upload_connections: 4,
            probe_timeout: MAX_PROBE_TIMEOUT,
            update_interval: Duration::from_millis(200),
            lookup_metadata: true,
            metadata_urls: vec![
                "https://ipinfo.io/json".to_string(),
                "https://ipapi.co/json/".to_string(),
            ],
        }
    }
}

impl SpeedTestConfig {
    pub fn sizes(&self, test_type: TestType) -> &[f64] {
        match test_type {
            TestType::Download => &self.download_sizes_mb,
            TestType::Upload => &self.upload_sizes_mb,
        }
    }

    pub fn connections(&self, test_type: TestType) -> u32 {
        match test_type {
            TestType::Download => self.download_connections,
            TestType::Upload => self.upload_connections,
        }
    }

    /// Probe timeout held inside the advisory 500ms..5000ms window.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout.clamp(MIN_PROBE_TIMEOUT, MAX_PROBE_TIMEOUT)
    }

    pub fn validate(&self) -> Result<(), SpeedTestError> {
        let invalid = |msg: &str| Err(SpeedTestError::InvalidConfig(msg.to_string()));

        if self.endpoints.is_empty() {
            return invalid("no endpoints configured");
        }
        if self.latency_probes == 0 {
            return invalid("latency probe count must be at least 1");
        }
        if !(self.fallback_latency_ms.is_finite() && self.fallback_latency_ms >= 0.0) {
            return invalid("fallback latency must be a non-negative number");
        }
        for test_type in [TestType::Download, TestType::Upload] {
            let sizes = self.sizes(test_type);
            if sizes.is_empty() {
                return Err(SpeedTestError::InvalidConfig(format!(
                    "no {test_type} trial sizes configured"
                )));
            }
            if sizes.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                return Err(SpeedTestError::InvalidConfig(format!(
                    "{test_type} trial sizes must be positive"
                )));
            }
            if self.connections(test_type) == 0 {
                return Err(SpeedTestError::InvalidConfig(format!(
                    "{test_type} connection count must be at least 1"
                )));
            }
        }
        if self.update_interval.is_zero() {
            return invalid("update interval must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpeedTestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sizes(TestType::Download), &[1.0, 2.0, 5.0, 10.0]);
        assert_eq!(config.sizes(TestType::Upload), &[1.0, 2.0, 5.0]);
        assert_eq!(config.connections(TestType::Download), 8);
        assert_eq!(config.connections(TestType::Upload), 4);
        assert_eq!(config.latency_probes, 10);
        assert_eq!(config.fallback_latency_ms, 100.0);
    }

    #[test]
    fn test_probe_timeout_is_clamped() {
        let mut config = SpeedTestConfig {
            probe_timeout: Duration::from_millis(10),
            ..Default::default()
        };
        assert_eq!(config.probe_timeout(), MIN_PROBE_TIMEOUT);
        config.probe_timeout = Duration::from_secs(60);
        assert_eq!(config.probe_timeout(), MAX_PROBE_TIMEOUT);
        config.probe_timeout = Duration::from_millis(1500);
        assert_eq!(config.probe_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let cases = [
            SpeedTestConfig {
                endpoints: vec![],
                ..Default::default()
            },
            SpeedTestConfig {
                upload_sizes_mb: vec![],
                ..Default::default()
            },
            SpeedTestConfig {
                download_sizes_mb: vec![1.0, 0.0],
                ..Default::default()
            },
            SpeedTestConfig {
                download_connections: 0,
                ..Default::default()
            },
            SpeedTestConfig {
                latency_probes: 0,
                ..Default::default()
            },
            SpeedTestConfig {
                update_interval: Duration::ZERO,
                ..Default::default()
            },
            SpeedTestConfig {
                fallback_latency_ms: -1.0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(SpeedTestError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Metric::from(TestType::Upload).to_string(), "upload");
        assert_eq!(Metric::Jitter.to_string(), "jitter");
        assert_eq!(Stage::from(TestType::Download).to_string(), "download");
        assert_eq!(Stage::Latency.to_string(), "ping");
        assert_eq!(TestType::Download.to_string(), "Download");
    }

    #[test]
    fn test_in_flight_states() {
        assert!(SessionState::Downloading.is_in_flight());
        assert!(!SessionState::Idle.is_in_flight());
        assert!(!SessionState::Aborted.is_in_flight());
        assert!(!SessionState::Complete.is_in_flight());
    }
}
