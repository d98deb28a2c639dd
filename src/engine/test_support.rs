use chrono::{TimeZone, Utc};

use super::endpoint::Endpoint;
use super::quality::assess;
use super::types::{
    ConnectionMetadata, LatencyResult, ResultSet, SessionReport, ThroughputResult, TrialResult,
};

fn trial(size_mb: f64, mbps: f64, connections: u32) -> TrialResult {
    TrialResult {
        size_mb,
        mbps,
        weight: size_mb,
        bytes: (size_mb * 1_048_576.0) as u64,
        elapsed_ms: size_mb * 8.0 / mbps * 1000.0,
        connections,
    }
}

/// A finished session with fixed numbers for formatter tests.
pub(crate) fn report() -> SessionReport {
    let results = ResultSet {
        download: 62.5,
        upload: 18.25,
        ping: 24.0,
        jitter: 4.0,
    };
    SessionReport {
        timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        endpoint: Endpoint::new("http://127.0.0.1:8080", "/bytes/", "/upload", "/ping"),
        results,
        latency: LatencyResult {
            ping_ms: 24.0,
            jitter_ms: 4.0,
            samples: vec![22.0, 26.0, 22.0, 26.0],
            failed_probes: 0,
        },
        download: ThroughputResult {
            mbps: 62.5,
            trials: vec![trial(1.0, 60.0, 8), trial(2.0, 63.75, 8)],
            discarded: 0,
        },
        upload: ThroughputResult {
            mbps: 18.25,
            trials: vec![trial(1.0, 18.25, 4)],
            discarded: 1,
        },
        connection_info: Some(ConnectionMetadata {
            ip: "203.0.113.7".to_string(),
            isp: "Example Fiber".to_string(),
            location: "Zurich, Switzerland".to_string(),
        }),
        quality: assess(&results),
    }
}
