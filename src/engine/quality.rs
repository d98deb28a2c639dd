//! Quality model: per-metric tiers plus a 0-100 composite score.
//!
//! Both parts are pure functions of the final download/upload/ping numbers.
//! Thresholds and slopes are fixed so that assessments stay comparable with
//! previously recorded results.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::ResultSet;

struct Band {
    /// Upper bound, exclusive.
    threshold: f64,
    label: &'static str,
    description: &'static str,
}

const DOWNLOAD_BANDS: [Band; 5] = [
    Band {
        threshold: 5.0,
        label: "Very Slow",
        description: "Suitable for basic web browsing only",
    },
    Band {
        threshold: 15.0,
        label: "Slow",
        description: "Adequate for web browsing and SD video",
    },
    Band {
        threshold: 40.0,
        label: "Good",
        description: "Good for HD video and small households",
    },
    Band {
        threshold: 100.0,
        label: "Fast",
        description: "Great for multiple users and 4K streaming",
    },
    Band {
        threshold: f64::INFINITY,
        label: "Very Fast",
        description:
            "Excellent for all activities including multiple 4K streams and large downloads",
    },
];

const UPLOAD_BANDS: [Band; 5] = [
    Band {
        threshold: 1.0,
        label: "Very Slow",
        description: "Minimal for basic uploads",
    },
    Band {
        threshold: 5.0,
        label: "Slow",
        description: "Adequate for social media and basic video calls",
    },
    Band {
        threshold: 10.0,
        label: "Good",
        description: "Good for video calls and uploading media",
    },
    Band {
        threshold: 20.0,
        label: "Fast",
        description: "Great for HD video calls and cloud backups",
    },
    Band {
        threshold: f64::INFINITY,
        label: "Very Fast",
        description: "Excellent for content creators and large file sharing",
    },
];

const PING_BANDS: [Band; 5] = [
    Band {
        threshold: 20.0,
        label: "Excellent",
        description: "Perfect for competitive gaming and real-time applications",
    },
    Band {
        threshold: 50.0,
        label: "Good",
        description: "Great for online gaming and video calls",
    },
    Band {
        threshold: 100.0,
        label: "Average",
        description: "Suitable for most everyday activities",
    },
    Band {
        threshold: 150.0,
        label: "Poor",
        description: "May experience lag in real-time applications",
    },
    Band {
        threshold: f64::INFINITY,
        label: "Very Poor",
        description: "Significant delays in interactive applications",
    },
];

/// Label and description for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub label: String,
    pub description: String,
}

/// Six-level overall rating derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Rating::Excellent
        } else if score >= 75.0 {
            Rating::VeryGood
        } else if score >= 60.0 {
            Rating::Good
        } else if score >= 40.0 {
            Rating::Fair
        } else if score >= 20.0 {
            Rating::Poor
        } else {
            Rating::VeryPoor
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Excellent => "Excellent",
            Rating::VeryGood => "Very Good",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
            Rating::VeryPoor => "Very Poor",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub download: Tier,
    pub upload: Tier,
    pub ping: Tier,
    pub score: f64,
    pub overall: Rating,
}

/// Assess a result set.
pub fn assess(results: &ResultSet) -> QualityAssessment {
    let score = composite_score(results.download, results.upload, results.ping);
    QualityAssessment {
        download: find_tier(results.download, &DOWNLOAD_BANDS),
        upload: find_tier(results.upload, &UPLOAD_BANDS),
        ping: find_tier(results.ping, &PING_BANDS),
        score,
        overall: Rating::from_score(score),
    }
}

/// First band whose threshold is strictly greater than `value`.
fn find_tier(value: f64, bands: &[Band]) -> Tier {
    let band = bands
        .iter()
        .find(|band| value < band.threshold)
        .unwrap_or(&bands[bands.len() - 1]);
    Tier {
        label: band.label.to_string(),
        description: band.description.to_string(),
    }
}

pub fn composite_score(download: f64, upload: f64, ping: f64) -> f64 {
    download_score(download) + upload_score(upload) + ping_score(ping)
}

/// 0-50 points.
pub fn download_score(d: f64) -> f64 {
    if d >= 100.0 {
        50.0
    } else if d >= 50.0 {
        40.0 + (d - 50.0) * 0.2
    } else if d >= 25.0 {
        30.0 + (d - 25.0) * 0.4
    } else if d >= 10.0 {
        20.0 + (d - 10.0) * 0.67
    } else if d >= 5.0 {
        10.0 + (d - 5.0)
    } else {
        d * 2.0
    }
}

/// 0-30 points.
pub fn upload_score(u: f64) -> f64 {
    if u >= 50.0 {
        30.0
    } else if u >= 20.0 {
        25.0 + (u - 20.0) * 0.17
    } else if u >= 10.0 {
        20.0 + (u - 10.0) * 0.5
    } else if u >= 5.0 {
        15.0 + (u - 5.0)
    } else if u >= 1.0 {
        5.0 + u * 2.5
    } else {
        u * 5.0
    }
}

/// 0-20 points, lower latency scores higher.
pub fn ping_score(p: f64) -> f64 {
    if p <= 10.0 {
        20.0
    } else if p <= 20.0 {
        18.0 - (p - 10.0) * 0.2
    } else if p <= 50.0 {
        15.0 - (p - 20.0) * 0.1
    } else if p <= 100.0 {
        12.0 - (p - 50.0) * 0.06
    } else if p <= 200.0 {
        7.0 - (p - 100.0) * 0.03
    } else {
        (4.0 - (p - 200.0) * 0.01).max(0.0)
    }
}
