use std::fmt::Write;

use crate::engine::store::SavedResult;

const RULE: &str = "----------------------------------------------------";

/// Plain-text report of a result, suitable for pasting or saving.
pub fn render_summary(record: &SavedResult) -> String {
    let r = &record.results;
    let q = &record.quality;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "DevSpeedTest Results - {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Download: {} Mbps ({})", r.download, q.download.label);
    let _ = writeln!(out, "Upload: {} Mbps ({})", r.upload, q.upload.label);
    let _ = writeln!(out, "Ping: {} ms ({})", r.ping, q.ping.label);
    let _ = writeln!(out, "Jitter: {} ms", r.jitter);
    let _ = writeln!(out, "{RULE}");
    if let Some(info) = &record.connection_info {
        let _ = writeln!(out, "{info}");
        let _ = writeln!(out, "{RULE}");
    }
    let _ = writeln!(out, "Overall Rating: {} ({:.0}/100)", q.overall, q.score);
    out
}

pub fn print_summary(record: &SavedResult) {
    print!("{}", render_summary(record));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::report;

    #[test]
    fn test_render_summary() {
        let text = render_summary(&SavedResult::from(&report()));
        let expected = "\
DevSpeedTest Results - 2026-03-14 09:30:00 UTC
----------------------------------------------------
Download: 62.5 Mbps (Fast)
Upload: 18.25 Mbps (Fast)
Ping: 24 ms (Good)
Jitter: 4 ms
----------------------------------------------------
IP Address: 203.0.113.7
ISP: Example Fiber
Location: Zurich, Switzerland
----------------------------------------------------
Overall Rating: Very Good (81/100)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_summary_without_connection_info() {
        let mut record = SavedResult::from(&report());
        record.connection_info = None;
        let text = render_summary(&record);
        assert!(!text.contains("ISP:"));
        assert!(text.ends_with("Overall Rating: Very Good (81/100)\n"));
    }
}
