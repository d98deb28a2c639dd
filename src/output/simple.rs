use crate::engine::types::SessionReport;

/// One-line summary: "↓ 450.00 Mbps  ↑ 120.00 Mbps  ⏱ 12ms  ± 3ms  Very Good"
pub fn format_simple(report: &SessionReport) -> String {
    let r = &report.results;
    format!(
        "↓ {:.2} Mbps  ↑ {:.2} Mbps  ⏱ {}ms  ± {}ms  {}",
        r.download, r.upload, r.ping, r.jitter, report.quality.overall
    )
}

pub fn print_simple(report: &SessionReport) {
    println!("{}", format_simple(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::report;

    #[test]
    fn test_format_simple() {
        assert_eq!(
            format_simple(&report()),
            "↓ 62.50 Mbps  ↑ 18.25 Mbps  ⏱ 24ms  ± 4ms  Very Good"
        );
    }
}
