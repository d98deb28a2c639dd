use anyhow::Result;
use std::io::Write;

use crate::engine::types::{SessionReport, ThroughputResult};

/// Write one row per latency sample and per usable trial, followed by the
/// final figures.
pub fn write_csv<W: Write>(report: &SessionReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "test_type",
        "size_mb",
        "connections",
        "bytes",
        "elapsed_ms",
        "value",
        "weight",
    ])?;

    for sample in &report.latency.samples {
        wtr.write_record(["latency", "", "", "", "", &format!("{sample:.2}"), ""])?;
    }

    for (name, throughput) in [("download", &report.download), ("upload", &report.upload)] {
        write_trials(&mut wtr, name, throughput)?;
    }

    let r = &report.results;
    for (name, value) in [
        ("download_mbps", r.download),
        ("upload_mbps", r.upload),
        ("ping_ms", r.ping),
        ("jitter_ms", r.jitter),
        ("score", report.quality.score),
    ] {
        wtr.write_record([name, "", "", "", "", &format!("{value:.2}"), ""])?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_trials<W: Write>(
    wtr: &mut csv::Writer<W>,
    name: &str,
    throughput: &ThroughputResult,
) -> Result<()> {
    for trial in &throughput.trials {
        wtr.write_record([
            name,
            &trial.size_mb.to_string(),
            &trial.connections.to_string(),
            &trial.bytes.to_string(),
            &format!("{:.2}", trial.elapsed_ms),
            &format!("{:.2}", trial.mbps),
            &format!("{:.2}", trial.weight),
        ])?;
    }
    Ok(())
}

pub fn print_csv(report: &SessionReport) -> Result<()> {
    write_csv(report, std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::report;

    #[test]
    fn test_csv_rows() {
        let mut out = Vec::new();
        write_csv(&report(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "test_type,size_mb,connections,bytes,elapsed_ms,value,weight"
        );
        // 4 latency samples, 3 trials, 5 totals
        assert_eq!(lines.len(), 1 + 4 + 3 + 5);
        assert_eq!(lines[1], "latency,,,,,22.00,");
        assert_eq!(lines[5], "download,1,8,1048576,133.33,60.00,1.00");
        assert_eq!(lines[7], "upload,1,4,1048576,438.36,18.25,1.00");
        assert_eq!(lines[8], "download_mbps,,,,,62.50,");
        assert!(lines[12].starts_with("score,,,,,81.2"));
    }
}
