use std::time::Duration;

const MEBI: f64 = 1024.0 * 1024.0;

/// Convert a byte count moved in `elapsed` into megabits per second.
///
/// Bits are divided by a binary mega (1024²) over a decimal second, which is
/// the convention recorded baselines use. A zero duration yields 0.
pub fn bytes_to_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    if elapsed_ms <= 0.0 {
        return 0.0;
    }
    ((bytes as f64 * 8.0) / elapsed_ms) * 1000.0 / 1024.0 / 1024.0
}

/// Size in (binary) megabytes to bytes, rounded to the nearest byte.
pub fn mb_to_bytes(size_mb: f64) -> u64 {
    (size_mb * MEBI).round().max(0.0) as u64
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Format bytes into a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    match bytes {
        1_024..=1_048_575 => format!("{}KB", bytes / 1_024),
        1_048_576.. => {
            let mb = bytes as f64 / MEBI;
            if mb.fract() == 0.0 {
                format!("{mb:.0}MB")
            } else {
                format!("{mb:.2}MB")
            }
        }
        _ => format!("{bytes} bytes"),
    }
}

/// Format a size given in megabytes, e.g. `1MB` or `0.25MB`.
pub fn format_mb(size_mb: f64) -> String {
    if size_mb.fract() == 0.0 {
        format!("{size_mb:.0}MB")
    } else {
        format!("{size_mb}MB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_mebibyte_per_second_is_eight_mbps() {
        let mbps = bytes_to_mbps(1_048_576, Duration::from_secs(1));
        assert!((mbps - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_bytes_and_zero_duration() {
        assert_eq!(bytes_to_mbps(0, Duration::from_millis(250)), 0.0);
        assert_eq!(bytes_to_mbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_rate_is_monotonic_in_bytes() {
        let elapsed = Duration::from_millis(730);
        let mut last = -1.0;
        for bytes in [0u64, 1, 10, 1_000, 65_536, 1_048_576, 10_485_760] {
            let mbps = bytes_to_mbps(bytes, elapsed);
            assert!(mbps >= 0.0);
            assert!(mbps > last);
            last = mbps;
        }
    }

    #[test]
    fn test_mb_to_bytes() {
        assert_eq!(mb_to_bytes(1.0), 1_048_576);
        assert_eq!(mb_to_bytes(0.125), 131_072);
        // 1MB over 8 connections, as a download share
        assert_eq!(mb_to_bytes(1.0 / 8.0), 131_072);
        assert_eq!(mb_to_bytes(5.0 / 8.0), 655_360);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(16.666_666, 2), 16.67);
        assert_eq!(round_to(14.5, 0), 15.0);
        assert_eq!(round_to(0.0, 2), 0.0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(65_536), "64KB");
        assert_eq!(format_bytes(1_048_576), "1MB");
        assert_eq!(format_bytes(262_144 * 10), "2.50MB");
    }

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(10.0), "10MB");
        assert_eq!(format_mb(0.25), "0.25MB");
    }
}
