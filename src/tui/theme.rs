use ratatui::style::Color;

use crate::engine::quality::Rating;
use crate::engine::types::Metric;

/// Teal for download indicators.
pub const DOWNLOAD_COLOR: Color = Color::Rgb(0, 200, 170);

/// Blue for upload indicators.
pub const UPLOAD_COLOR: Color = Color::Rgb(100, 180, 255);

/// Green for latency indicators.
pub const LATENCY_COLOR: Color = Color::Rgb(130, 220, 130);

/// Violet for jitter indicators.
pub const JITTER_COLOR: Color = Color::Rgb(190, 140, 255);

/// Muted text.
pub const DIM_TEXT: Color = Color::DarkGray;

/// Bright white for hero numbers.
pub const BRIGHT_TEXT: Color = Color::White;

/// Border color.
pub const BORDER_COLOR: Color = Color::Rgb(80, 80, 80);

/// Header accent.
pub const HEADER_COLOR: Color = Color::Rgb(0, 200, 170);

pub const ERROR_COLOR: Color = Color::Rgb(235, 90, 90);

pub fn metric_color(metric: Metric) -> Color {
    match metric {
        Metric::Download => DOWNLOAD_COLOR,
        Metric::Upload => UPLOAD_COLOR,
        Metric::Ping => LATENCY_COLOR,
        Metric::Jitter => JITTER_COLOR,
    }
}

pub fn rating_color(rating: Rating) -> Color {
    match rating {
        Rating::Excellent | Rating::VeryGood => Color::Rgb(80, 220, 120),
        Rating::Good => Color::Rgb(170, 220, 90),
        Rating::Fair => Color::Rgb(240, 200, 80),
        Rating::Poor => Color::Rgb(245, 140, 60),
        Rating::VeryPoor => ERROR_COLOR,
    }
}
