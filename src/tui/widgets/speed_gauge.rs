use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::Frame;

use crate::engine::types::Metric;
use crate::tui::theme;

/// Fill level of a metric's gauge, 0-100.
///
/// Rates fill linearly up to 100 Mbps down and 50 Mbps up. Ping and jitter
/// are inverted so that lower is fuller, bottoming out at 200ms and 50ms.
pub fn gauge_percentage(metric: Metric, value: f64) -> f64 {
    let pct = match metric {
        Metric::Download => value,
        Metric::Upload => value * 2.0,
        Metric::Ping => 100.0 - value / 2.0,
        Metric::Jitter => 100.0 - value * 2.0,
    };
    pct.clamp(0.0, 100.0)
}

fn unit(metric: Metric) -> &'static str {
    match metric {
        Metric::Download | Metric::Upload => "Mbps",
        Metric::Ping | Metric::Jitter => "ms",
    }
}

pub fn render(f: &mut Frame, area: Rect, metric: Metric, value: f64) {
    let color = theme::metric_color(metric);
    let label = match metric {
        Metric::Download | Metric::Upload => format!("{value:.1} {}", unit(metric)),
        Metric::Ping | Metric::Jitter => format!("{value:.0} {}", unit(metric)),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::BORDER_COLOR))
                .title(Span::styled(
                    format!(" {} ", metric.to_string().to_uppercase()),
                    Style::default().fg(color),
                )),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(gauge_percentage(metric, value) / 100.0)
        .label(Span::styled(
            label,
            Style::default()
                .fg(theme::BRIGHT_TEXT)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, area);
}
