use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Sparkline};
use ratatui::Frame;

use crate::tui::theme;

/// Running-average latency after each probe as a sparkline, with the
/// current figures below. Individual samples are only in the final report.
pub fn render(
    f: &mut Frame,
    area: Rect,
    history: &[f64],
    done: usize,
    total: u32,
    jitter: Option<f64>,
) {
    if area.height < 3 {
        return;
    }

    let spark_height = area.height.saturating_sub(2).min(4);
    let spark_area = Rect {
        x: area.x + 2,
        y: area.y,
        width: area.width.saturating_sub(4),
        height: spark_height,
    };

    if !history.is_empty() {
        // Sparkline wants integers; keep a tenth of a millisecond
        let spark_data: Vec<u64> = history.iter().map(|&v| (v * 10.0) as u64).collect();
        let sparkline = Sparkline::default()
            .data(&spark_data)
            .style(Style::default().fg(theme::LATENCY_COLOR));
        f.render_widget(sparkline, spark_area);
    }

    let stats_area = Rect {
        x: area.x,
        y: area.y + spark_height + 1,
        width: area.width,
        height: 1,
    };

    let current = history.last().copied().unwrap_or(0.0);
    let mut spans = vec![
        Span::styled(
            format!("{current:.1} ms"),
            Style::default().fg(theme::LATENCY_COLOR),
        ),
        Span::styled(" avg    ", Style::default().fg(theme::DIM_TEXT)),
    ];
    if let Some(jitter) = jitter {
        spans.push(Span::styled(
            format!("{jitter:.0} ms"),
            Style::default().fg(theme::JITTER_COLOR),
        ));
        spans.push(Span::styled(" jitter    ", Style::default().fg(theme::DIM_TEXT)));
    }
    spans.push(Span::styled(
        format!("{done}/{total} probes"),
        Style::default().fg(theme::DIM_TEXT),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(paragraph, stats_area);
}
