use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::engine::units::format_mb;
use crate::tui::app::{App, Phase};
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let progress = app.overall_progress();
    let bar_width = area.width.saturating_sub(24) as usize;
    let filled = (progress * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let label = match app.phase {
        Phase::Latency => format!("Ping {:.0}%", app.stage_percent),
        Phase::Download | Phase::Upload => {
            let size = app.current_size_mb.map(format_mb).unwrap_or_default();
            format!(
                "{} {} · {}/{}",
                app.current_test_type
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                size,
                app.trials_done,
                app.trials_total
            )
        }
        _ => app.status.clone(),
    };
    let label_color = match app.phase {
        Phase::Failed => theme::ERROR_COLOR,
        _ => theme::DIM_TEXT,
    };

    let line = Line::from(vec![
        Span::styled("▰".repeat(filled), Style::default().fg(theme::HEADER_COLOR)),
        Span::styled("▱".repeat(empty), Style::default().fg(theme::DIM_TEXT)),
        Span::raw("  "),
        Span::styled(label, Style::default().fg(label_color)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
