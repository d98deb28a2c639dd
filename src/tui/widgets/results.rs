use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::engine::quality::Tier;
use crate::engine::types::{Metric, SessionReport};
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, report: &SessionReport) {
    if area.height < 6 {
        return;
    }

    let mut y = area.y;
    let bottom = area.y + area.height;

    let hero_area = Rect {
        x: area.x,
        y,
        width: area.width,
        height: 3,
    };
    render_hero(f, hero_area, report);
    y += 4;

    if bottom.saturating_sub(y) >= 5 {
        let table_area = Rect {
            x: area.x + 1,
            y,
            width: area.width.saturating_sub(2),
            height: 4,
        };
        render_quality_table(f, table_area, report);
        y += 5;
    }

    if bottom.saturating_sub(y) >= 2 {
        let q = &report.quality;
        let rating = Line::from(vec![
            Span::styled("Overall ", Style::default().fg(theme::DIM_TEXT)),
            Span::styled(
                q.overall.to_string(),
                Style::default()
                    .fg(theme::rating_color(q.overall))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {:.0}/100", q.score),
                Style::default().fg(theme::DIM_TEXT),
            ),
        ]);
        let rating_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height: 1,
        };
        f.render_widget(
            Paragraph::new(rating).alignment(Alignment::Center),
            rating_area,
        );
        y += 2;
    }

    if let Some(info) = &report.connection_info {
        if bottom.saturating_sub(y) >= 2 {
            let line = Line::from(Span::styled(
                format!("{} · {} · {}", info.ip, info.isp, info.location),
                Style::default().fg(theme::DIM_TEXT),
            ));
            let info_area = Rect {
                x: area.x,
                y,
                width: area.width,
                height: 1,
            };
            f.render_widget(Paragraph::new(line).alignment(Alignment::Center), info_area);
        }
    }

    let hint_area = Rect {
        x: area.x,
        y: bottom - 1,
        width: area.width,
        height: 1,
    };
    let hint = Paragraph::new(Line::from(Span::styled(
        "r run again · q quit",
        Style::default().fg(theme::DIM_TEXT),
    )))
    .alignment(Alignment::Center);
    f.render_widget(hint, hint_area);
}

fn render_hero(f: &mut Frame, area: Rect, report: &SessionReport) {
    let r = &report.results;
    let col_width = (area.width / 4) as usize;
    let columns = [
        (Metric::Download, "↓ DOWNLOAD", format!("{:.2} Mbps", r.download)),
        (Metric::Upload, "↑ UPLOAD", format!("{:.2} Mbps", r.upload)),
        (Metric::Ping, "⏱ PING", format!("{:.0} ms", r.ping)),
        (Metric::Jitter, "~ JITTER", format!("{:.0} ms", r.jitter)),
    ];

    let mut spans_top = Vec::new();
    let mut spans_mid = Vec::new();
    for (metric, title, value) in columns {
        let color = theme::metric_color(metric);
        spans_top.push(Span::styled(
            pad_center(title, col_width),
            Style::default().fg(color),
        ));
        spans_mid.push(Span::styled(
            pad_center(&value, col_width),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let lines = vec![
        Line::from(spans_top),
        Line::from(vec![]),
        Line::from(spans_mid),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_quality_table(f: &mut Frame, area: Rect, report: &SessionReport) {
    let q = &report.quality;
    let row = |metric: Metric, tier: &Tier| {
        Row::new(vec![
            Cell::from(Span::styled(
                metric.to_string(),
                Style::default().fg(theme::metric_color(metric)),
            )),
            Cell::from(Span::styled(
                tier.label.clone(),
                Style::default()
                    .fg(theme::BRIGHT_TEXT)
                    .add_modifier(Modifier::BOLD),
            )),
            Cell::from(Span::styled(
                tier.description.clone(),
                Style::default().fg(theme::DIM_TEXT),
            )),
        ])
    };
    let rows = vec![
        row(Metric::Download, &q.download),
        row(Metric::Upload, &q.upload),
        row(Metric::Ping, &q.ping),
    ];

    let header = Row::new(vec![
        Cell::from(Span::styled("quality", Style::default().fg(theme::DIM_TEXT))),
        Cell::from(Span::raw("")),
        Cell::from(Span::raw("")),
    ]);
    let widths = [
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths).header(header);
    f.render_widget(table, area);
}

fn pad_center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{s}{}", " ".repeat(pad), " ".repeat(width - len - pad))
}
