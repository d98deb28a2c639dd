use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::app::{App, Phase};
use super::theme;
use super::widgets;
use crate::engine::types::{Metric, TestType};

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_COLOR));
    f.render_widget(block, size);

    let inner = Rect {
        x: size.x + 2,
        y: size.y + 1,
        width: size.width.saturating_sub(4),
        height: size.height.saturating_sub(2),
    };

    if inner.height < 3 || inner.width < 20 {
        return;
    }

    // Layout: header (1) | phase (1) | content (flex) | progress (1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(inner);

    widgets::header::render(f, chunks[0], app);
    render_phase_label(f, chunks[1], app);

    let content = chunks[2];
    match app.phase {
        Phase::Connecting | Phase::Selecting | Phase::ConnectionInfo => {
            render_message(f, content, &app.status, theme::DIM_TEXT);
        }
        Phase::Latency => render_latency(f, content, app),
        Phase::Download | Phase::Upload => render_throughput(f, content, app),
        Phase::Results => match &app.report {
            Some(report) => widgets::results::render(f, content, report),
            None => render_message(f, content, &app.status, theme::DIM_TEXT),
        },
        Phase::Aborted => render_message(
            f,
            content,
            "Test aborted · r run again · q quit",
            theme::DIM_TEXT,
        ),
        Phase::Failed => {
            let msg = format!(
                "{} · r retry · q quit",
                app.errors.last().map(String::as_str).unwrap_or("Test failed")
            );
            render_message(f, content, &msg, theme::ERROR_COLOR);
        }
    }

    widgets::progress::render(f, chunks[3], app);
}

fn render_phase_label(f: &mut Frame, area: Rect, app: &App) {
    let (label, color) = match app.phase {
        Phase::Connecting => ("STARTING", theme::DIM_TEXT),
        Phase::Selecting => ("SERVER", theme::DIM_TEXT),
        Phase::Latency => ("PING", theme::LATENCY_COLOR),
        Phase::Download => ("DOWNLOAD", theme::DOWNLOAD_COLOR),
        Phase::Upload => ("UPLOAD", theme::UPLOAD_COLOR),
        Phase::ConnectionInfo => ("CONNECTION", theme::DIM_TEXT),
        Phase::Results => ("RESULTS", theme::BRIGHT_TEXT),
        Phase::Aborted => ("ABORTED", theme::DIM_TEXT),
        Phase::Failed => ("FAILED", theme::ERROR_COLOR),
    };

    let line = Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(line), area);
}

fn render_message(f: &mut Frame, area: Rect, text: &str, color: ratatui::style::Color) {
    let msg = Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color),
    )))
    .alignment(Alignment::Center);

    let centered = Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1,
    };
    f.render_widget(msg, centered);
}

fn render_latency(f: &mut Frame, area: Rect, app: &App) {
    let ping = app.ping.unwrap_or(0.0);
    let done = app.ping_averages.len();

    if area.height < 7 {
        widgets::speed_gauge::render(f, area, Metric::Ping, ping);
        return;
    }

    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);
    let gauges = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    widgets::speed_gauge::render(f, gauges[0], Metric::Ping, ping);
    widgets::speed_gauge::render(f, gauges[1], Metric::Jitter, app.jitter.unwrap_or(0.0));
    widgets::latency_plot::render(
        f,
        chunks[1],
        &app.ping_averages,
        done,
        app.latency_total,
        app.jitter,
    );
}

fn render_throughput(f: &mut Frame, area: Rect, app: &App) {
    let test_type = app.current_test_type.unwrap_or(TestType::Download);
    let metric = Metric::from(test_type);

    if area.height < 6 {
        // Small terminal: just show speed gauge
        widgets::speed_gauge::render(f, area, metric, app.current_mbps);
        return;
    }

    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);

    widgets::speed_gauge::render(f, chunks[0], metric, app.current_mbps);
    widgets::live_chart::render(f, chunks[1], &app.chart_data, &app.trial_marks, test_type);
}
