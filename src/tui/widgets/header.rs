use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::app::App;
use crate::tui::theme;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = Span::styled(
        " DEVSPEEDTEST ",
        Style::default()
            .fg(theme::HEADER_COLOR)
            .add_modifier(Modifier::BOLD),
    );

    let info = match (&app.server, app.report.as_ref().and_then(|r| r.connection_info.as_ref())) {
        (Some(server), Some(meta)) => format!(" {server} · {} · {} ", meta.isp, meta.ip),
        (Some(server), None) => format!(" {server} "),
        (None, _) => " Selecting server... ".to_string(),
    };

    let line = Line::from(vec![
        title,
        Span::raw("  "),
        Span::styled(info, Style::default().fg(theme::DIM_TEXT)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
