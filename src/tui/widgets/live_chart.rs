use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, LegendPosition};
use ratatui::Frame;

use crate::engine::types::{Metric, TestType};
use crate::tui::theme;

/// Vertical rules at each finished trial, spanning `0..top`.
pub fn boundary_lines(marks: &[(usize, f64)], top: f64) -> Vec<[(f64, f64); 2]> {
    marks
        .iter()
        .map(|&(at, _)| [(at as f64, 0.0), (at as f64, top)])
        .collect()
}

/// Upper y bound: room above the highest live sample or trial result.
pub fn y_ceiling(data: &[f64], marks: &[(usize, f64)]) -> f64 {
    data.iter()
        .chain(marks.iter().map(|(_, mbps)| mbps))
        .fold(1.0_f64, |acc, &v| acc.max(v))
        * 1.1
}

/// Live rate of the running direction, one point per update tick.
///
/// Each finished trial gets a dim rule at the tick it ended on and a dot at
/// the rate that trial was credited with.
pub fn render(
    f: &mut Frame,
    area: Rect,
    data: &[f64],
    marks: &[(usize, f64)],
    test_type: TestType,
) {
    if data.is_empty() || area.width < 10 || area.height < 4 {
        return;
    }

    let color = theme::metric_color(Metric::from(test_type));
    let top = y_ceiling(data, marks);
    let right = (data.len().max(2) - 1) as f64;

    let points: Vec<(f64, f64)> = data
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    let rules = boundary_lines(marks, top);
    let results: Vec<(f64, f64)> = marks
        .iter()
        .map(|&(at, mbps)| ((at as f64).min(right), mbps))
        .collect();

    let mut datasets: Vec<Dataset> = rules
        .iter()
        .map(|rule| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme::BORDER_COLOR))
                .data(rule)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .name(format!("{test_type} Mbps"))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points),
    );
    if !results.is_empty() {
        datasets.push(
            Dataset::default()
                .name("trial")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(
                    Style::default()
                        .fg(theme::BRIGHT_TEXT)
                        .add_modifier(Modifier::BOLD),
                )
                .data(&results),
        );
    }

    let x_axis = Axis::default()
        .bounds([0.0, right])
        .style(Style::default().fg(theme::DIM_TEXT));

    let max_y = top / 1.1;
    let y_axis = Axis::default()
        .bounds([0.0, top])
        .labels(vec![
            Span::from("0"),
            Span::from(format!("{:.0}", max_y / 2.0)),
            Span::from(format!("{max_y:.0}")),
        ])
        .style(Style::default().fg(theme::DIM_TEXT));

    let chart = Chart::new(datasets)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopLeft));
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_lines_span_the_chart() {
        let lines = boundary_lines(&[(4, 52.0), (9, 61.5)], 70.0);
        assert_eq!(
            lines,
            vec![[(4.0, 0.0), (4.0, 70.0)], [(9.0, 0.0), (9.0, 70.0)]]
        );
        assert!(boundary_lines(&[], 10.0).is_empty());
    }

    #[test]
    fn test_ceiling_covers_trial_results() {
        // a trial result above every live sample still fits
        let ceiling = y_ceiling(&[10.0, 20.0], &[(2, 40.0)]);
        assert!((ceiling - 44.0).abs() < 1e-9);
        assert!((y_ceiling(&[0.2], &[]) - 1.1).abs() < 1e-9);
    }
}
