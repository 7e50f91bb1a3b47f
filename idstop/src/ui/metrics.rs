//! Metrics page: value cards and four rolling charts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::api::DashboardApi;
use crate::history::SampleWindow;
use crate::ui::theme::percent_color;
use crate::ui::util::human;
use crate::views::MetricsView;
use crate::ws::EventSource;

pub fn draw_metrics<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &MetricsView<A, S>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    draw_cards(f, rows[0], view);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    draw_line_chart(f, top[0], "CPU Usage (%)", view.cpu(), Some(100.0), Color::Cyan);
    draw_line_chart(f, top[1], "Memory Usage (%)", view.memory(), Some(100.0), Color::Rgb(255, 159, 64));
    draw_line_chart(f, bottom[0], "Detection Latency (ms)", view.latency(), None, Color::Rgb(255, 99, 132));
    draw_bytes_chart(f, bottom[1], view.bytes());

    let summary = match view.history_peak_cpu() {
        Some(peak) => format!(
            "Last hour: {} samples | peak CPU {:.1}% | threats detected {}",
            view.history().len(),
            peak,
            view.history_threats()
        ),
        None => "Last hour: no history".into(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(Color::DarkGray))),
        rows[3],
    );
}

fn draw_cards<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &MetricsView<A, S>,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    let m = view.latest();
    let cards = [
        ("CPU", m.map(|m| format!("{:.1}%", m.cpu_percent)), m.map(|m| percent_color(m.cpu_percent))),
        ("Memory", m.map(|m| format!("{:.1}%", m.memory_percent)), m.map(|m| percent_color(m.memory_percent))),
        ("Latency", m.map(|m| format!("{:.0} ms", m.latency_ms)), None),
        ("Throughput", m.map(|m| format!("{:.2} Mbps", m.throughput_mbps)), None),
    ];
    for (slot, (title, value, fg)) in cols.iter().zip(cards) {
        let text = Line::from(Span::styled(
            value.unwrap_or_else(|| "--".into()),
            Style::default()
                .fg(fg.unwrap_or(Color::White))
                .add_modifier(Modifier::BOLD),
        ));
        let p = Paragraph::new(text)
            .centered()
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, *slot);
    }
}

fn draw_line_chart(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    series: &SampleWindow<f64>,
    y_max: Option<f64>,
    color: Color,
) {
    let data: Vec<(f64, f64)> = series
        .values()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let top = y_max.unwrap_or_else(|| data.iter().map(|p| p.1).fold(1.0, f64::max) * 1.1);
    let x_max = (series.capacity().max(2) - 1) as f64;

    let now = series.latest().map(|v| format!(" (now: {v:.1})")).unwrap_or_default();
    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data)];
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(format!("{title}{now}")))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(series.first_label().unwrap_or("").to_string()),
                    Span::raw(series.last_label().unwrap_or("").to_string()),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, top])
                .labels(vec![Span::raw("0"), Span::raw(format!("{top:.0}"))])
                .style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(chart, area);
}

fn draw_bytes_chart(f: &mut ratatui::Frame<'_>, area: Rect, series: &SampleWindow<(u64, u64)>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::raw("Network (bytes/sample) "),
            Span::styled("■ sent ", Style::default().fg(Color::Rgb(75, 192, 192))),
            Span::styled("■ received", Style::default().fg(Color::Rgb(255, 99, 132))),
        ]));

    // Each group takes two 1-col bars plus a gap
    let fit = (area.width.saturating_sub(2) / 3) as usize;
    let start = series.len().saturating_sub(fit);
    let mut chart = BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);
    for (_, &(sent, recv)) in series.iter().skip(start) {
        let group = BarGroup::default().bars(&[
            Bar::default()
                .value(sent)
                .text_value(human(sent))
                .style(Style::default().fg(Color::Rgb(75, 192, 192))),
            Bar::default()
                .value(recv)
                .text_value(human(recv))
                .style(Style::default().fg(Color::Rgb(255, 99, 132))),
        ]);
        chart = chart.data(group);
    }
    f.render_widget(chart, area);
}
