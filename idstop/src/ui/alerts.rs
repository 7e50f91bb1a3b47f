//! Alert log page: filter bar, paginated table, pagination bar.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::api::DashboardApi;
use crate::app::FilterField;
use crate::ui::theme::severity_color;
use crate::ui::util::{local_time, truncate_middle};
use crate::views::AlertsView;

const COLS: [Constraint; 9] = [
    Constraint::Length(19), // Time
    Constraint::Length(8),  // Severity
    Constraint::Length(14), // Type
    Constraint::Length(15), // Source
    Constraint::Length(15), // Dest
    Constraint::Length(11), // Ports
    Constraint::Length(5),  // Proto
    Constraint::Min(20),    // Signature
    Constraint::Length(8),  // Status
];

pub fn draw_alerts<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &AlertsView<A>,
    editing: Option<(FilterField, &str)>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    draw_filter_bar(f, rows[0], view, editing);
    draw_table(f, rows[1], view);
    draw_pagination(f, rows[2], view);
}

fn draw_filter_bar<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &AlertsView<A>,
    editing: Option<(FilterField, &str)>,
) {
    let filters = view.filters();
    let sev = filters
        .severity
        .map(|s| format!("{} ({})", s.level(), s.label()))
        .unwrap_or_else(|| "All".into());

    let field = |which: FilterField, current: Option<&str>| -> Span<'static> {
        match editing {
            Some((w, buf)) if w == which => Span::styled(
                format!("{buf}_"),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ),
            _ => Span::styled(
                current.filter(|s| !s.is_empty()).unwrap_or("*").to_string(),
                Style::default().fg(Color::Cyan),
            ),
        }
    };

    let line = Line::from(vec![
        Span::raw("[s] Severity: "),
        Span::styled(sev, Style::default().fg(Color::Cyan)),
        Span::raw("   [t] Type: "),
        field(FilterField::Kind, filters.kind.as_deref()),
        Span::raw("   [i] IP: "),
        field(FilterField::Ip, filters.ip.as_deref()),
        Span::raw(format!("   {} matching", view.alerts().len())),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(p, area);
}

fn draw_table<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &AlertsView<A>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Alerts (page {} of {})", view.page(), view.total_pages().max(1)));

    let page = view.page_rows();
    if page.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No alerts",
            Style::default().fg(Color::DarkGray),
        )))
        .centered()
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let sig_w = area.width.saturating_sub(100).max(20) as usize;
    let rows = page.iter().enumerate().map(|(i, a)| {
        let (status, status_fg) = if a.blocked {
            ("Blocked", Color::Red)
        } else {
            ("Detected", Color::Yellow)
        };
        let row = Row::new(vec![
            Cell::from(local_time(&a.timestamp)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(a.severity.label()).style(Style::default().fg(severity_color(a.severity))),
            Cell::from(a.kind.clone()),
            Cell::from(a.source_ip.clone()),
            Cell::from(a.destination_ip.clone()),
            Cell::from(a.port_pair()),
            Cell::from(a.protocol.clone()),
            Cell::from(truncate_middle(&a.signature, sig_w)),
            Cell::from(status).style(Style::default().fg(status_fg)),
        ]);
        if i == view.selected_index() {
            row.style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            row
        }
    });

    let header = Row::new(vec![
        "Time", "Severity", "Type", "Source", "Destination", "Ports", "Proto", "Signature", "Status",
    ])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, COLS.to_vec())
        .header(header)
        .column_spacing(1)
        .block(block);
    f.render_widget(table, area);
}

fn draw_pagination<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &AlertsView<A>) {
    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(
        "< Previous ",
        if view.has_prev() { enabled } else { disabled },
    )];
    for p in view.page_links() {
        let style = if p == view.page() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::REVERSED)
        } else {
            enabled
        };
        spans.push(Span::styled(format!(" {p} "), style));
    }
    spans.push(Span::styled(
        " Next >",
        if view.has_next() { enabled } else { disabled },
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
