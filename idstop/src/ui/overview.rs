//! Overview page: counters, CPU/memory gauges, CPU sparkline, attack mix and
//! the most recent alerts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph, Sparkline},
};

use crate::api::DashboardApi;
use crate::ui::theme::{percent_color, severity_color};
use crate::ui::util::clock_time;
use crate::views::overview::ATTACK_FAMILIES;
use crate::views::OverviewView;
use crate::ws::EventSource;

pub fn draw_overview<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &OverviewView<A, S>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(9), Constraint::Min(6)])
        .split(area);

    draw_counters(f, rows[0], view);

    let mid = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    draw_resources(f, mid[0], view);
    draw_attack_mix(f, mid[1], view);

    draw_recent_alerts(f, rows[2], view);
}

fn draw_counters<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &OverviewView<A, S>,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    let stats = view.statistics();
    let topo = view.topology();
    let cards = [
        ("Active Threats", view.active_threats().to_string(), Color::Red),
        ("Switches", topo.map_or(stats.switches as usize, |t| t.switches).to_string(), Color::Rgb(0xFF, 0x98, 0x00)),
        ("Active Flows", stats.total_flows.to_string(), Color::Cyan),
        (
            "Hosts / Links",
            topo.map(|t| format!("{} / {}", t.hosts, t.links))
                .unwrap_or_else(|| format!("{} / {}", stats.hosts, stats.links)),
            Color::Rgb(0x21, 0x96, 0xF3),
        ),
    ];
    for (slot, (title, value, fg)) in cols.iter().zip(cards) {
        let p = Paragraph::new(Span::styled(value, Style::default().fg(fg).add_modifier(Modifier::BOLD)))
            .centered()
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, *slot);
    }
}

fn draw_resources<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &OverviewView<A, S>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let (cpu, mem) = view
        .metrics()
        .map(|m| (m.cpu_percent, m.memory_percent))
        .unwrap_or((0.0, 0.0));
    for (slot, title, pct) in [(rows[0], "CPU", cpu), (rows[1], "Memory", mem)] {
        let clamped = pct.clamp(0.0, 100.0);
        let g = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(Style::default().fg(percent_color(clamped)))
            .ratio(clamped / 100.0)
            .label(format!("{clamped:.1}%"));
        f.render_widget(g, slot);
    }

    let max_points = rows[2].width.saturating_sub(2) as usize;
    let start = view.traffic().len().saturating_sub(max_points);
    let data: Vec<u64> = view
        .traffic()
        .values()
        .skip(start)
        .map(|v| v.clamp(0.0, 100.0).round() as u64)
        .collect();
    let spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("CPU trend"))
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(spark, rows[2]);
}

fn draw_attack_mix<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &OverviewView<A, S>,
) {
    let counts = view.attack_distribution();
    let bars: Vec<Bar> = ATTACK_FAMILIES
        .iter()
        .zip(counts)
        .map(|(name, n)| Bar::default().label(Line::from(*name)).value(n))
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Attack Types"))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Red))
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn draw_recent_alerts<A: DashboardApi, S: EventSource>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &OverviewView<A, S>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Recent Alerts ({} buffered)", view.buffered_alerts()));
    let mut lines: Vec<Line> = Vec::new();
    for a in view.recent_alerts() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", a.severity.label()),
                Style::default()
                    .fg(severity_color(a.severity))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(a.signature.clone()),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "  {}:{} → {}:{}  {}",
                a.source_ip,
                a.source_port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                a.destination_ip,
                a.destination_port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                clock_time(&a.timestamp)
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No recent alerts",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}
