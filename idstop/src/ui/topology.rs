//! Topology page: force-directed canvas plus node details and counts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Paragraph,
    },
};

use crate::api::DashboardApi;
use crate::types::{NodeKind, NodeStatus};
use crate::ui::theme::{edge_color, node_color, SUSPICIOUS};
use crate::views::TopologyView;

pub fn draw_topology<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &TopologyView<A>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);
    draw_graph(f, cols[0], view);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(cols[1]);
    draw_summary(f, side[0], view);
    draw_details(f, side[1], view);
}

fn draw_graph<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &TopologyView<A>) {
    let graph = view.graph();
    let pos = view.positions();
    let half = 0.55 / view.zoom();
    let selected = view.selected_index();
    let peak = view.peak_weight();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Network Topology (zoom {:.2}x)", view.zoom())),
        )
        .marker(Marker::Braille)
        .x_bounds([0.5 - half, 0.5 + half])
        .y_bounds([0.5 - half, 0.5 + half])
        .paint(move |ctx| {
            let at = |id: &str| {
                graph
                    .nodes
                    .iter()
                    .position(|n| n.id == id)
                    .and_then(|i| pos.get(i).copied())
            };
            for e in &graph.edges {
                if let (Some(a), Some(b)) = (at(&e.from), at(&e.to)) {
                    ctx.draw(&CanvasLine {
                        x1: a.0,
                        y1: a.1,
                        x2: b.0,
                        y2: b.1,
                        color: if e.suspicious { SUSPICIOUS } else { edge_color(e.weight, peak) },
                    });
                }
            }
            ctx.layer();
            for (i, (node, &(x, y))) in graph.nodes.iter().zip(pos.iter()).enumerate() {
                let glyph = match node.kind {
                    NodeKind::Switch => "■",
                    NodeKind::Host => "●",
                };
                let mut style = Style::default().fg(node_color(node));
                if selected == Some(i) {
                    style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                }
                ctx.print(x, y, Span::styled(format!("{glyph} {}", node.label), style));
            }
        });
    f.render_widget(canvas, area);
}

fn draw_summary<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &TopologyView<A>) {
    let s = view.summary();
    let lines = vec![
        Line::from(format!("Switches: {}", s.switches)),
        Line::from(format!("Hosts:    {}", s.hosts)),
        Line::from(format!("Links:    {}", s.links)),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Statistics")),
        area,
    );
}

fn draw_details<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, view: &TopologyView<A>) {
    let block = Block::default().borders(Borders::ALL).title("Node Details");
    let Some(d) = view.details() else {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Select a node with ↑/↓",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(hint, area);
        return;
    };
    let (status, status_fg) = match d.status {
        NodeStatus::Suspicious => ("Suspicious", SUSPICIOUS),
        NodeStatus::Normal => ("Active", Color::Green),
    };
    let lines = vec![
        Line::from(format!("ID:     {}", d.id)),
        Line::from(format!("Label:  {}", d.label)),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(status, Style::default().fg(status_fg)),
        ]),
        Line::from(format!("Type:   {}", d.title)),
        Line::from(format!("Links:  {}", d.degree)),
        Line::from(format!("Traffic: {:.1}", d.traffic)),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}
