//! Top header (backend, controller, push channel state, tabs) and the footer
//! notice/key-hint line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
};

use crate::app::{Notice, Tab};
use crate::types::BackendStatus;

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    base_url: &str,
    status: Option<&BackendStatus>,
    push_live: bool,
    tab: Tab,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let controller = status
        .map(|s| s.controller.as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or("unknown");
    let controller_fg = if controller == "connected" { Color::Green } else { Color::Yellow };
    let (push_txt, push_fg) = if push_live { ("live", Color::Green) } else { ("polling only", Color::Yellow) };
    let title = Line::from(vec![
        Span::styled("idstop", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | backend: {base_url} | controller: ")),
        Span::styled(controller.to_string(), Style::default().fg(controller_fg)),
        Span::raw(" | push: "),
        Span::styled(push_txt, Style::default().fg(push_fg)),
        Span::raw("  (press 'q' to quit)"),
    ]);
    f.render_widget(Paragraph::new(title), rows[0]);

    let tabs = Tabs::new(Tab::ALL.iter().enumerate().map(|(i, t)| format!("{} {}", i + 1, t.title())))
        .select(tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED));
    f.render_widget(tabs, rows[1]);
}

pub fn draw_footer(f: &mut ratatui::Frame<'_>, area: Rect, notice: Option<&Notice>, hints: &str) {
    let line = match notice {
        Some(n) => {
            let fg = if n.ok { Color::Green } else { Color::Red };
            Line::from(Span::styled(n.text.clone(), Style::default().fg(fg)))
        }
        None => Line::from(Span::styled(hints.to_string(), Style::default().fg(Color::DarkGray))),
    };
    f.render_widget(Paragraph::new(line), area);
}
