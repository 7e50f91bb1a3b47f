//! Shared UI theme constants.

use ratatui::style::Color;

use crate::types::{Node, NodeKind, NodeStatus, Severity};

// Topology palette
pub const SWITCH: Color = Color::Rgb(0xFF, 0x98, 0x00);
pub const HOST: Color = Color::Rgb(0x21, 0x96, 0xF3);
pub const SUSPICIOUS: Color = Color::Rgb(0xF4, 0x43, 0x36);
pub const EDGE: Color = Color::Rgb(0x99, 0x99, 0x99);

pub fn severity_color(s: Severity) -> Color {
    match s {
        Severity::Critical => Color::Red,
        Severity::High => Color::Yellow,
        Severity::Medium => Color::Cyan,
        Severity::Low => Color::Gray,
    }
}

/// Suspicious status wins over the per-kind color.
pub fn node_color(node: &Node) -> Color {
    if node.status == NodeStatus::Suspicious {
        return SUSPICIOUS;
    }
    match node.kind {
        NodeKind::Switch => SWITCH,
        NodeKind::Host => HOST,
    }
}

/// Non-suspicious links brighten from grey to white as their share of the
/// peak weight grows.
pub fn edge_color(weight: f64, peak: f64) -> Color {
    if peak <= 0.0 || weight <= 0.0 {
        return EDGE;
    }
    let share = (weight / peak).clamp(0.0, 1.0);
    let v = 0x99 + ((0xFF - 0x99) as f64 * share).round() as u8;
    Color::Rgb(v, v, v)
}

pub fn percent_color(pct: f64) -> Color {
    match pct {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspicious_overrides_kind() {
        let mut n = Node {
            id: "s1".into(),
            label: "S1".into(),
            kind: NodeKind::Switch,
            status: NodeStatus::Normal,
        };
        assert_eq!(node_color(&n), SWITCH);
        n.status = NodeStatus::Suspicious;
        assert_eq!(node_color(&n), SUSPICIOUS);
        n.kind = NodeKind::Host;
        assert_eq!(node_color(&n), SUSPICIOUS);
    }

    #[test]
    fn heavier_edges_are_brighter() {
        assert_eq!(edge_color(0.0, 10.0), EDGE);
        assert_eq!(edge_color(5.0, 0.0), EDGE);
        assert_eq!(edge_color(10.0, 10.0), Color::Rgb(0xFF, 0xFF, 0xFF));
        assert_eq!(edge_color(5.0, 10.0), Color::Rgb(0xCC, 0xCC, 0xCC));
    }
}
