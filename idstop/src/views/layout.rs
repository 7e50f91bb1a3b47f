//! Deterministic force-directed layout (Fruchterman–Reingold) in the unit square.

use std::collections::HashMap;
use std::f64::consts::TAU;

use tracing::debug;

use crate::types::TopologyGraph;

pub const ITERATIONS: usize = 200;
const INITIAL_TEMP: f64 = 0.1;
const MIN_DIST: f64 = 1e-4;
const MARGIN: f64 = 0.05;

/// Node positions, index-aligned with `graph.nodes`, each within `[0, 1]`.
pub fn force_layout(graph: &TopologyGraph, iterations: usize) -> Vec<(f64, f64)> {
    let n = graph.nodes.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.5, 0.5)],
        _ => {}
    }

    let index: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();
    let edges: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .filter_map(|e| match (index.get(e.from.as_str()), index.get(e.to.as_str())) {
            (Some(&a), Some(&b)) if a != b => Some((a, b)),
            (Some(_), Some(_)) => None,
            _ => {
                debug!(from = %e.from, to = %e.to, "edge references an unknown node");
                None
            }
        })
        .collect();

    // Start on a circle so the result does not depend on any RNG.
    let mut pos: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            (0.5 + 0.4 * a.cos(), 0.5 + 0.4 * a.sin())
        })
        .collect();

    let k = (1.0 / n as f64).sqrt();
    for step in 0..iterations {
        let temp = INITIAL_TEMP * (1.0 - step as f64 / iterations as f64);
        let mut disp = vec![(0.0_f64, 0.0_f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let d = dx.hypot(dy).max(MIN_DIST);
                let f = k * k / d;
                disp[i].0 += dx / d * f;
                disp[i].1 += dy / d * f;
                disp[j].0 -= dx / d * f;
                disp[j].1 -= dy / d * f;
            }
        }
        for &(a, b) in &edges {
            let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
            let d = dx.hypot(dy).max(MIN_DIST);
            let f = d * d / k;
            disp[a].0 -= dx / d * f;
            disp[a].1 -= dy / d * f;
            disp[b].0 += dx / d * f;
            disp[b].1 += dy / d * f;
        }
        for (p, (dx, dy)) in pos.iter_mut().zip(disp) {
            let len = dx.hypot(dy);
            if len > 0.0 {
                let step_len = len.min(temp);
                p.0 = (p.0 + dx / len * step_len).clamp(0.0, 1.0);
                p.1 = (p.1 + dy / len * step_len).clamp(0.0, 1.0);
            }
        }
    }

    normalize(&mut pos);
    pos
}

// Stretch the bounding box to fill the square minus a small margin.
fn normalize(pos: &mut [(f64, f64)]) {
    let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
    let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
    for &(x, y) in pos.iter() {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let span = 1.0 - 2.0 * MARGIN;
    let scale = |v: f64, lo: f64, hi: f64| {
        if hi - lo < MIN_DIST {
            0.5
        } else {
            MARGIN + (v - lo) / (hi - lo) * span
        }
    };
    for p in pos.iter_mut() {
        p.0 = scale(p.0, min_x, max_x);
        p.1 = scale(p.1, min_y, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, Node, NodeKind, NodeStatus};

    fn node(id: &str) -> Node {
        Node {
            id: id.into(),
            label: id.into(),
            kind: NodeKind::Host,
            status: NodeStatus::Normal,
        }
    }

    fn edge(a: &str, b: &str) -> Edge {
        Edge {
            from: a.into(),
            to: b.into(),
            label: None,
            weight: 0.0,
            suspicious: false,
        }
    }

    #[test]
    fn positions_stay_in_unit_square_and_are_stable() {
        let g = TopologyGraph {
            nodes: vec![node("s1"), node("s2"), node("h1"), node("h2"), node("h3")],
            edges: vec![edge("s1", "s2"), edge("h1", "s1"), edge("h2", "s1"), edge("h3", "s2"), edge("h9", "s1")],
        };
        let a = force_layout(&g, ITERATIONS);
        let b = force_layout(&g, ITERATIONS);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|&(x, y)| (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)));
    }

    #[test]
    fn linked_nodes_end_up_closer_than_unlinked() {
        let g = TopologyGraph {
            nodes: vec![node("a"), node("b"), node("c"), node("d")],
            edges: vec![edge("a", "b"), edge("c", "d")],
        };
        let p = force_layout(&g, ITERATIONS);
        let dist = |i: usize, j: usize| (p[i].0 - p[j].0).hypot(p[i].1 - p[j].1);
        assert!(dist(0, 1) < dist(0, 2));
        assert!(dist(2, 3) < dist(1, 3));
    }

    #[test]
    fn trivial_graphs() {
        assert!(force_layout(&TopologyGraph::default(), ITERATIONS).is_empty());
        let one = TopologyGraph {
            nodes: vec![node("only")],
            edges: vec![],
        };
        assert_eq!(force_layout(&one, ITERATIONS), vec![(0.5, 0.5)]);
    }
}
