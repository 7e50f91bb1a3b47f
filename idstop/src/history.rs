//! Small utilities to manage bounded history buffers for charts and alert streams.

use std::collections::VecDeque;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while dq.len() >= cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Newest-first variant: prepend and evict from the tail
pub fn push_front_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while dq.len() >= cap {
        dq.pop_back();
    }
    dq.push_front(v);
}

/// Fixed-capacity chart series: one label per point, oldest evicted first.
#[derive(Debug, Clone)]
pub struct SampleWindow<T> {
    points: VecDeque<(String, T)>,
    cap: usize,
}

impl<T> SampleWindow<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, label: impl Into<String>, v: T) {
        push_capped(&mut self.points, (label.into(), v), self.cap);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn latest(&self) -> Option<&T> {
        self.points.back().map(|(_, v)| v)
    }

    pub fn first_label(&self) -> Option<&str> {
        self.points.front().map(|(l, _)| l.as_str())
    }

    pub fn last_label(&self) -> Option<&str> {
        self.points.back().map(|(l, _)| l.as_str())
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.points.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &T)> + ExactSizeIterator + '_ {
        self.points.iter().map(|(l, v)| (l.as_str(), v))
    }
}
