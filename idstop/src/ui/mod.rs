//! UI module root: drawing functions for each page and the shared chrome.

pub mod alerts;
pub mod header;
pub mod metrics;
pub mod overview;
pub mod theme;
pub mod topology;
pub mod util;
