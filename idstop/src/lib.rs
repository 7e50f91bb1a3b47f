//! idstop: terminal dashboard for an SDN intrusion detection backend.
//!
//! The `views` hold page state and talk to the backend through
//! [`api::DashboardApi`] and [`ws::EventSource`]; `ui` renders them and
//! `app` ties both to the terminal.

pub mod api;
pub mod app;
pub mod error;
pub mod history;
pub mod logging;
pub mod profiles;
pub mod types;
pub mod ui;
pub mod views;
pub mod ws;

pub use error::Error;
