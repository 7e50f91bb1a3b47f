//! App state and main loop: key routing, poll timers, push drain and drawing.

use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::HttpApi;
use crate::error::Error;
use crate::ui::{
    alerts::draw_alerts,
    header::{draw_footer, draw_header},
    metrics::draw_metrics,
    overview::draw_overview,
    topology::draw_topology,
};
use crate::views::{AlertsView, CommandOutcome, MetricsView, OverviewView, TopologyView};
use crate::ws::{push_url, EventSource, PushChannel, PushEvent, Subscription};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const NOTICE_TTL: Duration = Duration::from_secs(5);
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Alerts,
    Metrics,
    Topology,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Alerts, Tab::Metrics, Tab::Topology];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Alerts => "Alerts",
            Tab::Metrics => "Metrics",
            Tab::Topology => "Topology",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    fn hints(self) -> &'static str {
        match self {
            Tab::Overview | Tab::Metrics => "Tab/1-4 switch | r refresh | q quit",
            Tab::Alerts => {
                "←/→ page | ↑/↓ select | s severity | t type | i ip | c clear | r reload | e export | b block | u unblock"
            }
            Tab::Topology => "↑/↓ select node | +/- zoom | f fit | r refresh | q quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Kind,
    Ip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Block,
    Unblock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing(FilterField, String),
    Confirm(ConfirmAction, String),
}

/// Footer message for command results and load failures.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub ok: bool,
    pub at: Instant,
}

pub struct App {
    base_url: String,
    tab: Tab,
    overview: OverviewView<HttpApi, Subscription>,
    alerts: AlertsView<HttpApi>,
    metrics: MetricsView<HttpApi, Subscription>,
    topology: TopologyView<HttpApi>,
    topology_events: Subscription,
    push: Option<PushChannel>,
    input: InputMode,
    notice: Option<Notice>,
    should_quit: bool,
    last_poll: Instant,
    export_dir: PathBuf,
}

impl App {
    /// Builds the HTTP client and opens the push channel. A push channel
    /// that fails to connect leaves the views on polling only.
    pub async fn connect(base_url: &str) -> Result<Self, Error> {
        let api = HttpApi::new(base_url)?;
        let push = match push_url(api.base_url()) {
            Ok(url) => match PushChannel::connect(&url).await {
                Ok(ch) => Some(ch),
                Err(e) => {
                    warn!(error = %e, %url, "push channel unavailable, polling only");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "cannot derive push url");
                None
            }
        };
        let sub = || {
            push.as_ref()
                .map(PushChannel::subscribe)
                .unwrap_or_else(Subscription::closed)
        };

        Ok(Self {
            base_url: api.base_url().to_string(),
            tab: Tab::Overview,
            overview: OverviewView::new(api.clone(), sub()),
            alerts: AlertsView::new(api.clone()),
            metrics: MetricsView::new(api.clone(), sub()),
            topology: TopologyView::new(api),
            topology_events: sub(),
            push,
            input: InputMode::Normal,
            notice: None,
            should_quit: false,
            last_poll: Instant::now(),
            export_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // First paint before the initial fetches so the frame is not blank
        terminal.draw(|f| self.draw(f))?;
        self.load_initial().await;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn load_initial(&mut self) {
        self.overview.load_initial().await;
        if !self.alerts.reload().await {
            self.fail("Failed to load alerts");
        }
        self.metrics.load_initial().await;
        if !self.topology.refresh().await {
            self.fail("Failed to load topology");
        }
        self.last_poll = Instant::now();
        info!(base = %self.base_url, "initial load done");
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if k.kind == KeyEventKind::Press {
                        self.on_key(k).await;
                    }
                }
            }
            if self.should_quit {
                break;
            }

            // Push events, in delivery order per view
            self.overview.pump();
            self.metrics.pump();
            while let Some(ev) = self.topology_events.try_next() {
                if let PushEvent::TopologyUpdate(g) = ev {
                    self.topology.apply_graph(g);
                }
            }

            if self.last_poll.elapsed() >= POLL_INTERVAL {
                self.poll().await;
            }

            if self
                .notice
                .as_ref()
                .is_some_and(|n| n.at.elapsed() >= NOTICE_TTL)
            {
                self.notice = None;
            }

            terminal.draw(|f| self.draw(f))?;
            sleep(TICK).await;
        }
        Ok(())
    }

    async fn poll(&mut self) {
        self.overview.poll().await;
        self.metrics.poll().await;
        self.last_poll = Instant::now();
    }

    fn notify(&mut self, text: impl Into<String>, ok: bool) {
        self.notice = Some(Notice {
            text: text.into(),
            ok,
            at: Instant::now(),
        });
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.notify(text, false);
    }

    async fn on_key(&mut self, k: KeyEvent) {
        match std::mem::replace(&mut self.input, InputMode::Normal) {
            InputMode::Editing(field, buf) => self.on_edit_key(k, field, buf).await,
            InputMode::Confirm(action, ip) => self.on_confirm_key(k, action, ip).await,
            InputMode::Normal => self.on_normal_key(k).await,
        }
    }

    async fn on_normal_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.tab = self.tab.next();
                return;
            }
            KeyCode::BackTab => {
                self.tab = self.tab.prev();
                return;
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.tab = Tab::ALL[(c as usize) - ('1' as usize)];
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Overview | Tab::Metrics => {
                if k.code == KeyCode::Char('r') {
                    self.poll().await;
                }
            }
            Tab::Alerts => self.on_alerts_key(k).await,
            Tab::Topology => match k.code {
                KeyCode::Char('r') => {
                    if !self.topology.refresh().await {
                        self.fail("Failed to load topology");
                    }
                }
                KeyCode::Down => self.topology.select_next(),
                KeyCode::Up => self.topology.select_prev(),
                KeyCode::Char('+') | KeyCode::Char('=') => self.topology.zoom_in(),
                KeyCode::Char('-') => self.topology.zoom_out(),
                KeyCode::Char('f') => self.topology.fit(),
                _ => {}
            },
        }
    }

    async fn on_alerts_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Left => self.alerts.prev_page(),
            KeyCode::Right => self.alerts.next_page(),
            KeyCode::Up => self.alerts.select_prev(),
            KeyCode::Down => self.alerts.select_next(),
            KeyCode::Char('s') => {
                let mut filters = self.alerts.filters().clone();
                filters.cycle_severity();
                self.load_alerts(filters).await;
            }
            KeyCode::Char('t') => {
                let buf = self.alerts.filters().kind.clone().unwrap_or_default();
                self.input = InputMode::Editing(FilterField::Kind, buf);
            }
            KeyCode::Char('i') => {
                let buf = self.alerts.filters().ip.clone().unwrap_or_default();
                self.input = InputMode::Editing(FilterField::Ip, buf);
            }
            KeyCode::Char('c') => self.load_alerts(Default::default()).await,
            KeyCode::Char('r') => {
                if !self.alerts.reload().await {
                    self.fail("Failed to load alerts");
                }
            }
            KeyCode::Char('e') => match self.alerts.export_to_dir(&self.export_dir) {
                Ok(path) => self.notify(format!("Exported to {}", path.display()), true),
                Err(e) => {
                    warn!(error = %e, "export failed");
                    self.fail(format!("Export failed: {e}"));
                }
            },
            KeyCode::Char(c @ ('b' | 'u')) => {
                let action = if c == 'b' { ConfirmAction::Block } else { ConfirmAction::Unblock };
                match self.alerts.selected() {
                    Some(a) => self.input = InputMode::Confirm(action, a.source_ip.clone()),
                    None => self.fail("No alert selected"),
                }
            }
            _ => {}
        }
    }

    async fn on_edit_key(&mut self, k: KeyEvent, field: FilterField, mut buf: String) {
        match k.code {
            KeyCode::Enter => {
                let mut filters = self.alerts.filters().clone();
                let value = Some(buf).filter(|s| !s.is_empty());
                match field {
                    FilterField::Kind => filters.kind = value,
                    FilterField::Ip => filters.ip = value,
                }
                self.load_alerts(filters).await;
            }
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                buf.pop();
                self.input = InputMode::Editing(field, buf);
            }
            KeyCode::Char(c) => {
                buf.push(c);
                self.input = InputMode::Editing(field, buf);
            }
            _ => self.input = InputMode::Editing(field, buf),
        }
    }

    async fn on_confirm_key(&mut self, k: KeyEvent, action: ConfirmAction, ip: String) {
        if !matches!(k.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.notify("Cancelled", true);
            return;
        }
        let (outcome, verb) = match action {
            ConfirmAction::Block => (self.alerts.block_ip(&ip).await, "Blocked"),
            ConfirmAction::Unblock => (self.alerts.unblock_ip(&ip).await, "Unblocked"),
        };
        match outcome {
            CommandOutcome::Succeeded => self.notify(format!("{verb} {ip}"), true),
            CommandOutcome::Rejected(reason) => self.fail(format!("{ip}: {reason}")),
            CommandOutcome::Failed(e) => self.fail(format!("{ip}: {e}")),
        }
    }

    async fn load_alerts(&mut self, filters: crate::views::AlertFilters) {
        if !self.alerts.load(filters).await {
            self.fail("Failed to load alerts");
        }
    }

    fn footer_text(&self) -> String {
        match &self.input {
            InputMode::Confirm(ConfirmAction::Block, ip) => format!("Block {ip} for 1 hour? (y/N)"),
            InputMode::Confirm(ConfirmAction::Unblock, ip) => format!("Unblock {ip}? (y/N)"),
            InputMode::Editing(..) => "Enter apply | Esc cancel".into(),
            InputMode::Normal => self.tab.hints().into(),
        }
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // header + tabs
                Constraint::Min(10),   // page
                Constraint::Length(1), // footer
            ])
            .split(area);

        let push_live = self.push.as_ref().is_some_and(PushChannel::is_open);
        draw_header(f, rows[0], &self.base_url, self.overview.status(), push_live, self.tab);

        match self.tab {
            Tab::Overview => draw_overview(f, rows[1], &self.overview),
            Tab::Alerts => {
                let editing = match &self.input {
                    InputMode::Editing(field, buf) => Some((*field, buf.as_str())),
                    _ => None,
                };
                draw_alerts(f, rows[1], &self.alerts, editing);
            }
            Tab::Metrics => draw_metrics(f, rows[1], &self.metrics),
            Tab::Topology => draw_topology(f, rows[1], &self.topology),
        }

        // Prompts take precedence over transient notices
        let notice = match self.input {
            InputMode::Normal => self.notice.as_ref(),
            _ => None,
        };
        draw_footer(f, rows[2], notice, &self.footer_text());
    }
}
