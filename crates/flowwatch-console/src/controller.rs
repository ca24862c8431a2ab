//! Dashboard controller: load cycles, the refresh timer, and operator actions.
//!
//! A load cycle fetches flows and blocked addresses concurrently on a
//! spawned task and reports back through the controller's event channel.
//! Only a cycle where both fetches succeeded is rendered; a failed cycle
//! leaves the previous view in place and records the error.
//!
//! At most one cycle is in flight. Triggers that arrive meanwhile (timer
//! ticks, manual refreshes, post-action resyncs) collapse into a single
//! follow-up cycle that starts when the running one finishes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flowwatch_client::{BaseUrl, ClientError, MonitorApi};
use flowwatch_protocol::{
    ActionKind, BlockedEntry, FlowRecord, DEFAULT_REFRESH_INTERVAL_SECS, TOP_N_LIMIT,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregate::{aggregate, Aggregates};
use crate::charts::{ChartSlot, ChartSurface};
use crate::elements::{DashboardElements, ElementId};
use crate::render::{
    render_blocked_table, render_flows_table, RowAction, TableView, BLOCKED_HEADERS, FLOW_HEADERS,
};

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub refresh_interval: Duration,
    pub flow_limit: Option<usize>,
    /// Entries kept in the source/destination bar charts.
    pub top_n: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            flow_limit: None,
            top_n: TOP_N_LIMIT,
        }
    }
}

/// Live operator inputs.
#[derive(Debug, Clone, Default)]
pub struct ControlInputs {
    /// Shared with the API client, which reads it on every request.
    pub api_url: BaseUrl,
    pub auto_refresh: bool,
    pub ip_input: String,
}

/// Why a cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Manual,
    Timer,
    AfterAction,
    /// Follow-up for triggers that arrived while a cycle was running.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleRequest {
    Started(u64),
    Coalesced,
}

/// Messages delivered to the controller's owner.
#[derive(Debug)]
pub enum ControllerEvent {
    Tick,
    CycleFinished {
        cycle: u64,
        result: Result<DashboardSnapshot, ClientError>,
    },
}

/// Both resources from one successful load cycle.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub flows: Vec<FlowRecord>,
    pub blocked: Vec<BlockedEntry>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The address was blank; nothing was sent.
    Skipped,
    Completed {
        kind: ActionKind,
        ip: String,
        ok: bool,
        status: String,
    },
}

/// Everything the front-end draws.
#[derive(Debug)]
pub struct DashboardView {
    pub flows_table: TableView,
    pub blocked_table: TableView,
    pub charts: ChartSurface,
    pub aggregates: Aggregates,
    pub snapshot: Option<DashboardSnapshot>,
    /// Text of the most recent failed cycle; cleared by the next success.
    pub last_error: Option<String>,
    /// Action message area.
    pub status: Option<String>,
    pub rendered_cycles: u64,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            flows_table: TableView::empty(&FLOW_HEADERS),
            blocked_table: TableView::empty(&BLOCKED_HEADERS),
            charts: ChartSurface::new(),
            aggregates: Aggregates::default(),
            snapshot: None,
            last_error: None,
            status: None,
            rendered_cycles: 0,
        }
    }
}

impl DashboardView {
    /// Replace tables and charts with ones built from `snapshot`.
    fn render(&mut self, snapshot: DashboardSnapshot, elements: &DashboardElements, top_n: usize) {
        self.flows_table = render_flows_table(&snapshot.flows);
        self.blocked_table = render_blocked_table(&snapshot.blocked);

        let aggregates = aggregate(&snapshot.flows);
        self.charts.render_pie_chart(
            ChartSlot::Protocol,
            &aggregates.by_protocol,
            elements.label(ElementId::ProtocolChart),
        );
        self.charts.render_bar_chart(
            ChartSlot::Source,
            &aggregates.by_src,
            elements.label(ElementId::SrcChart),
            top_n,
        );
        self.charts.render_bar_chart(
            ChartSlot::Destination,
            &aggregates.by_dst,
            elements.label(ElementId::DstChart),
            top_n,
        );

        self.aggregates = aggregates;
        self.snapshot = Some(snapshot);
        self.last_error = None;
        self.rendered_cycles += 1;
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.snapshot.as_ref().map(|s| s.fetched_at)
    }
}

/// Fetch both resources. Either failure fails the whole cycle.
pub async fn run_load_cycle(
    api: &dyn MonitorApi,
    flow_limit: Option<usize>,
) -> Result<DashboardSnapshot, ClientError> {
    let (flows, blocked) = tokio::try_join!(api.fetch_flows(flow_limit), api.fetch_blocked())?;
    Ok(DashboardSnapshot {
        flows,
        blocked,
        fetched_at: Utc::now(),
    })
}

pub struct DashboardController {
    api: Arc<dyn MonitorApi>,
    elements: DashboardElements,
    settings: ControllerSettings,
    inputs: ControlInputs,
    view: DashboardView,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    ticker: Option<JoinHandle<()>>,
    in_flight: Option<u64>,
    pending: bool,
    cycles_started: u64,
}

impl DashboardController {
    pub fn new(
        api: Arc<dyn MonitorApi>,
        inputs: ControlInputs,
        elements: DashboardElements,
        settings: ControllerSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            elements,
            settings,
            inputs,
            view: DashboardView::default(),
            events_tx,
            events_rx,
            ticker: None,
            in_flight: None,
            pending: false,
            cycles_started: 0,
        }
    }

    /// Start the refresh timer and request the initial load cycle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let tx = self.events_tx.clone();
        let period = self.settings.refresh_interval;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(ControllerEvent::Tick).is_err() {
                    break;
                }
            }
        }));
        tracing::info!(interval_ms = period.as_millis() as u64, "Dashboard started");
        self.request_cycle(Trigger::Startup);
    }

    /// Stop the refresh timer. A cycle already in flight still reports back.
    pub fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            tracing::info!("Dashboard stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start a load cycle, or fold the request into the one already running.
    pub fn request_cycle(&mut self, trigger: Trigger) -> CycleRequest {
        if let Some(running) = self.in_flight {
            self.pending = true;
            tracing::debug!(?trigger, running, "Load cycle coalesced");
            return CycleRequest::Coalesced;
        }

        self.cycles_started += 1;
        let cycle = self.cycles_started;
        self.in_flight = Some(cycle);
        tracing::debug!(?trigger, cycle, "Load cycle started");

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let flow_limit = self.settings.flow_limit;
        tokio::spawn(async move {
            let result = run_load_cycle(api.as_ref(), flow_limit).await;
            let _ = tx.send(ControllerEvent::CycleFinished { cycle, result });
        });
        CycleRequest::Started(cycle)
    }

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Tick => {
                // Toggle is read when the tick fires, not when it was scheduled.
                if self.inputs.auto_refresh {
                    self.request_cycle(Trigger::Timer);
                } else {
                    tracing::trace!("Auto-refresh off, tick ignored");
                }
            }
            ControllerEvent::CycleFinished { cycle, result } => {
                if self.in_flight == Some(cycle) {
                    self.in_flight = None;
                }
                match result {
                    Ok(snapshot) => {
                        tracing::info!(
                            cycle,
                            flows = snapshot.flows.len(),
                            blocked = snapshot.blocked.len(),
                            "Load cycle rendered"
                        );
                        self.view
                            .render(snapshot, &self.elements, self.settings.top_n);
                    }
                    Err(e) => {
                        tracing::warn!(cycle, error = %e, "Load cycle failed");
                        self.view.last_error = Some(format!("Refresh failed: {e}"));
                    }
                }
                if self.pending && self.in_flight.is_none() {
                    self.pending = false;
                    self.request_cycle(Trigger::Coalesced);
                }
            }
        }
    }

    /// Wait for the next event without handling it.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Handle events until no cycle is running or queued.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.pending
    }

    pub async fn handle_block(&mut self, ip: &str) -> ActionOutcome {
        self.run_action(ActionKind::Block, ip).await
    }

    pub async fn handle_unblock(&mut self, ip: &str) -> ActionOutcome {
        self.run_action(ActionKind::Unblock, ip).await
    }

    /// Block the address typed in the IP input.
    pub async fn block_from_input(&mut self) -> ActionOutcome {
        let ip = self.inputs.ip_input.clone();
        self.handle_block(&ip).await
    }

    /// Unblock the address typed in the IP input.
    pub async fn unblock_from_input(&mut self) -> ActionOutcome {
        let ip = self.inputs.ip_input.clone();
        self.handle_unblock(&ip).await
    }

    /// Run the control bound to a table row.
    pub async fn activate(&mut self, action: &RowAction) -> ActionOutcome {
        match action {
            RowAction::Unblock(ip) => self.handle_unblock(ip).await,
        }
    }

    async fn run_action(&mut self, kind: ActionKind, ip: &str) -> ActionOutcome {
        let ip = ip.trim();
        if ip.is_empty() {
            tracing::debug!(action = %kind, "No address entered, action skipped");
            return ActionOutcome::Skipped;
        }

        let (ok, status) = match self.api.post_action(kind, ip).await {
            Ok(response) => (response.ok, response.status_line(kind)),
            Err(e) => (false, format!("Error: {e}")),
        };
        if ok {
            tracing::info!(action = %kind, ip, "Action accepted");
        } else {
            tracing::warn!(action = %kind, ip, status = %status, "Action failed");
        }
        self.view.status = Some(status.clone());

        // Resync whatever the outcome.
        self.request_cycle(Trigger::AfterAction);

        ActionOutcome::Completed {
            kind,
            ip: ip.to_string(),
            ok,
            status,
        }
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn inputs(&self) -> &ControlInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut ControlInputs {
        &mut self.inputs
    }

    pub fn elements(&self) -> &DashboardElements {
        &self.elements
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycles_started
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.stop();
    }
}
