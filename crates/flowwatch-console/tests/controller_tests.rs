//! DashboardController driven by an in-memory backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowwatch_client::{BaseUrl, ClientError, MonitorApi};
use flowwatch_console::{
    ActionOutcome, ChartKind, ChartSlot, ControlInputs, ControllerEvent, ControllerSettings,
    CycleRequest, DashboardController, DashboardElements, Trigger,
};
use flowwatch_protocol::{ActionKind, ActionResponse, BlockedEntry, FlowRecord, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Flows(Option<usize>),
    Blocked,
    Action(ActionKind, String),
}

#[derive(Default)]
struct FakeState {
    flows: Vec<FlowRecord>,
    blocked: Vec<BlockedEntry>,
    fail_blocked: bool,
    action_reply: Option<ActionResponse>,
    action_fails: bool,
    calls: Vec<Call>,
}

#[derive(Default)]
struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    fn with_data(flows: Vec<FlowRecord>, blocked: Vec<BlockedEntry>) -> Arc<Self> {
        let api = FakeApi::default();
        {
            let mut s = api.state.lock().unwrap();
            s.flows = flows;
            s.blocked = blocked;
        }
        Arc::new(api)
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl MonitorApi for FakeApi {
    async fn fetch_flows(&self, limit: Option<usize>) -> Result<Vec<FlowRecord>, ClientError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::Flows(limit));
        Ok(s.flows.clone())
    }

    async fn fetch_blocked(&self) -> Result<Vec<BlockedEntry>, ClientError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::Blocked);
        if s.fail_blocked {
            return Err(ClientError::Api {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        Ok(s.blocked.clone())
    }

    async fn post_action(&self, kind: ActionKind, ip: &str) -> Result<ActionResponse, ClientError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::Action(kind, ip.to_string()));
        if s.action_fails {
            return Err(ClientError::Schema(SchemaError::MalformedJson(
                "expected value at line 1 column 1".into(),
            )));
        }
        Ok(s.action_reply.clone().unwrap_or(ActionResponse {
            ok: true,
            message: Some(format!("{kind} {ip}")),
            error: None,
        }))
    }
}

fn flow(src: &str, dst: &str, proto: &str, anomaly: bool) -> FlowRecord {
    FlowRecord {
        ts: Some("2025-01-06 10:00:00".into()),
        src_ip: Some(src.into()),
        dest_ip: Some(dst.into()),
        protocol: Some(proto.into()),
        packets: Some(1),
        bytes_sent: Some(60),
        is_anomaly: anomaly,
        ..Default::default()
    }
}

fn blocked_entry(ip: &str) -> BlockedEntry {
    BlockedEntry {
        ip: Some(ip.into()),
        blocked_at: Some("t1".into()),
        device: Some("d1".into()),
        reason: Some("r1".into()),
        ..Default::default()
    }
}

fn controller(api: Arc<FakeApi>, settings: ControllerSettings) -> DashboardController {
    let inputs = ControlInputs {
        api_url: BaseUrl::new(""),
        auto_refresh: true,
        ip_input: String::new(),
    };
    DashboardController::new(api, inputs, DashboardElements::default(), settings)
}

#[tokio::test]
async fn test_load_cycle_renders_tables_and_charts_from_one_snapshot() {
    let api = FakeApi::with_data(
        vec![
            flow("10.0.0.1", "8.8.8.8", "UDP", false),
            flow("10.0.0.2", "8.8.8.8", "TCP", true),
            flow("10.0.0.1", "1.1.1.1", "TCP", false),
        ],
        vec![blocked_entry("10.0.0.5")],
    );
    let mut c = controller(api.clone(), ControllerSettings::default());

    assert_eq!(c.request_cycle(Trigger::Manual), CycleRequest::Started(1));
    c.settle().await;

    let view = c.view();
    assert_eq!(view.flows_table.len(), 3);
    assert_eq!(view.blocked_table.len(), 1);
    assert_eq!(view.rendered_cycles, 1);
    assert!(view.last_error.is_none());
    assert!(view.last_refresh().is_some());

    let pie = view.charts.get(ChartSlot::Protocol).unwrap();
    assert_eq!(pie.kind, ChartKind::Pie);
    assert_eq!(pie.title, "Traffic by Protocol");
    assert_eq!(pie.points, vec![("UDP".to_string(), 1), ("TCP".to_string(), 2)]);

    let dst = view.charts.get(ChartSlot::Destination).unwrap();
    assert_eq!(dst.kind, ChartKind::Bar);
    assert_eq!(dst.points[0], ("8.8.8.8".to_string(), 2));
    assert_eq!(view.charts.len(), 3);
}

#[tokio::test]
async fn test_unblock_control_posts_once_then_one_cycle() {
    let api = FakeApi::with_data(vec![], vec![blocked_entry("10.0.0.5")]);
    let mut c = controller(api.clone(), ControllerSettings::default());
    c.request_cycle(Trigger::Manual);
    c.settle().await;

    let action = c.view().blocked_table.rows[0].action().cloned().unwrap();
    api.clear_calls();
    let before = c.cycles_started();

    let outcome = c.activate(&action).await;
    c.settle().await;

    assert_eq!(
        outcome,
        ActionOutcome::Completed {
            kind: ActionKind::Unblock,
            ip: "10.0.0.5".into(),
            ok: true,
            status: "Unblocked: unblock 10.0.0.5".into(),
        }
    );
    assert_eq!(
        api.count(|c| *c == Call::Action(ActionKind::Unblock, "10.0.0.5".into())),
        1
    );
    assert_eq!(api.count(|c| matches!(c, Call::Action(..))), 1);
    assert_eq!(c.cycles_started(), before + 1);
    assert_eq!(api.count(|c| matches!(c, Call::Flows(_))), 1);
    assert_eq!(api.count(|c| matches!(c, Call::Blocked)), 1);
    assert_eq!(c.view().status.as_deref(), Some("Unblocked: unblock 10.0.0.5"));
}

#[tokio::test]
async fn test_failed_blocked_fetch_keeps_previous_render() {
    let api = FakeApi::with_data(
        vec![flow("10.0.0.1", "8.8.8.8", "UDP", false)],
        vec![blocked_entry("10.0.0.5")],
    );
    let mut c = controller(api.clone(), ControllerSettings::default());
    c.request_cycle(Trigger::Manual);
    c.settle().await;
    let flows_before = c.view().flows_table.clone();
    let generation_before = c.view().charts.generation(ChartSlot::Protocol);

    {
        let mut s = api.state.lock().unwrap();
        s.flows = vec![
            flow("10.9.9.9", "4.4.4.4", "TCP", true),
            flow("10.9.9.8", "4.4.4.4", "TCP", true),
        ];
        s.fail_blocked = true;
    }
    c.request_cycle(Trigger::Manual);
    c.settle().await;

    let view = c.view();
    assert_eq!(view.flows_table, flows_before);
    assert_eq!(view.blocked_table.len(), 1);
    assert_eq!(view.charts.generation(ChartSlot::Protocol), generation_before);
    assert_eq!(view.rendered_cycles, 1);
    let err = view.last_error.as_deref().unwrap();
    assert!(err.contains("database unavailable"), "{err}");

    // The next good cycle clears the error.
    api.state.lock().unwrap().fail_blocked = false;
    c.request_cycle(Trigger::Manual);
    c.settle().await;
    assert!(c.view().last_error.is_none());
    assert_eq!(c.view().flows_table.len(), 2);
}

#[tokio::test]
async fn test_failed_first_cycle_renders_empty_tables() {
    let api = FakeApi::with_data(vec![flow("10.0.0.1", "8.8.8.8", "UDP", false)], vec![]);
    api.state.lock().unwrap().fail_blocked = true;
    let mut c = controller(api, ControllerSettings::default());
    c.request_cycle(Trigger::Startup);
    c.settle().await;

    assert!(c.view().flows_table.is_empty());
    assert!(c.view().charts.is_empty());
    assert!(c.view().last_error.is_some());
}

#[tokio::test]
async fn test_tick_respects_toggle_at_fire_time() {
    let api = FakeApi::with_data(vec![], vec![]);
    let mut c = controller(api.clone(), ControllerSettings::default());

    c.inputs_mut().auto_refresh = false;
    c.handle_event(ControllerEvent::Tick);
    assert_eq!(c.cycles_started(), 0);
    assert!(!c.is_busy());

    c.inputs_mut().auto_refresh = true;
    c.handle_event(ControllerEvent::Tick);
    assert_eq!(c.cycles_started(), 1);
    c.settle().await;
    assert_eq!(api.count(|c| matches!(c, Call::Flows(_))), 1);
}

#[tokio::test]
async fn test_triggers_during_cycle_coalesce_into_one_follow_up() {
    let api = FakeApi::with_data(vec![], vec![]);
    let mut c = controller(api.clone(), ControllerSettings::default());

    assert_eq!(c.request_cycle(Trigger::Manual), CycleRequest::Started(1));
    assert_eq!(c.request_cycle(Trigger::Timer), CycleRequest::Coalesced);
    assert_eq!(c.request_cycle(Trigger::Manual), CycleRequest::Coalesced);
    assert!(c.is_busy());

    c.settle().await;
    assert_eq!(c.cycles_started(), 2);
    assert_eq!(c.view().rendered_cycles, 2);
    assert_eq!(api.count(|c| matches!(c, Call::Blocked)), 2);
}

#[tokio::test]
async fn test_blank_address_sends_nothing() {
    let api = FakeApi::with_data(vec![], vec![]);
    let mut c = controller(api.clone(), ControllerSettings::default());
    c.inputs_mut().ip_input = "   ".into();

    assert_eq!(c.block_from_input().await, ActionOutcome::Skipped);
    assert_eq!(c.handle_unblock("").await, ActionOutcome::Skipped);
    assert!(api.calls().is_empty());
    assert_eq!(c.cycles_started(), 0);
    assert!(c.view().status.is_none());
}

#[tokio::test]
async fn test_input_address_is_trimmed() {
    let api = FakeApi::with_data(vec![], vec![]);
    let mut c = controller(api.clone(), ControllerSettings::default());
    c.inputs_mut().ip_input = " 192.168.1.50 ".into();

    c.block_from_input().await;
    c.settle().await;
    assert_eq!(
        api.calls()[0],
        Call::Action(ActionKind::Block, "192.168.1.50".into())
    );
}

#[tokio::test]
async fn test_rejected_action_reports_error_and_still_refreshes() {
    let api = FakeApi::with_data(vec![], vec![]);
    api.state.lock().unwrap().action_reply = Some(ActionResponse {
        ok: false,
        message: None,
        error: Some("switch login failed".into()),
    });
    let mut c = controller(api.clone(), ControllerSettings::default());

    let outcome = c.handle_block("10.0.0.7").await;
    assert!(matches!(outcome, ActionOutcome::Completed { ok: false, .. }));
    assert_eq!(c.view().status.as_deref(), Some("Error: switch login failed"));
    assert_eq!(c.cycles_started(), 1);
    c.settle().await;
    assert_eq!(c.view().rendered_cycles, 1);
}

#[tokio::test]
async fn test_action_transport_failure_becomes_status_and_refreshes() {
    let api = FakeApi::with_data(vec![], vec![]);
    api.state.lock().unwrap().action_fails = true;
    let mut c = controller(api.clone(), ControllerSettings::default());

    c.handle_unblock("10.0.0.7").await;
    let status = c.view().status.clone().unwrap();
    assert!(status.starts_with("Error: "), "{status}");
    assert_eq!(c.cycles_started(), 1);
    c.settle().await;
}

#[tokio::test]
async fn test_flow_limit_is_forwarded() {
    let api = FakeApi::with_data(vec![], vec![]);
    let settings = ControllerSettings {
        flow_limit: Some(250),
        ..Default::default()
    };
    let mut c = controller(api.clone(), settings);
    c.request_cycle(Trigger::Manual);
    c.settle().await;
    assert!(api.calls().contains(&Call::Flows(Some(250))));
}

#[tokio::test]
async fn test_timer_ticks_after_start_and_stops() {
    let api = FakeApi::with_data(vec![], vec![]);
    let settings = ControllerSettings {
        refresh_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let mut c = controller(api.clone(), settings);

    c.start();
    c.start();
    assert!(c.is_running());
    assert_eq!(c.cycles_started(), 1, "start requests exactly one initial cycle");
    c.settle().await;

    let event = tokio::time::timeout(Duration::from_secs(2), c.next_event())
        .await
        .expect("timer should tick")
        .unwrap();
    assert!(matches!(event, ControllerEvent::Tick));
    let before = c.cycles_started();
    c.handle_event(event);
    assert_eq!(c.cycles_started(), before + 1);
    c.settle().await;

    c.stop();
    c.stop();
    assert!(!c.is_running());
}
