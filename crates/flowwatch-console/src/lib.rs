//! FlowWatch Console - terminal dashboard for the monitoring backend
//!
//! Polls the backend for flow records and blocked addresses, renders them as
//! tables and summary charts, and issues block/unblock commands. The
//! dashboard state lives in [`DashboardController`]; the ratatui front-end in
//! [`console`] only draws what the controller has rendered.

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod console;
pub mod controller;
pub mod elements;
pub mod logging;
pub mod render;

pub use aggregate::{aggregate, Aggregates, BucketKey, FrequencyMap};
pub use charts::{ChartKind, ChartSlot, ChartSpec, ChartSurface};
pub use config::{ConfigError, ConsoleConfig};
pub use console::{
    run_console, snapshot_report, ConsoleCommand, ConsoleState, Focus, PanicHookGuard, TableSizes,
};
pub use controller::{
    ActionOutcome, ControlInputs, ControllerEvent, ControllerSettings, CycleRequest,
    DashboardController, DashboardSnapshot, DashboardView, Trigger,
};
pub use elements::{DashboardElements, ElementId};
pub use logging::{init_logging, LogTarget};
pub use render::{
    flow_detail, render_blocked_table, render_flows_table, Badge, CellContent, RowAction, RowClass,
    TableRow, TableView,
};
