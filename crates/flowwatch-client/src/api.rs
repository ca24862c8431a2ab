use async_trait::async_trait;
use flowwatch_protocol::{ActionKind, ActionResponse, BlockedEntry, FlowRecord};

use crate::error::ClientError;

/// The backend operations the dashboard depends on.
///
/// `ApiClient` implements this over HTTP; the dashboard controller only sees
/// the trait, so it can be driven by an in-memory backend in tests.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// Latest flow records, newest first. `limit` is forwarded as `?limit=N`.
    async fn fetch_flows(&self, limit: Option<usize>) -> Result<Vec<FlowRecord>, ClientError>;

    async fn fetch_blocked(&self) -> Result<Vec<BlockedEntry>, ClientError>;

    /// Issue a block/unblock. The returned envelope may carry `ok: false`.
    async fn post_action(&self, kind: ActionKind, ip: &str) -> Result<ActionResponse, ClientError>;
}
