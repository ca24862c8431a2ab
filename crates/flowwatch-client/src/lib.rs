//! FlowWatch Client - HTTP access to the monitoring backend
//!
//! Every request resolves its URL against the live base URL input at call
//! time. GET requests treat a non-2xx status as a failure; action POSTs
//! return the backend's JSON envelope whatever the status, and callers
//! decide success from its `ok` field.

pub mod api;
pub mod base_url;
pub mod client;
pub mod error;

pub use api::MonitorApi;
pub use base_url::BaseUrl;
pub use client::{ApiClient, ClientSettings};
pub use error::ClientError;
