//! FlowWatch Protocol - Core types for the monitoring backend API
//!
//! Defines the flow record and blocked-address payloads served by the
//! backend, the response envelope of block/unblock actions, and the
//! schema validation applied to every payload before it is rendered.

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::*;
pub use types::*;
