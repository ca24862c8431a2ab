use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{BLOCK_PATH, UNBLOCK_PATH};
use crate::error::{json_type_name, SchemaError};

/// One observed network flow, as summarised by the backend.
///
/// Every field is optional: the backend forwards database rows as-is and
/// columns may be NULL. Rendering treats a missing field as an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub src_ip: Option<String>,
    #[serde(default)]
    pub dest_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<u16>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub packets: Option<u64>,
    #[serde(default)]
    pub bytes_sent: Option<u64>,
    /// Encoded as 0/1 on the wire.
    #[serde(
        default,
        deserialize_with = "deserialize_anomaly_flag",
        serialize_with = "serialize_anomaly_flag"
    )]
    pub is_anomaly: bool,
    #[serde(default)]
    pub action_taken: Option<String>,
}

impl FlowRecord {
    pub fn is_anomalous(&self) -> bool {
        self.is_anomaly
    }
}

/// An address currently denied by the backend's enforcement device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub blocked_at: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of a block/unblock request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub ip: String,
}

/// Envelope returned by the action endpoints, whatever the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    /// Human-readable status line for the action message area.
    pub fn status_line(&self, kind: ActionKind) -> String {
        if self.ok {
            format!("{}: {}", kind.past_tense(), self.message.as_deref().unwrap_or(""))
        } else {
            let detail = self
                .error
                .as_deref()
                .or(self.message.as_deref())
                .unwrap_or("unknown error");
            format!("Error: {detail}")
        }
    }
}

/// The two operator actions the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Block,
    Unblock,
}

impl ActionKind {
    pub fn path(&self) -> &'static str {
        match self {
            ActionKind::Block => BLOCK_PATH,
            ActionKind::Unblock => UNBLOCK_PATH,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ActionKind::Block => "Blocked",
            ActionKind::Unblock => "Unblocked",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Block => write!(f, "block"),
            ActionKind::Unblock => write!(f, "unblock"),
        }
    }
}

/// Validate a `/flows` payload.
pub fn parse_flows(value: serde_json::Value) -> Result<Vec<FlowRecord>, SchemaError> {
    parse_records(value, "flow")
}

/// Validate a `/blocked` payload.
pub fn parse_blocked(value: serde_json::Value) -> Result<Vec<BlockedEntry>, SchemaError> {
    parse_records(value, "blocked")
}

/// Validate an action endpoint payload. Anything but a JSON object is rejected.
pub fn parse_action_response(value: serde_json::Value) -> Result<ActionResponse, SchemaError> {
    if !value.is_object() {
        return Err(SchemaError::InvalidActionResponse(format!(
            "expected an object, got {}",
            json_type_name(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| SchemaError::InvalidActionResponse(e.to_string()))
}

fn parse_records<T>(value: serde_json::Value, kind: &'static str) -> Result<Vec<T>, SchemaError>
where
    T: serde::de::DeserializeOwned,
{
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(SchemaError::NotAnArray {
                kind,
                found: json_type_name(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(SchemaError::InvalidRecord {
                    kind,
                    index,
                    reason: format!("expected an object, got {}", json_type_name(&item)),
                });
            }
            serde_json::from_value(item).map_err(|e| SchemaError::InvalidRecord {
                kind,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Loose `== 1` comparison: 1, true and "1" are anomalous, anything else is not.
fn deserialize_anomaly_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok() == Some(1.0),
        _ => false,
    })
}

fn serialize_anomaly_flag<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*flag))
}
