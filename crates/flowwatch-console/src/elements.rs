//! The named elements the dashboard draws into.
//!
//! Each element has a fixed identifier and an operator-facing label. The
//! set is validated once when the dashboard is built; a missing element is
//! a configuration error, never a blank panel at runtime.

use std::collections::{BTreeMap, HashMap};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    ApiUrl,
    Flows,
    Blocked,
    ProtocolChart,
    SrcChart,
    DstChart,
    IpInput,
    BlockButton,
    UnblockButton,
    RefreshButton,
    AutoRefresh,
    ActionMessage,
}

impl ElementId {
    pub const ALL: [ElementId; 12] = [
        ElementId::ApiUrl,
        ElementId::Flows,
        ElementId::Blocked,
        ElementId::ProtocolChart,
        ElementId::SrcChart,
        ElementId::DstChart,
        ElementId::IpInput,
        ElementId::BlockButton,
        ElementId::UnblockButton,
        ElementId::RefreshButton,
        ElementId::AutoRefresh,
        ElementId::ActionMessage,
    ];

    /// Identifier used in the `[elements]` config table.
    pub fn key(&self) -> &'static str {
        match self {
            ElementId::ApiUrl => "apiUrl",
            ElementId::Flows => "flows",
            ElementId::Blocked => "blocked",
            ElementId::ProtocolChart => "protocolChart",
            ElementId::SrcChart => "srcChart",
            ElementId::DstChart => "dstChart",
            ElementId::IpInput => "ipInput",
            ElementId::BlockButton => "blockBtn",
            ElementId::UnblockButton => "unblockBtn",
            ElementId::RefreshButton => "refreshBtn",
            ElementId::AutoRefresh => "autoRefresh",
            ElementId::ActionMessage => "actionMsg",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            ElementId::ApiUrl => "API URL",
            ElementId::Flows => "Recent Flows",
            ElementId::Blocked => "Blocked IPs",
            ElementId::ProtocolChart => "Traffic by Protocol",
            ElementId::SrcChart => "Top Source IPs",
            ElementId::DstChart => "Top Destination IPs",
            ElementId::IpInput => "IP",
            ElementId::BlockButton => "Block",
            ElementId::UnblockButton => "Unblock",
            ElementId::RefreshButton => "Refresh",
            ElementId::AutoRefresh => "Auto-refresh",
            ElementId::ActionMessage => "Status",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// Validated labels for every dashboard element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardElements {
    labels: HashMap<ElementId, String>,
}

impl DashboardElements {
    /// Build from an `[elements]` table. Every element must be present with a
    /// non-blank label.
    pub fn from_labels(table: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for key in table.keys() {
            if ElementId::from_key(key).is_none() {
                tracing::warn!(element = %key, "Ignoring unknown dashboard element");
            }
        }

        let mut labels = HashMap::with_capacity(ElementId::ALL.len());
        for id in ElementId::ALL {
            match table.get(id.key()) {
                Some(label) if !label.trim().is_empty() => {
                    labels.insert(id, label.trim().to_string());
                }
                _ => return Err(ConfigError::MissingElement(id.key())),
            }
        }
        Ok(Self { labels })
    }

    /// The `[elements]` table a default config carries.
    pub fn default_table() -> BTreeMap<String, String> {
        ElementId::ALL
            .into_iter()
            .map(|id| (id.key().to_string(), id.default_label().to_string()))
            .collect()
    }

    pub fn label(&self, id: ElementId) -> &str {
        self.labels
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.default_label())
    }
}

impl Default for DashboardElements {
    fn default() -> Self {
        Self {
            labels: ElementId::ALL
                .into_iter()
                .map(|id| (id, id.default_label().to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_validates() {
        let elements = DashboardElements::from_labels(&DashboardElements::default_table()).unwrap();
        assert_eq!(elements, DashboardElements::default());
        assert_eq!(elements.label(ElementId::SrcChart), "Top Source IPs");
    }

    #[test]
    fn missing_element_fails_fast_with_its_key() {
        let mut table = DashboardElements::default_table();
        table.remove("dstChart");
        match DashboardElements::from_labels(&table) {
            Err(ConfigError::MissingElement(key)) => assert_eq!(key, "dstChart"),
            other => panic!("expected MissingElement, got {other:?}"),
        }
    }

    #[test]
    fn blank_label_counts_as_missing() {
        let mut table = DashboardElements::default_table();
        table.insert("actionMsg".into(), "   ".into());
        assert!(matches!(
            DashboardElements::from_labels(&table),
            Err(ConfigError::MissingElement("actionMsg"))
        ));
    }

    #[test]
    fn custom_labels_are_used() {
        let mut table = DashboardElements::default_table();
        table.insert("flows".into(), " Flujos ".into());
        table.insert("legacyWidget".into(), "ignored".into());
        let elements = DashboardElements::from_labels(&table).unwrap();
        assert_eq!(elements.label(ElementId::Flows), "Flujos");
    }

    #[test]
    fn keys_round_trip() {
        for id in ElementId::ALL {
            assert_eq!(ElementId::from_key(id.key()), Some(id));
        }
    }
}
