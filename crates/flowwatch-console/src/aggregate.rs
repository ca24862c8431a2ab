//! Frequency counts over a batch of flow records.

use std::collections::HashMap;
use std::fmt;

use flowwatch_protocol::FlowRecord;

/// A frequency-map key. Records with no value for the keyed field land in
/// `Missing` so data-quality gaps stay visible in the charts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Value(String),
    Missing,
}

impl BucketKey {
    fn from_field(field: Option<&str>) -> Self {
        match field {
            Some(v) => BucketKey::Value(v.to_string()),
            None => BucketKey::Missing,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Value(v) => write!(f, "{v}"),
            BucketKey::Missing => write!(f, "(missing)"),
        }
    }
}

/// Count per distinct key, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    entries: Vec<(BucketKey, u64)>,
    index: HashMap<BucketKey, usize>,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: BucketKey) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &BucketKey) -> Option<u64> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(BucketKey, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }
}

impl FromIterator<BucketKey> for FrequencyMap {
    fn from_iter<I: IntoIterator<Item = BucketKey>>(iter: I) -> Self {
        let mut map = FrequencyMap::new();
        for key in iter {
            map.increment(key);
        }
        map
    }
}

/// The three summaries drawn from one batch of flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub by_protocol: FrequencyMap,
    pub by_src: FrequencyMap,
    pub by_dst: FrequencyMap,
}

/// Count flows per protocol, source and destination in a single pass.
///
/// Keys are taken verbatim: `"TCP"` and `"tcp"` are separate buckets.
pub fn aggregate(flows: &[FlowRecord]) -> Aggregates {
    let mut out = Aggregates::default();
    for flow in flows {
        out.by_protocol
            .increment(BucketKey::from_field(flow.protocol.as_deref()));
        out.by_src.increment(BucketKey::from_field(flow.src_ip.as_deref()));
        out.by_dst.increment(BucketKey::from_field(flow.dest_ip.as_deref()));
    }
    out
}
