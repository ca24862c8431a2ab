//! Chart specs and the surface that holds one chart per slot.

use std::collections::HashMap;

use crate::aggregate::FrequencyMap;
use crate::elements::ElementId;

/// Where a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSlot {
    Protocol,
    Source,
    Destination,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 3] = [ChartSlot::Protocol, ChartSlot::Source, ChartSlot::Destination];

    pub fn element(&self) -> ElementId {
        match self {
            ChartSlot::Protocol => ElementId::ProtocolChart,
            ChartSlot::Source => ElementId::SrcChart,
            ChartSlot::Destination => ElementId::DstChart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
}

/// Everything needed to draw a chart: kind, title and labelled values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub points: Vec<(String, u64)>,
}

impl ChartSpec {
    pub fn total(&self) -> u64 {
        self.points.iter().map(|(_, v)| v).sum()
    }

    pub fn max(&self) -> u64 {
        self.points.iter().map(|(_, v)| *v).max().unwrap_or(0)
    }
}

/// One slice per key, in the map's insertion order.
pub fn pie_chart_spec(map: &FrequencyMap, title: &str) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Pie,
        title: title.to_string(),
        points: map
            .entries()
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
    }
}

/// Top `limit` keys by count. Equal counts keep their insertion order.
pub fn bar_chart_spec(map: &FrequencyMap, title: &str, limit: usize) -> ChartSpec {
    let mut points: Vec<(String, u64)> = map
        .entries()
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();
    // sort_by is stable
    points.sort_by(|a, b| b.1.cmp(&a.1));
    points.truncate(limit);
    ChartSpec {
        kind: ChartKind::Bar,
        title: title.to_string(),
        points,
    }
}

#[derive(Debug, Clone)]
struct ChartInstance {
    spec: ChartSpec,
    generation: u64,
}

/// Holds at most one chart per slot.
///
/// Rendering into a slot drops whatever was there and installs a fresh
/// chart; nothing is patched in place, so repeated refreshes never stack
/// stale charts.
#[derive(Debug, Default)]
pub struct ChartSurface {
    charts: HashMap<ChartSlot, ChartInstance>,
    generations: u64,
}

impl ChartSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_pie_chart(&mut self, slot: ChartSlot, map: &FrequencyMap, title: &str) -> &ChartSpec {
        self.install(slot, pie_chart_spec(map, title))
    }

    pub fn render_bar_chart(
        &mut self,
        slot: ChartSlot,
        map: &FrequencyMap,
        title: &str,
        limit: usize,
    ) -> &ChartSpec {
        self.install(slot, bar_chart_spec(map, title, limit))
    }

    fn install(&mut self, slot: ChartSlot, spec: ChartSpec) -> &ChartSpec {
        self.generations += 1;
        let instance = ChartInstance {
            spec,
            generation: self.generations,
        };
        if let Some(old) = self.charts.insert(slot, instance) {
            tracing::trace!(?slot, generation = old.generation, "Replaced chart");
        }
        &self.charts[&slot].spec
    }

    pub fn get(&self, slot: ChartSlot) -> Option<&ChartSpec> {
        self.charts.get(&slot).map(|c| &c.spec)
    }

    /// Monotonic id of the chart currently in `slot`.
    pub fn generation(&self, slot: ChartSlot) -> Option<u64> {
        self.charts.get(&slot).map(|c| c.generation)
    }

    /// Number of live charts.
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
