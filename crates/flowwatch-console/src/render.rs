//! Table view models for flows and blocked addresses.
//!
//! Rendering is pure: the same records always produce the same
//! [`TableView`]. The ratatui layer and the plain-text printer both draw
//! from these views, so neither has to know about missing fields or
//! anomaly encoding.

use flowwatch_protocol::{BlockedEntry, FlowRecord};

pub const FLOW_HEADERS: [&str; 8] = ["Time", "Src", "Dst", "Proto", "Pkts", "Bytes", "Anom", "Action"];
pub const BLOCKED_HEADERS: [&str; 5] = ["IP", "Blocked At", "Device", "Reason", ""];

/// Row-level style class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Anomaly,
    Normal,
    Plain,
}

impl RowClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowClass::Anomaly => "anom-row",
            RowClass::Normal => "ok-row",
            RowClass::Plain => "",
        }
    }
}

/// Inline anomaly badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Yes,
    No,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Yes => "YES",
            Badge::No => "NO",
        }
    }
}

/// An action control bound to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Unblock(String),
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Unblock(_) => "Unblock",
        }
    }

    pub fn ip(&self) -> &str {
        match self {
            RowAction::Unblock(ip) => ip,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Text(String),
    Badge(Badge),
    Action(RowAction),
}

impl CellContent {
    fn optional<T: ToString>(value: Option<&T>) -> Self {
        CellContent::Text(value.map(ToString::to_string).unwrap_or_default())
    }

    /// Text shown for the cell.
    pub fn display(&self) -> &str {
        match self {
            CellContent::Text(s) => s,
            CellContent::Badge(b) => b.label(),
            CellContent::Action(a) => a.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub class: RowClass,
    pub cells: Vec<CellContent>,
}

impl TableRow {
    pub fn action(&self) -> Option<&RowAction> {
        self.cells.iter().find_map(|c| match c {
            CellContent::Action(a) => Some(a),
            _ => None,
        })
    }

    pub fn badge(&self) -> Option<Badge> {
        self.cells.iter().find_map(|c| match c {
            CellContent::Badge(b) => Some(*b),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn empty(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fixed-width plain text, header first. Trailing spaces are trimmed.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.cells.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.display().chars().count());
                }
            }
        }

        let mut out = String::new();
        let header: Vec<&str> = self.headers.to_vec();
        push_line(&mut out, &header, &widths);
        for row in &self.rows {
            let cells: Vec<&str> = row.cells.iter().map(CellContent::display).collect();
            push_line(&mut out, &cells, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// One row per flow, in input order.
pub fn render_flows_table(rows: &[FlowRecord]) -> TableView {
    let rows = rows
        .iter()
        .map(|r| {
            let (class, badge) = if r.is_anomalous() {
                (RowClass::Anomaly, Badge::Yes)
            } else {
                (RowClass::Normal, Badge::No)
            };
            TableRow {
                class,
                cells: vec![
                    CellContent::optional(r.ts.as_ref()),
                    CellContent::optional(r.src_ip.as_ref()),
                    CellContent::optional(r.dest_ip.as_ref()),
                    CellContent::optional(r.protocol.as_ref()),
                    CellContent::optional(r.packets.as_ref()),
                    CellContent::optional(r.bytes_sent.as_ref()),
                    CellContent::Badge(badge),
                    CellContent::optional(r.action_taken.as_ref()),
                ],
            }
        })
        .collect();

    TableView {
        headers: FLOW_HEADERS.to_vec(),
        rows,
    }
}

/// Single-line summary of one flow, including the fields the table omits.
///
/// `#4242  10.0.0.5:51234 -> 8.8.8.8:853  UDP  action: none`
pub fn flow_detail(flow: &FlowRecord) -> String {
    fn endpoint(ip: Option<&String>, port: Option<u16>) -> String {
        let ip = ip.map(String::as_str).unwrap_or("?");
        match port {
            Some(port) => format!("{ip}:{port}"),
            None => ip.to_string(),
        }
    }

    let mut parts = Vec::with_capacity(4);
    if let Some(id) = flow.id {
        parts.push(format!("#{id}"));
    }
    parts.push(format!(
        "{} -> {}",
        endpoint(flow.src_ip.as_ref(), flow.src_port),
        endpoint(flow.dest_ip.as_ref(), flow.dest_port)
    ));
    if let Some(proto) = &flow.protocol {
        parts.push(proto.clone());
    }
    parts.push(format!(
        "action: {}",
        flow.action_taken.as_deref().unwrap_or("-")
    ));
    parts.join("  ")
}

/// One row per blocked address, in input order, each with an unblock control.
///
/// A row whose address is missing gets no control: there is nothing to unblock.
pub fn render_blocked_table(rows: &[BlockedEntry]) -> TableView {
    let rows = rows
        .iter()
        .map(|r| {
            let action = match r.ip.as_deref() {
                Some(ip) if !ip.trim().is_empty() => {
                    CellContent::Action(RowAction::Unblock(ip.to_string()))
                }
                _ => CellContent::Text(String::new()),
            };
            TableRow {
                class: RowClass::Plain,
                cells: vec![
                    CellContent::optional(r.ip.as_ref()),
                    CellContent::optional(r.blocked_at.as_ref()),
                    CellContent::optional(r.device.as_ref()),
                    CellContent::optional(r.reason.as_ref()),
                    action,
                ],
            }
        })
        .collect();

    TableView {
        headers: BLOCKED_HEADERS.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(anomaly: bool) -> FlowRecord {
        FlowRecord {
            ts: Some("2025-01-06 10:00:00".into()),
            src_ip: Some("10.0.0.1".into()),
            dest_ip: Some("8.8.8.8".into()),
            protocol: Some("UDP".into()),
            packets: Some(3),
            bytes_sent: Some(180),
            is_anomaly: anomaly,
            action_taken: Some("none".into()),
            ..Default::default()
        }
    }

    #[test]
    fn detail_line_shows_id_ports_and_action() {
        let record = FlowRecord {
            id: Some(4242),
            src_port: Some(51234),
            dest_port: Some(853),
            ..flow(false)
        };
        assert_eq!(
            flow_detail(&record),
            "#4242  10.0.0.1:51234 -> 8.8.8.8:853  UDP  action: none"
        );
        assert_eq!(
            flow_detail(&FlowRecord::default()),
            "? -> ?  action: -"
        );
    }

    #[test]
    fn empty_inputs_give_header_only_tables() {
        let flows = render_flows_table(&[]);
        let blocked = render_blocked_table(&[]);
        assert!(flows.is_empty());
        assert!(blocked.is_empty());
        assert_eq!(flows.headers.len(), 8);
        assert_eq!(blocked.headers.len(), 5);
        assert_eq!(flows.to_text().lines().count(), 1);
        assert_eq!(blocked.to_text().lines().count(), 1);
    }

    #[test]
    fn anomaly_rows_are_classed_and_badged() {
        let table = render_flows_table(&[flow(true), flow(false)]);
        assert_eq!(table.rows[0].class.as_str(), "anom-row");
        assert_eq!(table.rows[0].badge().map(|b| b.label()), Some("YES"));
        assert_eq!(table.rows[1].class.as_str(), "ok-row");
        assert_eq!(table.rows[1].badge().map(|b| b.label()), Some("NO"));
    }

    #[test]
    fn missing_fields_render_as_empty_cells() {
        let table = render_flows_table(&[FlowRecord::default()]);
        let row = &table.rows[0];
        let texts: Vec<&str> = row.cells.iter().map(CellContent::display).collect();
        assert_eq!(texts, vec!["", "", "", "", "", "", "NO", ""]);
        assert!(!table.to_text().contains("undefined"));
        assert!(!table.to_text().contains("None"));
    }

    #[test]
    fn rows_keep_input_order() {
        let mut a = flow(false);
        a.src_ip = Some("10.0.0.9".into());
        let mut b = flow(false);
        b.src_ip = Some("10.0.0.1".into());
        let table = render_flows_table(&[a, b]);
        assert_eq!(table.rows[0].cells[1].display(), "10.0.0.9");
        assert_eq!(table.rows[1].cells[1].display(), "10.0.0.1");
    }

    #[test]
    fn blocked_rows_bind_unblock_to_their_ip() {
        let entries = vec![
            BlockedEntry {
                ip: Some("10.0.0.5".into()),
                blocked_at: Some("t1".into()),
                device: Some("d1".into()),
                reason: Some("r1".into()),
                ..Default::default()
            },
            BlockedEntry::default(),
        ];
        let table = render_blocked_table(&entries);
        assert_eq!(
            table.rows[0].action(),
            Some(&RowAction::Unblock("10.0.0.5".into()))
        );
        assert_eq!(table.rows[0].action().map(RowAction::label), Some("Unblock"));
        assert_eq!(table.rows[1].action(), None);
    }

    #[test]
    fn text_output_aligns_columns() {
        let text = render_flows_table(&[flow(true)]).to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Time"));
        assert!(lines[1].contains("YES"));
        assert_eq!(lines[0].find("Src"), lines[1].find("10.0.0.1"));
    }
}
