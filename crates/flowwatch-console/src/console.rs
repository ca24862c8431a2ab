//! Interactive terminal dashboard.
//!
//! Draws the controller's [`DashboardView`]: the flows and blocked tables,
//! the three summary charts, the live inputs (API URL, auto-refresh toggle,
//! IP address) and the action message area.
//!
//! Launch with `flowwatch-console` (or `flowwatch-console console`).

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

use crate::charts::{ChartKind, ChartSlot, ChartSpec};
use crate::controller::{ActionOutcome, ControlInputs, DashboardController, DashboardView, Trigger};
use crate::elements::{DashboardElements, ElementId};
use crate::render::{flow_detail, CellContent, RowClass, TableView};

/// Slice colours, cycled.
const PIE_PALETTE: [Color; 4] = [
    Color::Rgb(0x36, 0xA2, 0xEB),
    Color::Rgb(0xFF, 0x63, 0x84),
    Color::Rgb(0xFF, 0xCE, 0x56),
    Color::Rgb(0x4B, 0xC0, 0xC0),
];

/// Which part of the screen receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    ApiUrl,
    IpInput,
    Flows,
    Blocked,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::ApiUrl => Focus::IpInput,
            Focus::IpInput => Focus::Flows,
            Focus::Flows => Focus::Blocked,
            Focus::Blocked => Focus::ApiUrl,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::ApiUrl => Focus::Blocked,
            Focus::IpInput => Focus::ApiUrl,
            Focus::Flows => Focus::IpInput,
            Focus::Blocked => Focus::Flows,
        }
    }
}

/// What a keystroke asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    None,
    Quit,
    Refresh,
    Block,
    Unblock,
    /// Run the action bound to the selected blocked row.
    ActivateSelected,
}

/// Row counts of the two tables, for moving selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSizes {
    pub flows: usize,
    pub blocked: usize,
}

impl TableSizes {
    pub fn of(view: &DashboardView) -> Self {
        Self {
            flows: view.flows_table.len(),
            blocked: view.blocked_table.len(),
        }
    }
}

/// Keyboard and selection state; the data itself lives in the controller.
#[derive(Debug)]
pub struct ConsoleState {
    pub focus: Focus,
    api_cursor: usize,
    ip_cursor: usize,
    flows_selected: usize,
    blocked_selected: usize,
}

impl ConsoleState {
    pub fn new(inputs: &ControlInputs) -> Self {
        Self {
            focus: Focus::IpInput,
            api_cursor: inputs.api_url.raw().chars().count(),
            ip_cursor: inputs.ip_input.chars().count(),
            flows_selected: 0,
            blocked_selected: 0,
        }
    }

    pub fn blocked_selected(&self) -> usize {
        self.blocked_selected
    }

    /// Apply a keystroke. Text edits and toggles happen here; anything that
    /// needs the network is returned as a command.
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        inputs: &mut ControlInputs,
        sizes: TableSizes,
    ) -> ConsoleCommand {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                return ConsoleCommand::Quit
            }
            (KeyCode::Char('b'), KeyModifiers::CONTROL) => return ConsoleCommand::Block,
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => return ConsoleCommand::Unblock,
            (KeyCode::F(5), _) => return ConsoleCommand::Refresh,
            (KeyCode::F(2), _) => {
                inputs.auto_refresh = !inputs.auto_refresh;
                return ConsoleCommand::None;
            }
            (KeyCode::Tab, _) => {
                self.focus = self.focus.next();
                return ConsoleCommand::None;
            }
            (KeyCode::BackTab, _) => {
                self.focus = self.focus.prev();
                return ConsoleCommand::None;
            }
            _ => {}
        }

        // Unbound chords are not text.
        if matches!(code, KeyCode::Char(_))
            && modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return ConsoleCommand::None;
        }

        match self.focus {
            Focus::ApiUrl => {
                if code == KeyCode::Enter {
                    return ConsoleCommand::Refresh;
                }
                let cursor = &mut self.api_cursor;
                inputs.api_url.edit(|text| edit_text(text, cursor, code));
            }
            Focus::IpInput => {
                if code == KeyCode::Enter {
                    return ConsoleCommand::Block;
                }
                edit_text(&mut inputs.ip_input, &mut self.ip_cursor, code);
            }
            Focus::Flows => match code {
                KeyCode::Up => self.flows_selected = self.flows_selected.saturating_sub(1),
                KeyCode::Down => {
                    self.flows_selected = step_down(self.flows_selected, sizes.flows)
                }
                KeyCode::Char('r') => return ConsoleCommand::Refresh,
                KeyCode::Char(' ') => inputs.auto_refresh = !inputs.auto_refresh,
                _ => {}
            },
            Focus::Blocked => match code {
                KeyCode::Up => self.blocked_selected = self.blocked_selected.saturating_sub(1),
                KeyCode::Down => {
                    self.blocked_selected = step_down(self.blocked_selected, sizes.blocked)
                }
                KeyCode::Char('r') => return ConsoleCommand::Refresh,
                KeyCode::Enter | KeyCode::Char('u') => return ConsoleCommand::ActivateSelected,
                _ => {}
            },
        }
        ConsoleCommand::None
    }

    /// Keep selections inside tables that may have shrunk after a refresh.
    fn clamp_selection(&mut self, sizes: TableSizes) {
        self.flows_selected = self.flows_selected.min(sizes.flows.saturating_sub(1));
        self.blocked_selected = self.blocked_selected.min(sizes.blocked.saturating_sub(1));
    }
}

fn step_down(selected: usize, len: usize) -> usize {
    if selected + 1 < len {
        selected + 1
    } else {
        selected
    }
}

fn byte_offset(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Single-line editing with a char-indexed cursor.
fn edit_text(text: &mut String, cursor: &mut usize, code: KeyCode) {
    let len = text.chars().count();
    *cursor = (*cursor).min(len);
    match code {
        KeyCode::Char(c) => {
            let at = byte_offset(text, *cursor);
            text.insert(at, c);
            *cursor += 1;
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                let at = byte_offset(text, *cursor - 1);
                text.remove(at);
                *cursor -= 1;
            }
        }
        KeyCode::Delete => {
            if *cursor < len {
                let at = byte_offset(text, *cursor);
                text.remove(at);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(len),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = len,
        _ => {}
    }
}

/// Render the full dashboard layout.
pub fn draw(
    frame: &mut Frame,
    state: &ConsoleState,
    view: &DashboardView,
    inputs: &ControlInputs,
    elements: &DashboardElements,
) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // API URL + refresh status
            Constraint::Min(8),     // Tables
            Constraint::Length(12), // Charts
            Constraint::Length(4),  // IP input + action message
        ])
        .split(frame.area());

    render_status_bar(frame, outer[0], state, view, inputs, elements);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(outer[1]);
    let flows_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(tables[0]);
    render_table(
        frame,
        flows_area[0],
        elements.label(ElementId::Flows),
        &view.flows_table,
        state.flows_selected,
        state.focus == Focus::Flows,
        &[
            Constraint::Length(19),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Min(6),
        ],
    );
    render_flow_detail(frame, flows_area[1], state, view);
    render_table(
        frame,
        tables[1],
        elements.label(ElementId::Blocked),
        &view.blocked_table,
        state.blocked_selected,
        state.focus == Focus::Blocked,
        &[
            Constraint::Length(15),
            Constraint::Length(19),
            Constraint::Length(10),
            Constraint::Min(8),
            Constraint::Length(9),
        ],
    );

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(outer[2]);
    for (slot, area) in ChartSlot::ALL.into_iter().zip(charts.iter()) {
        render_chart(frame, *area, slot, view, elements);
    }

    render_action_area(frame, outer[3], state, view, inputs, elements);
}

fn focus_style(focused: bool, base: Color) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(base)
    }
}

/// Top bar: API URL input, auto-refresh toggle, refresh state.
fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    state: &ConsoleState,
    view: &DashboardView,
    inputs: &ControlInputs,
    elements: &DashboardElements,
) {
    let block = Block::default()
        .title(" FlowWatch ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let url = inputs.api_url.raw();
    let url_label = format!("  {}: ", elements.label(ElementId::ApiUrl));
    let checkbox = if inputs.auto_refresh { "[x]" } else { "[ ]" };
    let refreshed = view
        .last_refresh()
        .map(|ts| ts.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut spans = vec![
        Span::styled(url_label.clone(), Style::default().fg(Color::Gray)),
        Span::styled(
            if url.is_empty() { "(same origin)".to_string() } else { url.clone() },
            focus_style(state.focus == Focus::ApiUrl, Color::White),
        ),
        Span::styled(
            format!("  |  {} {} ", checkbox, elements.label(ElementId::AutoRefresh)),
            Style::default().fg(if inputs.auto_refresh { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("  |  Last refresh: ", Style::default().fg(Color::Gray)),
        Span::styled(refreshed, Style::default().fg(Color::Magenta)),
    ];
    if let Some(err) = &view.last_error {
        spans.push(Span::styled("  |  ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);

    if state.focus == Focus::ApiUrl {
        let x = area.x + 1 + url_label.chars().count() as u16 + state.api_cursor as u16;
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &TableView,
    selected: usize,
    focused: bool,
    widths: &[Constraint],
) {
    let block = Block::default()
        .title(format!(" {} ({}) ", title, table.len()))
        .borders(Borders::ALL)
        .border_style(focus_style(focused, Color::White));

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let row_style = match row.class {
                RowClass::Anomaly => Style::default().fg(Color::LightRed),
                RowClass::Normal | RowClass::Plain => Style::default().fg(Color::White),
            };
            let cells: Vec<Cell> = row
                .cells
                .iter()
                .map(|cell| match cell {
                    CellContent::Text(s) => Cell::from(s.clone()),
                    CellContent::Badge(b) => {
                        let color = if row.class == RowClass::Anomaly { Color::Red } else { Color::Green };
                        Cell::from(Span::styled(
                            b.label(),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ))
                    }
                    CellContent::Action(a) => Cell::from(Span::styled(
                        format!("[{}]", a.label()),
                        Style::default().fg(Color::Cyan),
                    )),
                })
                .collect();
            Row::new(cells).style(row_style)
        })
        .collect();

    let widget = Table::new(rows, widths.to_vec())
        .block(block)
        .header(
            Row::new(table.headers.clone())
                .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });

    let mut table_state = TableState::default();
    if !table.is_empty() {
        table_state.select(Some(selected));
    }
    frame.render_stateful_widget(widget, area, &mut table_state);
}

/// Detail line for the selected flow: id, ports and action.
fn render_flow_detail(frame: &mut Frame, area: Rect, state: &ConsoleState, view: &DashboardView) {
    let selected = view
        .snapshot
        .as_ref()
        .and_then(|s| s.flows.get(state.flows_selected));
    let line = match selected {
        Some(flow) => Line::from(vec![
            Span::styled(" > ", Style::default().fg(Color::Gray)),
            Span::styled(
                flow_detail(flow),
                Style::default().fg(if flow.is_anomalous() { Color::LightRed } else { Color::White }),
            ),
        ]),
        None => Line::from(Span::styled(" no flow selected", Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_chart(
    frame: &mut Frame,
    area: Rect,
    slot: ChartSlot,
    view: &DashboardView,
    elements: &DashboardElements,
) {
    let Some(spec) = view.charts.get(slot) else {
        let block = Block::default()
            .title(format!(" {} ", elements.label(slot.element())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));
        let text = Paragraph::new(Line::from(Span::styled(
            "  Waiting for first refresh...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(text, area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", spec.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));

    match spec.kind {
        ChartKind::Pie => {
            let width = area.width.saturating_sub(2) as usize;
            frame.render_widget(Paragraph::new(pie_lines(spec, width)).block(block), area);
        }
        ChartKind::Bar => {
            let bars: Vec<Bar> = spec
                .points
                .iter()
                .map(|(label, count)| {
                    Bar::default()
                        .value(*count)
                        .label(Line::from(label.clone()))
                        .text_value(count.to_string())
                        .style(Style::default().fg(PIE_PALETTE[0]))
                })
                .collect();
            let chart = BarChart::default()
                .block(block)
                .direction(Direction::Horizontal)
                .bar_width(1)
                .bar_gap(0)
                .max(spec.max().max(1))
                .data(BarGroup::default().bars(&bars));
            frame.render_widget(chart, area);
        }
    }
}

/// One line per slice: label, a proportional bar and the share.
fn pie_lines(spec: &ChartSpec, width: usize) -> Vec<Line<'static>> {
    let total = spec.total().max(1);
    let label_width = spec
        .points
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        .min(15);
    let bar_budget = width.saturating_sub(label_width + 16).max(1);

    spec.points
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            let share = *count as f64 / total as f64;
            let filled = ((share * bar_budget as f64).round() as usize).max(1);
            let color = PIE_PALETTE[i % PIE_PALETTE.len()];
            let shown: String = label.chars().take(label_width).collect();
            Line::from(vec![
                Span::styled(format!(" {shown:<label_width$} "), Style::default().fg(Color::White)),
                Span::styled("█".repeat(filled), Style::default().fg(color)),
                Span::styled(
                    format!(" {:>5.1}% ({})", share * 100.0, count),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect()
}

/// Bottom area: IP input with its controls, and the action message.
fn render_action_area(
    frame: &mut Frame,
    area: Rect,
    state: &ConsoleState,
    view: &DashboardView,
    inputs: &ControlInputs,
    elements: &DashboardElements,
) {
    let block = Block::default()
        .title(format!(
            " {}: Enter/Ctrl+B {} | Ctrl+U {} | F5 {} | F2 {} | Tab focus | Esc quit ",
            elements.label(ElementId::IpInput),
            elements.label(ElementId::BlockButton),
            elements.label(ElementId::UnblockButton),
            elements.label(ElementId::RefreshButton),
            elements.label(ElementId::AutoRefresh),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = if inputs.ip_input.is_empty() && state.focus != Focus::IpInput {
        Line::from(vec![
            Span::styled("  > ", Style::default().fg(Color::Green)),
            Span::styled("Type an IP address...", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![
            Span::styled("  > ", Style::default().fg(Color::Green)),
            Span::styled(
                inputs.ip_input.clone(),
                focus_style(state.focus == Focus::IpInput, Color::White),
            ),
        ])
    };

    let status = view.status.clone().unwrap_or_default();
    let status_color = if status.starts_with("Error") { Color::Red } else { Color::Cyan };
    let status_line = Line::from(vec![
        Span::styled(
            format!("  {}: ", elements.label(ElementId::ActionMessage)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(status, Style::default().fg(status_color)),
    ]);

    frame.render_widget(Paragraph::new(vec![input_line, status_line]).block(block), area);

    if state.focus == Focus::IpInput {
        let x = area.x + 5 + state.ip_cursor as u16;
        frame.set_cursor_position((x, area.y + 1));
    }
}

/// Plain-text rendering of the current view, for non-interactive use.
pub fn snapshot_report(view: &DashboardView, elements: &DashboardElements) -> String {
    let mut out = String::new();
    if let Some(err) = &view.last_error {
        out.push_str(&format!("{err}\n\n"));
    }

    out.push_str(&format!(
        "== {} ({}) ==\n",
        elements.label(ElementId::Flows),
        view.flows_table.len()
    ));
    out.push_str(&view.flows_table.to_text());
    out.push_str(&format!(
        "\n== {} ({}) ==\n",
        elements.label(ElementId::Blocked),
        view.blocked_table.len()
    ));
    out.push_str(&view.blocked_table.to_text());

    for slot in ChartSlot::ALL {
        if let Some(spec) = view.charts.get(slot) {
            out.push_str(&format!("\n== {} ==\n", spec.title));
            if spec.points.is_empty() {
                out.push_str("(no data)\n");
            }
            for (label, count) in &spec.points {
                out.push_str(&format!("{label:<20} {count}\n"));
            }
        }
    }
    out
}

type PanicHook = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Leaves raw mode and the alternate screen if the dashboard panics, then
/// defers to the previous hook. Dropping the guard reinstates that hook.
pub struct PanicHookGuard {
    original: Option<Arc<PanicHook>>,
}

impl PanicHookGuard {
    pub fn install() -> Self {
        let original: Arc<PanicHook> = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&original);
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            chained(panic_info);
        }));
        Self {
            original: Some(original),
        }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // take_hook panics on a panicking thread.
        if std::thread::panicking() {
            return;
        }
        // Dropping our hook leaves the original with a single owner.
        drop(std::panic::take_hook());
        if let Some(Ok(hook)) = self.original.take().map(Arc::try_unwrap) {
            std::panic::set_hook(hook);
        }
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn dispatch(command: ConsoleCommand, state: &ConsoleState, controller: &mut DashboardController) {
    let outcome = match command {
        ConsoleCommand::None | ConsoleCommand::Quit => return,
        ConsoleCommand::Refresh => {
            controller.request_cycle(Trigger::Manual);
            return;
        }
        ConsoleCommand::Block => controller.block_from_input().await,
        ConsoleCommand::Unblock => controller.unblock_from_input().await,
        ConsoleCommand::ActivateSelected => {
            let action = controller
                .view()
                .blocked_table
                .rows
                .get(state.blocked_selected())
                .and_then(|row| row.action().cloned());
            match action {
                Some(action) => controller.activate(&action).await,
                None => return,
            }
        }
    };
    if let ActionOutcome::Completed { kind, ip, ok, .. } = outcome {
        tracing::debug!(action = %kind, ip = %ip, ok, "Console action finished");
    }
}

/// Draw one frame into any backend.
pub fn draw_once<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &ConsoleState,
    controller: &DashboardController,
) -> io::Result<()> {
    terminal.draw(|frame| {
        draw(
            frame,
            state,
            controller.view(),
            controller.inputs(),
            controller.elements(),
        )
    })?;
    Ok(())
}

/// Run the dashboard event loop until the operator quits.
pub async fn run_console(mut controller: DashboardController) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The dashboard requires a terminal (TTY); use `snapshot` for non-interactive output."
        ));
    }

    let _panic_hook = PanicHookGuard::install();

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
    };
    let mut state = ConsoleState::new(controller.inputs());
    controller.start();

    let result = event_loop(&mut terminal, &mut state, &mut controller).await;

    controller.stop();
    let restored = restore_terminal(&mut terminal);
    result.and(restored.map_err(anyhow::Error::from))
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &mut ConsoleState,
    controller: &mut DashboardController,
) -> Result<(), anyhow::Error> {
    let tick_rate = Duration::from_millis(100);

    loop {
        controller.pump();
        state.clamp_selection(TableSizes::of(controller.view()));

        draw_once(terminal, state, controller)?;

        if event::poll(tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    let sizes = TableSizes::of(controller.view());
                    let command = state.handle_key(
                        key_event.code,
                        key_event.modifiers,
                        controller.inputs_mut(),
                        sizes,
                    );
                    if command == ConsoleCommand::Quit {
                        return Ok(());
                    }
                    dispatch(command, state, controller).await;
                }
            }
        }
    }
}
