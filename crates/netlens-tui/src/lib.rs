// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use netlens_app::{
    CursorDirection, Endpoint, FetchCompleted, FetchOutcome, FetchRequest, NavEvent, NavMessage,
    NavigationCoordinator, ProfileSummary, RowDetail, TableHandle, TableRegistry, TableSpec,
    TimeWindow, ViewKind, Visibility, flag,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const BROWSER_WIDTH: u16 = 34;
const INFO_HEIGHT: u16 = 4;
const NESTED_MARK: &str = "↳";
const EXPANDED_MARK: &str = "▾";
const COLLAPSED_MARK: &str = "▸";

pub trait AppRuntime {
    fn fetch_rows(&mut self, endpoint: &Endpoint) -> Result<Vec<netlens_app::Row>>;

    /// Runs a queued fetch and reports completion on `tx`. The default runs
    /// inline; network runtimes fetch off the UI thread instead.
    fn spawn_fetch(&mut self, request: FetchRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.fetch_rows(&request.endpoint);
        tx.send(InternalEvent::Fetch(fetch_completed(&request, result)))
            .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

/// Wraps a fetch result as the completion message for `request`.
pub fn fetch_completed(
    request: &FetchRequest,
    result: Result<Vec<netlens_app::Row>>,
) -> FetchCompleted {
    let outcome = match result {
        Ok(rows) => FetchOutcome::Rows {
            rows,
            received_at: OffsetDateTime::now_utc(),
        },
        Err(error) => FetchOutcome::Failed {
            error: format!("{error:#}"),
        },
    };
    FetchCompleted {
        table: request.table,
        generation: request.generation,
        outcome,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Fetch(FetchCompleted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Browser,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowserEntry {
    Profile { row: usize },
    TimeWindow { table: TableHandle, row: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BrowserLine {
    text: String,
    highlighted: bool,
    marked: bool,
    blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewLine {
    Row { row: usize },
    Detail(String),
    Nested { table: TableHandle, row: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    focus: Focus,
    browser_cursor: usize,
    view_cursor: usize,
    status: Option<String>,
    status_token: u64,
    help_visible: bool,
}

pub fn run_app<R: AppRuntime>(nav: &mut NavigationCoordinator, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    if !nav.profile_browser().is_visible() {
        view_data.focus = Focus::View;
    }
    let (internal_tx, internal_rx) = mpsc::channel();
    start_session(nav, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(nav, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, nav, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let next = match event::poll(Duration::from_millis(120)) {
            Ok(true) => event::read().map(Some),
            Ok(false) => Ok(None),
            Err(error) => Err(error),
        };
        match next {
            Ok(Some(Event::Key(key))) => {
                if handle_key_event(nav, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error).context("read terminal event");
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn start_session<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = nav.start();
    after_nav(nav, runtime, view_data, internal_tx, &events);
}

fn process_internal_events(
    nav: &mut NavigationCoordinator,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetch(completed) => {
                let events = nav.dispatch(NavMessage::FetchCompleted(completed));
                for event in &events {
                    report_event(view_data, tx, event);
                }
                clamp_cursors(nav, view_data);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch_nav<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: NavMessage,
) {
    let events = nav.dispatch(message);
    after_nav(nav, runtime, view_data, internal_tx, &events);
}

/// Reports coordinator events, hands queued fetches to the runtime, and
/// keeps highlights inside the current row counts.
fn after_nav<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[NavEvent],
) {
    for event in events {
        report_event(view_data, internal_tx, event);
    }
    for request in nav.take_requests() {
        let path = request.endpoint.path();
        if let Err(error) = runtime.spawn_fetch(request, internal_tx.clone()) {
            tracing::warn!(%path, %error, "fetch could not be started");
            emit_status(view_data, internal_tx, format!("fetch failed: {error}"));
        }
    }
    clamp_cursors(nav, view_data);
}

fn report_event(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, event: &NavEvent) {
    match event {
        NavEvent::FetchFailed { error, .. } => {
            emit_status(view_data, internal_tx, format!("load failed: {error}"));
        }
        NavEvent::ProfileBrowserChanged(visibility) => {
            let status = match visibility {
                Visibility::Visible => "profiles shown",
                Visibility::Hidden => "profiles hidden",
            };
            emit_status(view_data, internal_tx, status);
        }
        NavEvent::StaleResponseDropped { table, generation } => {
            tracing::debug!(%table, generation, "stale response ignored");
        }
        _ => {}
    }
}

fn handle_key_event<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }

    if ctrl && matches!(key.code, KeyCode::Char('n') | KeyCode::Char('p')) {
        if !nav.has_active_table() {
            tracing::trace!("time-window cursor key ignored; nothing selected");
            return false;
        }
        let direction = if key.code == KeyCode::Char('n') {
            CursorDirection::Next
        } else {
            CursorDirection::Previous
        };
        dispatch_nav(
            nav,
            runtime,
            view_data,
            internal_tx,
            NavMessage::MoveCursor(direction),
        );
        sync_browser_cursor(nav, view_data);
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char(digit @ '1'..='6') => {
            let index = digit as usize - '1' as usize;
            if let Some(view) = ViewKind::ALL.get(index).copied() {
                if view != nav.selection().active_view() {
                    view_data.view_cursor = 0;
                }
                dispatch_nav(
                    nav,
                    runtime,
                    view_data,
                    internal_tx,
                    NavMessage::ActivateView(view),
                );
            }
        }
        KeyCode::Tab => {
            view_data.focus = match view_data.focus {
                Focus::Browser => Focus::View,
                Focus::View if nav.profile_browser().is_visible() => Focus::Browser,
                Focus::View => Focus::View,
            };
        }
        KeyCode::Char('b') => {
            dispatch_nav(
                nav,
                runtime,
                view_data,
                internal_tx,
                NavMessage::ToggleProfileBrowser,
            );
            if !nav.profile_browser().is_visible() {
                view_data.focus = Focus::View;
            }
        }
        KeyCode::Char('r') => {
            dispatch_nav(
                nav,
                runtime,
                view_data,
                internal_tx,
                NavMessage::RefreshProfiles,
            );
        }
        KeyCode::Char('j') | KeyCode::Down => move_highlight(nav, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_highlight(nav, view_data, -1),
        KeyCode::Enter => activate_highlighted(nav, runtime, view_data, internal_tx),
        KeyCode::Esc if view_data.focus == Focus::View => {
            if let Some(table) = nav.active_view_table() {
                let events = nav.collapse_row(table, view_data.view_cursor);
                after_nav(nav, runtime, view_data, internal_tx, &events);
            }
        }
        KeyCode::Char('i') => lookup_highlighted(nav, runtime, view_data, internal_tx, 0),
        KeyCode::Char('I') => lookup_highlighted(nav, runtime, view_data, internal_tx, 1),
        _ => {}
    }
    false
}

fn move_highlight(nav: &NavigationCoordinator, view_data: &mut ViewData, delta: isize) {
    let (cursor, len) = match view_data.focus {
        Focus::Browser => (
            &mut view_data.browser_cursor,
            browser_entries(nav).len(),
        ),
        Focus::View => (&mut view_data.view_cursor, active_view_row_count(nav)),
    };
    if len == 0 {
        *cursor = 0;
        return;
    }
    *cursor = cursor.saturating_add_signed(delta).min(len - 1);
}

fn activate_highlighted<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let message = match view_data.focus {
        Focus::Browser => match browser_entries(nav).get(view_data.browser_cursor) {
            Some(BrowserEntry::Profile { row }) => NavMessage::ToggleRowDetail {
                table: nav.profiles_table(),
                row: *row,
            },
            Some(BrowserEntry::TimeWindow { table, row }) => NavMessage::SelectTimeWindow {
                table: *table,
                row: *row,
            },
            None => return,
        },
        Focus::View => {
            let Some(table) = nav.active_view_table() else {
                return;
            };
            NavMessage::ToggleRowDetail {
                table,
                row: view_data.view_cursor,
            }
        }
    };
    dispatch_nav(nav, runtime, view_data, internal_tx, message);
}

fn lookup_highlighted<R: AppRuntime>(
    nav: &mut NavigationCoordinator,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field_index: usize,
) {
    let (table, row) = match view_data.focus {
        Focus::Browser => match browser_entries(nav).get(view_data.browser_cursor) {
            Some(BrowserEntry::Profile { row }) => (nav.profiles_table(), *row),
            _ => return,
        },
        Focus::View => match nav.active_view_table() {
            Some(table) => (table, view_data.view_cursor),
            None => return,
        },
    };
    let Some(field) = nav
        .tables()
        .get(table)
        .and_then(|instance| instance.spec().info_fields.get(field_index))
    else {
        emit_status(view_data, internal_tx, "no lookup available here");
        return;
    };
    dispatch_nav(
        nav,
        runtime,
        view_data,
        internal_tx,
        NavMessage::LookupInfo {
            table,
            row,
            field: (*field).to_owned(),
        },
    );
}

fn sync_browser_cursor(nav: &NavigationCoordinator, view_data: &mut ViewData) {
    let (Some(table), Some(row)) = (nav.selection().active_table(), nav.selection().cursor_row())
    else {
        return;
    };
    if let Some(position) = browser_entries(nav)
        .iter()
        .position(|entry| *entry == BrowserEntry::TimeWindow { table, row })
    {
        view_data.browser_cursor = position;
    }
}

fn clamp_cursors(nav: &NavigationCoordinator, view_data: &mut ViewData) {
    let browser = browser_entries(nav).len();
    view_data.browser_cursor = view_data.browser_cursor.min(browser.saturating_sub(1));
    let rows = active_view_row_count(nav);
    view_data.view_cursor = view_data.view_cursor.min(rows.saturating_sub(1));
}

fn active_view_row_count(nav: &NavigationCoordinator) -> usize {
    nav.active_view_table()
        .map(|table| nav.tables().rows(table).len())
        .unwrap_or(0)
}

fn browser_entries(nav: &NavigationCoordinator) -> Vec<BrowserEntry> {
    let Some(profiles) = nav.tables().get(nav.profiles_table()) else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    for row in 0..profiles.rows.len() {
        entries.push(BrowserEntry::Profile { row });
        if let Some(RowDetail::Nested(nested)) = profiles.detail_for_row(row) {
            let count = nav.tables().rows(*nested).len();
            entries.extend((0..count).map(|row| BrowserEntry::TimeWindow {
                table: *nested,
                row,
            }));
        }
    }
    entries
}

fn browser_lines(nav: &NavigationCoordinator, view_data: &ViewData) -> Vec<BrowserLine> {
    let focused = view_data.focus == Focus::Browser;
    browser_entries(nav)
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let highlighted = focused && index == view_data.browser_cursor;
            match entry {
                BrowserEntry::Profile { row } => {
                    let profiles = nav.tables().get(nav.profiles_table())?;
                    let summary = profiles.row(row).and_then(ProfileSummary::from_row)?;
                    let mark = if profiles.detail_for_row(row).is_some() {
                        EXPANDED_MARK
                    } else {
                        COLLAPSED_MARK
                    };
                    Some(BrowserLine {
                        text: format!("{mark} {}", summary.id),
                        highlighted,
                        marked: false,
                        blocked: summary.blocked,
                    })
                }
                BrowserEntry::TimeWindow { table, row } => {
                    let instance = nav.tables().get(table)?;
                    let window = instance.row(row).and_then(TimeWindow::from_row)?;
                    let marked = instance.is_marked(row);
                    let bullet = if marked { "●" } else { "·" };
                    Some(BrowserLine {
                        text: format!("  {bullet} {}", window.name),
                        highlighted,
                        marked,
                        blocked: window.blocked,
                    })
                }
            }
        })
        .collect()
}

fn view_lines(nav: &NavigationCoordinator) -> Vec<ViewLine> {
    let Some(table) = nav
        .active_view_table()
        .and_then(|table| nav.tables().get(table))
    else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    for row in 0..table.rows.len() {
        lines.push(ViewLine::Row { row });
        match table.detail_for_row(row) {
            Some(RowDetail::Inline(pairs)) => lines.extend(
                pairs
                    .iter()
                    .map(|(key, value)| ViewLine::Detail(format!("{key}: {value}"))),
            ),
            Some(RowDetail::Nested(nested)) => {
                let count = nav.tables().rows(*nested).len();
                if count == 0 {
                    lines.push(ViewLine::Detail("loading evidence…".to_owned()));
                }
                lines.extend((0..count).map(|row| ViewLine::Nested {
                    table: *nested,
                    row,
                }));
            }
            None => {}
        }
    }
    lines
}

fn cell_text(nav: &NavigationCoordinator, table: TableHandle, row: usize, field: &str) -> String {
    nav.tables()
        .get(table)
        .and_then(|instance| instance.row(row))
        .and_then(|data| data.text(field))
        .unwrap_or_default()
}

fn view_title(nav: &NavigationCoordinator) -> String {
    let view = nav.selection().active_view();
    let mut title = view.label().to_owned();
    let Some(table) = nav
        .active_view_table()
        .and_then(|table| nav.tables().get(table))
    else {
        return title;
    };
    if table.loading {
        title.push_str(" (loading)");
    }
    if let Some(loaded_at) = table.loaded_at {
        title.push_str(" as of ");
        title.push_str(&clock_time(loaded_at));
    }
    title
}

fn clock_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second] UTC"))
        .unwrap_or_default()
}

fn header_title(nav: &NavigationCoordinator) -> String {
    match nav.selection().selection_label() {
        Some(label) => format!("netlens | {label}"),
        None => "netlens".to_owned(),
    }
}

fn info_text(nav: &NavigationCoordinator) -> String {
    let Some(info) = nav.tables().get(nav.info_table()) else {
        return String::new();
    };
    let Some(row) = info.rows.first() else {
        return if info.loading {
            "looking up…".to_owned()
        } else {
            String::new()
        };
    };
    info.spec()
        .columns
        .iter()
        .filter_map(|column| {
            row.text(column.field)
                .map(|value| format!("{}: {value}", column.title))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn status_text(nav: &NavigationCoordinator, view_data: &ViewData) -> String {
    if let Some(status) = &view_data.status {
        return status.clone();
    }
    let selection = nav
        .selection()
        .selection_label()
        .unwrap_or_else(|| "no time window selected".to_owned());
    let hints = if nav.has_active_table() {
        "1-6 view  enter open  i info  ^n/^p next/prev tw  ? help"
    } else {
        "1-6 view  enter open  i info  ? help"
    };
    format!("{selection}  |  {hints}")
}

fn help_overlay_text() -> &'static str {
    "Global\n  ctrl+n / ctrl+p  next / previous time window\n  ctrl+q, q        quit\n  ?                toggle help\n\nViews\n  1-6              timeline, flows, alerts, in tuples, out tuples, evidence\n  tab              switch focus between profiles and view\n  j/k, arrows      move highlight\n  enter            expand profile, select time window, toggle row detail\n  esc              collapse highlighted row\n  i / I            look up address (daddr / saddr) or profile\n\nProfiles\n  b                show / hide profile browser\n  r                refresh profiles"
}

fn render(frame: &mut ratatui::Frame<'_>, nav: &NavigationCoordinator, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(INFO_HEIGHT),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = ViewKind::ALL
        .iter()
        .position(|view| *view == nav.selection().active_view())
        .unwrap_or(0);
    let titles = ViewKind::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| format!("{} {}", index + 1, view.label()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(header_title(nav))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let body = if nav.profile_browser().is_visible() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(BROWSER_WIDTH), Constraint::Min(1)])
            .split(layout[1]);
        render_browser(frame, split[0], nav, view_data);
        split[1]
    } else {
        layout[1]
    };
    render_view_table(frame, body, nav, view_data);

    let info = Paragraph::new(info_text(nav))
        .block(Block::default().title("info").borders(Borders::ALL));
    frame.render_widget(info, layout[2]);

    let status_widget = Paragraph::new(status_text(nav, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_browser(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    nav: &NavigationCoordinator,
    view_data: &ViewData,
) {
    let lines = browser_lines(nav, view_data)
        .into_iter()
        .map(|line| {
            let mut style = Style::default();
            if line.blocked {
                style = style.fg(Color::Red);
            }
            if line.marked {
                style = style.add_modifier(Modifier::BOLD);
            }
            if line.highlighted {
                style = style.bg(Color::DarkGray);
            }
            Line::styled(line.text, style)
        })
        .collect::<Vec<_>>();
    let border = if view_data.focus == Focus::Browser {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let browser = Paragraph::new(lines).block(
        Block::default()
            .title("profiles")
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(browser, area);
}

fn render_view_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    nav: &NavigationCoordinator,
    view_data: &ViewData,
) {
    let spec = TableRegistry::view(nav.selection().active_view());
    let widths = vec![Constraint::Min(6); spec.columns.len().max(1)];
    let header = Row::new(spec.columns.iter().map(|column| {
        Cell::from(column.title).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let table_handle = nav.active_view_table();
    let focused = view_data.focus == Focus::View;
    let rows = view_lines(nav).into_iter().map(|line| match line {
        ViewLine::Row { row } => {
            let Some(table) = table_handle else {
                return Row::default();
            };
            let mut style = Style::default();
            if nav
                .tables()
                .get(table)
                .is_some_and(|instance| flag_warning(instance.row(row)))
            {
                style = style.fg(Color::Red);
            }
            if focused && row == view_data.view_cursor {
                style = style.bg(Color::DarkGray);
            }
            Row::new(
                spec.columns
                    .iter()
                    .map(|column| Cell::from(cell_text(nav, table, row, column.field))),
            )
            .style(style)
        }
        ViewLine::Detail(text) => Row::new([Cell::from(format!("  {NESTED_MARK} {text}"))])
            .style(Style::default().fg(Color::Gray)),
        ViewLine::Nested { table, row } => nested_row(nav, spec, table, row),
    });

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(view_title(nav))
                .borders(Borders::ALL)
                .border_style(border),
        );
    frame.render_widget(table, area);
}

fn nested_row(
    nav: &NavigationCoordinator,
    parent: &TableSpec,
    table: TableHandle,
    row: usize,
) -> Row<'static> {
    let Some(nested) = nav.tables().get(table) else {
        return Row::default();
    };
    let cells = nested
        .spec()
        .columns
        .iter()
        .take(parent.columns.len())
        .enumerate()
        .map(|(index, column)| {
            let text = cell_text(nav, table, row, column.field);
            if index == 0 {
                Cell::from(format!("  {NESTED_MARK} {text}"))
            } else {
                Cell::from(text)
            }
        })
        .collect::<Vec<_>>();
    Row::new(cells).style(Style::default().fg(Color::Magenta))
}

fn flag_warning(row: Option<&netlens_app::Row>) -> bool {
    row.is_some_and(|row| row.text("warning").is_some_and(|warning| !warning.is_empty()) || flag(row, "blocked"))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
