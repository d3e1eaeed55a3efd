// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{
    CursorDirection, Endpoint, ExpansionChange, ExpansionController, FetchCompleted, FetchRequest,
    LoadOutcome, NO_CURSOR, ProfileId, RemoteRowSource, RowKey, SelectionState, StalePolicy,
    TableHandle, TableKind, TableRegistry, TableScope, TableStore, TimeWindow, TimeWindowId,
    ViewKind, ViewSwitcher, Visibility,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSettings {
    pub stale_policy: StalePolicy,
    pub profile_browser: Visibility,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            stale_policy: StalePolicy::Discard,
            profile_browser: Visibility::Visible,
        }
    }
}

/// Input accepted by the coordinator. UI events and fetch completions both
/// arrive through [`NavigationCoordinator::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum NavMessage {
    ActivateView(ViewKind),
    SelectTimeWindow {
        table: TableHandle,
        row: usize,
    },
    MoveCursor(CursorDirection),
    ToggleRowDetail {
        table: TableHandle,
        row: usize,
    },
    LookupInfo {
        table: TableHandle,
        row: usize,
        field: String,
    },
    ToggleProfileBrowser,
    RefreshProfiles,
    FetchCompleted(FetchCompleted),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    ViewHidden(ViewKind),
    ListenersDetached(ViewKind),
    ListenersAttached(ViewKind),
    ViewShown(ViewKind),
    RowUnmarked {
        table: TableHandle,
        row: usize,
    },
    RowMarked {
        table: TableHandle,
        row: usize,
    },
    SelectionChanged {
        profile: ProfileId,
        time_window: TimeWindowId,
        cursor: isize,
    },
    ReloadIssued(FetchRequest),
    RowExpanded {
        table: TableHandle,
        key: RowKey,
        nested: Option<TableHandle>,
    },
    RowCollapsed {
        table: TableHandle,
        key: RowKey,
        nested: Option<TableHandle>,
    },
    RowsLoaded {
        table: TableHandle,
        rows: usize,
    },
    StaleResponseDropped {
        table: TableHandle,
        generation: u64,
    },
    FetchFailed {
        table: TableHandle,
        error: String,
    },
    ProfileBrowserChanged(Visibility),
}

/// Translates analyst input into selection transitions and table reloads.
#[derive(Debug, Clone)]
pub struct NavigationCoordinator {
    selection: SelectionState,
    tables: TableStore,
    source: RemoteRowSource,
    switcher: ViewSwitcher,
    view_tables: BTreeMap<ViewKind, TableHandle>,
    profiles_table: TableHandle,
    info_table: TableHandle,
    profile_browser: Visibility,
}

impl NavigationCoordinator {
    pub fn new(selection: SelectionState, settings: NavigationSettings) -> Self {
        let mut tables = TableStore::new();
        let view_tables = TableRegistry::views()
            .filter_map(|spec| {
                let view = spec.kind.view()?;
                Some((view, tables.create(spec.kind, spec.container, TableScope::Global)))
            })
            .collect();
        let profiles = TableRegistry::spec(TableKind::Profiles);
        let profiles_table = tables.create(profiles.kind, profiles.container, TableScope::Global);
        let info = TableRegistry::spec(TableKind::IpInfo);
        let info_table = tables.create(info.kind, info.container, TableScope::Global);

        Self {
            switcher: ViewSwitcher::new(selection.active_view()),
            selection,
            tables,
            source: RemoteRowSource::new(settings.stale_policy),
            view_tables,
            profiles_table,
            info_table,
            profile_browser: settings.profile_browser,
        }
    }

    /// Issues the initial loads: the profile browser, plus the active view
    /// when the injected selection already names a time window.
    pub fn start(&mut self) -> Vec<NavEvent> {
        let mut events = self.refresh_profiles();
        self.reload_active_view(&mut events);
        events
    }

    pub fn dispatch(&mut self, message: NavMessage) -> Vec<NavEvent> {
        match message {
            NavMessage::ActivateView(view) => self.activate_view(view),
            NavMessage::SelectTimeWindow { table, row } => self.select_time_window_row(table, row),
            NavMessage::MoveCursor(direction) => self.move_cursor(direction),
            NavMessage::ToggleRowDetail { table, row } => self.toggle_row_detail(table, row),
            NavMessage::LookupInfo { table, row, field } => self.lookup_info(table, row, &field),
            NavMessage::ToggleProfileBrowser => self.toggle_profile_browser(),
            NavMessage::RefreshProfiles => self.refresh_profiles(),
            NavMessage::FetchCompleted(completed) => self.handle_fetch_completed(completed),
        }
    }

    pub fn activate_view(&mut self, view: ViewKind) -> Vec<NavEvent> {
        let Some(previous) = self.selection.select_view(view) else {
            tracing::trace!(%view, "view already active");
            return Vec::new();
        };
        tracing::debug!(%previous, %view, "activate view");

        let mut events = Vec::new();
        self.switcher.hide(previous);
        events.push(NavEvent::ViewHidden(previous));
        self.switcher.detach_listeners(previous);
        events.push(NavEvent::ListenersDetached(previous));
        self.switcher.attach_listeners(view);
        events.push(NavEvent::ListenersAttached(view));
        self.switcher.show(view);
        events.push(NavEvent::ViewShown(view));
        self.reload_if_dirty(&mut events);
        events
    }

    pub fn select_profile_time_window(
        &mut self,
        profile: ProfileId,
        time_window: TimeWindowId,
        time_window_name: impl Into<String>,
        table: TableHandle,
        row: usize,
    ) -> Vec<NavEvent> {
        let mut events = Vec::new();
        self.unmark_cursor_row(&mut events);

        tracing::debug!(%profile, %time_window, %table, row, "select time window");
        self.selection.select_profile_and_time_window(
            profile.clone(),
            time_window.clone(),
            time_window_name,
            table,
            row,
        );
        self.tables.set_marked(table, row, true);
        events.push(NavEvent::RowMarked { table, row });
        events.push(NavEvent::SelectionChanged {
            profile,
            time_window,
            cursor: self.selection.cursor(),
        });
        self.reload_if_dirty(&mut events);
        events
    }

    /// Selects a row of a nested time-window table, taking the profile from
    /// the table's scope.
    pub fn select_time_window_row(&mut self, table: TableHandle, row: usize) -> Vec<NavEvent> {
        let Some(instance) = self.tables.get(table) else {
            return Vec::new();
        };
        let TableScope::Profile(profile) = &instance.scope else {
            return Vec::new();
        };
        let Some(window) = instance.row(row).and_then(TimeWindow::from_row) else {
            return Vec::new();
        };
        let profile = profile.clone();
        self.select_profile_time_window(profile, window.id, window.name, table, row)
    }

    pub fn move_cursor(&mut self, direction: CursorDirection) -> Vec<NavEvent> {
        let Some(table) = self.active_time_window_table() else {
            tracing::trace!(?direction, "cursor move ignored; no active time-window table");
            return Vec::new();
        };
        let rows = self.tables.rows(table);
        let Some(row) = wrap_cursor(self.selection.cursor(), rows.len(), direction) else {
            return Vec::new();
        };
        let Some(window) = rows.get(row).and_then(TimeWindow::from_row) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        self.unmark_cursor_row(&mut events);
        tracing::debug!(?direction, row, time_window = %window.id, "cursor moved");
        self.selection.move_cursor(row, window.id.clone(), window.name);
        self.tables.set_marked(table, row, true);
        events.push(NavEvent::RowMarked { table, row });
        if let Some(profile) = self.selection.active_profile() {
            events.push(NavEvent::SelectionChanged {
                profile: profile.clone(),
                time_window: window.id,
                cursor: self.selection.cursor(),
            });
        }
        self.reload_if_dirty(&mut events);
        events
    }

    pub fn toggle_row_detail(&mut self, table: TableHandle, row: usize) -> Vec<NavEvent> {
        let Some(kind) = self.tables.get(table).map(|instance| instance.kind) else {
            return Vec::new();
        };
        if !self.accepts_row_input(kind) {
            tracing::trace!(%table, "row toggle ignored; listeners detached");
            return Vec::new();
        }

        let mut events = Vec::new();
        if kind == TableKind::Profiles {
            events.extend(self.lookup_info(table, row, "profile"));
        }
        match ExpansionController::toggle_row_detail(&mut self.tables, &mut self.source, table, row)
        {
            ExpansionChange::Expanded { key, nested } => {
                events.push(NavEvent::RowExpanded { table, key, nested });
                if let Some(nested) = nested {
                    self.rebind_cursor_table(nested);
                }
                if let Some(nested) = nested
                    && let Some(request) = self
                        .source
                        .pending()
                        .iter()
                        .rev()
                        .find(|request| request.table == nested)
                {
                    events.push(NavEvent::ReloadIssued(request.clone()));
                }
            }
            ExpansionChange::Collapsed { key, nested } => {
                events.push(NavEvent::RowCollapsed { table, key, nested });
            }
            ExpansionChange::Unchanged => {}
        }
        events
    }

    pub fn collapse_row(&mut self, table: TableHandle, row: usize) -> Vec<NavEvent> {
        match ExpansionController::collapse_row(&mut self.tables, table, row) {
            ExpansionChange::Collapsed { key, nested } => {
                vec![NavEvent::RowCollapsed { table, key, nested }]
            }
            _ => Vec::new(),
        }
    }

    /// Loads the info panel for the value of `field` in the given row.
    pub fn lookup_info(&mut self, table: TableHandle, row: usize, field: &str) -> Vec<NavEvent> {
        let Some(instance) = self.tables.get(table) else {
            return Vec::new();
        };
        let listed = instance
            .spec()
            .info_fields
            .iter()
            .any(|candidate| *candidate == field);
        if !listed || !self.accepts_row_input(instance.kind) {
            return Vec::new();
        }
        let Some(key) = instance.row(row).and_then(|data| data.text(field)) else {
            return Vec::new();
        };

        tracing::debug!(%table, field, %key, "info lookup");
        self.source
            .load(&mut self.tables, self.info_table, Endpoint::Info { key })
            .map(NavEvent::ReloadIssued)
            .into_iter()
            .collect()
    }

    pub fn toggle_profile_browser(&mut self) -> Vec<NavEvent> {
        self.profile_browser = self.profile_browser.toggled();
        vec![NavEvent::ProfileBrowserChanged(self.profile_browser)]
    }

    pub fn refresh_profiles(&mut self) -> Vec<NavEvent> {
        self.source
            .load(&mut self.tables, self.profiles_table, Endpoint::Profiles)
            .map(NavEvent::ReloadIssued)
            .into_iter()
            .collect()
    }

    pub fn handle_fetch_completed(&mut self, completed: FetchCompleted) -> Vec<NavEvent> {
        let table = completed.table;
        let generation = completed.generation;
        match self.source.complete(&mut self.tables, completed) {
            LoadOutcome::Applied { rows } => {
                let mut events = vec![NavEvent::RowsLoaded { table, rows }];
                self.remark_cursor_row(table, rows, &mut events);
                events
            }
            LoadOutcome::Stale { .. } => {
                vec![NavEvent::StaleResponseDropped { table, generation }]
            }
            LoadOutcome::Failed { error } => vec![NavEvent::FetchFailed { table, error }],
            LoadOutcome::Orphaned => Vec::new(),
        }
    }

    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.source.take_requests()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    pub fn switcher(&self) -> &ViewSwitcher {
        &self.switcher
    }

    pub fn stale_policy(&self) -> StalePolicy {
        self.source.policy()
    }

    pub fn profile_browser(&self) -> Visibility {
        self.profile_browser
    }

    pub fn profiles_table(&self) -> TableHandle {
        self.profiles_table
    }

    pub fn info_table(&self) -> TableHandle {
        self.info_table
    }

    pub fn view_table(&self, view: ViewKind) -> Option<TableHandle> {
        self.view_tables.get(&view).copied()
    }

    pub fn active_view_table(&self) -> Option<TableHandle> {
        self.view_table(self.selection.active_view())
    }

    /// The time-window table cursor navigation operates on, if it still
    /// exists.
    pub fn active_time_window_table(&self) -> Option<TableHandle> {
        self.selection
            .active_table()
            .filter(|table| self.tables.contains(*table))
    }

    pub fn has_active_table(&self) -> bool {
        self.active_time_window_table().is_some()
    }

    fn accepts_row_input(&self, kind: TableKind) -> bool {
        kind.view()
            .is_none_or(|view| self.switcher.is_listening(view))
    }

    /// A time-window table recreated for the active profile takes over the
    /// cursor from the one destroyed when the profile collapsed.
    fn rebind_cursor_table(&mut self, nested: TableHandle) {
        let Some(instance) = self.tables.get(nested) else {
            return;
        };
        let TableScope::Profile(profile) = &instance.scope else {
            return;
        };
        if self.selection.active_profile() != Some(profile)
            || self.active_time_window_table().is_some()
        {
            return;
        }
        tracing::debug!(%profile, %nested, "cursor rebound to recreated time-window table");
        self.selection.rebind_time_window_table(nested);
    }

    fn remark_cursor_row(&mut self, table: TableHandle, rows: usize, events: &mut Vec<NavEvent>) {
        if self.selection.active_table() != Some(table) {
            return;
        }
        let Some(row) = self.selection.cursor_row().filter(|row| *row < rows) else {
            return;
        };
        if self.tables.get(table).is_some_and(|instance| instance.is_marked(row)) {
            return;
        }
        self.tables.set_marked(table, row, true);
        events.push(NavEvent::RowMarked { table, row });
    }

    fn unmark_cursor_row(&mut self, events: &mut Vec<NavEvent>) {
        if let Some(table) = self.selection.active_table()
            && self.tables.contains(table)
            && let Some(row) = self.selection.cursor_row()
        {
            self.tables.set_marked(table, row, false);
            events.push(NavEvent::RowUnmarked { table, row });
        }
    }

    fn reload_if_dirty(&mut self, events: &mut Vec<NavEvent>) {
        if self.selection.take_dirty() {
            self.reload_active_view(events);
        }
    }

    fn reload_active_view(&mut self, events: &mut Vec<NavEvent>) {
        let (Some(profile), Some(time_window)) = (
            self.selection.active_profile(),
            self.selection.active_time_window(),
        ) else {
            tracing::trace!("reload skipped; no profile/time window selected");
            return;
        };
        let view = self.selection.active_view();
        let Some(table) = self.view_table(view) else {
            return;
        };
        let endpoint = Endpoint::View {
            view,
            profile: profile.clone(),
            time_window: time_window.clone(),
        };
        if let Some(request) = self.source.load(&mut self.tables, table, endpoint) {
            events.push(NavEvent::ReloadIssued(request));
        }
    }
}

/// Next cursor position in a table of `len` rows. Advancing past the last
/// row wraps to 0 and retreating before row 0 wraps to the last row.
pub fn wrap_cursor(current: isize, len: usize, direction: CursorDirection) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len as isize - 1;
    let next = match direction {
        CursorDirection::Next => {
            let mut index = current;
            if index >= last {
                index = NO_CURSOR;
            }
            index + 1
        }
        CursorDirection::Previous => {
            let index = current - 1;
            if index < 0 || index > last { last } else { index }
        }
    };
    usize::try_from(next).ok()
}
