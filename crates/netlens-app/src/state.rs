// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ProfileId, TableHandle, TimeWindowId, ViewKind};

/// Cursor value while no time-window row is selected.
pub const NO_CURSOR: isize = -1;

/// Single source of truth for what the analyst is looking at. Fields are
/// private; each semantic transition has exactly one mutating method and
/// every mutation marks the state dirty so the coordinator reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    active_profile: Option<ProfileId>,
    active_time_window: Option<TimeWindowId>,
    active_time_window_name: Option<String>,
    active_view: ViewKind,
    previous_view: ViewKind,
    active_table: Option<TableHandle>,
    cursor: isize,
    dirty: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(ViewKind::Timeline)
    }
}

impl SelectionState {
    pub fn new(initial_view: ViewKind) -> Self {
        Self {
            active_profile: None,
            active_time_window: None,
            active_time_window_name: None,
            active_view: initial_view,
            previous_view: initial_view,
            active_table: None,
            cursor: NO_CURSOR,
            dirty: false,
        }
    }

    pub fn active_profile(&self) -> Option<&ProfileId> {
        self.active_profile.as_ref()
    }

    pub fn active_time_window(&self) -> Option<&TimeWindowId> {
        self.active_time_window.as_ref()
    }

    pub fn active_time_window_name(&self) -> Option<&str> {
        self.active_time_window_name.as_deref()
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn previous_view(&self) -> ViewKind {
        self.previous_view
    }

    pub fn active_table(&self) -> Option<TableHandle> {
        self.active_table
    }

    /// Row index in the active time-window table, or [`NO_CURSOR`].
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn cursor_row(&self) -> Option<usize> {
        usize::try_from(self.cursor).ok()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A view reload needs both a profile and a time window.
    pub fn can_reload(&self) -> bool {
        self.active_profile.is_some() && self.active_time_window.is_some()
    }

    pub fn selection_label(&self) -> Option<String> {
        let profile = self.active_profile.as_ref()?;
        let window = self
            .active_time_window_name
            .clone()
            .or_else(|| self.active_time_window.as_ref().map(ToString::to_string))?;
        Some(format!("Selected: {profile} {window}"))
    }

    pub fn select_profile_and_time_window(
        &mut self,
        profile: ProfileId,
        time_window: TimeWindowId,
        time_window_name: impl Into<String>,
        table: TableHandle,
        row: usize,
    ) {
        self.active_profile = Some(profile);
        self.active_time_window = Some(time_window);
        self.active_time_window_name = Some(time_window_name.into());
        self.active_table = Some(table);
        self.cursor = row as isize;
        self.dirty = true;
    }

    /// Makes `view` active. Returns the view that was shown before, or `None`
    /// when `view` is already active and nothing changed.
    pub fn select_view(&mut self, view: ViewKind) -> Option<ViewKind> {
        if view == self.active_view {
            return None;
        }
        let previous = self.previous_view;
        self.active_view = view;
        self.previous_view = view;
        self.dirty = true;
        Some(previous)
    }

    pub fn move_cursor(
        &mut self,
        row: usize,
        time_window: TimeWindowId,
        time_window_name: impl Into<String>,
    ) {
        self.cursor = row as isize;
        self.active_time_window = Some(time_window);
        self.active_time_window_name = Some(time_window_name.into());
        self.dirty = true;
    }

    /// Points the cursor at the time-window table recreated for the active
    /// profile. The selected time window is unchanged, so nothing reloads.
    pub fn rebind_time_window_table(&mut self, table: TableHandle) {
        self.active_table = Some(table);
    }

    /// Consumes the dirty mark.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::{NO_CURSOR, SelectionState};
    use crate::{ProfileId, TableHandle, TimeWindowId, ViewKind};

    #[test]
    fn starts_empty_with_default_view() {
        let state = SelectionState::default();
        assert_eq!(state.active_view(), ViewKind::Timeline);
        assert_eq!(state.previous_view(), ViewKind::Timeline);
        assert_eq!(state.active_profile(), None);
        assert_eq!(state.active_table(), None);
        assert_eq!(state.cursor(), NO_CURSOR);
        assert_eq!(state.cursor_row(), None);
        assert!(!state.can_reload());
        assert!(!state.is_dirty());
        assert_eq!(state.selection_label(), None);
    }

    #[test]
    fn select_view_is_idempotent() {
        let mut state = SelectionState::default();
        assert_eq!(state.select_view(ViewKind::Timeline), None);
        assert!(!state.is_dirty());

        assert_eq!(state.select_view(ViewKind::Alerts), Some(ViewKind::Timeline));
        assert!(state.take_dirty());
        assert_eq!(state.select_view(ViewKind::Alerts), None);
        assert!(!state.is_dirty());
        assert_eq!(state.previous_view(), ViewKind::Alerts);
    }

    #[test]
    fn selecting_time_window_enables_reload() {
        let mut state = SelectionState::default();
        state.select_profile_and_time_window(
            ProfileId::from("192.168.1.5"),
            TimeWindowId::from("timewindow2"),
            "TW 2:2026/01/05 11:00:00",
            TableHandle::new(3),
            1,
        );
        assert!(state.can_reload());
        assert!(state.is_dirty());
        assert_eq!(state.cursor_row(), Some(1));
        assert_eq!(state.active_table(), Some(TableHandle::new(3)));
        assert_eq!(
            state.selection_label().as_deref(),
            Some("Selected: 192.168.1.5 TW 2:2026/01/05 11:00:00")
        );
    }

    #[test]
    fn move_cursor_keeps_profile_and_table() {
        let mut state = SelectionState::default();
        state.select_profile_and_time_window(
            ProfileId::from("10.0.0.1"),
            TimeWindowId::from("tw0"),
            "tw0",
            TableHandle::new(1),
            0,
        );
        state.take_dirty();

        state.move_cursor(2, TimeWindowId::from("tw2"), "tw2");
        assert!(state.take_dirty());
        assert!(!state.take_dirty());
        assert_eq!(state.cursor(), 2);
        assert_eq!(state.active_time_window(), Some(&TimeWindowId::from("tw2")));
        assert_eq!(state.active_profile(), Some(&ProfileId::from("10.0.0.1")));
        assert_eq!(state.active_table(), Some(TableHandle::new(1)));
    }

    #[test]
    fn rebinding_table_keeps_selection_clean() {
        let mut state = SelectionState::default();
        state.select_profile_and_time_window(
            ProfileId::from("10.0.0.1"),
            TimeWindowId::from("tw1"),
            "tw1",
            TableHandle::new(4),
            1,
        );
        state.take_dirty();

        state.rebind_time_window_table(TableHandle::new(9));
        assert!(!state.is_dirty());
        assert_eq!(state.active_table(), Some(TableHandle::new(9)));
        assert_eq!(state.cursor_row(), Some(1));
        assert_eq!(state.active_time_window(), Some(&TimeWindowId::from("tw1")));
    }
}
