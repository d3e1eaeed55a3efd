// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};

use crate::{ViewKind, Visibility};

/// Visibility of each view container and whether its row-level input
/// listeners are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSwitcher {
    visibility: BTreeMap<ViewKind, Visibility>,
    listeners: BTreeSet<ViewKind>,
}

impl ViewSwitcher {
    /// Every container starts hidden except `initial`, which is shown with its
    /// listeners attached.
    pub fn new(initial: ViewKind) -> Self {
        let mut switcher = Self {
            visibility: ViewKind::ALL
                .into_iter()
                .map(|view| (view, Visibility::Hidden))
                .collect(),
            listeners: BTreeSet::new(),
        };
        switcher.show(initial);
        switcher.attach_listeners(initial);
        switcher
    }

    pub fn show(&mut self, view: ViewKind) {
        self.visibility.insert(view, Visibility::Visible);
    }

    pub fn hide(&mut self, view: ViewKind) {
        self.visibility.insert(view, Visibility::Hidden);
    }

    pub fn attach_listeners(&mut self, view: ViewKind) {
        self.listeners.insert(view);
    }

    pub fn detach_listeners(&mut self, view: ViewKind) {
        self.listeners.remove(&view);
    }

    pub fn visibility(&self, view: ViewKind) -> Visibility {
        self.visibility
            .get(&view)
            .copied()
            .unwrap_or(Visibility::Hidden)
    }

    pub fn is_visible(&self, view: ViewKind) -> bool {
        self.visibility(view).is_visible()
    }

    pub fn is_listening(&self, view: ViewKind) -> bool {
        self.listeners.contains(&view)
    }

    pub fn visible_views(&self) -> Vec<ViewKind> {
        self.visibility
            .iter()
            .filter(|(_, visibility)| visibility.is_visible())
            .map(|(view, _)| *view)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ViewSwitcher;
    use crate::{ViewKind, Visibility};

    #[test]
    fn only_initial_view_is_visible_and_listening() {
        let switcher = ViewSwitcher::new(ViewKind::Alerts);
        assert_eq!(switcher.visible_views(), vec![ViewKind::Alerts]);
        assert!(switcher.is_listening(ViewKind::Alerts));
        assert!(!switcher.is_listening(ViewKind::Timeline));
        assert_eq!(switcher.visibility(ViewKind::Timeline), Visibility::Hidden);
    }

    #[test]
    fn show_and_hide_toggle_one_container() {
        let mut switcher = ViewSwitcher::new(ViewKind::Timeline);
        switcher.hide(ViewKind::Timeline);
        switcher.show(ViewKind::Evidence);
        assert_eq!(switcher.visible_views(), vec![ViewKind::Evidence]);

        switcher.detach_listeners(ViewKind::Timeline);
        switcher.detach_listeners(ViewKind::Timeline);
        assert!(!switcher.is_listening(ViewKind::Timeline));
    }
}
