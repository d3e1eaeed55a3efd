// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AlertId, Endpoint, ExpansionBehavior, ProfileId, RemoteRowSource, RowDetail, RowKey,
    TableHandle, TableKind, TableScope, TableStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionChange {
    Expanded {
        key: RowKey,
        nested: Option<TableHandle>,
    },
    Collapsed {
        key: RowKey,
        nested: Option<TableHandle>,
    },
    Unchanged,
}

/// Expand/collapse of row detail panels. Per-row state lives in the owning
/// [`TableStore`] entry, so a row is either collapsed (no detail attached) or
/// expanded with exactly one detail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpansionController;

impl ExpansionController {
    pub fn toggle_row_detail(
        tables: &mut TableStore,
        source: &mut RemoteRowSource,
        table: TableHandle,
        row: usize,
    ) -> ExpansionChange {
        let Some(key) = tables.get(table).and_then(|instance| instance.row_key(row)) else {
            return ExpansionChange::Unchanged;
        };
        let expanded = tables
            .get(table)
            .is_some_and(|instance| instance.detail(&key).is_some());
        if expanded {
            Self::collapse_key(tables, table, key)
        } else {
            Self::expand(tables, source, table, row, key)
        }
    }

    /// Collapses a row; collapsing a collapsed row changes nothing.
    pub fn collapse_row(
        tables: &mut TableStore,
        table: TableHandle,
        row: usize,
    ) -> ExpansionChange {
        let Some(key) = tables.get(table).and_then(|instance| instance.row_key(row)) else {
            return ExpansionChange::Unchanged;
        };
        Self::collapse_key(tables, table, key)
    }

    fn collapse_key(tables: &mut TableStore, table: TableHandle, key: RowKey) -> ExpansionChange {
        match tables.remove_detail(table, &key) {
            Some(RowDetail::Nested(nested)) => {
                tracing::debug!(%table, %key, %nested, "row collapsed; nested table destroyed");
                ExpansionChange::Collapsed {
                    key,
                    nested: Some(nested),
                }
            }
            Some(RowDetail::Inline(_)) => {
                tracing::debug!(%table, %key, "row collapsed");
                ExpansionChange::Collapsed { key, nested: None }
            }
            None => ExpansionChange::Unchanged,
        }
    }

    fn expand(
        tables: &mut TableStore,
        source: &mut RemoteRowSource,
        table: TableHandle,
        row: usize,
        key: RowKey,
    ) -> ExpansionChange {
        let Some(instance) = tables.get(table) else {
            return ExpansionChange::Unchanged;
        };
        let Some(data) = instance.row(row) else {
            return ExpansionChange::Unchanged;
        };
        let container = format!("{}/{key}", instance.container);

        let (kind, scope, endpoint) = match instance.spec().expansion {
            ExpansionBehavior::None => return ExpansionChange::Unchanged,
            ExpansionBehavior::InlineDetail => {
                let Some(pairs) = data.detail_pairs("info") else {
                    return ExpansionChange::Unchanged;
                };
                tables.attach_detail(table, key.clone(), RowDetail::Inline(pairs));
                tracing::debug!(%table, %key, "row expanded inline");
                return ExpansionChange::Expanded { key, nested: None };
            }
            ExpansionBehavior::NestedEvidenceTable => {
                let (RowKey::Field(alert), Some(Endpoint::View {
                    profile,
                    time_window,
                    ..
                })) = (&key, &instance.source)
                else {
                    return ExpansionChange::Unchanged;
                };
                let alert = AlertId::new(alert.clone());
                (
                    TableKind::AlertEvidence,
                    TableScope::Alert {
                        profile: profile.clone(),
                        time_window: time_window.clone(),
                        alert: alert.clone(),
                    },
                    Endpoint::Evidence {
                        profile: profile.clone(),
                        time_window: time_window.clone(),
                        alert,
                    },
                )
            }
            ExpansionBehavior::NestedTimeWindowTable => {
                let Some(profile) = data.text("profile").map(ProfileId::new) else {
                    return ExpansionChange::Unchanged;
                };
                (
                    TableKind::TimeWindows,
                    TableScope::Profile(profile.clone()),
                    Endpoint::TimeWindows { profile },
                )
            }
        };

        let nested = tables.create(kind, container, scope);
        tables.attach_detail(table, key.clone(), RowDetail::Nested(nested));
        source.load(tables, nested, endpoint);
        tracing::debug!(%table, %key, %nested, "row expanded with nested table");
        ExpansionChange::Expanded {
            key,
            nested: Some(nested),
        }
    }
}
