// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use time::OffsetDateTime;

use crate::{
    AlertId, Endpoint, ProfileId, Row, TableHandle, TableKind, TableRegistry, TableSpec,
    TimeWindowId,
};

/// Identity of a row within its table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKey {
    Field(String),
    Index(usize),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(value) => f.write_str(value),
            Self::Index(index) => write!(f, "row{index}"),
        }
    }
}

/// Backend context a table's rows belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableScope {
    Global,
    Profile(ProfileId),
    Alert {
        profile: ProfileId,
        time_window: TimeWindowId,
        alert: AlertId,
    },
}

/// Expanded state of one row. A collapsed row has no entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDetail {
    Inline(Vec<(String, String)>),
    Nested(TableHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableInstance {
    pub handle: TableHandle,
    pub kind: TableKind,
    pub container: String,
    pub scope: TableScope,
    pub source: Option<Endpoint>,
    pub rows: Vec<Row>,
    pub issued_generation: u64,
    pub applied_generation: u64,
    pub loading: bool,
    pub loaded_at: Option<OffsetDateTime>,
    marked: BTreeSet<usize>,
    details: BTreeMap<RowKey, RowDetail>,
}

impl TableInstance {
    pub fn spec(&self) -> &'static TableSpec {
        TableRegistry::spec(self.kind)
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_key(&self, index: usize) -> Option<RowKey> {
        let row = self.rows.get(index)?;
        let key = self
            .spec()
            .key_field
            .and_then(|field| row.text(field))
            .map_or(RowKey::Index(index), RowKey::Field);
        Some(key)
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn marked_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.marked.iter().copied()
    }

    pub fn detail(&self, key: &RowKey) -> Option<&RowDetail> {
        self.details.get(key)
    }

    pub fn detail_for_row(&self, index: usize) -> Option<&RowDetail> {
        self.details.get(&self.row_key(index)?)
    }

    pub fn expanded_count(&self) -> usize {
        self.details.len()
    }
}

/// Owner of every live table instance, top-level and nested.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: BTreeMap<TableHandle, TableInstance>,
    next_handle: u64,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        kind: TableKind,
        container: impl Into<String>,
        scope: TableScope,
    ) -> TableHandle {
        self.next_handle += 1;
        let handle = TableHandle::new(self.next_handle);
        self.tables.insert(
            handle,
            TableInstance {
                handle,
                kind,
                container: container.into(),
                scope,
                source: None,
                rows: Vec::new(),
                issued_generation: 0,
                applied_generation: 0,
                loading: false,
                loaded_at: None,
                marked: BTreeSet::new(),
                details: BTreeMap::new(),
            },
        );
        tracing::trace!(%handle, ?kind, "table created");
        handle
    }

    /// Removes a table together with every nested table attached to its rows.
    pub fn destroy(&mut self, handle: TableHandle) -> bool {
        let Some(instance) = self.tables.remove(&handle) else {
            return false;
        };
        for detail in instance.details.into_values() {
            if let RowDetail::Nested(nested) = detail {
                self.destroy(nested);
            }
        }
        tracing::trace!(%handle, "table destroyed");
        true
    }

    pub fn get(&self, handle: TableHandle) -> Option<&TableInstance> {
        self.tables.get(&handle)
    }

    pub fn get_mut(&mut self, handle: TableHandle) -> Option<&mut TableInstance> {
        self.tables.get_mut(&handle)
    }

    pub fn contains(&self, handle: TableHandle) -> bool {
        self.tables.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn rows(&self, handle: TableHandle) -> &[Row] {
        self.tables
            .get(&handle)
            .map(|table| table.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn find_by_container(&self, container: &str) -> Option<TableHandle> {
        self.tables
            .values()
            .find(|table| table.container == container)
            .map(|table| table.handle)
    }

    pub fn set_marked(&mut self, handle: TableHandle, index: usize, marked: bool) {
        let Some(table) = self.tables.get_mut(&handle) else {
            return;
        };
        if marked {
            if index < table.rows.len() {
                table.marked.insert(index);
            }
        } else {
            table.marked.remove(&index);
        }
    }

    pub fn attach_detail(&mut self, handle: TableHandle, key: RowKey, detail: RowDetail) {
        if let Some(table) = self.tables.get_mut(&handle) {
            table.details.insert(key, detail);
        }
    }

    /// Detaches a row's detail, destroying a nested table bound to it.
    pub fn remove_detail(&mut self, handle: TableHandle, key: &RowKey) -> Option<RowDetail> {
        let detail = self.tables.get_mut(&handle)?.details.remove(key)?;
        if let RowDetail::Nested(nested) = &detail {
            self.destroy(*nested);
        }
        Some(detail)
    }

    /// Installs a freshly loaded row set. Details stay attached only to rows
    /// whose keyed identity survives the reload; the rest are torn down.
    pub fn replace_rows(
        &mut self,
        handle: TableHandle,
        rows: Vec<Row>,
        loaded_at: OffsetDateTime,
    ) {
        let Some(table) = self.tables.get_mut(&handle) else {
            return;
        };
        let row_count = rows.len();
        table.rows = rows;
        table.loaded_at = Some(loaded_at);
        table.marked.retain(|index| *index < row_count);

        let surviving = (0..row_count)
            .filter_map(|index| table.row_key(index))
            .filter(|key| matches!(key, RowKey::Field(_)))
            .collect::<BTreeSet<_>>();
        let (kept, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut table.details)
            .into_iter()
            .partition(|(key, _)| surviving.contains(key));
        table.details = kept;
        for detail in dropped.into_values() {
            if let RowDetail::Nested(nested) = detail {
                self.destroy(nested);
            }
        }
    }
}
