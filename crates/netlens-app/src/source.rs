// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{AlertId, ProfileId, Row, TableHandle, TableStore, TimeWindowId, ViewKind};

const ROUTE_PREFIX: &str = "analysis";

/// Backend route for one row set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Profiles,
    View {
        view: ViewKind,
        profile: ProfileId,
        time_window: TimeWindowId,
    },
    Info {
        key: String,
    },
    TimeWindows {
        profile: ProfileId,
    },
    Evidence {
        profile: ProfileId,
        time_window: TimeWindowId,
        alert: AlertId,
    },
}

impl Endpoint {
    /// Path segments below the host. A trailing empty segment produces the
    /// trailing slash the general evidence route expects.
    pub fn segments(&self) -> Vec<String> {
        let mut segments = vec![ROUTE_PREFIX.to_owned()];
        match self {
            Self::Profiles => segments.push("profiles_tws".to_owned()),
            Self::View {
                view,
                profile,
                time_window,
            } => {
                segments.extend([
                    view.as_str().to_owned(),
                    profile.to_string(),
                    time_window.to_string(),
                ]);
                if *view == ViewKind::Evidence {
                    segments.push(String::new());
                }
            }
            Self::Info { key } => segments.extend(["info".to_owned(), key.clone()]),
            Self::TimeWindows { profile } => {
                segments.extend(["tws".to_owned(), profile.to_string()]);
            }
            Self::Evidence {
                profile,
                time_window,
                alert,
            } => segments.extend([
                "evidence".to_owned(),
                profile.to_string(),
                time_window.to_string(),
                alert.to_string(),
            ]),
        }
        segments
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub table: TableHandle,
    pub endpoint: Endpoint,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Rows {
        rows: Vec<Row>,
        received_at: OffsetDateTime,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCompleted {
    pub table: TableHandle,
    pub generation: u64,
    pub outcome: FetchOutcome,
}

/// What to do with a response whose generation was superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    #[default]
    Discard,
    LastArrivalWins,
}

impl StalePolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::LastArrivalWins => "last-arrival-wins",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "discard" => Some(Self::Discard),
            "last-arrival-wins" => Some(Self::LastArrivalWins),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { rows: usize },
    Stale { latest: u64 },
    Failed { error: String },
    Orphaned,
}

/// Addresses backend routes and queues row loads. Performs no I/O: queued
/// requests are drained by whichever runtime owns the network.
#[derive(Debug, Clone, Default)]
pub struct RemoteRowSource {
    policy: StalePolicy,
    queue: Vec<FetchRequest>,
}

impl RemoteRowSource {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            queue: Vec::new(),
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Points the table at a new source and queues a reload of only its rows.
    pub fn load(
        &mut self,
        tables: &mut TableStore,
        table: TableHandle,
        endpoint: Endpoint,
    ) -> Option<FetchRequest> {
        let instance = tables.get_mut(table)?;
        instance.issued_generation += 1;
        instance.source = Some(endpoint.clone());
        instance.loading = true;

        let request = FetchRequest {
            table,
            endpoint,
            generation: instance.issued_generation,
        };
        tracing::debug!(
            %table,
            path = %request.endpoint.path(),
            generation = request.generation,
            "row load queued"
        );
        self.queue.push(request.clone());
        Some(request)
    }

    pub fn pending(&self) -> &[FetchRequest] {
        &self.queue
    }

    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.queue)
    }

    /// Applies a completed fetch to the table it targeted. Failures keep the
    /// previous rows in place.
    pub fn complete(&self, tables: &mut TableStore, completed: FetchCompleted) -> LoadOutcome {
        let FetchCompleted {
            table,
            generation,
            outcome,
        } = completed;
        let Some(instance) = tables.get_mut(table) else {
            tracing::debug!(%table, generation, "response for destroyed table dropped");
            return LoadOutcome::Orphaned;
        };

        let latest = instance.issued_generation;
        if generation == latest {
            instance.loading = false;
        }
        let superseded = generation < latest;

        match outcome {
            FetchOutcome::Failed { error } => {
                tracing::warn!(%table, generation, %error, "row load failed; keeping stale rows");
                LoadOutcome::Failed { error }
            }
            FetchOutcome::Rows { .. } if superseded && self.policy == StalePolicy::Discard => {
                tracing::debug!(%table, generation, latest, "superseded response discarded");
                LoadOutcome::Stale { latest }
            }
            FetchOutcome::Rows { rows, received_at } => {
                let count = rows.len();
                instance.applied_generation = instance.applied_generation.max(generation);
                tables.replace_rows(table, rows, received_at);
                tracing::debug!(%table, generation, rows = count, "rows applied");
                LoadOutcome::Applied { rows: count }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Endpoint, FetchCompleted, FetchOutcome, LoadOutcome, RemoteRowSource, StalePolicy,
    };
    use crate::{
        AlertId, ProfileId, Row, TableHandle, TableKind, TableScope, TableStore, TimeWindowId,
        ViewKind,
    };
    use serde_json::json;
    use time::OffsetDateTime;

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|index| Row::from_pairs([("n", json!(index))]))
            .collect()
    }

    fn completed(table: TableHandle, generation: u64, count: usize) -> FetchCompleted {
        FetchCompleted {
            table,
            generation,
            outcome: FetchOutcome::Rows {
                rows: rows(count),
                received_at: OffsetDateTime::UNIX_EPOCH,
            },
        }
    }

    fn view_endpoint(time_window: &str) -> Endpoint {
        Endpoint::View {
            view: ViewKind::Alerts,
            profile: ProfileId::from("192.168.1.5"),
            time_window: TimeWindowId::from(time_window),
        }
    }

    #[test]
    fn endpoint_paths_follow_backend_routes() {
        assert_eq!(
            view_endpoint("tw1").path(),
            "/analysis/alerts/192.168.1.5/tw1"
        );
        assert_eq!(Endpoint::Profiles.path(), "/analysis/profiles_tws");
        assert_eq!(
            Endpoint::Info {
                key: "8.8.8.8".to_owned()
            }
            .path(),
            "/analysis/info/8.8.8.8"
        );
        assert_eq!(
            Endpoint::TimeWindows {
                profile: ProfileId::from("10.0.0.1")
            }
            .path(),
            "/analysis/tws/10.0.0.1"
        );
        assert_eq!(
            Endpoint::Evidence {
                profile: ProfileId::from("192.168.1.5"),
                time_window: TimeWindowId::from("tw1"),
                alert: AlertId::from("7"),
            }
            .path(),
            "/analysis/evidence/192.168.1.5/tw1/7"
        );
        assert_eq!(
            Endpoint::View {
                view: ViewKind::Evidence,
                profile: ProfileId::from("10.0.0.1"),
                time_window: TimeWindowId::from("tw0"),
            }
            .path(),
            "/analysis/evidence/10.0.0.1/tw0/"
        );
    }

    #[test]
    fn load_replaces_source_and_bumps_generation() {
        let mut tables = TableStore::new();
        let table = tables.create(TableKind::View(ViewKind::Alerts), "a", TableScope::Global);
        let mut source = RemoteRowSource::new(StalePolicy::Discard);

        source.load(&mut tables, table, view_endpoint("tw0"));
        let second = source
            .load(&mut tables, table, view_endpoint("tw1"))
            .expect("table exists");

        assert_eq!(second.generation, 2);
        let instance = tables.get(table).expect("table exists");
        assert_eq!(instance.source, Some(view_endpoint("tw1")));
        assert!(instance.loading);
        assert_eq!(source.take_requests().len(), 2);
        assert!(source.pending().is_empty());
    }

    #[test]
    fn load_for_unknown_table_queues_nothing() {
        let mut tables = TableStore::new();
        let mut source = RemoteRowSource::default();
        assert_eq!(
            source.load(&mut tables, TableHandle::new(42), Endpoint::Profiles),
            None
        );
        assert!(source.pending().is_empty());
    }

    #[test]
    fn discard_policy_drops_superseded_responses() {
        let mut tables = TableStore::new();
        let table = tables.create(TableKind::View(ViewKind::Alerts), "a", TableScope::Global);
        let mut source = RemoteRowSource::new(StalePolicy::Discard);
        source.load(&mut tables, table, view_endpoint("tw0"));
        source.load(&mut tables, table, view_endpoint("tw1"));

        assert_eq!(
            source.complete(&mut tables, completed(table, 2, 3)),
            LoadOutcome::Applied { rows: 3 }
        );
        assert_eq!(
            source.complete(&mut tables, completed(table, 1, 9)),
            LoadOutcome::Stale { latest: 2 }
        );
        assert_eq!(tables.rows(table).len(), 3);
        assert!(!tables.get(table).expect("table exists").loading);
    }

    #[test]
    fn last_arrival_wins_policy_applies_late_responses() {
        let mut tables = TableStore::new();
        let table = tables.create(TableKind::View(ViewKind::Alerts), "a", TableScope::Global);
        let mut source = RemoteRowSource::new(StalePolicy::LastArrivalWins);
        source.load(&mut tables, table, view_endpoint("tw0"));
        source.load(&mut tables, table, view_endpoint("tw1"));

        source.complete(&mut tables, completed(table, 2, 3));
        assert_eq!(
            source.complete(&mut tables, completed(table, 1, 9)),
            LoadOutcome::Applied { rows: 9 }
        );
        assert_eq!(tables.rows(table).len(), 9);
    }

    #[test]
    fn failed_fetch_keeps_stale_rows() {
        let mut tables = TableStore::new();
        let table = tables.create(TableKind::View(ViewKind::Alerts), "a", TableScope::Global);
        let mut source = RemoteRowSource::default();
        source.load(&mut tables, table, view_endpoint("tw0"));
        source.complete(&mut tables, completed(table, 1, 2));

        source.load(&mut tables, table, view_endpoint("tw1"));
        let outcome = source.complete(
            &mut tables,
            FetchCompleted {
                table,
                generation: 2,
                outcome: FetchOutcome::Failed {
                    error: "connection refused".to_owned(),
                },
            },
        );
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                error: "connection refused".to_owned()
            }
        );
        let instance = tables.get(table).expect("table exists");
        assert_eq!(instance.rows.len(), 2);
        assert!(!instance.loading);
    }

    #[test]
    fn responses_for_destroyed_tables_are_orphaned() {
        let mut tables = TableStore::new();
        let table = tables.create(TableKind::AlertEvidence, "e", TableScope::Global);
        let mut source = RemoteRowSource::default();
        source.load(&mut tables, table, Endpoint::Profiles);
        tables.destroy(table);

        assert_eq!(
            source.complete(&mut tables, completed(table, 1, 1)),
            LoadOutcome::Orphaned
        );
    }

    #[test]
    fn stale_policy_parses_config_values() {
        assert_eq!(StalePolicy::parse("discard"), Some(StalePolicy::Discard));
        assert_eq!(
            StalePolicy::parse(StalePolicy::LastArrivalWins.as_str()),
            Some(StalePolicy::LastArrivalWins)
        );
        assert_eq!(StalePolicy::parse("newest"), None);
    }
}
