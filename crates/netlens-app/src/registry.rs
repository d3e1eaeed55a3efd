// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ExpansionBehavior, TableKind, ViewKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub title: &'static str,
}

const fn column(field: &'static str, title: &'static str) -> ColumnSpec {
    ColumnSpec { field, title }
}

/// Static configuration of one table kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub kind: TableKind,
    /// Container identifier; nested tables derive theirs from it.
    pub container: &'static str,
    pub title: &'static str,
    pub columns: &'static [ColumnSpec],
    /// Field whose value identifies a row. Rows without it fall back to
    /// their index.
    pub key_field: Option<&'static str>,
    pub expansion: ExpansionBehavior,
    /// Fields whose values can be looked up in the info panel.
    pub info_fields: &'static [&'static str],
}

static TIMELINE: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::Timeline),
    container: "table_timeline",
    title: "timeline",
    columns: &[
        column("timestamp", "Timestamp"),
        column("dport_name", "Service"),
        column("preposition", "Dir"),
        column("daddr", "Address"),
        column("dport/proto", "Port/Proto"),
        column("state", "State"),
        column("Sent", "Sent"),
        column("Recv", "Recv"),
        column("Tot", "Total"),
        column("Duration", "Duration"),
        column("warning", "Warning"),
    ],
    key_field: None,
    expansion: ExpansionBehavior::InlineDetail,
    info_fields: &["daddr"],
};

static TIMELINE_FLOWS: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::TimelineFlows),
    container: "table_timeline_flows",
    title: "flows",
    columns: &[
        column("ts", "Time"),
        column("dur", "Duration"),
        column("saddr", "Source"),
        column("sport", "Sport"),
        column("daddr", "Destination"),
        column("dport", "Dport"),
        column("proto", "Proto"),
        column("state", "State"),
        column("pkts", "Packets"),
        column("allbytes", "Bytes"),
    ],
    key_field: Some("uid"),
    expansion: ExpansionBehavior::None,
    info_fields: &["daddr", "saddr"],
};

static ALERTS: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::Alerts),
    container: "table_alerts",
    title: "alerts",
    columns: &[
        column("alert", "Alert"),
        column("alert_id", "ID"),
        column("profileid", "Profile"),
        column("timewindow", "Time window"),
        column("evidence_count", "Evidence"),
    ],
    key_field: Some("alert_id"),
    expansion: ExpansionBehavior::NestedEvidenceTable,
    info_fields: &[],
};

const TUPLE_COLUMNS: &[ColumnSpec] = &[
    column("tuple", "Tuple"),
    column("string", "Behavior"),
    column("geocountry", "Country"),
    column("asnorg", "ASN"),
    column("reverse_dns", "rDNS"),
    column("threat_intel", "Threat intel"),
];

static IN_TUPLES: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::InTuples),
    container: "table_intuples",
    title: "in tuples",
    columns: TUPLE_COLUMNS,
    key_field: Some("tuple"),
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

static OUT_TUPLES: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::OutTuples),
    container: "table_outtuples",
    title: "out tuples",
    columns: TUPLE_COLUMNS,
    key_field: Some("tuple"),
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

const EVIDENCE_COLUMNS: &[ColumnSpec] = &[
    column("type_evidence", "Evidence"),
    column("confidence", "Confidence"),
    column("threat_level", "Threat level"),
    column("category", "Category"),
    column("source_target_tag", "Tag"),
    column("description", "Description"),
];

static EVIDENCE: TableSpec = TableSpec {
    kind: TableKind::View(ViewKind::Evidence),
    container: "table_evidence",
    title: "evidence",
    columns: EVIDENCE_COLUMNS,
    key_field: None,
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

static ALERT_EVIDENCE: TableSpec = TableSpec {
    kind: TableKind::AlertEvidence,
    container: "table_alert_evidence",
    title: "alert evidence",
    columns: EVIDENCE_COLUMNS,
    key_field: None,
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

static PROFILES: TableSpec = TableSpec {
    kind: TableKind::Profiles,
    container: "table_profiles",
    title: "profiles",
    columns: &[column("profile", "Profile")],
    key_field: Some("profile"),
    expansion: ExpansionBehavior::NestedTimeWindowTable,
    info_fields: &["profile"],
};

static TIME_WINDOWS: TableSpec = TableSpec {
    kind: TableKind::TimeWindows,
    container: "table_tws",
    title: "time windows",
    columns: &[column("name", "TW")],
    key_field: Some("tw"),
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

static IP_INFO: TableSpec = TableSpec {
    kind: TableKind::IpInfo,
    container: "table_ipinfo",
    title: "info",
    columns: &[
        column("ip", "Address"),
        column("geocountry", "Country"),
        column("asnorg", "ASN"),
        column("reverse_dns", "rDNS"),
        column("threat_intel", "Threat intel"),
        column("url", "VT URL"),
        column("down_file", "VT down"),
        column("ref_file", "VT ref"),
        column("com_file", "VT com"),
    ],
    key_field: Some("ip"),
    expansion: ExpansionBehavior::None,
    info_fields: &[],
};

/// Lookup of every table configuration the dashboard knows about.
pub struct TableRegistry;

impl TableRegistry {
    pub fn spec(kind: TableKind) -> &'static TableSpec {
        match kind {
            TableKind::View(ViewKind::Timeline) => &TIMELINE,
            TableKind::View(ViewKind::TimelineFlows) => &TIMELINE_FLOWS,
            TableKind::View(ViewKind::Alerts) => &ALERTS,
            TableKind::View(ViewKind::InTuples) => &IN_TUPLES,
            TableKind::View(ViewKind::OutTuples) => &OUT_TUPLES,
            TableKind::View(ViewKind::Evidence) => &EVIDENCE,
            TableKind::AlertEvidence => &ALERT_EVIDENCE,
            TableKind::Profiles => &PROFILES,
            TableKind::TimeWindows => &TIME_WINDOWS,
            TableKind::IpInfo => &IP_INFO,
        }
    }

    pub fn view(view: ViewKind) -> &'static TableSpec {
        Self::spec(TableKind::View(view))
    }

    pub fn views() -> impl Iterator<Item = &'static TableSpec> {
        ViewKind::ALL.into_iter().map(Self::view)
    }
}
