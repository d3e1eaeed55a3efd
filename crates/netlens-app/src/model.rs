// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::*;

/// The alternate tabular presentations of one time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    Timeline,
    TimelineFlows,
    Alerts,
    InTuples,
    OutTuples,
    Evidence,
}

impl ViewKind {
    pub const ALL: [Self; 6] = [
        Self::Timeline,
        Self::TimelineFlows,
        Self::Alerts,
        Self::InTuples,
        Self::OutTuples,
        Self::Evidence,
    ];

    /// Identifier used by the backend route and the config file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::TimelineFlows => "timeline_flows",
            Self::Alerts => "alerts",
            Self::InTuples => "intuples",
            Self::OutTuples => "outtuples",
            Self::Evidence => "evidence",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timeline" => Some(Self::Timeline),
            "timeline_flows" => Some(Self::TimelineFlows),
            "alerts" => Some(Self::Alerts),
            "intuples" => Some(Self::InTuples),
            "outtuples" => Some(Self::OutTuples),
            "evidence" => Some(Self::Evidence),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::TimelineFlows => "flows",
            Self::Alerts => "alerts",
            Self::InTuples => "in tuples",
            Self::OutTuples => "out tuples",
            Self::Evidence => "evidence",
        }
    }
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every table the dashboard can hold. Views are selectable; the rest are
/// auxiliary tables owned by the browser, the info panel, or a parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    View(ViewKind),
    Profiles,
    TimeWindows,
    AlertEvidence,
    IpInfo,
}

impl TableKind {
    pub const fn view(self) -> Option<ViewKind> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }
}

/// What expanding a row of a table reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionBehavior {
    None,
    InlineDetail,
    NestedEvidenceTable,
    NestedTimeWindowTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Visible => Self::Hidden,
            Self::Hidden => Self::Visible,
        }
    }
}

/// One backend row. Field values stay as raw JSON since column schemas are
/// owned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Returns the row with `field` set, replacing any previous value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Display text for a field; `None` when absent, null, or empty.
    pub fn text(&self, field: &str) -> Option<String> {
        let text = value_text(self.0.get(field)?);
        if text.is_empty() { None } else { Some(text) }
    }

    /// Key/value pairs of an object-valued field, used for inline detail.
    pub fn detail_pairs(&self, field: &str) -> Option<Vec<(String, String)>> {
        let Value::Object(entries) = self.0.get(field)? else {
            return None;
        };
        if entries.is_empty() {
            return None;
        }
        Some(
            entries
                .iter()
                .map(|(key, value)| (capitalize(key), value_text(value)))
                .collect(),
        )
    }
}

/// Row-set envelope returned by every backend endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RowSet {
    #[serde(default)]
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub id: TimeWindowId,
    pub name: String,
    pub blocked: bool,
}

impl TimeWindow {
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = row.text("tw")?;
        let name = row.text("name").unwrap_or_else(|| id.clone());
        Some(Self {
            id: TimeWindowId::new(id),
            name,
            blocked: flag(row, "blocked"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub blocked: bool,
}

impl ProfileSummary {
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: ProfileId::new(row.text("profile")?),
            blocked: flag(row, "blocked"),
        })
    }
}

pub fn flag(row: &Row, field: &str) -> bool {
    matches!(row.get(field), Some(Value::Bool(true)))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
