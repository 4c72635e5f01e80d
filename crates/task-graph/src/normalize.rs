//! Normalisation of untrusted task records.
//!
//! Task payloads come from an extraction step outside the planner, so every
//! field may be missing, mistyped or out of range. Nothing here fails: each
//! field is coerced to its documented default and the coercion is recorded
//! as a note for the import summary.

use crate::task::{Difficulty, KindAttributes, NewTask, Priority, TaskKind, TaskPatch};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::debug;

/// Name given to tasks without one.
pub const DEFAULT_NAME: &str = "Untitled task";

/// Source recorded for tasks without one.
pub const DEFAULT_SOURCE: &str = "unknown";

/// Largest accepted duration. Keeps every sum in the scheduling passes
/// far from `i64` overflow.
pub const MAX_DURATION: u64 = u32::MAX as u64;

/// Fields the planner interprets. Anything else is preserved as extra data.
const KNOWN_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "source",
    "type",
    "priority",
    "estimatedDuration",
    "dependencies",
    "deliverables",
    "keyTechnologies",
    "criteria",
    "technicalDifficulty",
    "plannedDate",
    "researchMethod",
    "expectedOutcome",
    "createdAt",
    "updatedAt",
];

/// Records how a single record was coerced.
#[derive(Debug, Default)]
pub(crate) struct Normalizer {
    notes: Vec<String>,
    label: String,
}

impl Normalizer {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            notes: Vec::new(),
            label: label.into(),
        }
    }

    pub(crate) fn into_notes(self) -> Vec<String> {
        self.notes
    }

    fn note(&mut self, field: &str, detail: impl std::fmt::Display) {
        let note = format!("{}: {field} {detail}", self.label);
        debug!("{note}");
        self.notes.push(note);
    }

    /// Normalise a whole record into a new task.
    ///
    /// `fallback_kind` is used when the record has no `type` at all.
    pub(crate) fn new_task(&mut self, value: &Value, fallback_kind: TaskKind) -> NewTask {
        let Some(record) = value.as_object() else {
            self.note("record", "is not an object; imported as an empty task");
            return NewTask {
                attributes: KindAttributes::empty(fallback_kind),
                ..NewTask::new(DEFAULT_NAME)
            };
        };

        let id = self.optional_text(record.get("id"), "id");
        let kind = self.kind(record.get("type"), fallback_kind);
        let (attributes, foreign) = self.attributes(record, kind);

        let mut extra = unknown_fields(record);
        extra.extend(foreign);

        NewTask {
            id,
            name: self.text_or(record.get("name"), "name", DEFAULT_NAME),
            description: self.text_or(record.get("description"), "description", ""),
            source: self.text_or(record.get("source"), "source", DEFAULT_SOURCE),
            attributes,
            priority: self.priority(record.get("priority")),
            estimated_duration: self.duration(record.get("estimatedDuration")),
            dependencies: self.ids(record.get("dependencies"), "dependencies"),
            deliverables: self.strings(record.get("deliverables"), "deliverables"),
            key_technologies: self.strings(record.get("keyTechnologies"), "keyTechnologies"),
            criteria: self.strings(record.get("criteria"), "criteria"),
            extra,
        }
    }

    /// Normalise the fields present in a JSON object into a patch.
    pub(crate) fn patch(&mut self, value: &Value) -> TaskPatch {
        let Some(record) = value.as_object() else {
            self.note("patch", "is not an object; nothing to apply");
            return TaskPatch::default();
        };

        let mut patch = TaskPatch {
            extra: unknown_fields(record),
            ..TaskPatch::default()
        };
        if record.contains_key("name") {
            patch.name = Some(self.text_or(record.get("name"), "name", DEFAULT_NAME));
        }
        if record.contains_key("description") {
            patch.description = Some(self.text_or(record.get("description"), "description", ""));
        }
        if record.contains_key("source") {
            patch.source = Some(self.text_or(record.get("source"), "source", DEFAULT_SOURCE));
        }
        if record.contains_key("type") {
            patch.kind = Some(self.kind(record.get("type"), TaskKind::General));
        }
        if record.contains_key("priority") {
            patch.priority = Some(self.priority(record.get("priority")));
        }
        if record.contains_key("estimatedDuration") {
            patch.estimated_duration = Some(self.duration(record.get("estimatedDuration")));
        }
        if record.contains_key("dependencies") {
            patch.dependencies = Some(self.ids(record.get("dependencies"), "dependencies"));
        }
        if record.contains_key("deliverables") {
            patch.deliverables = Some(self.strings(record.get("deliverables"), "deliverables"));
        }
        if record.contains_key("keyTechnologies") {
            patch.key_technologies =
                Some(self.strings(record.get("keyTechnologies"), "keyTechnologies"));
        }
        if record.contains_key("criteria") {
            patch.criteria = Some(self.strings(record.get("criteria"), "criteria"));
        }
        patch.technical_difficulty = self.difficulty(record.get("technicalDifficulty"));
        patch.planned_date = self.optional_text(record.get("plannedDate"), "plannedDate");
        patch.research_method = self.optional_text(record.get("researchMethod"), "researchMethod");
        patch.expected_outcome =
            self.optional_text(record.get("expectedOutcome"), "expectedOutcome");
        patch
    }

    fn kind(&mut self, value: Option<&Value>, fallback: TaskKind) -> TaskKind {
        match value {
            None | Some(Value::Null) => fallback,
            Some(Value::String(s)) if s.trim().is_empty() => fallback,
            Some(Value::String(s)) => TaskKind::parse(s).unwrap_or_else(|| {
                self.note("type", format_args!("'{s}' is not recognised; using general"));
                TaskKind::General
            }),
            Some(other) => {
                self.note("type", format_args!("{other} is not a string; using general"));
                TaskKind::General
            }
        }
    }

    fn priority(&mut self, value: Option<&Value>) -> Priority {
        match value {
            None | Some(Value::Null) => Priority::default(),
            Some(Value::String(s)) if s.trim().is_empty() => Priority::default(),
            Some(Value::String(s)) => Priority::parse(s).unwrap_or_else(|| {
                self.note("priority", format_args!("'{s}' is not recognised; using medium"));
                Priority::default()
            }),
            Some(other) => {
                self.note("priority", format_args!("{other} is not a string; using medium"));
                Priority::default()
            }
        }
    }

    fn difficulty(&mut self, value: Option<&Value>) -> Option<Difficulty> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                let parsed = Difficulty::parse(s);
                if parsed.is_none() && !s.trim().is_empty() {
                    self.note("technicalDifficulty", format_args!("'{s}' is not recognised"));
                }
                parsed
            }
            Some(other) => {
                self.note("technicalDifficulty", format_args!("{other} is not a string"));
                None
            }
        }
    }

    fn duration(&mut self, value: Option<&Value>) -> u64 {
        let Some(value) = value else {
            return 0;
        };
        let (duration, exact) = parse_duration(value);
        if !exact {
            self.note("estimatedDuration", format_args!("{value} coerced to {duration}"));
        }
        duration
    }

    fn attributes(
        &mut self,
        record: &Map<String, Value>,
        kind: TaskKind,
    ) -> (KindAttributes, Map<String, Value>) {
        let mut foreign = Map::new();
        let mut keep_foreign = |key: &str| {
            if let Some(value) = record.get(key).filter(|v| !v.is_null()) {
                foreign.insert(key.to_string(), value.clone());
            }
        };

        let attributes = match kind {
            TaskKind::Technical => KindAttributes::Technical {
                technical_difficulty: self.difficulty(record.get("technicalDifficulty")),
            },
            TaskKind::Milestone => KindAttributes::Milestone {
                planned_date: self.optional_text(record.get("plannedDate"), "plannedDate"),
            },
            TaskKind::Research => KindAttributes::Research {
                research_method: self.optional_text(record.get("researchMethod"), "researchMethod"),
                expected_outcome: self
                    .optional_text(record.get("expectedOutcome"), "expectedOutcome"),
            },
            TaskKind::Implementation => KindAttributes::Implementation,
            TaskKind::General => KindAttributes::General,
        };

        if kind != TaskKind::Technical {
            keep_foreign("technicalDifficulty");
        }
        if kind != TaskKind::Milestone {
            keep_foreign("plannedDate");
        }
        if kind != TaskKind::Research {
            keep_foreign("researchMethod");
            keep_foreign("expectedOutcome");
        }

        (attributes, foreign)
    }

    fn text_or(&mut self, value: Option<&Value>, field: &str, default: &str) -> String {
        self.optional_text(value, field)
            .unwrap_or_else(|| default.to_string())
    }

    fn optional_text(&mut self, value: Option<&Value>, field: &str) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
            Some(other) => {
                self.note(field, format_args!("{other} is not text; ignored"));
                None
            }
        }
    }

    fn strings(&mut self, value: Option<&Value>, field: &str) -> Vec<String> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let strings: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect();
                if strings.len() != items.len() {
                    self.note(field, "contained non-string entries; dropped");
                }
                strings
            }
            Some(other) => {
                self.note(field, format_args!("{other} is not a list; using empty"));
                Vec::new()
            }
        }
    }

    fn ids(&mut self, value: Option<&Value>, field: &str) -> Vec<String> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let ids: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect();
                let mapped = ids.len();
                let ids = dedup_ids(ids);
                if mapped != items.len() || ids.len() != mapped {
                    self.note(field, "contained invalid or repeated ids; dropped");
                }
                ids
            }
            Some(other) => {
                self.note(field, format_args!("{other} is not a list; using empty"));
                Vec::new()
            }
        }
    }
}

/// Coerce a duration value, reporting whether it was taken as-is.
///
/// Numbers are truncated toward zero, strings are read by their leading
/// integer (`"15 days"` is 15), negatives and everything else become 0.
#[must_use]
pub fn parse_duration(value: &Value) -> (u64, bool) {
    match value {
        Value::Null => (0, true),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                clamp(v, true)
            } else if n.as_i64().is_some() {
                (0, false)
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.is_finite() && f >= 1.0 {
                    #[allow(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss,
                        clippy::cast_precision_loss
                    )]
                    let truncated = f.min(MAX_DURATION as f64).trunc() as u64;
                    clamp(truncated, false)
                } else {
                    (0, false)
                }
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('-') {
                return (0, false);
            }
            let digits: String = s
                .trim_start_matches('+')
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if digits.is_empty() {
                return (0, false);
            }
            let exact = digits.len() == s.len();
            digits
                .parse::<u64>()
                .map_or((MAX_DURATION, false), |v| clamp(v, exact))
        }
        _ => (0, false),
    }
}

fn clamp(value: u64, exact: bool) -> (u64, bool) {
    if value > MAX_DURATION {
        (MAX_DURATION, false)
    } else {
        (value, exact)
    }
}

/// Drop blank and repeated ids, keeping first occurrences in order.
pub fn dedup_ids(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn unknown_fields(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
