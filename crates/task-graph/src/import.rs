//! Import payloads produced by the upstream extraction step.

use crate::{Error, Result, TaskKind};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Task collections of an extraction result, one per task kind.
///
/// Records are kept as raw JSON; the planner normalises them on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    /// Implementation tasks.
    pub implementation_tasks: Vec<Value>,
    /// Technical tasks.
    pub technical_tasks: Vec<Value>,
    /// Milestones.
    pub milestone_tasks: Vec<Value>,
    /// Research tasks.
    pub research_tasks: Vec<Value>,
}

impl ImportPayload {
    /// Collection names paired with the kind their records default to.
    pub const COLLECTIONS: [(&'static str, TaskKind); 4] = [
        ("implementationTasks", TaskKind::Implementation),
        ("technicalTasks", TaskKind::Technical),
        ("milestoneTasks", TaskKind::Milestone),
        ("researchTasks", TaskKind::Research),
    ];

    /// Read the four collections out of an arbitrary JSON value.
    ///
    /// Missing collections, collections that are not arrays and roots that
    /// are not objects all yield empty collections.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let collection = |name: &str| -> Vec<Value> {
            value
                .get(name)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };
        Self {
            implementation_tasks: collection("implementationTasks"),
            technical_tasks: collection("technicalTasks"),
            milestone_tasks: collection("milestoneTasks"),
            research_tasks: collection("researchTasks"),
        }
    }

    /// Parse JSON text into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] if the text is not JSON at all.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::payload(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// Iterate the collections as `(name, default kind, records)`.
    pub fn collections(&self) -> impl Iterator<Item = (&'static str, TaskKind, &[Value])> {
        let records = [
            self.implementation_tasks.as_slice(),
            self.technical_tasks.as_slice(),
            self.milestone_tasks.as_slice(),
            self.research_tasks.as_slice(),
        ];
        Self::COLLECTIONS
            .into_iter()
            .zip(records)
            .map(|((name, kind), records)| (name, kind, records))
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections().map(|(_, _, records)| records.len()).sum()
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Tasks in the registry after the import.
    pub imported: usize,
    /// Records read per collection.
    pub by_collection: IndexMap<String, usize>,
    /// Ids generated for records that had none.
    pub generated_ids: Vec<String>,
    /// Ids that appeared more than once in the payload.
    pub duplicate_ids: Vec<String>,
    /// Field coercions applied while normalising.
    pub notes: Vec<String>,
}
