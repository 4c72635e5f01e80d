//! Task records stored in the planner registry.
//!
//! A [`Task`] is a shared base of common fields plus a [`KindAttributes`]
//! variant carrying the attributes only some task kinds have. Callers create
//! tasks through [`NewTask`] and change them through [`TaskPatch`]; ids and
//! timestamps are always stamped by the planner.

use crate::TaskNodeData;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Implementation work.
    Implementation,
    /// Technical work with an assessed difficulty.
    Technical,
    /// A milestone with an optional planned date.
    Milestone,
    /// Research with a method and expected outcome.
    Research,
    /// Anything else.
    General,
}

impl TaskKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Implementation,
        Self::Technical,
        Self::Milestone,
        Self::Research,
        Self::General,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Technical => "technical",
            Self::Milestone => "milestone",
            Self::Research => "research",
            Self::General => "general",
        }
    }

    /// Parse a wire name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority. Missing or unrecognised values become `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// High priority.
    High,
    /// Medium priority.
    #[default]
    Medium,
    /// Low priority.
    Low,
}

impl Priority {
    /// All priorities, highest first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Wire name of the priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a wire name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assessed technical difficulty of a technical task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Hard.
    High,
    /// Moderate.
    Medium,
    /// Easy.
    Low,
}

impl Difficulty {
    /// Wire name of the difficulty.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a wire name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        [Self::High, Self::Medium, Self::Low]
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Attributes that only exist for some task kinds.
///
/// Serialized inline with the task, the variant name becoming its `type`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum KindAttributes {
    /// Implementation task.
    Implementation,
    /// Technical task.
    Technical {
        /// Assessed difficulty, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        technical_difficulty: Option<Difficulty>,
    },
    /// Milestone.
    Milestone {
        /// Planned completion date, free text.
        #[serde(skip_serializing_if = "Option::is_none")]
        planned_date: Option<String>,
    },
    /// Research task.
    Research {
        /// How the research is carried out.
        #[serde(skip_serializing_if = "Option::is_none")]
        research_method: Option<String>,
        /// What the research should produce.
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_outcome: Option<String>,
    },
    /// General task.
    #[default]
    General,
}

impl KindAttributes {
    /// Empty attribute set for a kind.
    #[must_use]
    pub const fn empty(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Implementation => Self::Implementation,
            TaskKind::Technical => Self::Technical {
                technical_difficulty: None,
            },
            TaskKind::Milestone => Self::Milestone { planned_date: None },
            TaskKind::Research => Self::Research {
                research_method: None,
                expected_outcome: None,
            },
            TaskKind::General => Self::General,
        }
    }

    /// The kind these attributes belong to.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Implementation => TaskKind::Implementation,
            Self::Technical { .. } => TaskKind::Technical,
            Self::Milestone { .. } => TaskKind::Milestone,
            Self::Research { .. } => TaskKind::Research,
            Self::General => TaskKind::General,
        }
    }
}

/// A task in the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Where the task was extracted from.
    pub source: String,
    /// Kind-specific attributes; also determines the task kind.
    #[serde(flatten)]
    pub attributes: KindAttributes,
    /// Scheduling priority.
    pub priority: Priority,
    /// Estimated duration in abstract day units.
    pub estimated_duration: u64,
    /// Ids of prerequisite tasks, unique, in listed order.
    pub dependencies: Vec<String>,
    /// Expected deliverables.
    pub deliverables: Vec<String>,
    /// Key technologies involved.
    pub key_technologies: Vec<String>,
    /// Acceptance criteria.
    pub criteria: Vec<String>,
    /// Fields the planner does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// When the planner first stored the task.
    pub created_at: DateTime<Utc>,
    /// When the planner last changed the task.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// The task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.attributes.kind()
    }

    /// Technical difficulty.
    ///
    /// Technical tasks carry it as an attribute; other kinds may still have
    /// a `technicalDifficulty` field preserved in `extra`.
    #[must_use]
    pub fn technical_difficulty(&self) -> Option<Difficulty> {
        match self.attributes {
            KindAttributes::Technical {
                technical_difficulty,
            } => technical_difficulty,
            _ => self
                .extra
                .get("technicalDifficulty")
                .and_then(Value::as_str)
                .and_then(Difficulty::parse),
        }
    }
}

impl TaskNodeData for Task {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(String::as_str)
    }
}

/// A task not yet stored in the planner.
///
/// When `id` is `None` the planner generates one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    /// Requested id.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Origin of the task.
    pub source: String,
    /// Kind-specific attributes.
    pub attributes: KindAttributes,
    /// Scheduling priority.
    pub priority: Priority,
    /// Estimated duration.
    pub estimated_duration: u64,
    /// Prerequisite ids.
    pub dependencies: Vec<String>,
    /// Expected deliverables.
    pub deliverables: Vec<String>,
    /// Key technologies.
    pub key_technologies: Vec<String>,
    /// Acceptance criteria.
    pub criteria: Vec<String>,
    /// Uninterpreted fields.
    pub extra: Map<String, Value>,
}

impl NewTask {
    /// Start a general task with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: crate::normalize::DEFAULT_SOURCE.to_string(),
            ..Self::default()
        }
    }

    /// Request a specific id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the kind, discarding attributes of any previous kind.
    #[must_use]
    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        if self.attributes.kind() != kind {
            self.attributes = KindAttributes::empty(kind);
        }
        self
    }

    /// Set kind-specific attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: KindAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the estimated duration.
    #[must_use]
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.estimated_duration = duration.min(crate::normalize::MAX_DURATION);
        self
    }

    /// Set prerequisite ids. Blank and repeated ids are dropped.
    #[must_use]
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = crate::normalize::dedup_ids(deps.into_iter().map(Into::into));
        self
    }

    /// Set key technologies.
    #[must_use]
    pub fn with_key_technologies<I, S>(mut self, technologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_technologies = technologies.into_iter().map(Into::into).collect();
        self
    }

    /// Make this a technical task with the given difficulty.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.attributes = KindAttributes::Technical {
            technical_difficulty: Some(difficulty),
        };
        self
    }

    /// Stamp id and timestamps, producing a stored task.
    pub(crate) fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            name: self.name,
            description: self.description,
            source: self.source,
            attributes: self.attributes,
            priority: self.priority,
            estimated_duration: self.estimated_duration,
            dependencies: self.dependencies,
            deliverables: self.deliverables,
            key_technologies: self.key_technologies,
            criteria: self.criteria,
            extra: self.extra,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update merged onto an existing task.
///
/// `None` leaves a field unchanged. Kind-specific fields apply only when the
/// resulting task has that kind; otherwise they are kept as extra fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New source.
    pub source: Option<String>,
    /// New kind. Attributes of the old kind are discarded when it changes.
    pub kind: Option<TaskKind>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New duration.
    pub estimated_duration: Option<u64>,
    /// Replacement prerequisite list.
    pub dependencies: Option<Vec<String>>,
    /// Replacement deliverables.
    pub deliverables: Option<Vec<String>>,
    /// Replacement key technologies.
    pub key_technologies: Option<Vec<String>>,
    /// Replacement criteria.
    pub criteria: Option<Vec<String>>,
    /// New technical difficulty.
    pub technical_difficulty: Option<Difficulty>,
    /// New planned date.
    pub planned_date: Option<String>,
    /// New research method.
    pub research_method: Option<String>,
    /// New expected outcome.
    pub expected_outcome: Option<String>,
    /// Extra fields merged over the existing ones.
    pub extra: Map<String, Value>,
}

impl TaskPatch {
    /// Replace the prerequisite list.
    #[must_use]
    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(crate::normalize::dedup_ids(deps.into_iter().map(Into::into)));
        self
    }

    /// Replace the estimated duration.
    #[must_use]
    pub fn duration(mut self, duration: u64) -> Self {
        self.estimated_duration = Some(duration.min(crate::normalize::MAX_DURATION));
        self
    }

    /// Replace the priority.
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replace the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether the patch replaces the prerequisite list.
    #[must_use]
    pub fn changes_dependencies(&self) -> bool {
        self.dependencies.is_some()
    }

    /// Merge the patch onto `task`. Timestamps are left to the caller.
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(source) = &self.source {
            task.source.clone_from(source);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(duration) = self.estimated_duration {
            task.estimated_duration = duration;
        }
        if let Some(deps) = &self.dependencies {
            task.dependencies.clone_from(deps);
        }
        if let Some(deliverables) = &self.deliverables {
            task.deliverables.clone_from(deliverables);
        }
        if let Some(technologies) = &self.key_technologies {
            task.key_technologies.clone_from(technologies);
        }
        if let Some(criteria) = &self.criteria {
            task.criteria.clone_from(criteria);
        }
        if let Some(kind) = self.kind
            && kind != task.kind()
        {
            task.attributes = KindAttributes::empty(kind);
        }
        self.apply_kind_fields(task);
        for (key, value) in &self.extra {
            task.extra.insert(key.clone(), value.clone());
        }
    }

    fn apply_kind_fields(&self, task: &mut Task) {
        let mut unplaced: Vec<(&str, Value)> = Vec::new();

        match &mut task.attributes {
            KindAttributes::Technical {
                technical_difficulty,
            } => {
                if let Some(difficulty) = self.technical_difficulty {
                    *technical_difficulty = Some(difficulty);
                }
            }
            _ => {
                if let Some(difficulty) = self.technical_difficulty {
                    unplaced.push(("technicalDifficulty", difficulty.as_str().into()));
                }
            }
        }

        match &mut task.attributes {
            KindAttributes::Milestone { planned_date } => {
                if let Some(date) = &self.planned_date {
                    *planned_date = Some(date.clone());
                }
            }
            _ => {
                if let Some(date) = &self.planned_date {
                    unplaced.push(("plannedDate", date.as_str().into()));
                }
            }
        }

        match &mut task.attributes {
            KindAttributes::Research {
                research_method,
                expected_outcome,
            } => {
                if let Some(method) = &self.research_method {
                    *research_method = Some(method.clone());
                }
                if let Some(outcome) = &self.expected_outcome {
                    *expected_outcome = Some(outcome.clone());
                }
            }
            _ => {
                if let Some(method) = &self.research_method {
                    unplaced.push(("researchMethod", method.as_str().into()));
                }
                if let Some(outcome) = &self.expected_outcome {
                    unplaced.push(("expectedOutcome", outcome.as_str().into()));
                }
            }
        }

        for (key, value) in unplaced {
            task.extra.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(new: NewTask) -> Task {
        new.into_task("t".to_string(), Utc::now())
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(TaskKind::parse(" Technical "), Some(TaskKind::Technical));
        assert_eq!(TaskKind::parse("design"), None);
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Difficulty::parse("low"), Some(Difficulty::Low));
    }

    #[test]
    fn test_builder_dedups_dependencies() {
        let task = NewTask::new("x").depends_on(["a", "b", "a", " "]);
        assert_eq!(task.dependencies, vec!["a", "b"]);
    }

    #[test]
    fn test_serialized_task_is_flat_camel_case() {
        let task = stored(
            NewTask::new("Prototype")
                .with_difficulty(Difficulty::High)
                .with_duration(3),
        );
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "technical");
        assert_eq!(json["technicalDifficulty"], "high");
        assert_eq!(json["estimatedDuration"], 3);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn test_patch_kind_change_resets_attributes() {
        let mut task = stored(NewTask::new("x").with_difficulty(Difficulty::High));
        let patch = TaskPatch {
            kind: Some(TaskKind::Research),
            research_method: Some("survey".into()),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.kind(), TaskKind::Research);
        assert_eq!(task.technical_difficulty(), None);
        assert_eq!(
            task.attributes,
            KindAttributes::Research {
                research_method: Some("survey".into()),
                expected_outcome: None,
            }
        );
    }

    #[test]
    fn test_difficulty_read_from_extra_for_other_kinds() {
        let mut task = stored(NewTask::new("x").with_kind(TaskKind::Milestone));
        assert_eq!(task.technical_difficulty(), None);
        task.extra.insert("technicalDifficulty".into(), Value::from(" High "));
        assert_eq!(task.technical_difficulty(), Some(Difficulty::High));
        task.extra.insert("technicalDifficulty".into(), Value::from("extreme"));
        assert_eq!(task.technical_difficulty(), None);
    }

    #[test]
    fn test_patch_keeps_foreign_kind_fields_as_extra() {
        let mut task = stored(NewTask::new("x"));
        let patch = TaskPatch {
            planned_date: Some("2025-06-01".into()),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.kind(), TaskKind::General);
        assert_eq!(task.extra["plannedDate"], "2025-06-01");
    }
}
