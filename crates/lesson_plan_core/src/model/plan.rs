//! Lesson plan document model.
//!
//! # Responsibility
//! - Define the canonical, fixed-shape lesson plan tree.
//! - Provide the default factory for a structurally valid blank plan.
//! - Expose name-based leaf access used by path mutation and reconciliation.
//!
//! # Invariants
//! - Every leaf is a `String`; absence is the empty string.
//! - `games` and `steps` always hold at least one item.
//! - Record nodes live behind `Arc`, so cloning a plan only bumps refcounts.
//!
//! # See also
//! - model::mutation for copy-on-write leaf updates.

use crate::model::collection::ItemList;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Number of blank steps in a freshly created plan.
pub const DEFAULT_STEP_COUNT: usize = 5;
/// Number of blank games in a freshly created plan.
pub const DEFAULT_GAME_COUNT: usize = 1;

/// Record whose fields are all string leaves.
///
/// Field names are the external (camelCase) names used in paths and JSON.
pub trait LeafRecord: Clone + Default {
    /// External field names in declaration order.
    const FIELD_NAMES: &'static [&'static str];

    /// Reads one leaf by external name.
    fn field(&self, name: &str) -> Option<&str>;

    /// Returns a mutable slot for one leaf by external name.
    fn field_mut(&mut self, name: &str) -> Option<&mut String>;
}

macro_rules! leaf_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($field:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            $(
                #[serde(rename = $key)]
                pub $field: String,
            )+
        }

        impl LeafRecord for $name {
            const FIELD_NAMES: &'static [&'static str] = &[$($key),+];

            fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $($key => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut String> {
                match name {
                    $($key => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

leaf_record! {
    /// Course metadata shown in the header grid.
    BasicInfo {
        level => "level",
        unit => "unit",
        lesson_no => "lessonNo",
        duration => "duration",
        class_name => "className",
        student_count => "studentCount",
        date => "date",
    }
}

leaf_record! {
    /// Three-tier goal list shared by vocabulary and sentence pattern objectives.
    TieredGoals {
        core => "core",
        basic => "basic",
        satellite => "satellite",
    }
}

leaf_record! {
    /// Expansion objectives beyond the language targets.
    ExpansionGoals {
        culture => "culture",
        daily => "daily",
        habits => "habits",
    }
}

leaf_record! {
    /// Teaching materials checklist.
    Materials {
        cards => "cards",
        realia => "realia",
        multimedia => "multimedia",
        rewards => "rewards",
    }
}

leaf_record! {
    /// One classroom game.
    Game {
        name => "name",
        goal => "goal",
        prep => "prep",
        rules => "rules",
    }
}

leaf_record! {
    /// One row of the implementation table.
    Step {
        step => "step",
        duration => "duration",
        design => "design",
        instructions => "instructions",
        notes => "notes",
        blackboard => "blackboard",
    }
}

leaf_record! {
    /// Links to the previous and next lesson.
    LessonConnection {
        review => "review",
        preview => "preview",
        homework => "homework",
        prep => "prep",
    }
}

leaf_record! {
    /// One communication memo.
    FeedbackEntry {
        content => "content",
        time => "time",
        plan => "plan",
    }
}

impl Game {
    /// Blank list item used by append and reconciliation padding.
    pub fn blank() -> Self {
        Self::default()
    }
}

impl Step {
    /// Blank list item used by append and reconciliation padding.
    pub fn blank() -> Self {
        Self::default()
    }
}

/// Teaching objectives grouped by target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Objectives {
    pub vocab: Arc<TieredGoals>,
    pub patterns: Arc<TieredGoals>,
    pub expansion: Arc<ExpansionGoals>,
}

/// Communication memos keyed by audience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub student: Arc<FeedbackEntry>,
    pub parent: Arc<FeedbackEntry>,
    pub partner: Arc<FeedbackEntry>,
}

impl Feedback {
    /// Audience slot names in display order.
    pub const SLOT_NAMES: &'static [&'static str] = &["student", "parent", "partner"];

    /// Reads one audience slot by name.
    pub fn slot(&self, name: &str) -> Option<&FeedbackEntry> {
        match name {
            "student" => Some(&self.student),
            "parent" => Some(&self.parent),
            "partner" => Some(&self.partner),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> Option<&mut Arc<FeedbackEntry>> {
        match name {
            "student" => Some(&mut self.student),
            "parent" => Some(&mut self.parent),
            "partner" => Some(&mut self.partner),
            _ => None,
        }
    }
}

/// Canonical lesson plan document.
///
/// Not `Deserialize` on purpose: external JSON enters only through
/// `reconcile`, which repairs whatever shape it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonPlan {
    pub basic: Arc<BasicInfo>,
    pub objectives: Arc<Objectives>,
    pub materials: Arc<Materials>,
    pub games: ItemList<Game>,
    pub steps: ItemList<Step>,
    pub connection: Arc<LessonConnection>,
    pub feedback: Arc<Feedback>,
}

impl LessonPlan {
    /// Builds a blank plan with default list lengths.
    ///
    /// # Invariants
    /// - Every leaf is the empty string.
    /// - `games.len() == DEFAULT_GAME_COUNT`, `steps.len() == DEFAULT_STEP_COUNT`.
    pub fn default_plan() -> Self {
        Self {
            basic: Arc::default(),
            objectives: Arc::default(),
            materials: Arc::default(),
            games: ItemList::padded(Vec::new(), DEFAULT_GAME_COUNT, Game::blank),
            steps: ItemList::padded(Vec::new(), DEFAULT_STEP_COUNT, Step::blank),
            connection: Arc::default(),
            feedback: Arc::default(),
        }
    }

    /// Returns a plan with one blank game appended.
    pub fn with_game_added(&self) -> Self {
        Self {
            games: self.games.append(Game::blank),
            ..self.clone()
        }
    }

    /// Returns a plan without the game at `index`; keeps the last game.
    pub fn with_game_removed(&self, index: usize) -> Self {
        Self {
            games: self.games.remove_at(index),
            ..self.clone()
        }
    }

    /// Returns a plan with one blank step appended.
    pub fn with_step_added(&self) -> Self {
        Self {
            steps: self.steps.append(Step::blank),
            ..self.clone()
        }
    }

    /// Returns a plan without the step at `index`; keeps the last step.
    pub fn with_step_removed(&self, index: usize) -> Self {
        Self {
            steps: self.steps.remove_at(index),
            ..self.clone()
        }
    }

    /// Returns a plan where `section` is reset to its default value.
    ///
    /// Other sections are shared with `self`.
    pub fn with_section_cleared(&self, section: PlanSection) -> Self {
        let blank = Self::default_plan();
        let mut next = self.clone();
        match section {
            PlanSection::Basic => next.basic = blank.basic,
            PlanSection::Objectives => next.objectives = blank.objectives,
            PlanSection::Materials => next.materials = blank.materials,
            PlanSection::Games => next.games = blank.games,
            PlanSection::Steps => next.steps = blank.steps,
            PlanSection::Connection => next.connection = blank.connection,
            PlanSection::Feedback => next.feedback = blank.feedback,
        }
        next
    }
}

impl Default for LessonPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}

/// Top-level plan section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanSection {
    Basic,
    Objectives,
    Materials,
    Games,
    Steps,
    Connection,
    Feedback,
}

impl PlanSection {
    /// All sections in document order.
    pub const ALL: [PlanSection; 7] = [
        Self::Basic,
        Self::Objectives,
        Self::Materials,
        Self::Games,
        Self::Steps,
        Self::Connection,
        Self::Feedback,
    ];

    /// Stable id used as the first path segment and in host calls.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Objectives => "objectives",
            Self::Materials => "materials",
            Self::Games => "games",
            Self::Steps => "steps",
            Self::Connection => "connection",
            Self::Feedback => "feedback",
        }
    }
}

impl Display for PlanSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one section id. Ids are exact lowercase strings.
pub fn parse_plan_section(value: &str) -> Result<PlanSection, PlanSectionError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(PlanSectionError::EmptySection);
    }

    PlanSection::ALL
        .into_iter()
        .find(|section| section.as_str() == normalized)
        .ok_or_else(|| PlanSectionError::UnknownSection(normalized.to_string()))
}

/// Section id parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSectionError {
    EmptySection,
    UnknownSection(String),
}

impl Display for PlanSectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySection => write!(f, "plan section must not be empty"),
            Self::UnknownSection(value) => write!(f, "unknown plan section: {value}"),
        }
    }
}

impl Error for PlanSectionError {}

#[cfg(test)]
mod tests {
    use super::{
        parse_plan_section, BasicInfo, LeafRecord, LessonPlan, PlanSection, PlanSectionError,
        DEFAULT_GAME_COUNT, DEFAULT_STEP_COUNT,
    };
    use std::sync::Arc;

    #[test]
    fn default_plan_has_blank_leaves_and_default_lengths() {
        let plan = LessonPlan::default_plan();
        assert_eq!(plan.games.len(), DEFAULT_GAME_COUNT);
        assert_eq!(plan.steps.len(), DEFAULT_STEP_COUNT);
        assert!(plan.basic.level.is_empty());
        assert!(plan.steps.iter().all(|step| step.blackboard.is_empty()));
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let value = serde_json::to_value(LessonPlan::default_plan()).unwrap();
        assert_eq!(value["basic"]["lessonNo"], "");
        assert_eq!(value["basic"]["studentCount"], "");
        assert_eq!(value["objectives"]["expansion"]["habits"], "");
        assert_eq!(value["feedback"]["partner"]["plan"], "");
        assert_eq!(value["steps"].as_array().unwrap().len(), DEFAULT_STEP_COUNT);
    }

    #[test]
    fn leaf_record_field_table_matches_accessors() {
        let mut info = BasicInfo::default();
        for name in BasicInfo::FIELD_NAMES {
            *info.field_mut(name).unwrap() = format!("v-{name}");
        }
        assert_eq!(info.lesson_no, "v-lessonNo");
        assert_eq!(info.field("className"), Some("v-className"));
        assert_eq!(info.field("class_name"), None);
    }

    #[test]
    fn clearing_a_section_resets_it_and_shares_the_rest() {
        let plan = LessonPlan::default_plan()
            .with_step_added()
            .with_game_added();
        let cleared = plan.with_section_cleared(PlanSection::Steps);

        assert_eq!(cleared.steps.len(), DEFAULT_STEP_COUNT);
        assert_eq!(cleared.games.len(), 2);
        assert!(Arc::ptr_eq(&cleared.basic, &plan.basic));
        assert!(cleared.games.shares_storage_with(&plan.games));
    }

    #[test]
    fn parses_section_ids() {
        for section in PlanSection::ALL {
            assert_eq!(parse_plan_section(section.as_str()), Ok(section));
        }
        assert_eq!(
            parse_plan_section(" "),
            Err(PlanSectionError::EmptySection)
        );
        assert_eq!(
            parse_plan_section("Basic"),
            Err(PlanSectionError::UnknownSection("Basic".to_string()))
        );
    }
}
