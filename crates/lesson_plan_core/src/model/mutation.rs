//! Path-addressed, copy-on-write leaf updates.
//!
//! # Responsibility
//! - Resolve a `FieldPath` against the static plan shape.
//! - Write one leaf into a new plan without touching the input plan.
//!
//! # Invariants
//! - Only nodes on the write path are reallocated; all siblings stay shared.
//! - `get` never fails; unresolved paths read as the empty string.
//! - `set` treats an unresolved path as a programming error and panics.

use crate::model::path::{FieldPath, PathError, PathSegment};
use crate::model::plan::{parse_plan_section, LeafRecord, LessonPlan, PlanSection};
use std::sync::Arc;

/// Returns the current value of the leaf at `path`, or `""` if the path does
/// not resolve.
pub fn get<'a>(plan: &'a LessonPlan, path: &FieldPath) -> &'a str {
    resolve(plan, path.segments()).unwrap_or("")
}

/// Returns a copy of `plan` with the leaf at `path` set to `value`.
///
/// # Errors
/// - `PathError::Unresolved` when `path` names no leaf (including list
///   indices past the end). `plan` is untouched in every case.
pub fn try_set(
    plan: &LessonPlan,
    path: &FieldPath,
    value: impl Into<String>,
) -> Result<LessonPlan, PathError> {
    let mut next = plan.clone();
    let slot = resolve_mut(&mut next, path.segments()).ok_or_else(|| PathError::Unresolved {
        path: path.to_string(),
    })?;
    *slot = value.into();
    Ok(next)
}

/// Returns a copy of `plan` with the leaf at `path` set to `value`.
///
/// Paths are literals owned by the calling code, never user input.
///
/// # Panics
/// - When `path` does not resolve to a leaf. Boundary callers that must not
///   panic use [`try_set`].
pub fn set(plan: &LessonPlan, path: &FieldPath, value: impl Into<String>) -> LessonPlan {
    match try_set(plan, path, value) {
        Ok(next) => next,
        Err(err) => panic!("{err}"),
    }
}

/// Enumerates every leaf path of `plan` in document order.
pub fn leaf_paths(plan: &LessonPlan) -> Vec<FieldPath> {
    use crate::model::plan::{
        BasicInfo, ExpansionGoals, Feedback, FeedbackEntry, Game, LessonConnection, Materials,
        Step, TieredGoals,
    };

    let mut paths = Vec::new();
    for section in PlanSection::ALL {
        match section {
            PlanSection::Basic => push_fields(&mut paths, section, None, BasicInfo::FIELD_NAMES),
            PlanSection::Materials => {
                push_fields(&mut paths, section, None, Materials::FIELD_NAMES)
            }
            PlanSection::Connection => {
                push_fields(&mut paths, section, None, LessonConnection::FIELD_NAMES)
            }
            PlanSection::Objectives => {
                push_fields(&mut paths, section, Some("vocab"), TieredGoals::FIELD_NAMES);
                push_fields(&mut paths, section, Some("patterns"), TieredGoals::FIELD_NAMES);
                push_fields(
                    &mut paths,
                    section,
                    Some("expansion"),
                    ExpansionGoals::FIELD_NAMES,
                );
            }
            PlanSection::Feedback => {
                for slot in Feedback::SLOT_NAMES {
                    push_fields(&mut paths, section, Some(*slot), FeedbackEntry::FIELD_NAMES);
                }
            }
            PlanSection::Games => {
                for index in 0..plan.games.len() {
                    for field in Game::FIELD_NAMES {
                        paths.push(FieldPath::item(section, index, field));
                    }
                }
            }
            PlanSection::Steps => {
                for index in 0..plan.steps.len() {
                    for field in Step::FIELD_NAMES {
                        paths.push(FieldPath::item(section, index, field));
                    }
                }
            }
        }
    }
    paths
}

fn push_fields(
    paths: &mut Vec<FieldPath>,
    section: PlanSection,
    group: Option<&str>,
    fields: &[&str],
) {
    for field in fields {
        paths.push(match group {
            Some(group) => FieldPath::group_field(section, group, field),
            None => FieldPath::section_field(section, field),
        });
    }
}

fn split_section(segments: &[PathSegment]) -> Option<(PlanSection, &[PathSegment])> {
    match segments {
        [PathSegment::Field(section), rest @ ..] => {
            Some((parse_plan_section(section).ok()?, rest))
        }
        _ => None,
    }
}

fn resolve<'a>(plan: &'a LessonPlan, segments: &[PathSegment]) -> Option<&'a str> {
    use PathSegment::{Field, Index};

    let (section, rest) = split_section(segments)?;
    match (section, rest) {
        (PlanSection::Basic, [Field(name)]) => plan.basic.field(name),
        (PlanSection::Materials, [Field(name)]) => plan.materials.field(name),
        (PlanSection::Connection, [Field(name)]) => plan.connection.field(name),
        (PlanSection::Objectives, [Field(group), Field(name)]) => match group.as_str() {
            "vocab" => plan.objectives.vocab.field(name),
            "patterns" => plan.objectives.patterns.field(name),
            "expansion" => plan.objectives.expansion.field(name),
            _ => None,
        },
        (PlanSection::Feedback, [Field(slot), Field(name)]) => {
            plan.feedback.slot(slot)?.field(name)
        }
        (PlanSection::Games, [Index(index), Field(name)]) => plan.games.get(*index)?.field(name),
        (PlanSection::Steps, [Index(index), Field(name)]) => plan.steps.get(*index)?.field(name),
        _ => None,
    }
}

fn resolve_mut<'a>(plan: &'a mut LessonPlan, segments: &[PathSegment]) -> Option<&'a mut String> {
    use PathSegment::{Field, Index};

    let (section, rest) = split_section(segments)?;
    match (section, rest) {
        (PlanSection::Basic, [Field(name)]) => Arc::make_mut(&mut plan.basic).field_mut(name),
        (PlanSection::Materials, [Field(name)]) => {
            Arc::make_mut(&mut plan.materials).field_mut(name)
        }
        (PlanSection::Connection, [Field(name)]) => {
            Arc::make_mut(&mut plan.connection).field_mut(name)
        }
        (PlanSection::Objectives, [Field(group), Field(name)]) => {
            let objectives = Arc::make_mut(&mut plan.objectives);
            match group.as_str() {
                "vocab" => Arc::make_mut(&mut objectives.vocab).field_mut(name),
                "patterns" => Arc::make_mut(&mut objectives.patterns).field_mut(name),
                "expansion" => Arc::make_mut(&mut objectives.expansion).field_mut(name),
                _ => None,
            }
        }
        (PlanSection::Feedback, [Field(slot), Field(name)]) => {
            let feedback = Arc::make_mut(&mut plan.feedback);
            Arc::make_mut(feedback.slot_mut(slot)?).field_mut(name)
        }
        (PlanSection::Games, [Index(index), Field(name)]) => {
            plan.games.item_mut(*index)?.field_mut(name)
        }
        (PlanSection::Steps, [Index(index), Field(name)]) => {
            plan.steps.item_mut(*index)?.field_mut(name)
        }
        _ => None,
    }
}
