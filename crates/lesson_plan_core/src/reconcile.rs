//! Total reconciliation of untrusted JSON into a valid lesson plan.
//!
//! # Responsibility
//! - Walk the known plan schema and pick matching string leaves from an
//!   arbitrary JSON value.
//! - Repair missing fields, wrong types and short lists with defaults.
//!
//! # Invariants
//! - Reconciliation never fails and never panics, whatever the input.
//! - Only string values are copied; every other JSON type reads as absent.
//! - Unknown fields are dropped.
//! - `games`/`steps` meet the configured minimum length (at least 1).
//! - With default options, a JSON-encoded valid plan reconciles to itself.

use crate::model::collection::ItemList;
use crate::model::plan::{
    BasicInfo, ExpansionGoals, Feedback, FeedbackEntry, Game, LeafRecord, LessonConnection,
    LessonPlan, Materials, Objectives, Step, TieredGoals,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Minimum list lengths applied while reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub min_games: usize,
    pub min_steps: usize,
}

impl Default for ReconcileOptions {
    /// Floor minimums only; keeps list lengths of already-valid plans.
    fn default() -> Self {
        Self {
            min_games: 1,
            min_steps: 1,
        }
    }
}

/// Builds a valid plan from an untrusted JSON value.
pub fn reconcile(value: &Value, options: &ReconcileOptions) -> LessonPlan {
    let root = value.as_object();
    let defaults = LessonPlan::default_plan();

    LessonPlan {
        basic: Arc::new(extract_record::<BasicInfo>(child(root, "basic"))),
        objectives: Arc::new(extract_objectives(child(root, "objectives"))),
        materials: Arc::new(extract_record::<Materials>(child(root, "materials"))),
        games: extract_list(
            child(root, "games"),
            &defaults.games,
            options.min_games,
            Game::blank,
        ),
        steps: extract_list(
            child(root, "steps"),
            &defaults.steps,
            options.min_steps,
            Step::blank,
        ),
        connection: Arc::new(extract_record::<LessonConnection>(child(root, "connection"))),
        feedback: Arc::new(extract_feedback(child(root, "feedback"))),
    }
}

fn child<'a>(parent: Option<&'a Map<String, Value>>, name: &str) -> Option<&'a Value> {
    parent?.get(name)
}

/// Copies every string leaf named by `R::FIELD_NAMES`; others stay `""`.
fn extract_record<R: LeafRecord>(value: Option<&Value>) -> R {
    let mut record = R::default();
    let Some(map) = value.and_then(Value::as_object) else {
        return record;
    };

    for name in R::FIELD_NAMES {
        if let Some(Value::String(text)) = map.get(*name) {
            if let Some(slot) = record.field_mut(name) {
                slot.clone_from(text);
            }
        }
    }
    record
}

fn extract_objectives(value: Option<&Value>) -> Objectives {
    let map = value.and_then(Value::as_object);
    Objectives {
        vocab: Arc::new(extract_record::<TieredGoals>(child(map, "vocab"))),
        patterns: Arc::new(extract_record::<TieredGoals>(child(map, "patterns"))),
        expansion: Arc::new(extract_record::<ExpansionGoals>(child(map, "expansion"))),
    }
}

fn extract_feedback(value: Option<&Value>) -> Feedback {
    let map = value.and_then(Value::as_object);
    Feedback {
        student: Arc::new(extract_record::<FeedbackEntry>(child(map, "student"))),
        parent: Arc::new(extract_record::<FeedbackEntry>(child(map, "parent"))),
        partner: Arc::new(extract_record::<FeedbackEntry>(child(map, "partner"))),
    }
}

/// Extracts one list section.
///
/// - Array input: objects are extracted in place, non-objects become blank
///   items at the same position.
/// - Anything else: the default list.
/// - Either way, padded to `min_len` (at least 1).
fn extract_list<T: LeafRecord>(
    value: Option<&Value>,
    defaults: &ItemList<T>,
    min_len: usize,
    blank: fn() -> T,
) -> ItemList<T> {
    let items: Vec<T> = match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                Value::Object(_) => extract_record::<T>(Some(entry)),
                _ => blank(),
            })
            .collect(),
        _ => defaults.iter().cloned().collect(),
    };
    ItemList::padded(items, min_len, blank)
}
