//! Stored byte form of a lesson plan.
//!
//! # Responsibility
//! - Wrap plans in a versioned JSON envelope for storage.
//! - Read envelopes and bare legacy plan objects back into valid plans.
//!
//! # Invariants
//! - Decoding goes through `reconcile` with floor minimums, so older shapes
//!   (missing groups, different default list lengths) load without losing
//!   any field the current schema knows.
//! - Only bytes that are not a JSON object are rejected.

use crate::model::plan::LessonPlan;
use crate::reconcile::{reconcile, ReconcileOptions};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version written into every envelope by this build.
pub const PLAN_SCHEMA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";
const PLAN_FIELD: &str = "plan";

#[derive(Serialize)]
struct PlanEnvelope<'a> {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    plan: &'a LessonPlan,
}

/// Result of decoding stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPlan {
    pub plan: LessonPlan,
    /// `None` for a bare plan object written without an envelope.
    pub schema_version: Option<u32>,
}

impl DecodedPlan {
    /// Whether the bytes came from a build newer than this one.
    pub fn is_from_newer_build(&self) -> bool {
        self.schema_version
            .is_some_and(|version| version > PLAN_SCHEMA_VERSION)
    }
}

/// Codec errors.
#[derive(Debug)]
pub enum CodecError {
    /// Bytes are not valid JSON.
    Corrupt(serde_json::Error),
    /// Valid JSON, but not an object.
    NotAnObject,
    /// `schemaVersion` is present but not a small non-negative integer.
    InvalidVersion(Value),
    Encode(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupt(err) => write!(f, "stored plan is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "stored plan is not a JSON object"),
            Self::InvalidVersion(value) => write!(f, "stored plan has invalid schema version: {value}"),
            Self::Encode(err) => write!(f, "failed to encode plan: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Corrupt(err) | Self::Encode(err) => Some(err),
            Self::NotAnObject | Self::InvalidVersion(_) => None,
        }
    }
}

/// Encodes `plan` as a versioned JSON envelope.
pub fn encode_plan(plan: &LessonPlan) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(&PlanEnvelope {
        schema_version: PLAN_SCHEMA_VERSION,
        plan,
    })
    .map_err(CodecError::Encode)
}

/// Decodes stored bytes into a valid plan.
///
/// # Errors
/// - `CodecError::Corrupt` / `NotAnObject` / `InvalidVersion` when the bytes
///   cannot be read as a plan at all. Callers fall back to the default plan.
pub fn decode_plan(bytes: &[u8]) -> Result<DecodedPlan, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(CodecError::Corrupt)?;
    let Some(root) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };

    let options = ReconcileOptions::default();
    match root.get(VERSION_FIELD) {
        Some(version) => {
            let schema_version = version
                .as_u64()
                .and_then(|raw| u32::try_from(raw).ok())
                .ok_or_else(|| CodecError::InvalidVersion(version.clone()))?;
            let plan = root.get(PLAN_FIELD).unwrap_or(&Value::Null);
            Ok(DecodedPlan {
                plan: reconcile(plan, &options),
                schema_version: Some(schema_version),
            })
        }
        None => Ok(DecodedPlan {
            plan: reconcile(&value, &options),
            schema_version: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_plan, encode_plan, CodecError, PLAN_SCHEMA_VERSION};
    use crate::model::mutation::set;
    use crate::model::path::FieldPath;
    use crate::model::plan::LessonPlan;
    use serde_json::json;

    #[test]
    fn encoded_plan_decodes_to_equal_plan() {
        let plan = LessonPlan::default_plan().with_game_added().with_step_removed(0);
        let plan = set(&plan, &FieldPath::parse("games.1.rules"), "two teams");

        let decoded = decode_plan(&encode_plan(&plan).unwrap()).unwrap();
        assert_eq!(decoded.plan, plan);
        assert_eq!(decoded.schema_version, Some(PLAN_SCHEMA_VERSION));
        assert!(!decoded.is_from_newer_build());
    }

    #[test]
    fn envelope_carries_schema_version() {
        let bytes = encode_plan(&LessonPlan::default_plan()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["schemaVersion"], PLAN_SCHEMA_VERSION);
        assert!(value["plan"]["basic"].is_object());
    }

    #[test]
    fn bare_legacy_plan_without_expansion_is_migrated() {
        let legacy = json!({
            "basic": { "level": "1", "unit": "7", "lessonNo": "1" },
            "objectives": {
                "vocab": { "core": "cat, dog", "basic": "", "satellite": "" },
                "patterns": { "core": "", "basic": "", "satellite": "" }
            },
            "steps": [
                { "step": "Warm up", "duration": "5" },
                {}, {}, {}, {}, {}
            ]
        });
        let decoded = decode_plan(legacy.to_string().as_bytes()).unwrap();

        assert_eq!(decoded.schema_version, None);
        assert_eq!(decoded.plan.objectives.vocab.core, "cat, dog");
        assert_eq!(decoded.plan.objectives.expansion.culture, "");
        assert_eq!(decoded.plan.steps.len(), 6);
        assert_eq!(decoded.plan.steps.get(0).unwrap().duration, "5");
        assert_eq!(decoded.plan.games.len(), 1);
    }

    #[test]
    fn newer_envelope_is_read_best_effort() {
        let bytes = json!({
            "schemaVersion": PLAN_SCHEMA_VERSION + 1,
            "plan": { "basic": { "date": "2026-09-01" }, "futureSection": {} }
        })
        .to_string();
        let decoded = decode_plan(bytes.as_bytes()).unwrap();
        assert!(decoded.is_from_newer_build());
        assert_eq!(decoded.plan.basic.date, "2026-09-01");
    }

    #[test]
    fn rejects_unreadable_bytes() {
        assert!(matches!(
            decode_plan(b"{not json").unwrap_err(),
            CodecError::Corrupt(_)
        ));
        assert!(matches!(
            decode_plan(b"[1, 2]").unwrap_err(),
            CodecError::NotAnObject
        ));
        assert!(matches!(
            decode_plan(br#"{"schemaVersion": "one"}"#).unwrap_err(),
            CodecError::InvalidVersion(_)
        ));
    }
}
