//! Core domain logic for the lesson plan editor.
//! This crate is the single source of truth for plan shape and invariants.

pub mod config;
pub mod db;
pub mod extraction;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;

pub use config::{ConfigError, PlanConfig, DEFAULT_STORAGE_KEY};
pub use extraction::{
    parse_extraction_payload, ExtractionError, ExtractionRequest, Extractor, ImportGate,
    ImportPermit, SourceContent,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::collection::ItemList;
pub use model::mutation::{get, leaf_paths, set, try_set};
pub use model::path::{FieldPath, PathError, PathSegment};
pub use model::plan::{
    parse_plan_section, BasicInfo, ExpansionGoals, Feedback, FeedbackEntry, Game, LeafRecord,
    LessonConnection, LessonPlan, Materials, Objectives, PlanSection, PlanSectionError, Step,
    TieredGoals, DEFAULT_GAME_COUNT, DEFAULT_STEP_COUNT,
};
pub use model::title::document_title;
pub use reconcile::{reconcile, ReconcileOptions};
pub use repo::kv_repo::{KvStore, RepoError, RepoResult, SqliteKvStore};
pub use repo::plan_codec::{decode_plan, encode_plan, CodecError, DecodedPlan};
pub use service::plan_service::PlanSession;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
