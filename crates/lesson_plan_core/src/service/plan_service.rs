//! Lesson plan editing session.
//!
//! # Responsibility
//! - Own the current plan snapshot for one editing session.
//! - Route edits through the mutation engine and persist after each change.
//! - Run the import flow: extraction, reconciliation, wholesale replace.
//!
//! # Invariants
//! - The current plan is only ever replaced by a complete new snapshot.
//! - A failed import leaves the current plan untouched.
//! - Persistence is fire-and-forget: save failures are logged, not returned.
//! - Loading never fails; unreadable or missing bytes yield the default plan.
//!
//! # See also
//! - crate::reconcile, crate::extraction

use crate::config::PlanConfig;
use crate::extraction::{
    parse_extraction_payload, ExtractionError, ExtractionRequest, Extractor, ImportGate,
    ImportPermit, SourceContent,
};
use crate::model::mutation::{get, try_set};
use crate::model::path::{FieldPath, PathError};
use crate::model::plan::{LessonPlan, PlanSection};
use crate::model::title::document_title;
use crate::reconcile::reconcile;
use crate::repo::kv_repo::KvStore;
use crate::repo::plan_codec::{decode_plan, encode_plan};
use log::{debug, error, info, warn};
use std::time::Instant;

/// One editing session over a key-value store.
pub struct PlanSession<S: KvStore> {
    store: S,
    config: PlanConfig,
    plan: LessonPlan,
    import_gate: ImportGate,
}

impl<S: KvStore> PlanSession<S> {
    /// Opens a session, loading the stored plan or starting from defaults.
    pub fn open(store: S, config: PlanConfig) -> Self {
        let plan = load_or_default(&store, config.storage_key.as_str());
        Self {
            store,
            config,
            plan,
            import_gate: ImportGate::new(),
        }
    }

    /// Current plan snapshot.
    pub fn plan(&self) -> &LessonPlan {
        &self.plan
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads one leaf; unresolved paths read as `""`.
    pub fn get_field(&self, path: &FieldPath) -> &str {
        get(&self.plan, path)
    }

    /// Writes one leaf.
    ///
    /// # Errors
    /// - `PathError::Unresolved` when `path` names no leaf; the plan is
    ///   unchanged.
    pub fn set_field(&mut self, path: &FieldPath, value: impl Into<String>) -> Result<(), PathError> {
        match try_set(&self.plan, path, value) {
            Ok(next) => {
                debug!("event=plan_edit module=service status=ok path={path}");
                self.commit(next);
                Ok(())
            }
            Err(err) => {
                warn!("event=plan_edit module=service status=error error_code=path_unresolved path={path}");
                Err(err)
            }
        }
    }

    /// Appends a blank game and returns the new game count.
    pub fn add_game(&mut self) -> usize {
        let next = self.plan.with_game_added();
        let len = next.games.len();
        info!("event=list_append module=service status=ok list=games len={len}");
        self.commit(next);
        len
    }

    /// Removes one game; returns `false` when the floor or bounds kept it.
    pub fn remove_game(&mut self, index: usize) -> bool {
        let next = self.plan.with_game_removed(index);
        let removed = !next.games.shares_storage_with(&self.plan.games);
        self.commit_removal(next, removed, PlanSection::Games, index)
    }

    /// Appends a blank step and returns the new step count.
    pub fn add_step(&mut self) -> usize {
        let next = self.plan.with_step_added();
        let len = next.steps.len();
        info!("event=list_append module=service status=ok list=steps len={len}");
        self.commit(next);
        len
    }

    /// Removes one step; returns `false` when the floor or bounds kept it.
    pub fn remove_step(&mut self, index: usize) -> bool {
        let next = self.plan.with_step_removed(index);
        let removed = !next.steps.shares_storage_with(&self.plan.steps);
        self.commit_removal(next, removed, PlanSection::Steps, index)
    }

    /// Resets one section to its default value.
    pub fn clear_section(&mut self, section: PlanSection) {
        info!("event=section_clear module=service status=ok section={section}");
        let next = self.plan.with_section_cleared(section);
        self.commit(next);
    }

    /// Replaces the whole plan with the default plan.
    pub fn reset(&mut self) {
        info!("event=plan_reset module=service status=ok");
        self.commit(LessonPlan::default_plan());
    }

    /// Export title derived from the current header fields.
    pub fn document_title(&self) -> String {
        document_title(&self.plan.basic)
    }

    pub fn is_import_in_flight(&self) -> bool {
        self.import_gate.is_busy()
    }

    /// Claims the import slot before calling the collaborator.
    ///
    /// The session stays usable while the permit is held; only a second
    /// import is refused.
    ///
    /// # Errors
    /// - `ExtractionError::Busy` while another import is in flight.
    pub fn begin_import(&self) -> Result<ImportPermit, ExtractionError> {
        let permit = self.import_gate.try_acquire().inspect_err(|_| {
            warn!("event=plan_import module=service status=rejected error_code=import_busy");
        })?;
        info!(
            "event=plan_import module=service status=start request_id={}",
            permit.request_id()
        );
        Ok(permit)
    }

    /// Completes an import with the collaborator's outcome.
    ///
    /// On success the reconciled plan replaces the current plan wholesale and
    /// is persisted. The permit is released when this returns.
    ///
    /// # Errors
    /// - The collaborator error, unchanged.
    /// - `ExtractionError::MalformedPayload` when the reply is not JSON.
    /// - `ExtractionError::ForeignPermit` for a permit from another session.
    pub fn finish_import(
        &mut self,
        permit: ImportPermit,
        outcome: Result<String, ExtractionError>,
    ) -> Result<(), ExtractionError> {
        if !permit.is_from(&self.import_gate) {
            return Err(ExtractionError::ForeignPermit);
        }
        let request_id = permit.request_id();

        let value = outcome
            .and_then(|reply| parse_extraction_payload(&reply))
            .inspect_err(|err| {
                error!(
                    "event=plan_import module=service status=error request_id={} error_code={} error={}",
                    request_id,
                    err.code(),
                    err
                );
            })?;

        let next = reconcile(&value, &self.config.import_options());
        info!(
            "event=plan_import module=service status=ok request_id={} games={} steps={}",
            request_id,
            next.games.len(),
            next.steps.len()
        );
        self.commit(next);
        drop(permit);
        Ok(())
    }

    /// Runs a complete import against a blocking collaborator.
    pub fn import_with(
        &mut self,
        extractor: &dyn Extractor,
        source: SourceContent,
    ) -> Result<(), ExtractionError> {
        let permit = self.begin_import()?;
        let started_at = Instant::now();
        debug!(
            "event=extraction_call module=service status=start request_id={} source_kind={} source_bytes={}",
            permit.request_id(),
            source.kind_label(),
            source.byte_len()
        );

        let outcome = extractor.extract(&ExtractionRequest::new(source));
        debug!(
            "event=extraction_call module=service status=done request_id={} duration_ms={} ok={}",
            permit.request_id(),
            started_at.elapsed().as_millis(),
            outcome.is_ok()
        );
        self.finish_import(permit, outcome)
    }

    fn commit_removal(
        &mut self,
        next: LessonPlan,
        removed: bool,
        list: PlanSection,
        index: usize,
    ) -> bool {
        if !removed {
            debug!("event=list_remove module=service status=skipped list={list} index={index}");
            return false;
        }

        info!("event=list_remove module=service status=ok list={list} index={index}");
        self.commit(next);
        true
    }

    fn commit(&mut self, next: LessonPlan) {
        self.plan = next;
        self.persist();
    }

    fn persist(&self) {
        let key = self.config.storage_key.as_str();
        let bytes = match encode_plan(&self.plan) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("event=plan_save module=service status=error error_code=encode_failed error={err}");
                return;
            }
        };
        match self.store.save(key, &bytes) {
            Ok(()) => debug!(
                "event=plan_save module=service status=ok key={key} bytes={}",
                bytes.len()
            ),
            Err(err) => error!(
                "event=plan_save module=service status=error error_code=store_failed key={key} error={err}"
            ),
        }
    }
}

fn load_or_default(store: &impl KvStore, key: &str) -> LessonPlan {
    let bytes = match store.load(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            info!("event=plan_load module=service status=ok source=default reason=absent key={key}");
            return LessonPlan::default_plan();
        }
        Err(err) => {
            error!(
                "event=plan_load module=service status=error source=default error_code=store_failed key={key} error={err}"
            );
            return LessonPlan::default_plan();
        }
    };

    match decode_plan(&bytes) {
        Ok(decoded) => {
            if decoded.is_from_newer_build() {
                warn!(
                    "event=plan_load module=service status=degraded reason=newer_schema key={key} schema_version={:?}",
                    decoded.schema_version
                );
            }
            info!(
                "event=plan_load module=service status=ok source=store key={key} bytes={} games={} steps={}",
                bytes.len(),
                decoded.plan.games.len(),
                decoded.plan.steps.len()
            );
            decoded.plan
        }
        Err(err) => {
            warn!(
                "event=plan_load module=service status=error source=default error_code=corrupt_plan key={key} error={err}"
            );
            LessonPlan::default_plan()
        }
    }
}
