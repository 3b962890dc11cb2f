//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the single process-wide editing session.
//! - Split imports into begin / complete so the host can run the
//!   extraction call without holding the session lock.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Return values are UTF-8 strings or plain envelopes with stable meaning.
//! - At most one import ticket is pending at a time.

use lesson_plan_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    parse_plan_section, ping as ping_inner, ExtractionError, ExtractionRequest, FieldPath,
    ImportPermit, PlanConfig, PlanSession, SourceContent, SqliteKvStore,
};
use log::{info, warn};
use std::sync::{Mutex, OnceLock};

static PLAN_SESSION: OnceLock<Mutex<PlanSession<SqliteKvStore>>> = OnceLock::new();
static PENDING_IMPORT: Mutex<Option<ImportPermit>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for plan commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// List length after an add/remove call.
    pub count: Option<u32>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl PlanActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            count: None,
            message: message.into(),
        }
    }

    fn with_count(message: impl Into<String>, count: usize) -> Self {
        Self {
            ok: true,
            count: Some(u32::try_from(count).unwrap_or(u32::MAX)),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            count: None,
            message: message.into(),
        }
    }
}

/// Plan snapshot envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSnapshotResponse {
    pub ok: bool,
    /// Camel-case plan JSON; empty on failure.
    pub plan_json: String,
    pub message: String,
}

/// Ticket handed to the host when an import starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanImportTicket {
    pub ok: bool,
    /// Correlation id of the pending import.
    pub request_id: Option<String>,
    /// `text` or the MIME type to send the file as.
    pub source_kind: String,
    /// Instruction text for the extraction service.
    pub instruction: String,
    /// JSON skeleton the reply must follow.
    pub target_shape: String,
    pub message: String,
}

impl PlanImportTicket {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            request_id: None,
            source_kind: String::new(),
            instruction: String::new(),
            target_shape: String::new(),
            message: message.into(),
        }
    }
}

/// Opens the process-wide editing session.
///
/// Input semantics:
/// - `db_path`: SQLite file holding the stored plan; created if missing.
/// - `config_json`: optional partial config object, e.g.
///   `{"storageKey":"teaching-plan-v5","importMinSteps":5}`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Only the first successful call opens a session; later calls fail.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn init_plan_session(db_path: String, config_json: Option<String>) -> PlanActionResponse {
    if PLAN_SESSION.get().is_some() {
        return PlanActionResponse::failure("plan session already initialized");
    }

    let config = match config_json.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => match PlanConfig::from_json(text) {
            Ok(config) => config,
            Err(err) => return PlanActionResponse::failure(format!("init_plan_session failed: {err}")),
        },
        _ => PlanConfig::default(),
    };

    let db_path = db_path.trim();
    if db_path.is_empty() {
        return PlanActionResponse::failure("init_plan_session failed: db_path cannot be empty");
    }
    let store = match SqliteKvStore::open(db_path) {
        Ok(store) => store,
        Err(err) => return PlanActionResponse::failure(format!("init_plan_session failed: {err}")),
    };

    let session = PlanSession::open(store, config);
    match PLAN_SESSION.set(Mutex::new(session)) {
        Ok(()) => {
            info!("event=ffi_session_init module=ffi status=ok");
            PlanActionResponse::success("Plan session ready.")
        }
        Err(_) => PlanActionResponse::failure("plan session already initialized"),
    }
}

/// Returns the current plan as JSON.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_snapshot_json() -> PlanSnapshotResponse {
    let encoded = with_session(|session| {
        serde_json::to_string(session.plan()).map_err(|err| err.to_string())
    })
    .and_then(|result| result);

    match encoded {
        Ok(plan_json) => PlanSnapshotResponse {
            ok: true,
            plan_json,
            message: String::new(),
        },
        Err(err) => PlanSnapshotResponse {
            ok: false,
            plan_json: String::new(),
            message: format!("plan_snapshot_json failed: {err}"),
        },
    }
}

/// Reads one leaf by dotted path, e.g. `steps.0.design`.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Never panics; unresolved paths and a missing session read as `""`.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_get_field(path: String) -> String {
    let path = FieldPath::parse(&path);
    with_session(|session| session.get_field(&path).to_string()).unwrap_or_default()
}

/// Writes one leaf by dotted path and persists the plan.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; unresolved paths leave the plan unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_set_field(path: String, value: String) -> PlanActionResponse {
    let path = FieldPath::parse(&path);
    match with_session(|session| session.set_field(&path, value)) {
        Ok(Ok(())) => PlanActionResponse::success("Field updated."),
        Ok(Err(err)) => PlanActionResponse::failure(format!("plan_set_field failed: {err}")),
        Err(err) => PlanActionResponse::failure(format!("plan_set_field failed: {err}")),
    }
}

/// Appends a blank game.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_add_game() -> PlanActionResponse {
    match with_session(|session| session.add_game()) {
        Ok(count) => PlanActionResponse::with_count("Game added.", count),
        Err(err) => PlanActionResponse::failure(format!("plan_add_game failed: {err}")),
    }
}

/// Removes one game; the last remaining game is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_remove_game(index: u32) -> PlanActionResponse {
    list_removal("plan_remove_game", index, |session, index| {
        (session.remove_game(index), session.plan().games.len())
    })
}

/// Appends a blank teaching step.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_add_step() -> PlanActionResponse {
    match with_session(|session| session.add_step()) {
        Ok(count) => PlanActionResponse::with_count("Step added.", count),
        Err(err) => PlanActionResponse::failure(format!("plan_add_step failed: {err}")),
    }
}

/// Removes one teaching step; the last remaining step is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_remove_step(index: u32) -> PlanActionResponse {
    list_removal("plan_remove_step", index, |session, index| {
        (session.remove_step(index), session.plan().steps.len())
    })
}

/// Resets one section (`basic|objectives|materials|games|steps|connection|feedback`).
#[flutter_rust_bridge::frb(sync)]
pub fn plan_clear_section(section: String) -> PlanActionResponse {
    let section = match parse_plan_section(&section) {
        Ok(section) => section,
        Err(err) => return PlanActionResponse::failure(format!("plan_clear_section failed: {err}")),
    };
    match with_session(|session| session.clear_section(section)) {
        Ok(()) => PlanActionResponse::success(format!("Section {section} cleared.")),
        Err(err) => PlanActionResponse::failure(format!("plan_clear_section failed: {err}")),
    }
}

/// Replaces the whole plan with the default plan.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_reset() -> PlanActionResponse {
    match with_session(|session| session.reset()) {
        Ok(()) => PlanActionResponse::success("Plan reset."),
        Err(err) => PlanActionResponse::failure(format!("plan_reset failed: {err}")),
    }
}

/// Export title for the current plan; empty without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_document_title() -> String {
    with_session(|session| session.document_title()).unwrap_or_default()
}

/// Starts an import for one uploaded file.
///
/// The host sends the file plus `instruction` and `target_shape` to its
/// extraction service, then calls [`plan_import_complete`] with the reply
/// or [`plan_import_fail`] with the failure text.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Fails while another import is pending or for unsupported file types.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_import_begin(file_name: String) -> PlanImportTicket {
    let source = match SourceContent::from_file(&file_name, Vec::new()) {
        Ok(source) => source,
        Err(err) => return PlanImportTicket::failure(format!("plan_import_begin failed: {err}")),
    };

    let mut pending = match PENDING_IMPORT.lock() {
        Ok(pending) => pending,
        Err(_) => return PlanImportTicket::failure("plan_import_begin failed: import slot poisoned"),
    };
    let permit = match with_session(|session| session.begin_import()) {
        Ok(Ok(permit)) => permit,
        Ok(Err(err)) => return PlanImportTicket::failure(format!("plan_import_begin failed: {err}")),
        Err(err) => return PlanImportTicket::failure(format!("plan_import_begin failed: {err}")),
    };

    let request_id = permit.request_id().to_string();
    *pending = Some(permit);
    let request = ExtractionRequest::new(source);
    PlanImportTicket {
        ok: true,
        request_id: Some(request_id),
        source_kind: request.source.kind_label().to_string(),
        instruction: request.instruction,
        target_shape: request.target_shape,
        message: "Import started.".to_string(),
    }
}

/// Completes the pending import with the extraction service's reply.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - On failure the current plan is unchanged and the ticket is released.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_import_complete(payload: String) -> PlanActionResponse {
    finish_pending_import("plan_import_complete", Ok(payload))
}

/// Releases the pending import after the extraction service failed.
///
/// Always reports `ok=false` with the failure text; the plan is unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_import_fail(error_message: String) -> PlanActionResponse {
    finish_pending_import(
        "plan_import_fail",
        Err(ExtractionError::Collaborator(error_message.trim().to_string())),
    )
}

fn finish_pending_import(
    operation: &str,
    outcome: Result<String, ExtractionError>,
) -> PlanActionResponse {
    let permit = match PENDING_IMPORT.lock() {
        Ok(mut pending) => pending.take(),
        Err(_) => return PlanActionResponse::failure(format!("{operation} failed: import slot poisoned")),
    };
    let Some(permit) = permit else {
        warn!("event=ffi_import module=ffi status=rejected error_code=no_pending_import");
        return PlanActionResponse::failure(format!("{operation} failed: no import in progress"));
    };

    match with_session(|session| session.finish_import(permit, outcome)) {
        Ok(Ok(())) => PlanActionResponse::success("Plan imported."),
        Ok(Err(err)) => PlanActionResponse::failure(format!("{operation} failed: {err}")),
        Err(err) => PlanActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn list_removal(
    operation: &str,
    index: u32,
    remove: impl FnOnce(&mut PlanSession<SqliteKvStore>, usize) -> (bool, usize),
) -> PlanActionResponse {
    let index = index as usize;
    match with_session(|session| remove(session, index)) {
        Ok((true, count)) => PlanActionResponse::with_count("Item removed.", count),
        Ok((false, count)) => PlanActionResponse {
            ok: false,
            count: Some(u32::try_from(count).unwrap_or(u32::MAX)),
            message: format!("{operation}: item {index} kept"),
        },
        Err(err) => PlanActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn with_session<T>(f: impl FnOnce(&mut PlanSession<SqliteKvStore>) -> T) -> Result<T, String> {
    let session = PLAN_SESSION
        .get()
        .ok_or_else(|| "plan session not initialized".to_string())?;
    let mut guard = session
        .lock()
        .map_err(|_| "plan session lock poisoned".to_string())?;
    Ok(f(&mut guard))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, init_plan_session, ping, plan_add_game, plan_add_step,
        plan_clear_section, plan_document_title, plan_get_field, plan_import_begin,
        plan_import_complete, plan_import_fail, plan_remove_game, plan_remove_step, plan_reset,
        plan_set_field, plan_snapshot_json,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn clear_section_rejects_unknown_section_id() {
        let response = plan_clear_section("homework".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("unknown plan section"));
    }

    #[test]
    fn import_begin_rejects_unsupported_file_type() {
        let ticket = plan_import_begin("slides.pptx".to_string());
        assert!(!ticket.ok);
        assert!(ticket.request_id.is_none());
    }

    // One test owns the process-wide session so steps cannot interleave.
    #[test]
    fn session_flow_edits_imports_and_resets() {
        let db_path = std::env::temp_dir().join(format!(
            "lesson-plan-ffi-{}-{}.sqlite3",
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time went backwards")
                .as_nanos()
        ));
        let init = init_plan_session(
            db_path.to_string_lossy().into_owned(),
            Some(r#"{"importMinSteps": 3}"#.to_string()),
        );
        assert!(init.ok, "{}", init.message);
        assert!(!init_plan_session(String::new(), None).ok);

        let edit = plan_set_field("basic.unit".to_string(), "7".to_string());
        assert!(edit.ok, "{}", edit.message);
        assert_eq!(plan_get_field("basic.unit".to_string()), "7");
        assert!(!plan_set_field("basic.nope".to_string(), "x".to_string()).ok);
        assert_eq!(plan_get_field("basic.nope".to_string()), "");
        assert!(plan_document_title().contains("U7"));

        assert_eq!(plan_add_game().count, Some(2));
        assert!(plan_remove_game(0).ok);
        let kept = plan_remove_game(0);
        assert!(!kept.ok);
        assert_eq!(kept.count, Some(1));
        assert_eq!(plan_add_step().count, Some(6));
        assert_eq!(plan_remove_step(5).count, Some(5));

        let ticket = plan_import_begin("unit7.pdf".to_string());
        assert!(ticket.ok, "{}", ticket.message);
        assert_eq!(ticket.source_kind, "application/pdf");
        assert!(ticket.target_shape.contains("\"steps\""));
        assert!(!plan_import_begin("other.txt".to_string()).ok);

        let failed = plan_import_fail("quota exceeded".to_string());
        assert!(!failed.ok);
        assert!(failed.message.contains("quota exceeded"));
        assert_eq!(plan_get_field("basic.unit".to_string()), "7");
        assert!(!plan_import_complete("{}".to_string()).ok);

        assert!(plan_import_begin("unit8.txt".to_string()).ok);
        let imported = plan_import_complete(
            "```json\n{\"basic\":{\"unit\":\"8\"},\"games\":[{\"name\":\"Simon Says\"}],\
             \"steps\":[{\"step\":\"Warm up\"}]}\n```"
                .to_string(),
        );
        assert!(imported.ok, "{}", imported.message);
        assert_eq!(plan_get_field("basic.unit".to_string()), "8");
        assert_eq!(plan_get_field("games.0.name".to_string()), "Simon Says");
        assert_eq!(plan_get_field("steps.2.step".to_string()), "");
        let snapshot = plan_snapshot_json();
        assert!(snapshot.ok, "{}", snapshot.message);
        let value: serde_json::Value =
            serde_json::from_str(&snapshot.plan_json).expect("snapshot should be JSON");
        assert_eq!(value["steps"].as_array().map(Vec::len), Some(3));

        assert!(plan_clear_section("games".to_string()).ok);
        assert_eq!(plan_get_field("games.0.name".to_string()), "");

        assert!(plan_reset().ok);
        assert_eq!(plan_get_field("basic.unit".to_string()), "");

        let _ = std::fs::remove_file(db_path);
    }
}
