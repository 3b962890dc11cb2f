//! Extraction collaborator contract and import gate.
//!
//! # Responsibility
//! - Describe what is sent to an external content-extraction service.
//! - Turn its raw reply into a JSON value, or an extraction failure.
//! - Allow at most one extraction in flight per session.
//!
//! # Invariants
//! - The collaborator's output is untrusted; shape repair happens in
//!   `reconcile`, never here.
//! - A permit holds the in-flight slot until it is dropped.
//!
//! # See also
//! - crate::service::plan_service for the import flow.

use crate::model::collection::ItemList;
use crate::model::plan::{LessonPlan, Step};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```\s*$").expect("valid fence regex")
});

const DEFAULT_INSTRUCTION: &str = "Read the attached teaching material and fill in the lesson \
plan. Reply with exactly one JSON object that follows the target shape. Every value is a \
string; use an empty string when the source does not say. Add one array item per game and per \
teaching step found in the source. Do not add fields that are not in the target shape.";

/// Raw source handed to the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// Plain text, already extracted from its container.
    Text(String),
    /// Binary document or image with its MIME type.
    Binary { bytes: Vec<u8>, mime_type: String },
}

impl SourceContent {
    /// Classifies an uploaded file by extension.
    ///
    /// # Errors
    /// - `ExtractionError::UnsupportedSource` for extensions with no known
    ///   text or MIME mapping.
    pub fn from_file(file_name: &str, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let extension = Path::new(file_name.trim())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mime_type = match extension.as_str() {
            "txt" | "md" => {
                return Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned()));
            }
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            _ => {
                return Err(ExtractionError::UnsupportedSource {
                    file_name: file_name.to_string(),
                });
            }
        };

        Ok(Self::Binary {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    /// Source kind label for logs (`text` or the MIME type).
    pub fn kind_label(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Binary { mime_type, .. } => mime_type.as_str(),
        }
    }

    /// Payload size in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary { bytes, .. } => bytes.len(),
        }
    }
}

/// Request envelope for one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub source: SourceContent,
    /// Natural-language instruction for the collaborator.
    pub instruction: String,
    /// JSON skeleton of the expected reply.
    pub target_shape: String,
}

impl ExtractionRequest {
    /// Builds a request with the default instruction and target shape.
    pub fn new(source: SourceContent) -> Self {
        Self {
            source,
            instruction: DEFAULT_INSTRUCTION.to_string(),
            target_shape: target_shape_description(),
        }
    }
}

/// Pretty JSON skeleton of a plan with one item per list.
pub fn target_shape_description() -> String {
    let mut shape = LessonPlan::default_plan();
    shape.steps = ItemList::padded(vec![Step::blank()], 1, Step::blank);
    serde_json::to_string_pretty(&shape).unwrap_or_default()
}

/// External content-extraction service.
///
/// Returns the raw reply text; parsing happens in
/// [`parse_extraction_payload`].
pub trait Extractor {
    fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError>;
}

impl<F> Extractor for F
where
    F: Fn(&ExtractionRequest) -> Result<String, ExtractionError>,
{
    fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        self(request)
    }
}

/// Parses a collaborator reply into JSON.
///
/// A reply wrapped in one Markdown code fence is unwrapped first.
///
/// # Errors
/// - `ExtractionError::MalformedPayload` when the text is not valid JSON.
pub fn parse_extraction_payload(text: &str) -> Result<Value, ExtractionError> {
    let body = match CODE_FENCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    };
    serde_json::from_str(body).map_err(ExtractionError::MalformedPayload)
}

/// Extraction and import failures surfaced to the host.
#[derive(Debug)]
pub enum ExtractionError {
    /// Another extraction is still in flight.
    Busy,
    /// The permit was issued by a different session.
    ForeignPermit,
    /// The file type cannot be sent to the collaborator.
    UnsupportedSource { file_name: String },
    /// The collaborator was unreachable or reported an error.
    Collaborator(String),
    /// The reply was not valid JSON.
    MalformedPayload(serde_json::Error),
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "an extraction is already in progress"),
            Self::ForeignPermit => write!(f, "import permit does not belong to this session"),
            Self::UnsupportedSource { file_name } => {
                write!(f, "unsupported source file type: {file_name}")
            }
            Self::Collaborator(message) => write!(f, "extraction service failed: {message}"),
            Self::MalformedPayload(err) => write!(f, "extraction reply is not valid JSON: {err}"),
        }
    }
}

impl Error for ExtractionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedPayload(err) => Some(err),
            _ => None,
        }
    }
}

impl ExtractionError {
    /// Stable machine-readable code for logs and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Busy => "import_busy",
            Self::ForeignPermit => "import_foreign_permit",
            Self::UnsupportedSource { .. } => "unsupported_source",
            Self::Collaborator(_) => "extraction_failed",
            Self::MalformedPayload(_) => "malformed_payload",
        }
    }
}

/// Single-slot in-flight flag for extraction calls.
#[derive(Debug, Clone, Default)]
pub struct ImportGate {
    in_flight: Arc<AtomicBool>,
}

impl ImportGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot.
    ///
    /// # Errors
    /// - `ExtractionError::Busy` while another permit is alive.
    pub fn try_acquire(&self) -> Result<ImportPermit, ExtractionError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExtractionError::Busy)?;
        Ok(ImportPermit {
            slot: Arc::clone(&self.in_flight),
            request_id: Uuid::new_v4(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof of holding the extraction slot; releases it on drop.
#[derive(Debug)]
pub struct ImportPermit {
    slot: Arc<AtomicBool>,
    request_id: Uuid,
}

impl ImportPermit {
    /// Correlation id for log lines of this import.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub(crate) fn is_from(&self, gate: &ImportGate) -> bool {
        Arc::ptr_eq(&self.slot, &gate.in_flight)
    }
}

impl Drop for ImportPermit {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}
