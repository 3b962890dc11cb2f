//! Persistence adapter for plan documents.
//!
//! # Responsibility
//! - Define the key-value byte store contract used by the editing session.
//! - Encode/decode plans to and from their stored byte form.
//!
//! # Invariants
//! - Each save carries the full plan; last write wins.
//! - Stored bytes are decoded through `reconcile`, never trusted as-is.

pub mod kv_repo;
pub mod plan_codec;
