//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model, reconciliation and persistence into session APIs.
//! - Keep FFI callers decoupled from storage details.

pub mod plan_service;
