//! Lesson plan domain model.
//!
//! # Responsibility
//! - Define the canonical plan tree and its default factory.
//! - Provide path-addressed copy-on-write updates and list editing.
//!
//! # Invariants
//! - The tree shape is static; only leaf values and list lengths vary.
//! - `games` and `steps` never drop below one item.
//!
//! # See also
//! - crate::reconcile for untrusted JSON intake.

pub mod collection;
pub mod mutation;
pub mod path;
pub mod plan;
pub mod title;
