//! Flutter bridge for the lesson plan editor core.

pub mod api;
