//! Field paths addressing one leaf of a lesson plan.
//!
//! Dotted text form: `basic.lessonNo`, `objectives.vocab.core`,
//! `steps.2.design`. All-digit segments are list indices.

use crate::model::plan::PlanSection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Parsed path into the plan tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Splits dotted text into segments.
    ///
    /// Parsing never fails; whether the path names a leaf is decided when it
    /// is resolved against a plan.
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .trim()
            .split('.')
            .map(|segment| {
                if !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()) {
                    if let Ok(index) = segment.parse::<usize>() {
                        return PathSegment::Index(index);
                    }
                }
                PathSegment::Field(segment.to_string())
            })
            .collect();
        Self { segments }
    }

    /// Path to a field of a scalar section, e.g. `basic.date`.
    pub fn section_field(section: PlanSection, field: &str) -> Self {
        Self::new(vec![
            PathSegment::Field(section.as_str().to_string()),
            PathSegment::Field(field.to_string()),
        ])
    }

    /// Path to a field of a grouped section, e.g. `feedback.parent.time`.
    pub fn group_field(section: PlanSection, group: &str, field: &str) -> Self {
        Self::new(vec![
            PathSegment::Field(section.as_str().to_string()),
            PathSegment::Field(group.to_string()),
            PathSegment::Field(field.to_string()),
        ])
    }

    /// Path to a field of one list item, e.g. `steps.3.notes`.
    pub fn item(list: PlanSection, index: usize, field: &str) -> Self {
        Self::new(vec![
            PathSegment::Field(list.as_str().to_string()),
            PathSegment::Index(index),
            PathSegment::Field(field.to_string()),
        ])
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Path resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path does not name a leaf of the plan schema (or the list index
    /// is out of range).
    Unresolved { path: String },
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved { path } => write!(f, "path does not resolve to a plan field: `{path}`"),
        }
    }
}

impl Error for PathError {}
