//! Shared data models for defects, emitted issues and pass results.

pub mod defect;

use crate::rules::RuleKey;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A file of the scanned source tree.
pub struct LocalFile {
    pub path: PathBuf,
    /// Detected language key (`c`, `cpp`, `java`...). `None` when the
    /// extension is not recognised.
    pub language: Option<String>,
    pub lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPointer {
    pub line: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start: TextPointer,
    pub end: TextPointer,
}

impl TextRange {
    /// Zero-width range at the start of `line`.
    pub fn at_line(line: u32) -> Self {
        let p = TextPointer { line, offset: 0 };
        TextRange { start: p, end: p }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One issue the host platform should create.
pub struct IssueRequest {
    pub cid: i64,
    pub file: PathBuf,
    pub line: u32,
    pub range: TextRange,
    pub rule: RuleKey,
    /// Severity the profile assigns to `rule`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Outstanding defect counts for one pass.
pub struct Counters {
    pub total: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Values handed to the metrics collaborator after a pass.
pub struct Measures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub service_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    pub outstanding: u32,
    pub high_impact: u32,
    pub medium_impact: u32,
    pub low_impact: u32,
    /// Sum of line counts over every file touched during the pass.
    pub lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Result of a completed pass.
pub struct PassReport {
    pub issues: Vec<IssueRequest>,
    pub counters: Counters,
    pub measures: Measures,
}
