//! Response match conditions
//!
//! A [`Condition`] selects responses by status code and/or body substring.
//! Each condition gets one [`ConditionResult`] per run that collects the
//! bodies of every matching response, in arrival order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::transport::HttpResponse;

/// Match rule for capturing responses into a dedicated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Accepted status codes (any). Empty or absent means any status.
    #[serde(default)]
    pub status_codes: Option<Vec<u16>>,
    /// Body substrings (any). Empty or absent means any body.
    #[serde(default)]
    pub messages: Option<Vec<String>>,
    /// File that receives matching bodies
    pub output_file: PathBuf,
}

impl Condition {
    /// Condition with no constraints, matching every response
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            status_codes: None,
            messages: None,
            output_file: output_file.into(),
        }
    }

    /// Restrict to these status codes
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_codes = Some(codes.into_iter().collect());
        self
    }

    /// Restrict to bodies containing one of these substrings
    pub fn with_messages<S: Into<String>>(mut self, messages: impl IntoIterator<Item = S>) -> Self {
        self.messages = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    /// Evaluate both clauses; each clause is vacuously true when empty
    pub fn matches(&self, response: &HttpResponse) -> bool {
        let status_ok = match self.status_codes.as_deref() {
            Some(codes) if !codes.is_empty() => codes.contains(&response.status),
            _ => true,
        };

        let message_ok = match self.messages.as_deref() {
            Some(messages) if !messages.is_empty() => messages
                .iter()
                .any(|message| response.body.contains(message.as_str())),
            _ => true,
        };

        status_ok && message_ok
    }
}

/// Bodies captured by one condition during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionResult {
    condition: Condition,
    matched_bodies: Vec<String>,
}

impl ConditionResult {
    /// Empty result for a condition
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            matched_bodies: Vec::new(),
        }
    }

    /// The condition being evaluated
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Matched bodies, in arrival order
    pub fn matched_bodies(&self) -> &[String] {
        &self.matched_bodies
    }

    /// Destination file
    pub fn output_file(&self) -> &Path {
        &self.condition.output_file
    }

    /// Whether anything has matched yet
    pub fn has_matches(&self) -> bool {
        !self.matched_bodies.is_empty()
    }
}

/// Evaluate `result`'s condition against `response` and record the body on a match.
///
/// No deduplication: the same body is appended every time it matches.
pub fn evaluate(result: &mut ConditionResult, response: &HttpResponse) -> bool {
    let matched = result.condition.matches(response);
    if matched {
        result.matched_bodies.push(response.body.clone());
    }
    matched
}
