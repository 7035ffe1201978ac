//! Record model - one tracked item and its optional label

use chrono::NaiveDateTime;
use serde::Serialize;
use crate::{Error, Result};

/// Separator between label tokens in the stored label string
pub const LABEL_DELIMITER: &str = ",";

/// Timestamp layout used for storage and export.
///
/// Fixed-width so lexical order in SQLite matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Accepts any fractional precision, including none
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Labelling state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelState {
    Unlabelled,
    Labelled,
}

impl LabelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelState::Unlabelled => "unlabelled",
            LabelState::Labelled => "labelled",
        }
    }
}

/// One tracked item: a URL or filesystem path plus its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Unique key, immutable once created
    pub identifier: String,
    /// Delimited label tokens; `None` while unlabelled
    pub label: Option<String>,
    /// Set at creation, bumped on every label write (UTC)
    pub last_modified: NaiveDateTime,
}

impl Record {
    pub fn state(&self) -> LabelState {
        if self.label.is_some() {
            LabelState::Labelled
        } else {
            LabelState::Unlabelled
        }
    }

    pub fn is_labelled(&self) -> bool {
        self.state() == LabelState::Labelled
    }

    /// Individual label tokens, empty when unlabelled
    pub fn labels(&self) -> Vec<&str> {
        self.label
            .as_deref()
            .map(split_labels)
            .unwrap_or_default()
    }

    /// Whether the identifier points at a remote resource rather than a local path
    pub fn is_remote(&self) -> bool {
        self.identifier.starts_with("http://") || self.identifier.starts_with("https://")
    }

    pub fn last_modified_string(&self) -> String {
        format_timestamp(&self.last_modified)
    }
}

/// Join label tokens into the stored representation
pub fn join_labels<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(LABEL_DELIMITER)
}

pub fn split_labels(label: &str) -> Vec<&str> {
    label.split(LABEL_DELIMITER).collect()
}

/// Export fields are tab-separated, one record per line
fn breaks_export_line(s: &str) -> bool {
    s.contains(&['\t', '\n', '\r'][..])
}

/// Trim label tokens and drop blank ones.
///
/// Tokens must survive `join_labels`/`split_labels` and the tab-separated
/// export unchanged, so the delimiter, tabs and line breaks are rejected.
pub fn normalize_labels<S: AsRef<str>>(labels: &[S]) -> Result<Vec<String>> {
    let mut tokens = Vec::with_capacity(labels.len());
    for label in labels {
        let token = label.as_ref().trim();
        if token.is_empty() {
            continue;
        }
        if token.contains(LABEL_DELIMITER) || breaks_export_line(token) {
            return Err(Error::InvalidLabel(token.to_string()));
        }
        tokens.push(token.to_string());
    }

    if tokens.is_empty() {
        return Err(Error::EmptyLabels);
    }
    Ok(tokens)
}

pub fn validate_identifier(identifier: &str) -> Result<()> {
    if breaks_export_line(identifier) {
        return Err(Error::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT)
}

/// Current UTC time truncated to the precision we store
pub fn now() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    let formatted = format_timestamp(&now);
    parse_timestamp(&formatted).unwrap_or(now)
}
