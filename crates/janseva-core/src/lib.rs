use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("form rejected: {0}")]
    Form(String),
    #[error("no matching record: {0}")]
    NoData(String),
    #[error("unparsable response: {0}")]
    Parse(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Only transport-level failures (network, timeout, unexpected modal) are
    /// worth another round trip. Everything else is terminal for its identifier.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Raw content a portal session hands back for one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PageContent {
    /// Unstructured page or table text, one block per source element, in scan
    /// order (data tables first, full page body last).
    Text(Vec<String>),
    /// Machine-readable payload (a parsed JSON mapping).
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl PageContent {
    pub fn blocks(&self) -> &[String] {
        match self {
            PageContent::Text(blocks) => blocks,
            PageContent::Structured(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// At least one field carries a non-default value.
    Success,
    /// The portal answered but nothing classifiable was found. Not retried.
    SoftFailure,
    /// Retries exhausted (or the form rejected the identifier outright).
    HardFailure,
}

/// Fixed column layout of one portal's output row.
///
/// `width()` is a hard contract: every record emitted for this shape has
/// exactly that many fields, and no field is ever the empty string.
#[derive(Debug, Clone)]
pub struct RecordShape {
    pub portal: &'static str,
    pub columns: &'static [&'static str],
    /// Fill for a field no token contributed to.
    pub default_marker: &'static str,
    /// Fill for a "portal answered, record does not exist" row.
    pub not_found_marker: &'static str,
    /// Fill for a row whose retries were exhausted.
    pub error_marker: &'static str,
    /// Column that receives the identifier verbatim, when the row carries it.
    pub identifier_column: Option<usize>,
    /// Column that receives the status phrase or failure label.
    pub status_column: Option<usize>,
}

impl RecordShape {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// A full-width row with every data field set to `marker`.
    pub fn filled(&self, identifier: &str, marker: &str) -> Vec<String> {
        let mut fields = vec![marker.to_string(); self.width()];
        if let Some(col) = self.identifier_column {
            fields[col] = identifier.to_string();
        }
        fields
    }
}

/// The final structured result for one identifier: a fixed-width row plus the
/// outcome the orchestrator decided on. The row is what gets persisted; the
/// outcome only drives logging and batch accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub identifier: String,
    pub fields: Vec<String>,
    pub outcome: Outcome,
}

impl OutputRecord {
    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

/// One fetch+parse cycle, consumed by the orchestrator to decide continuation.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    /// 1-based attempt counter.
    pub index: u32,
    /// Which scan strategy produced the result ("table-scan", "keyword-scan", ...).
    pub strategy: &'static str,
    pub outcome: Outcome,
}

/// A portal session (browser or HTTP client) reduced to its narrow interface.
#[async_trait::async_trait]
pub trait PageProvider: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<PageContent>;
}

/// The spreadsheet-backed row store, reduced to its narrow interface.
///
/// `sheet` names one worksheet / file within the store. Rows are 1-based and
/// row 1 is the header, matching the upstream sheet layout.
pub trait RowStore {
    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>>;
    fn write_row(&mut self, sheet: &str, row: usize, fields: &[String]) -> Result<()>;
    fn append_row(&mut self, sheet: &str, fields: &[String]) -> Result<()>;
    /// Identifiers already persisted, used for resumable skip-logic.
    fn read_existing(&self, sheet: &str) -> Result<BTreeSet<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: RecordShape = RecordShape {
        portal: "test",
        columns: &["Id", "A", "B", "Status"],
        default_marker: "N/A",
        not_found_marker: "N/A",
        error_marker: "ERROR",
        identifier_column: Some(0),
        status_column: Some(3),
    };

    #[test]
    fn filled_row_has_exact_width_and_identifier() {
        let fields = SHAPE.filled("X123", "N/A");
        assert_eq!(fields.len(), SHAPE.width());
        assert_eq!(fields[0], "X123");
        assert!(fields.iter().all(|f| !f.is_empty()));
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(Error::Transport("timeout".into()).is_retryable());
        assert!(!Error::Form("validation alert".into()).is_retryable());
        assert!(!Error::NoData("no record".into()).is_retryable());
        assert!(!Error::Parse("no pattern matched".into()).is_retryable());
    }

    #[test]
    fn structured_content_has_no_text_blocks() {
        let content = PageContent::Structured(serde_json::Map::new());
        assert!(content.blocks().is_empty());
    }
}
