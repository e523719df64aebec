//! Portal adapters: one per government portal, each owning its fixed column
//! layout, its marker vocabulary, and the scan strategies that recover fields
//! from that portal's content.

pub mod beneficiary;
pub mod lifecycle;
pub mod ration;

use janseva_core::{Error, Outcome, OutputRecord, PageContent, RecordShape, Result};

/// A parsed result plus which scan strategy produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: OutputRecord,
    pub strategy: &'static str,
}

pub trait PortalAdapter: Send + Sync {
    fn shape(&self) -> &RecordShape;

    /// Heuristic parse of one fetch's content.
    ///
    /// `Err(NoData)` and `Err(Parse)` are terminal for the identifier; the
    /// orchestrator folds them into marker rows via [`failure_record`].
    ///
    /// [`failure_record`]: PortalAdapter::failure_record
    fn parse(&self, identifier: &str, content: &PageContent) -> Result<Extraction>;

    /// Input-cell validation; `None` drops the cell before processing.
    fn validate_identifier(&self, raw: &str) -> Option<String> {
        let id = raw.trim();
        if id.is_empty() || id.eq_ignore_ascii_case("nan") || id.eq_ignore_ascii_case("none") {
            return None;
        }
        Some(id.to_string())
    }

    /// Fold a terminal error into a full-width marker row. Never empty fields;
    /// downstream must be able to tell "not fetched" from "empty".
    fn failure_record(&self, identifier: &str, error: &Error) -> OutputRecord {
        match error {
            Error::NoData(_) => self.not_found_record(identifier),
            Error::Parse(_) => self.soft_failure_record(identifier),
            _ => self.hard_failure_record(identifier, error),
        }
    }

    fn not_found_record(&self, identifier: &str) -> OutputRecord {
        let shape = self.shape();
        let mut fields = shape.filled(identifier, shape.not_found_marker);
        if let Some(col) = shape.status_column {
            fields[col] = "NoDataFound".to_string();
        }
        OutputRecord {
            identifier: identifier.to_string(),
            fields,
            outcome: Outcome::SoftFailure,
        }
    }

    fn soft_failure_record(&self, identifier: &str) -> OutputRecord {
        let shape = self.shape();
        OutputRecord {
            identifier: identifier.to_string(),
            fields: shape.filled(identifier, shape.default_marker),
            outcome: Outcome::SoftFailure,
        }
    }

    fn hard_failure_record(&self, identifier: &str, _error: &Error) -> OutputRecord {
        let shape = self.shape();
        OutputRecord {
            identifier: identifier.to_string(),
            fields: shape.filled(identifier, shape.error_marker),
            outcome: Outcome::HardFailure,
        }
    }
}
