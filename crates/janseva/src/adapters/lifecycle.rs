//! Service-lifecycle portal adapter (receipt tracking).
//!
//! Two extractions per page: the service name (free text near the search
//! result, recovered through the cleaner) and the most recent lifecycle table
//! row (six cells). Lifecycle strategies, in order: tab-delimited table rows,
//! keyword-bearing lines, then a whole-page keyword check.

use super::{Extraction, PortalAdapter};
use janseva_core::{Error, Outcome, OutputRecord, PageContent, RecordShape, Result};
use janseva_extract::{clean, CleanConfig};

pub const LIFECYCLE_SHAPE: RecordShape = RecordShape {
    portal: "service-lifecycle",
    columns: &[
        "Service Name",
        "Date",
        "Time",
        "Status",
        "Officer",
        "Location",
        "Remarks",
    ],
    default_marker: "NO DATA AVAILABLE",
    not_found_marker: "RECEIPT NOT FOUND",
    error_marker: "PROCESSING ERROR",
    identifier_column: None,
    status_column: Some(3),
};

const LIFECYCLE_CELLS: usize = 6;
const SERVICE_NOT_FOUND: &str = "SERVICE NAME NOT FOUND";
const DATA_KEYWORDS: &[&str] = &["date", "time", "status", "officer", "location", "remark"];

pub struct LifecycleAdapter {
    clean: CleanConfig,
}

impl LifecycleAdapter {
    pub fn new() -> Self {
        Self {
            clean: CleanConfig::default(),
        }
    }

    fn service_name(&self, blocks: &[String]) -> Option<String> {
        blocks
            .iter()
            .flat_map(|b| b.lines())
            // Tab-delimited lines are lifecycle rows, never service labels.
            .filter(|line| !line.contains('\t'))
            .find_map(|line| clean(&self.clean, line))
    }

    /// Last qualifying table row wins: lifecycle tables list stages oldest
    /// first and the most recent stage is the one worth persisting.
    fn table_scan(blocks: &[String]) -> Option<Vec<String>> {
        let mut last: Option<Vec<String>> = None;
        for line in blocks.iter().flat_map(|b| b.lines()) {
            if !line.contains('\t') {
                continue;
            }
            let row: Vec<String> = line
                .split('\t')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if row.len() >= 3 {
                last = Some(row);
            }
        }
        last
    }

    fn keyword_scan(blocks: &[String]) -> Option<Vec<String>> {
        let mut found = Vec::new();
        for line in blocks.iter().flat_map(|b| b.lines()) {
            let lower = line.to_lowercase();
            if line.trim().chars().count() > 5
                && DATA_KEYWORDS.iter().any(|k| lower.contains(k))
            {
                found.push(line.trim().to_string());
                if found.len() == LIFECYCLE_CELLS {
                    break;
                }
            }
        }
        (!found.is_empty()).then_some(found)
    }
}

impl Default for LifecycleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalAdapter for LifecycleAdapter {
    fn shape(&self) -> &RecordShape {
        &LIFECYCLE_SHAPE
    }

    fn parse(&self, identifier: &str, content: &PageContent) -> Result<Extraction> {
        let blocks = match content {
            PageContent::Text(blocks) => blocks,
            PageContent::Structured(_) => {
                return Err(Error::Parse("expected page text, got structured payload".into()))
            }
        };

        let service = self.service_name(blocks);

        let mut strategy = "table-scan";
        let mut cells = Self::table_scan(blocks);
        if cells.is_none() {
            strategy = "keyword-scan";
            cells = Self::keyword_scan(blocks);
        }
        if cells.is_none() {
            strategy = "page-dump";
            let page = blocks.join("\n").to_lowercase();
            // Success phrasing wins over not-found phrasing when both occur.
            if page.contains("success") || page.contains("completed") {
                cells = Some(vec!["DATA FOUND BUT NOT STRUCTURED".to_string(); LIFECYCLE_CELLS]);
            } else if page.contains("not found") || page.contains("invalid") {
                return Err(Error::NoData("portal reported receipt not found".into()));
            }
        }

        if service.is_none() && cells.is_none() {
            return Err(Error::Parse("no classifiable content".into()));
        }

        let mut fields = vec![LIFECYCLE_SHAPE.default_marker.to_string(); LIFECYCLE_SHAPE.width()];
        fields[0] = service.unwrap_or_else(|| SERVICE_NOT_FOUND.to_string());
        if let Some(mut cells) = cells {
            cells.truncate(LIFECYCLE_CELLS);
            for (i, cell) in cells.into_iter().enumerate() {
                fields[1 + i] = cell;
            }
        }

        Ok(Extraction {
            record: OutputRecord {
                identifier: identifier.to_string(),
                fields,
                outcome: Outcome::Success,
            },
            strategy,
        })
    }

    fn not_found_record(&self, identifier: &str) -> OutputRecord {
        OutputRecord {
            identifier: identifier.to_string(),
            fields: vec![LIFECYCLE_SHAPE.not_found_marker.to_string(); LIFECYCLE_SHAPE.width()],
            outcome: Outcome::SoftFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(blocks: &[&str]) -> PageContent {
        PageContent::Text(blocks.iter().map(|b| b.to_string()).collect())
    }

    #[test]
    fn service_name_plus_last_table_row() {
        let adapter = LifecycleAdapter::new();
        let content = text(&[
            "Service : Caste Certificate Application - View More",
            "01/02/2024\t10:15\tSubmitted\tClerk\tJaipur\t-\n\
             05/02/2024\t16:40\tApproved\tOfficer\tJaipur\tdone",
        ]);
        let ext = adapter.parse("R-100", &content).unwrap();
        assert_eq!(ext.strategy, "table-scan");
        assert_eq!(ext.record.fields.len(), 7);
        assert_eq!(ext.record.fields[0], "Caste Certificate Application");
        assert_eq!(ext.record.fields[1], "05/02/2024");
        assert_eq!(ext.record.fields[3], "Approved");
        assert_eq!(ext.record.outcome, Outcome::Success);
    }

    #[test]
    fn short_table_rows_are_padded_with_the_marker() {
        let adapter = LifecycleAdapter::new();
        let content = text(&["x", "05/02/2024\tApproved\tJaipur"]);
        let ext = adapter.parse("R-101", &content).unwrap();
        assert_eq!(ext.record.fields[3], "Jaipur");
        assert_eq!(ext.record.fields[4], "NO DATA AVAILABLE");
        assert_eq!(ext.record.fields[0], SERVICE_NOT_FOUND);
    }

    #[test]
    fn keyword_scan_runs_when_no_table_rows_exist() {
        let adapter = LifecycleAdapter::new();
        let content = text(&["Status: Under Review by District Officer"]);
        let ext = adapter.parse("R-102", &content).unwrap();
        assert_eq!(ext.strategy, "keyword-scan");
        assert_eq!(
            ext.record.fields[1],
            "Status: Under Review by District Officer"
        );
    }

    #[test]
    fn not_found_phrasing_maps_to_no_data() {
        let adapter = LifecycleAdapter::new();
        let err = adapter
            .parse("R-103", &text(&["Receipt not found in records"]))
            .unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn invalid_receipt_page_is_no_data() {
        let adapter = LifecycleAdapter::new();
        let err = adapter
            .parse("R-104", &text(&["Invalid receipt, try again"]))
            .unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn unstructured_success_page_gets_the_unstructured_marker() {
        let adapter = LifecycleAdapter::new();
        let content = text(&["Your request was processed with great SUCCESS today"]);
        let ext = adapter.parse("R-105", &content).unwrap();
        assert_eq!(ext.strategy, "page-dump");
        assert!(ext
            .record
            .fields[1..]
            .iter()
            .all(|c| c == "DATA FOUND BUT NOT STRUCTURED"));
    }

    #[test]
    fn success_phrasing_wins_over_not_found_phrasing() {
        let adapter = LifecycleAdapter::new();
        let content = text(&["Request completed. Earlier receipt not found in archive"]);
        let ext = adapter.parse("R-107", &content).unwrap();
        assert_eq!(ext.strategy, "page-dump");
        assert_eq!(ext.record.fields[1], "DATA FOUND BUT NOT STRUCTURED");
    }

    #[test]
    fn blank_page_is_a_parse_failure() {
        let adapter = LifecycleAdapter::new();
        let err = adapter.parse("R-106", &text(&["zz"])).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
