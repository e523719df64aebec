//! Ration-card status portal adapter.
//!
//! The portal renders one free-text result line mixing the issuing office
//! (Hindi), two long numeric identifiers, an alphanumeric user id and a
//! parenthesized status phrase. Scan strategies, in order: lines anchored by
//! the authority marker, then any line carrying a long numeric token, then a
//! whole-page check for "no record" phrasing.

use super::{Extraction, PortalAdapter};
use janseva_core::{Error, Outcome, PageContent, RecordShape, Result};
use janseva_extract::{
    assemble, classify, line_is_classifiable, status_fallback, ClassifyConfig, FieldMap,
};

pub const RATION_SHAPE: RecordShape = RecordShape {
    portal: "ration-card",
    columns: &[
        "Ration Card Number",
        "Office Name",
        "Form Number",
        "Token Number",
        "User ID",
        "Status",
    ],
    default_marker: "N/A",
    not_found_marker: "N/A",
    error_marker: "FETCH ERROR",
    identifier_column: Some(0),
    status_column: Some(5),
};

const FIELD_MAP: FieldMap = FieldMap {
    office: Some(1),
    primary: Some(2),
    secondary: Some(3),
    user_id: Some(4),
    status: Some(5),
};

/// Table blocks that are portal contact boilerplate, not result data.
fn is_contact_block(block: &str) -> bool {
    block.contains("Contact No") || block.contains("Email") || block.contains("Address")
}

fn has_long_numeric(line: &str) -> bool {
    line.split_whitespace()
        .any(|w| w.len() >= 8 && w.chars().all(|c| c.is_ascii_digit()))
}

pub struct RationCardAdapter {
    classify: ClassifyConfig,
}

impl RationCardAdapter {
    pub fn new() -> Self {
        Self {
            classify: ClassifyConfig::default(),
        }
    }

    fn extract_line(&self, identifier: &str, line: &str, strategy: &'static str) -> Extraction {
        let tokens = classify(&self.classify, line);
        let mut record = assemble(&RATION_SHAPE, &FIELD_MAP, identifier, &tokens);
        // Second chance for a status phrase the token scan missed.
        if record.fields[5] == RATION_SHAPE.default_marker {
            if let Some(status) = status_fallback(&self.classify, line) {
                record.fields[5] = status;
                record.outcome = Outcome::Success;
            }
        }
        Extraction { record, strategy }
    }
}

impl Default for RationCardAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalAdapter for RationCardAdapter {
    fn shape(&self) -> &RecordShape {
        &RATION_SHAPE
    }

    fn parse(&self, identifier: &str, content: &PageContent) -> Result<Extraction> {
        let blocks = match content {
            PageContent::Text(blocks) => blocks,
            PageContent::Structured(_) => {
                return Err(Error::Parse("expected page text, got structured payload".into()))
            }
        };

        // Strategy 1: lines anchored by the authority marker.
        for block in blocks {
            if is_contact_block(block) {
                continue;
            }
            for line in block.lines() {
                if line_is_classifiable(&self.classify, line) {
                    let ext = self.extract_line(identifier, line, "table-scan");
                    if ext.record.outcome == Outcome::Success {
                        return Ok(ext);
                    }
                }
            }
        }

        // Strategy 2: unanchored lines that still carry a long numeric token.
        for block in blocks {
            if is_contact_block(block) {
                continue;
            }
            for line in block.lines() {
                if has_long_numeric(line) {
                    let ext = self.extract_line(identifier, line, "keyword-scan");
                    if ext.record.outcome == Outcome::Success {
                        return Ok(ext);
                    }
                }
            }
        }

        // Strategy 3: whole-page dump.
        let page = blocks.join("\n").to_lowercase();
        if ["no record", "not found", "no data"]
            .iter()
            .any(|p| page.contains(p))
        {
            return Err(Error::NoData("portal reported no matching ration card".into()));
        }
        if page.chars().count() < 200 {
            // A near-empty page usually means the portal errored silently.
            return Err(Error::Parse("minimal response from portal".into()));
        }
        Err(Error::Parse("no classifiable content".into()))
    }
}
