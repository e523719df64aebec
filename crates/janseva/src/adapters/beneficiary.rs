//! Welfare-beneficiary portal adapter.
//!
//! Unlike the text portals, this one answers with a machine-readable payload:
//! a JSON mapping whose `Labour` list carries one record keyed by bilingual
//! labels (several with trailing spaces, preserved verbatim; they are part of
//! the portal's contract). Fields map 1:1 onto the 18-column row; no token
//! heuristics are involved.

use super::{Extraction, PortalAdapter};
use janseva_core::{Error, Outcome, OutputRecord, PageContent, RecordShape, Result};
use janseva_extract::assemble_structured;

pub const BENEFICIARY_SHAPE: RecordShape = RecordShape {
    portal: "beneficiary",
    columns: &[
        "Aadhaar Number",
        "Name",
        "Father Name",
        "Address",
        "Gender",
        "Authority",
        "Renewal Date",
        "Registration Fees",
        "Application Status",
        "Application Number",
        "Card Issued Date",
        "Benefit Name",
        "Amount",
        "Bank Name",
        "Debit Date",
        "Apply Date",
        "Fetch Status",
        "Error Message",
    ],
    default_marker: "N/A",
    not_found_marker: "N/A",
    error_marker: "N/A",
    identifier_column: Some(0),
    status_column: Some(16),
};

const FETCH_STATUS: usize = 16;
const ERROR_MESSAGE: usize = 17;

/// Payload keys as the portal emits them, column-for-column.
const KEY_MAP: &[(&str, usize)] = &[
    ("व्यक्ति / लाभार्थी का नाम / Beneficiary Name", 1),
    ("व्यक्ति / लाभार्थी के पिता का नाम / Beneficiary Father Name ", 2),
    ("व्यक्ति / लाभार्थी का पता / Address", 3),
    ("लिंग / Gender", 4),
    ("संबंधित प्राधिकरण / Concerned Union/Authority/Person", 5),
    ("वैधता दिनांक / Renewal Due Date", 6),
    ("आवेदन का शुल्क / Registration Fees ", 7),
    ("आवेदन की स्थिति / Application Status ", 8),
    ("आवेदन क्रमांक / Application Number ", 9),
    ("कार्ड जारी करने की दिनांक / Card Issued Date ", 10),
];

pub struct BeneficiaryAdapter;

impl BeneficiaryAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BeneficiaryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalAdapter for BeneficiaryAdapter {
    fn shape(&self) -> &RecordShape {
        &BENEFICIARY_SHAPE
    }

    fn parse(&self, identifier: &str, content: &PageContent) -> Result<Extraction> {
        let payload = match content {
            PageContent::Structured(map) => map,
            PageContent::Text(_) => {
                return Err(Error::Parse("expected structured payload, got page text".into()))
            }
        };

        let labour = payload
            .get("Labour")
            .and_then(|v| v.as_array())
            .and_then(|list| list.first())
            .and_then(|v| v.as_object())
            .ok_or_else(|| Error::NoData("no beneficiary data found".into()))?;

        let mut record = assemble_structured(&BENEFICIARY_SHAPE, KEY_MAP, identifier, labour);
        // A record without a name is the portal's way of saying "nothing here".
        if record.fields[1] == BENEFICIARY_SHAPE.default_marker {
            return Err(Error::NoData("no beneficiary data found".into()));
        }
        record.fields[FETCH_STATUS] = "Success".to_string();
        record.outcome = Outcome::Success;
        Ok(Extraction {
            record,
            strategy: "structured",
        })
    }

    /// Beneficiary identifiers are Aadhaar numbers: exactly 12 digits.
    fn validate_identifier(&self, raw: &str) -> Option<String> {
        let id = raw.trim();
        (id.len() == 12 && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
    }

    fn not_found_record(&self, identifier: &str) -> OutputRecord {
        let mut fields = BENEFICIARY_SHAPE.filled(identifier, BENEFICIARY_SHAPE.not_found_marker);
        fields[FETCH_STATUS] = "Failed".to_string();
        fields[ERROR_MESSAGE] = "No beneficiary data found".to_string();
        OutputRecord {
            identifier: identifier.to_string(),
            fields,
            outcome: Outcome::SoftFailure,
        }
    }

    fn soft_failure_record(&self, identifier: &str) -> OutputRecord {
        let mut fields = BENEFICIARY_SHAPE.filled(identifier, BENEFICIARY_SHAPE.default_marker);
        fields[FETCH_STATUS] = "Failed".to_string();
        fields[ERROR_MESSAGE] = "Unparsable portal response".to_string();
        OutputRecord {
            identifier: identifier.to_string(),
            fields,
            outcome: Outcome::SoftFailure,
        }
    }

    fn hard_failure_record(&self, identifier: &str, error: &Error) -> OutputRecord {
        let mut fields = BENEFICIARY_SHAPE.filled(identifier, BENEFICIARY_SHAPE.error_marker);
        fields[FETCH_STATUS] = "Failed".to_string();
        fields[ERROR_MESSAGE] = error.to_string();
        OutputRecord {
            identifier: identifier.to_string(),
            fields,
            outcome: Outcome::HardFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_with_labour(labour: serde_json::Value) -> PageContent {
        let map = serde_json::json!({ "Labour": labour })
            .as_object()
            .cloned()
            .unwrap();
        PageContent::Structured(map)
    }

    #[test]
    fn maps_labour_keys_onto_the_18_column_row() {
        let adapter = BeneficiaryAdapter::new();
        let content = payload_with_labour(serde_json::json!([{
            "व्यक्ति / लाभार्थी का नाम / Beneficiary Name": "Ramesh Kumar",
            "लिंग / Gender": "Male",
            "आवेदन क्रमांक / Application Number ": " 2023/12345 ",
        }]));
        let ext = adapter.parse("123456789012", &content).unwrap();
        assert_eq!(ext.record.fields.len(), 18);
        assert_eq!(ext.record.fields[0], "123456789012");
        assert_eq!(ext.record.fields[1], "Ramesh Kumar");
        assert_eq!(ext.record.fields[4], "Male");
        assert_eq!(ext.record.fields[9], "2023/12345");
        assert_eq!(ext.record.fields[11], "N/A"); // benefit name never served
        assert_eq!(ext.record.fields[16], "Success");
        assert_eq!(ext.record.outcome, Outcome::Success);
    }

    #[test]
    fn empty_labour_list_is_no_data() {
        let adapter = BeneficiaryAdapter::new();
        let err = adapter
            .parse("123456789012", &payload_with_labour(serde_json::json!([])))
            .unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn nameless_record_is_no_data() {
        let adapter = BeneficiaryAdapter::new();
        let content = payload_with_labour(serde_json::json!([{ "लिंग / Gender": "Male" }]));
        let err = adapter.parse("123456789012", &content).unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn aadhaar_validation_requires_exactly_12_digits() {
        let adapter = BeneficiaryAdapter::new();
        assert_eq!(
            adapter.validate_identifier(" 123456789012 ").as_deref(),
            Some("123456789012")
        );
        assert_eq!(adapter.validate_identifier("12345678901"), None);
        assert_eq!(adapter.validate_identifier("12345678901a"), None);
    }

    #[test]
    fn hard_failure_row_carries_the_error_message() {
        let adapter = BeneficiaryAdapter::new();
        let rec =
            adapter.hard_failure_record("123456789012", &Error::Transport("HTTP 503".into()));
        assert_eq!(rec.fields.len(), 18);
        assert_eq!(rec.fields[16], "Failed");
        assert_eq!(rec.fields[17], "transport error: HTTP 503");
        assert_eq!(rec.outcome, Outcome::HardFailure);
    }
}
