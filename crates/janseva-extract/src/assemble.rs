//! Turns classified tokens (or a structured payload) into one fixed-width
//! output row. Every column is always filled: fields nothing contributed to
//! get the shape's default marker, never the empty string.

use crate::classify::Token;
use janseva_core::{Outcome, OutputRecord, RecordShape};

/// Where each semantic bucket lands in the output row.
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub office: Option<usize>,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    pub user_id: Option<usize>,
    pub status: Option<usize>,
}

fn set(fields: &mut [String], col: Option<usize>, value: String) {
    if let Some(col) = col {
        if col < fields.len() && !value.is_empty() {
            fields[col] = value;
        }
    }
}

/// Count of data fields carrying something other than the default marker.
/// The identifier column does not count toward success.
pub fn populated_fields(shape: &RecordShape, fields: &[String]) -> usize {
    fields
        .iter()
        .enumerate()
        .filter(|(i, v)| Some(*i) != shape.identifier_column && v.as_str() != shape.default_marker)
        .count()
}

/// Combine classified tokens into a fixed-width record.
///
/// Office fragments join with single spaces; numeric ids fill the primary
/// then secondary column in first-seen order (portal output order is not
/// contractually guaranteed, see DESIGN.md); the first alphanumeric id fills
/// the user column; the first status fragment fills the status column.
pub fn assemble(
    shape: &RecordShape,
    map: &FieldMap,
    identifier: &str,
    tokens: &[Token],
) -> OutputRecord {
    let mut fields = shape.filled(identifier, shape.default_marker);

    let mut office: Vec<&str> = Vec::new();
    let mut numerics: Vec<&str> = Vec::new();
    let mut user: Option<&str> = None;
    let mut status: Option<&str> = None;
    for token in tokens {
        match token {
            Token::OfficeFragment(s) => office.push(s),
            Token::NumericId(s) => numerics.push(s),
            Token::AlphanumericId(s) => user = user.or(Some(s)),
            Token::StatusFragment(s) => status = status.or(Some(s)),
            Token::Unclassified(_) => {}
        }
    }

    if !office.is_empty() {
        set(&mut fields, map.office, office.join(" "));
    }
    if let Some(first) = numerics.first() {
        set(&mut fields, map.primary, first.to_string());
    }
    if let Some(second) = numerics.get(1) {
        set(&mut fields, map.secondary, second.to_string());
    }
    if let Some(user) = user {
        set(&mut fields, map.user_id, user.to_string());
    }
    if let Some(status) = status {
        set(&mut fields, map.status, status.to_string());
    }

    let outcome = if populated_fields(shape, &fields) > 0 {
        Outcome::Success
    } else {
        Outcome::SoftFailure
    };
    OutputRecord {
        identifier: identifier.to_string(),
        fields,
        outcome,
    }
}

/// Assembly path for portals that answer with machine-readable content: each
/// column maps 1:1 to a named key in the payload. Absent or blank keys get
/// the same default marker as the text path.
pub fn assemble_structured(
    shape: &RecordShape,
    key_map: &[(&str, usize)],
    identifier: &str,
    payload: &serde_json::Map<String, serde_json::Value>,
) -> OutputRecord {
    let mut fields = shape.filled(identifier, shape.default_marker);
    for (key, col) in key_map {
        let value = payload
            .get(*key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or("");
        set(&mut fields, Some(*col), value.to_string());
    }
    let outcome = if populated_fields(shape, &fields) > 0 {
        Outcome::Success
    } else {
        Outcome::SoftFailure
    };
    OutputRecord {
        identifier: identifier.to_string(),
        fields,
        outcome,
    }
}
