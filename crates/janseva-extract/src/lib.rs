//! Field Extraction Engine: takes raw, inconsistent, mixed Hindi/English page
//! content and produces fixed-shape rows.
//!
//! Three layers, composed by the portal adapters in the `janseva` crate:
//! [`clean`] normalizes candidate strings, [`classify`] buckets the tokens of
//! a result line, [`assemble`] lays the buckets out into a fixed-width record.

pub mod assemble;
pub mod classify;
pub mod clean;

pub use assemble::{assemble, assemble_structured, populated_fields, FieldMap};
pub use classify::{classify, line_is_classifiable, status_fallback, ClassifyConfig, Token};
pub use clean::{clean, CleanConfig};
