//! Batch retrieval of citizen-service records from government portals.
//!
//! The pipeline per identifier: a [`provider`] fetches raw portal content, a
//! portal [`adapter`](adapters) turns it into a fixed-width record, and the
//! [`orchestrator`] handles retries, pacing, and persistence through a
//! [`RowStore`](janseva_core::RowStore).

pub mod adapters;
pub mod delay;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use adapters::beneficiary::BeneficiaryAdapter;
pub use adapters::lifecycle::LifecycleAdapter;
pub use adapters::ration::RationCardAdapter;
pub use adapters::{Extraction, PortalAdapter};
pub use delay::DelayPolicy;
pub use orchestrator::{BatchConfig, BatchSummary, Orchestrator, RetryPolicy};
pub use provider::{DumpProvider, FormProvider};
pub use store::CsvStore;
