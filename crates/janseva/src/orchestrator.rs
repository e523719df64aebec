//! Drives identifiers through fetch, parse, and persistence.
//!
//! `process_one` is total: whatever the portal does, the caller gets a
//! fixed-width record back. One misbehaving identifier never aborts a batch;
//! transport failures retry, terminal failures fold into marker rows.

use crate::adapters::{Extraction, PortalAdapter};
use crate::delay::DelayPolicy;
use janseva_core::{FetchAttempt, Outcome, OutputRecord, PageProvider, Result, RowStore};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff: DelayPolicy,
}

impl RetryPolicy {
    pub fn single() -> Self {
        Self {
            max_attempts: 1,
            backoff: DelayPolicy::None,
        }
    }
}

/// What one batch run is asked to do: which sheet/column the identifiers come
/// from and which sheet the rows land in.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_sheet: String,
    pub input_column: usize,
    pub output_sheet: String,
    /// Skip identifiers that already have a persisted row.
    pub resume: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Input cells below the header, before any filtering.
    pub total: usize,
    /// Invalid identifiers plus already-persisted ones (when resuming).
    pub skipped: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Orchestrator {
    provider: Box<dyn PageProvider>,
    adapter: Box<dyn PortalAdapter>,
    retry: RetryPolicy,
    pacing: DelayPolicy,
}

impl Orchestrator {
    pub fn new(
        provider: Box<dyn PageProvider>,
        adapter: Box<dyn PortalAdapter>,
        retry: RetryPolicy,
        pacing: DelayPolicy,
    ) -> Self {
        Self {
            provider,
            adapter,
            retry,
            pacing,
        }
    }

    pub fn adapter(&self) -> &dyn PortalAdapter {
        self.adapter.as_ref()
    }

    async fn attempt(&self, identifier: &str) -> Result<Extraction> {
        let content = self.provider.fetch(identifier).await?;
        self.adapter.parse(identifier, &content)
    }

    /// Fetch, parse, and retry one identifier until it yields a record.
    pub async fn process_one(&self, identifier: &str) -> OutputRecord {
        let portal = self.adapter.shape().portal;
        let mut index = 1u32;
        loop {
            match self.attempt(identifier).await {
                Ok(ext) => {
                    let attempt = FetchAttempt {
                        index,
                        strategy: ext.strategy,
                        outcome: ext.record.outcome,
                    };
                    info!(
                        portal,
                        identifier,
                        attempt.index,
                        strategy = attempt.strategy,
                        "record extracted"
                    );
                    return ext.record;
                }
                Err(e) if e.is_retryable() && index < self.retry.max_attempts => {
                    warn!(portal, identifier, attempt = index, error = %e, "retrying");
                    self.retry.backoff.pause().await;
                    index += 1;
                }
                Err(e) => {
                    warn!(portal, identifier, attempt = index, error = %e, "giving up");
                    return self.adapter.failure_record(identifier, &e);
                }
            }
        }
    }

    /// Process identifiers in order, pacing between portal round trips.
    pub async fn process_all(&self, identifiers: &[String]) -> Vec<OutputRecord> {
        let mut records = Vec::with_capacity(identifiers.len());
        for (i, identifier) in identifiers.iter().enumerate() {
            if i > 0 {
                self.pacing.pause().await;
            }
            records.push(self.process_one(identifier).await);
        }
        records
    }

    /// Read identifiers from the store, process each, append the rows back.
    ///
    /// Store write failures are logged and skipped rather than aborting: a
    /// half-written batch plus a warning beats losing the fetched data for
    /// every identifier after the bad row.
    pub async fn run_batch(&self, store: &mut dyn RowStore, cfg: &BatchConfig) -> Result<BatchSummary> {
        let cells = store.read_column(&cfg.input_sheet, cfg.input_column)?;
        let cells: Vec<String> = cells.into_iter().skip(1).collect(); // header

        let existing = if cfg.resume {
            store.read_existing(&cfg.output_sheet)?
        } else {
            Default::default()
        };

        let shape = self.adapter.shape();
        if store.read_column(&cfg.output_sheet, 0)?.is_empty() {
            let header: Vec<String> = shape.columns.iter().map(|c| c.to_string()).collect();
            store.append_row(&cfg.output_sheet, &header)?;
        }

        let mut summary = BatchSummary {
            total: cells.len(),
            ..Default::default()
        };
        let mut first = true;
        for cell in &cells {
            let Some(identifier) = self.adapter.validate_identifier(cell) else {
                warn!(portal = shape.portal, cell = %cell, "skipping invalid identifier");
                summary.skipped += 1;
                continue;
            };
            if existing.contains(&identifier) {
                info!(portal = shape.portal, %identifier, "already persisted, skipping");
                summary.skipped += 1;
                continue;
            }

            if !first {
                self.pacing.pause().await;
            }
            first = false;

            let record = self.process_one(&identifier).await;
            summary.processed += 1;
            match record.outcome {
                Outcome::Success => summary.succeeded += 1,
                Outcome::SoftFailure | Outcome::HardFailure => summary.failed += 1,
            }
            if let Err(e) = store.append_row(&cfg.output_sheet, &record.fields) {
                warn!(portal = shape.portal, %identifier, error = %e, "row not persisted");
            }
        }

        info!(
            portal = shape.portal,
            summary.total,
            summary.skipped,
            summary.processed,
            summary.succeeded,
            summary.failed,
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ration::RationCardAdapter;
    use crate::store::MemStore;
    use janseva_core::{Error, PageContent};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const RESULT_LINE: &str = "प्राधिकृत अधिकारी कार्यालय जयपुर 12345678 90123456 K119269051 Ration Card Printed(2024-01-01)";

    /// Replays a queue of canned fetch results.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<PageContent>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<PageContent>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }

        fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl PageProvider for ScriptedProvider {
        async fn fetch(&self, _identifier: &str) -> Result<PageContent> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("script exhausted".into())))
        }
    }

    fn good_page() -> PageContent {
        PageContent::Text(vec![RESULT_LINE.to_string()])
    }

    fn orchestrator(script: Vec<Result<PageContent>>, retry: RetryPolicy) -> Orchestrator {
        Orchestrator::new(
            Box::new(ScriptedProvider::new(script)),
            Box::new(RationCardAdapter::new()),
            retry,
            DelayPolicy::None,
        )
    }

    fn retry_twice() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            backoff: DelayPolicy::None,
        }
    }

    #[tokio::test]
    async fn transport_failure_retries_then_succeeds() {
        let orch = orchestrator(
            vec![Err(Error::Transport("timeout".into())), Ok(good_page())],
            retry_twice(),
        );
        let record = orch.process_one("RC-1").await;
        assert_eq!(record.outcome, Outcome::Success);
        assert_eq!(record.fields[4], "K119269051");
    }

    #[tokio::test]
    async fn non_retryable_errors_are_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(Error::NoData("no record".into())),
            Ok(good_page()),
        ]);
        // Hold a second handle to check the queue afterwards.
        let provider = std::sync::Arc::new(provider);
        struct Shared(std::sync::Arc<ScriptedProvider>);
        #[async_trait::async_trait]
        impl PageProvider for Shared {
            async fn fetch(&self, identifier: &str) -> Result<PageContent> {
                self.0.fetch(identifier).await
            }
        }
        let orch = Orchestrator::new(
            Box::new(Shared(provider.clone())),
            Box::new(RationCardAdapter::new()),
            retry_twice(),
            DelayPolicy::None,
        );

        let record = orch.process_one("RC-2").await;
        assert_eq!(record.outcome, Outcome::SoftFailure);
        assert_eq!(record.fields[5], "NoDataFound");
        assert_eq!(provider.remaining(), 1, "second page must stay unfetched");
    }

    #[tokio::test]
    async fn exhausted_retries_fold_into_the_error_marker_row() {
        let orch = orchestrator(
            vec![
                Err(Error::Transport("timeout".into())),
                Err(Error::Transport("timeout".into())),
            ],
            retry_twice(),
        );
        let record = orch.process_one("RC-3").await;
        assert_eq!(record.outcome, Outcome::HardFailure);
        assert_eq!(record.fields[0], "RC-3");
        assert!(record.fields[1..].iter().all(|f| f == "FETCH ERROR"));
    }

    #[tokio::test]
    async fn one_bad_identifier_does_not_abort_the_batch() {
        let orch = orchestrator(
            vec![
                Ok(good_page()),
                Err(Error::Transport("down".into())),
                Ok(good_page()),
            ],
            RetryPolicy::single(),
        );
        let ids: Vec<String> = ["RC-1", "RC-2", "RC-3"].map(String::from).into();
        let records = orch.process_all(&ids).await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].outcome, Outcome::Success);
        assert_eq!(records[1].outcome, Outcome::HardFailure);
        assert_eq!(records[2].outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn run_batch_validates_resumes_and_appends() {
        let mut store = MemStore::new();
        for row in [
            vec!["Ration Card Number".to_string()],
            vec!["RC-1".to_string()],
            vec!["nan".to_string()],
            vec!["RC-2".to_string()],
        ] {
            store.append_row("input", &row).unwrap();
        }
        // RC-1 already persisted from an earlier run.
        store
            .append_row("cards", &vec!["Ration Card Number".to_string(); 6])
            .unwrap();
        store
            .append_row("cards", &{
                let mut row = vec!["N/A".to_string(); 6];
                row[0] = "RC-1".to_string();
                row
            })
            .unwrap();

        let orch = orchestrator(vec![Ok(good_page())], RetryPolicy::single());
        let cfg = BatchConfig {
            input_sheet: "input".to_string(),
            input_column: 0,
            output_sheet: "cards".to_string(),
            resume: true,
        };
        let summary = orch.run_batch(&mut store, &cfg).await.unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                skipped: 2,
                processed: 1,
                succeeded: 1,
                failed: 0,
            }
        );
        let rows = &store.sheets["cards"];
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], "RC-2");
        assert_eq!(rows[2][4], "K119269051");
    }

    #[tokio::test]
    async fn run_batch_writes_the_header_when_the_sheet_is_new() {
        let mut store = MemStore::new();
        store
            .append_row("input", &vec!["Ration Card Number".to_string()])
            .unwrap();

        let orch = orchestrator(vec![], RetryPolicy::single());
        let cfg = BatchConfig {
            input_sheet: "input".to_string(),
            input_column: 0,
            output_sheet: "cards".to_string(),
            resume: false,
        };
        let summary = orch.run_batch(&mut store, &cfg).await.unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(store.sheets["cards"][0][0], "Ration Card Number");
        assert_eq!(store.sheets["cards"][0].len(), 6);
    }
}
