use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use janseva::{
    BatchConfig, BeneficiaryAdapter, CsvStore, DelayPolicy, DumpProvider, FormProvider,
    LifecycleAdapter, Orchestrator, PortalAdapter, RationCardAdapter, RetryPolicy,
};
use janseva_core::{PageProvider, RowStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "janseva")]
#[command(about = "Batch retrieval of citizen-service records from government portals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every identifier in the input sheet and append result rows.
    Run(RunCmd),
    /// Fetch one identifier and print its parsed record (json).
    Probe(ProbeCmd),
    /// Count persisted rows and flagged failures in an output sheet.
    Summary(SummaryCmd),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Portal {
    /// Ration-card status lookups (free-text result lines).
    Ration,
    /// Welfare-beneficiary lookups (CSRF form + JSON payload).
    Beneficiary,
    /// Service-lifecycle receipt tracking.
    Lifecycle,
}

#[derive(clap::Args, Debug)]
struct RunCmd {
    #[arg(long, value_enum)]
    portal: Portal,
    /// Directory holding the CSV sheets.
    #[arg(long, env = "JANSEVA_STORE_DIR", default_value = "data")]
    store: PathBuf,
    /// Directory of saved portal pages; required for the text portals.
    #[arg(long, env = "JANSEVA_DUMP_DIR")]
    dumps: Option<PathBuf>,
    /// Sheet the identifiers are read from.
    #[arg(long, default_value = "input")]
    input_sheet: String,
    /// 0-based column of the identifiers within the input sheet.
    #[arg(long, default_value_t = 0)]
    input_column: usize,
    /// Sheet the result rows land in (default: per-portal name).
    #[arg(long)]
    output_sheet: Option<String>,
    /// Reprocess identifiers that already have a persisted row.
    #[arg(long)]
    no_resume: bool,
    /// Drop the pauses between portal round trips.
    #[arg(long)]
    fast: bool,
}

#[derive(clap::Args, Debug)]
struct ProbeCmd {
    #[arg(long, value_enum)]
    portal: Portal,
    /// Directory of saved portal pages; required for the text portals.
    #[arg(long, env = "JANSEVA_DUMP_DIR")]
    dumps: Option<PathBuf>,
    identifier: String,
}

#[derive(clap::Args, Debug)]
struct SummaryCmd {
    #[arg(long, value_enum)]
    portal: Portal,
    #[arg(long, env = "JANSEVA_STORE_DIR", default_value = "data")]
    store: PathBuf,
    /// Sheet to summarize (default: per-portal name).
    #[arg(long)]
    sheet: Option<String>,
}

fn adapter_for(portal: Portal) -> Box<dyn PortalAdapter> {
    match portal {
        Portal::Ration => Box::new(RationCardAdapter::new()),
        Portal::Beneficiary => Box::new(BeneficiaryAdapter::new()),
        Portal::Lifecycle => Box::new(LifecycleAdapter::new()),
    }
}

fn default_sheet(portal: Portal) -> &'static str {
    match portal {
        Portal::Ration => "ration-cards",
        Portal::Beneficiary => "beneficiaries",
        Portal::Lifecycle => "lifecycle",
    }
}

/// Per-portal pacing, tuned to what each portal tolerates.
fn policies_for(portal: Portal) -> (RetryPolicy, DelayPolicy) {
    match portal {
        Portal::Ration => (
            RetryPolicy {
                max_attempts: 2,
                backoff: DelayPolicy::Fixed(Duration::from_secs(3)),
            },
            DelayPolicy::Fixed(Duration::from_secs(5)),
        ),
        Portal::Beneficiary => (
            RetryPolicy::single(),
            DelayPolicy::Jittered {
                base: Duration::from_secs(6),
                spread: Duration::from_secs(3),
            },
        ),
        Portal::Lifecycle => (
            RetryPolicy::single(),
            DelayPolicy::Fixed(Duration::from_secs(3)),
        ),
    }
}

fn provider_for(portal: Portal, dumps: Option<PathBuf>) -> Result<Box<dyn PageProvider>> {
    if let Some(root) = dumps {
        return Ok(Box::new(DumpProvider::new(root)));
    }
    match portal {
        Portal::Beneficiary => Ok(Box::new(FormProvider::from_env()?)),
        Portal::Ration | Portal::Lifecycle => anyhow::bail!(
            "the {} portal has no live provider; pass --dumps (or JANSEVA_DUMP_DIR)",
            adapter_for(portal).shape().portal
        ),
    }
}

async fn run(cmd: RunCmd) -> Result<()> {
    let adapter = adapter_for(cmd.portal);
    let (retry, pacing) = if cmd.fast {
        (
            RetryPolicy {
                max_attempts: policies_for(cmd.portal).0.max_attempts,
                backoff: DelayPolicy::None,
            },
            DelayPolicy::None,
        )
    } else {
        policies_for(cmd.portal)
    };
    let provider = provider_for(cmd.portal, cmd.dumps)?;
    let orch = Orchestrator::new(provider, adapter, retry, pacing);

    let mut store = CsvStore::new(&cmd.store);
    let cfg = BatchConfig {
        input_sheet: cmd.input_sheet,
        input_column: cmd.input_column,
        output_sheet: cmd
            .output_sheet
            .unwrap_or_else(|| default_sheet(cmd.portal).to_string()),
        resume: !cmd.no_resume,
    };
    let summary = orch.run_batch(&mut store, &cfg).await?;
    println!(
        "{}: {} identifiers, {} skipped, {} processed ({} ok, {} failed)",
        cfg.output_sheet,
        summary.total,
        summary.skipped,
        summary.processed,
        summary.succeeded,
        summary.failed
    );
    Ok(())
}

async fn probe(cmd: ProbeCmd) -> Result<()> {
    let adapter = adapter_for(cmd.portal);
    let provider = provider_for(cmd.portal, cmd.dumps)?;
    let orch = Orchestrator::new(provider, adapter, RetryPolicy::single(), DelayPolicy::None);
    let record = orch.process_one(&cmd.identifier).await;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn summarize(cmd: SummaryCmd) -> Result<()> {
    let adapter = adapter_for(cmd.portal);
    let shape = adapter.shape();
    let sheet = cmd
        .sheet
        .unwrap_or_else(|| default_sheet(cmd.portal).to_string());

    let store = CsvStore::new(&cmd.store);
    let column = shape.status_column.unwrap_or(0);
    let values = store.read_column(&sheet, column)?;
    let total = values.len().saturating_sub(1);
    let flagged = values
        .iter()
        .skip(1)
        .filter(|v| {
            v.as_str() == shape.error_marker
                || v.as_str() == "NoDataFound"
                || v.as_str() == "Failed"
                // Distinguishable not-found fills (e.g. "RECEIPT NOT FOUND").
                || (shape.not_found_marker != shape.default_marker
                    && v.as_str() == shape.not_found_marker)
        })
        .count();
    println!("{sheet}: {total} rows, {flagged} flagged as failed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(cmd) => run(cmd).await,
        Commands::Probe(cmd) => probe(cmd).await,
        Commands::Summary(cmd) => summarize(cmd),
    }
}
