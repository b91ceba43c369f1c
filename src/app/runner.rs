use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::args::RunArgs;
use crate::config::load_config;
use crate::error::{AppError, AppResult};
use crate::http::{RequestExecutor, ReqwestTransport, Transport};
use crate::metrics::MetricsAggregator;
use crate::report::{RunSummary, render_table, write_summary};
use crate::scenario::{self, RunOverrides, Scenario};
use crate::scheduler::{Scheduler, VuWorkload};
use crate::shutdown::ShutdownReceiver;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};
use crate::thresholds::evaluate;

/// Result of a completed run.
#[derive(Debug)]
pub(crate) struct RunOutcome {
    pub summary: RunSummary,
    /// Set when the thresholds could not be evaluated (e.g. a threshold
    /// metric saw no samples). The summary then carries no verdicts.
    pub threshold_error: Option<AppError>,
}

impl RunOutcome {
    pub(crate) const fn passed(&self) -> bool {
        self.threshold_error.is_none() && self.summary.passed
    }
}

/// Loads the scenario, runs it against the network, and reports.
///
/// A failed threshold is a verdict, not an error: the outcome is returned
/// once the table is printed and the summary file is written.
///
/// # Errors
///
/// Returns a configuration error for an invalid scenario or a threshold
/// that cannot be evaluated (after reporting), and other errors when the
/// client cannot be built or the summary cannot be written.
pub(crate) async fn run_local(args: &RunArgs) -> AppResult<RunOutcome> {
    let (path, config) = load_config(args.config.as_deref())?;
    info!("Using scenario {}", path.display());
    let scenario = scenario::load(&config, &RunOverrides::from(args))?;
    let transport = ReqwestTransport::new(&scenario.options)?;
    let summary_path = scenario.options.summary_path.clone();

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let result = execute(scenario, Arc::new(transport), shutdown_rx).await;
    drop(shutdown_tx.send(()));
    signal_handle.abort();
    let mut outcome = result?;

    publish(&outcome, summary_path.as_deref(), args).await?;
    if let Some(err) = outcome.threshold_error.take() {
        return Err(err);
    }
    Ok(outcome)
}

/// Runs `scenario` to completion over `transport` and evaluates its
/// thresholds. Nothing is printed or written.
///
/// # Errors
///
/// Returns an error if the metrics cannot be allocated or finalized.
pub(crate) async fn execute(
    scenario: Scenario,
    transport: Arc<dyn Transport>,
    shutdown_rx: ShutdownReceiver,
) -> AppResult<RunOutcome> {
    let scenario = Arc::new(scenario);
    let aggregator = Arc::new(MetricsAggregator::with_default_shards(Arc::clone(
        &scenario.registry,
    ))?);
    let executor = RequestExecutor::new(transport, *scenario.registry.builtins());
    let scheduler = Scheduler::from_scenario(&scenario);
    let workload = VuWorkload {
        scenario: Arc::clone(&scenario),
        executor,
        aggregator: Arc::clone(&aggregator),
    };

    let started_at = Utc::now();
    let scheduler_report = scheduler.run(&workload, shutdown_rx).await;
    drop(workload);

    let snapshot = aggregator.finalize(scheduler_report.elapsed)?;
    match evaluate(&scenario.thresholds, &snapshot) {
        Ok(verdicts) => Ok(RunOutcome {
            summary: RunSummary::build(started_at, &scheduler_report, snapshot, verdicts),
            threshold_error: None,
        }),
        Err(err) => {
            let mut summary =
                RunSummary::build(started_at, &scheduler_report, snapshot, Vec::new());
            summary.passed = false;
            Ok(RunOutcome {
                summary,
                threshold_error: Some(err),
            })
        }
    }
}

async fn publish(outcome: &RunOutcome, summary_path: Option<&Path>, args: &RunArgs) -> AppResult<()> {
    if let Some(path) = summary_path {
        write_summary(path, &outcome.summary).await?;
    }

    if !args.quiet {
        let color = !args.no_color && std::io::stdout().is_terminal();
        println!("{}", render_table(&outcome.summary, color));
    }

    if outcome.summary.cancelled {
        warn!("Run was cancelled before all stages completed");
    }
    Ok(())
}
