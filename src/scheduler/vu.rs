use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::http::RequestExecutor;
use crate::metrics::{MetricsAggregator, Sample, ShardRecorder};
use crate::scenario::Scenario;

/// Shared, read-only inputs every virtual user runs against.
#[derive(Clone)]
pub struct VuWorkload {
    pub scenario: Arc<Scenario>,
    pub executor: RequestExecutor,
    pub aggregator: Arc<MetricsAggregator>,
}

/// Scheduler-side handle for one live virtual user.
pub(super) struct ActiveVu {
    pub(super) id: u64,
    stop_tx: watch::Sender<bool>,
    pub(super) handle: tokio::task::JoinHandle<()>,
}

impl ActiveVu {
    pub(super) fn spawn(id: u64, workload: &VuWorkload) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let scenario = Arc::clone(&workload.scenario);
        let executor = workload.executor.clone();
        let recorder = workload.aggregator.recorder(id);
        let handle = tokio::spawn(async move {
            debug!("VU {} started", id);
            run_virtual_user(&scenario, &executor, &recorder, stop_rx).await;
            debug!("VU {} stopped", id);
        });
        Self {
            id,
            stop_tx,
            handle,
        }
    }

    /// Asks the VU to stop before its next step. In-flight requests finish.
    pub(super) fn signal_stop(&self) {
        drop(self.stop_tx.send(true));
    }

    pub(super) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run_virtual_user(
    scenario: &Scenario,
    executor: &RequestExecutor,
    recorder: &ShardRecorder,
    mut stop_rx: watch::Receiver<bool>,
) {
    let builtins = *scenario.registry.builtins();
    loop {
        let iteration_started = Instant::now();
        for step in &scenario.steps {
            if *stop_rx.borrow() {
                return;
            }
            executor.execute(step, recorder).await;

            let Some(think_time) = step.think_time else {
                continue;
            };
            let pause = think_time.sample();
            if pause.is_zero() {
                continue;
            }
            tokio::select! {
                _ = stop_rx.changed() => return,
                () = sleep(pause) => {}
            }
        }

        recorder.record(&[
            Sample::Count(builtins.iterations, 1),
            Sample::Trend(builtins.iteration_duration, iteration_started.elapsed()),
        ]);
        tokio::task::yield_now().await;
    }
}
