//! Virtual-user scheduling: ramp plan, supervisory tick loop, VU lifecycle.
mod ramp;
mod vu;


use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};
use tracing::{debug, info, warn};

use crate::scenario::Scenario;
use crate::shutdown::ShutdownReceiver;

pub use ramp::RampPlan;
pub use vu::VuWorkload;

use vu::ActiveVu;

/// What the scheduler observed over the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerReport {
    pub elapsed: Duration,
    pub cancelled: bool,
    pub vus_max: u64,
    pub abandoned: u64,
}

/// Drives the VU population along a [`RampPlan`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    plan: RampPlan,
    tick: Duration,
    grace_period: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(plan: RampPlan, tick: Duration, grace_period: Duration) -> Self {
        Self {
            plan,
            tick: tick.max(Duration::from_millis(1)),
            grace_period,
        }
    }

    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(
            scenario.plan.clone(),
            scenario.options.tick,
            scenario.options.grace_period,
        )
    }

    /// Runs until every stage has elapsed or `shutdown_rx` fires, then stops
    /// all VUs and waits up to the grace period for them.
    pub async fn run(&self, workload: &VuWorkload, mut shutdown_rx: ShutdownReceiver) -> SchedulerReport {
        let started = Instant::now();
        let total = self.plan.total_duration();
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut active: Vec<ActiveVu> = Vec::new();
        let mut retiring: Vec<ActiveVu> = Vec::new();
        let mut next_id: u64 = 0;
        let mut vus_max: u64 = 0;
        let mut cancelled = false;
        let mut shutdown_open = true;
        let mut current_stage: Option<usize> = None;

        info!(
            "Starting run: {} stage(s) over {:?}, peak {} VUs",
            self.plan.stages().len(),
            total,
            self.plan.peak_vus()
        );

        loop {
            tokio::select! {
                result = shutdown_rx.recv(), if shutdown_open => {
                    match result {
                        Ok(()) | Err(RecvError::Lagged(_)) => {
                            info!("Run aborted; stopping virtual users");
                            cancelled = true;
                            break;
                        }
                        Err(RecvError::Closed) => shutdown_open = false,
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }

            let stage = self.plan.stage_index_at(elapsed);
            if stage != current_stage {
                if let Some(index) = stage {
                    info!(
                        "Stage {}/{} at {:?}",
                        index.saturating_add(1),
                        self.plan.stages().len(),
                        elapsed
                    );
                }
                current_stage = stage;
            }

            active.retain(|vu| !vu.is_finished());
            retiring.retain(|vu| !vu.is_finished());

            let desired = usize::try_from(self.plan.desired_at(elapsed)).unwrap_or(usize::MAX);
            while active.len() < desired {
                active.push(ActiveVu::spawn(next_id, workload));
                next_id = next_id.saturating_add(1);
            }
            while active.len() > desired {
                let Some(vu) = active.pop() else {
                    break;
                };
                debug!("Retiring VU {}", vu.id);
                vu.signal_stop();
                retiring.push(vu);
            }

            let live = u64::try_from(active.len().saturating_add(retiring.len())).unwrap_or(u64::MAX);
            vus_max = vus_max.max(live);
        }

        for vu in active.drain(..) {
            vu.signal_stop();
            retiring.push(vu);
        }
        let abandoned = self.wait_for_stragglers(retiring).await;

        SchedulerReport {
            elapsed: started.elapsed(),
            cancelled,
            vus_max,
            abandoned,
        }
    }

    async fn wait_for_stragglers(&self, vus: Vec<ActiveVu>) -> u64 {
        if vus.is_empty() {
            return 0;
        }
        debug!(
            "Waiting up to {:?} for {} VU(s) to finish",
            self.grace_period,
            vus.len()
        );
        let now = Instant::now();
        let deadline = now.checked_add(self.grace_period).unwrap_or(now);
        let mut abandoned: u64 = 0;
        for mut vu in vus {
            if timeout_at(deadline, &mut vu.handle).await.is_err() {
                vu.handle.abort();
                abandoned = abandoned.saturating_add(1);
            }
        }
        if abandoned > 0 {
            warn!(
                "Grace period of {:?} expired; abandoned {} VU(s)",
                self.grace_period, abandoned
            );
        }
        abandoned
    }
}
