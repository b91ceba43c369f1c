use std::time::Duration;

use crate::scenario::Stage;

/// Desired virtual-user count over time: a start value followed by
/// piecewise-linear stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RampPlan {
    start_vus: u64,
    stages: Vec<Stage>,
}

impl RampPlan {
    #[must_use]
    pub const fn new(start_vus: u64, stages: Vec<Stage>) -> Self {
        Self { start_vus, stages }
    }

    #[must_use]
    pub const fn start_vus(&self) -> u64 {
        self.start_vus
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.stages
            .iter()
            .fold(Duration::ZERO, |total, stage| total.saturating_add(stage.duration))
    }

    /// Highest VU count the plan ever asks for.
    #[must_use]
    pub fn peak_vus(&self) -> u64 {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .fold(self.start_vus, u64::max)
    }

    /// Index of the stage active at `elapsed`, `None` once every stage is done.
    #[must_use]
    pub fn stage_index_at(&self, elapsed: Duration) -> Option<usize> {
        let elapsed_ms = elapsed.as_millis();
        let mut stage_end_ms: u128 = 0;
        for (index, stage) in self.stages.iter().enumerate() {
            stage_end_ms = stage_end_ms.saturating_add(stage.duration.as_millis());
            if elapsed_ms < stage_end_ms {
                return Some(index);
            }
        }
        None
    }

    /// VU count the plan asks for at `elapsed`.
    ///
    /// Interpolates linearly (integer milliseconds, truncating) between the
    /// previous target and the active stage's target. Zero-length stages are
    /// instant jumps; past the last stage the final target holds.
    #[must_use]
    pub fn desired_at(&self, elapsed: Duration) -> u64 {
        let elapsed_ms = i128::try_from(elapsed.as_millis()).unwrap_or(i128::MAX);
        let mut from = self.start_vus;
        let mut stage_start_ms: i128 = 0;

        for stage in &self.stages {
            let stage_ms = i128::try_from(stage.duration.as_millis()).unwrap_or(i128::MAX);
            let stage_end_ms = stage_start_ms.saturating_add(stage_ms);
            if elapsed_ms < stage_end_ms {
                let start = i128::from(from);
                let delta = i128::from(stage.target).saturating_sub(start);
                let step = delta
                    .saturating_mul(elapsed_ms.saturating_sub(stage_start_ms))
                    .checked_div(stage_ms)
                    .unwrap_or(0);
                let vus = start.saturating_add(step);
                return if vus < 0 {
                    0
                } else {
                    u64::try_from(vus).unwrap_or(u64::MAX)
                };
            }
            from = stage.target;
            stage_start_ms = stage_end_ms;
        }

        from
    }
}
