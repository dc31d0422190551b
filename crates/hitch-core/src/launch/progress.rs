//! Progress timing for a launch.

use crate::config::LaunchConfig;
use std::time::Duration;

/// Fixed schedule of a launch: `total_steps` equal ticks spread over
/// `duration`, with the launcher started once progress reaches
/// `spawn_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPlan {
    pub total_steps: u32,
    pub duration: Duration,
    pub spawn_threshold: f32,
}

impl ProgressPlan {
    #[must_use]
    pub fn from_config(config: &LaunchConfig) -> Self {
        Self {
            total_steps: config.total_steps.max(1),
            duration: config.duration(),
            spawn_threshold: config.spawn_threshold,
        }
    }

    /// Time from the start of the launch at which `step` is due.
    #[must_use]
    pub fn offset_of(&self, step: u32) -> Duration {
        let total = self.total_steps.max(1);
        self.duration
            .checked_mul(step.min(total))
            .map_or(self.duration, |d| d / total)
    }

    /// Fraction complete after `step` steps, in [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_at(&self, step: u32) -> f32 {
        let total = self.total_steps.max(1);
        (step.min(total) as f32) / (total as f32)
    }

    /// Last step at which the launcher may be started. Later than this would
    /// coincide with completion, unless there is only one step.
    #[must_use]
    pub fn latest_spawn_step(&self) -> u32 {
        self.total_steps.saturating_sub(1).max(1)
    }

    /// Whether `step` is at or past the spawn point. Step 0 never is.
    #[must_use]
    pub fn crosses_threshold(&self, step: u32) -> bool {
        step > 0
            && (self.progress_at(step) >= self.spawn_threshold || step >= self.latest_spawn_step())
    }
}

/// Walks a [`ProgressPlan`] and latches the spawn decision
#[derive(Debug, Clone)]
pub struct ProgressDriver {
    plan: ProgressPlan,
    spawned: bool,
}

impl ProgressDriver {
    #[must_use]
    pub fn new(plan: ProgressPlan) -> Self {
        Self {
            plan,
            spawned: false,
        }
    }

    /// True exactly once per launch: on the first call whose step crosses the
    /// threshold. Every later call returns false, whatever the step.
    pub fn check_spawn(&mut self, step: u32) -> bool {
        if self.spawned || !self.plan.crosses_threshold(step) {
            return false;
        }
        self.spawned = true;
        true
    }

    #[must_use]
    pub fn has_spawned(&self) -> bool {
        self.spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(total_steps: u32, threshold: f32) -> ProgressPlan {
        ProgressPlan {
            total_steps,
            duration: Duration::from_millis(1000),
            spawn_threshold: threshold,
        }
    }

    #[test]
    fn test_offset_of_spreads_steps_over_duration() {
        let plan10 = plan(10, 0.1);
        assert_eq!(plan10.offset_of(0), Duration::ZERO);
        assert_eq!(plan10.offset_of(1), Duration::from_millis(100));
        assert_eq!(plan10.offset_of(10), Duration::from_millis(1000));
        assert_eq!(plan10.offset_of(25), Duration::from_millis(1000));

        let fine = ProgressPlan {
            total_steps: 1000,
            duration: Duration::from_millis(3605),
            spawn_threshold: 0.01,
        };
        assert_eq!(fine.offset_of(1), Duration::from_micros(3605));
        assert_eq!(fine.offset_of(1000), Duration::from_millis(3605));
    }

    #[test]
    fn test_progress_at_bounds() {
        let p = plan(10, 0.1);
        assert!(p.progress_at(0).abs() < f32::EPSILON);
        assert!((p.progress_at(5) - 0.5).abs() < f32::EPSILON);
        assert!((p.progress_at(10) - 1.0).abs() < f32::EPSILON);
        assert!((p.progress_at(99) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ten_steps_spawns_at_first_step() {
        let mut driver = ProgressDriver::new(plan(10, 0.1));
        assert!(!driver.check_spawn(0));
        assert!(driver.check_spawn(1));
        assert!((2..=10).all(|step| !driver.check_spawn(step)));
    }

    #[test]
    fn test_default_plan_spawns_at_step_ten() {
        let config = LaunchConfig::default();
        let mut driver = ProgressDriver::new(ProgressPlan::from_config(&config));
        let spawn_step = (0..=config.total_steps).find(|&step| driver.check_spawn(step));
        assert_eq!(spawn_step, Some(10));
    }

    #[test]
    fn test_double_check_spawns_once() {
        let mut driver = ProgressDriver::new(plan(10, 0.1));
        assert!(driver.check_spawn(1));
        assert!(!driver.check_spawn(1));
        assert!(driver.has_spawned());
    }

    #[test]
    fn test_skipped_ticks_still_spawn() {
        let mut driver = ProgressDriver::new(plan(100, 0.05));
        assert!(!driver.check_spawn(3));
        assert!(driver.check_spawn(8));
    }

    #[test]
    fn test_threshold_of_one_spawns_before_completion() {
        let p = plan(10, 1.0);
        assert!(!p.crosses_threshold(8));
        assert!(p.crosses_threshold(9));
    }

    #[test]
    fn test_single_step_plan_spawns_at_completion() {
        let mut driver = ProgressDriver::new(plan(1, 0.5));
        assert!(!driver.check_spawn(0));
        assert!(driver.check_spawn(1));
    }
}
