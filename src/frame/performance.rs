//! Frame budget monitoring
//!
//! Keeps a rolling window of frame compute times and grades them against the
//! per-frame budget (1 / frame rate). The scheduler logs when the grade drops.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Minimum samples before the grade is trusted
const MIN_SAMPLES: usize = 10;

/// Budget grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PerformanceStatus {
    /// Under 30% of the budget
    Excellent,
    /// Under 70% of the budget
    Good,
    /// Under 100% of the budget
    Warning,
    /// Frames are overrunning the budget
    Critical,
}

impl PerformanceStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, PerformanceStatus::Warning | PerformanceStatus::Critical)
    }
}

/// Rolling frame-time monitor
pub struct PerformanceMonitor {
    frame_durations: VecDeque<Duration>,
    max_samples: usize,
    budget: Duration,
    excellent_threshold: f32,
    warning_threshold: f32,
    critical_threshold: f32,
    status: PerformanceStatus,
    frame_start: Option<Instant>,
    last_entity_count: usize,
}

impl PerformanceMonitor {
    pub fn new(frame_rate: u32) -> Self {
        let budget = Duration::from_secs_f32(1.0 / frame_rate.max(1) as f32);

        Self {
            frame_durations: VecDeque::with_capacity(120),
            max_samples: 120, // ~2 seconds at 60 fps
            budget,
            excellent_threshold: 0.3,
            warning_threshold: 0.7,
            critical_threshold: 1.0,
            status: PerformanceStatus::Excellent,
            frame_start: None,
            last_entity_count: 0,
        }
    }

    pub fn frame_start(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Close the current frame. Returns the new status if it changed.
    pub fn frame_end(&mut self, entity_count: usize) -> Option<PerformanceStatus> {
        let start = self.frame_start.take()?;
        self.last_entity_count = entity_count;
        self.record_frame(start.elapsed())
    }

    fn record_frame(&mut self, duration: Duration) -> Option<PerformanceStatus> {
        self.frame_durations.push_back(duration);
        while self.frame_durations.len() > self.max_samples {
            self.frame_durations.pop_front();
        }

        let previous = self.status;
        self.update_status();
        (self.status != previous).then_some(self.status)
    }

    fn update_status(&mut self) {
        if self.frame_durations.len() < MIN_SAMPLES {
            return;
        }

        let ratio = self.budget_usage_percent() / 100.0;
        self.status = if ratio < self.excellent_threshold {
            PerformanceStatus::Excellent
        } else if ratio < self.warning_threshold {
            PerformanceStatus::Good
        } else if ratio < self.critical_threshold {
            PerformanceStatus::Warning
        } else {
            PerformanceStatus::Critical
        };
    }

    pub fn average_frame_duration(&self) -> Duration {
        if self.frame_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.frame_durations.iter().sum();
        sum / self.frame_durations.len() as u32
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Average frame time as a percentage of the budget (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        self.average_frame_duration().as_secs_f32() / self.budget.as_secs_f32() * 100.0
    }

    pub fn last_entity_count(&self) -> usize {
        self.last_entity_count
    }

    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget, {} entities",
            self.status,
            self.budget_usage_percent(),
            self.last_entity_count
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(monitor: &mut PerformanceMonitor, millis: u64) {
        for _ in 0..20 {
            monitor.record_frame(Duration::from_millis(millis));
        }
    }

    #[test]
    fn test_starts_excellent() {
        let monitor = PerformanceMonitor::new(60);
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        assert_eq!(monitor.average_frame_duration(), Duration::ZERO);
    }

    #[test]
    fn test_grades_follow_budget_share() {
        // 60 fps budget is ~16.7ms
        let mut monitor = PerformanceMonitor::new(60);
        feed(&mut monitor, 2);
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);

        let mut monitor = PerformanceMonitor::new(60);
        feed(&mut monitor, 8);
        assert_eq!(monitor.status(), PerformanceStatus::Good);

        let mut monitor = PerformanceMonitor::new(60);
        feed(&mut monitor, 14);
        assert_eq!(monitor.status(), PerformanceStatus::Warning);
        assert!(monitor.status().is_degraded());

        let mut monitor = PerformanceMonitor::new(60);
        feed(&mut monitor, 25);
        assert_eq!(monitor.status(), PerformanceStatus::Critical);
    }

    #[test]
    fn test_needs_enough_samples_before_grading() {
        let mut monitor = PerformanceMonitor::new(60);
        for _ in 0..MIN_SAMPLES - 1 {
            assert_eq!(monitor.record_frame(Duration::from_millis(40)), None);
        }
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        assert_eq!(
            monitor.record_frame(Duration::from_millis(40)),
            Some(PerformanceStatus::Critical)
        );
    }

    #[test]
    fn test_frame_end_without_start_is_ignored() {
        let mut monitor = PerformanceMonitor::new(60);
        assert_eq!(monitor.frame_end(5), None);
        assert_eq!(monitor.last_entity_count(), 0);

        monitor.frame_start();
        monitor.frame_end(7);
        assert_eq!(monitor.last_entity_count(), 7);
    }
}
