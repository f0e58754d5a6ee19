//! Per-student, per-course progress aggregation.
//!
//! [`CourseProgress::record_time`] accumulates study time on a module,
//! marks the module completed once 80% of its duration has been spent, and
//! recomputes the course percentage over currently-approved modules.
//! Time accumulation is additive: repeating a call adds the delta again.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Fraction of a module's duration that must be spent to complete it.
pub const COMPLETION_RATIO: f64 = 0.8;

/// Duration assumed for modules without a configured duration (minutes).
pub const DEFAULT_MODULE_DURATION_MINS: i32 = 10;

/// Seconds of study required to complete a module of `duration_mins`.
///
/// `None` or a non-positive duration falls back to
/// [`DEFAULT_MODULE_DURATION_MINS`].
pub fn completion_threshold_secs(duration_mins: Option<i32>) -> i64 {
    let mins = duration_mins
        .filter(|&d| d > 0)
        .unwrap_or(DEFAULT_MODULE_DURATION_MINS);
    (f64::from(mins) * 60.0 * COMPLETION_RATIO).ceil() as i64
}

/// Round-half-up percentage of `completed` over `total`, clamped to 0..=100.
///
/// Returns `None` when `total` is zero.
pub fn percent_of(completed: usize, total: usize) -> Option<i32> {
    if total == 0 {
        return None;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    let pct = (200 * completed + total) / (2 * total);
    Some(pct.min(100) as i32)
}

/// Accumulated progress on a single module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub module_id: DbId,
    pub time_spent_secs: i64,
    pub completed: bool,
    pub last_updated: Timestamp,
}

/// The in-memory view of a progress record for one (student, course) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseProgress {
    pub modules: Vec<ModuleProgress>,
    /// Flat list of completed module ids kept for older clients.
    pub completed_module_ids: Vec<DbId>,
    pub percent_complete: i32,
}

/// Result of a single [`CourseProgress::record_time`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub module_id: DbId,
    pub time_spent_secs: i64,
    pub completed: bool,
    /// True only on the call that crossed the completion threshold.
    pub newly_completed: bool,
    pub percent_complete: i32,
}

impl CourseProgress {
    /// Add `seconds` of study time to `module_id`.
    ///
    /// `approved_module_ids` is the set of modules currently approved in the
    /// course; completed modules outside it are not counted towards the
    /// percentage. With zero approved modules the prior percentage is kept.
    pub fn record_time(
        &mut self,
        module_id: DbId,
        duration_mins: Option<i32>,
        seconds: i64,
        approved_module_ids: &[DbId],
        now: Timestamp,
    ) -> Result<RecordOutcome, CoreError> {
        if seconds < 0 {
            return Err(CoreError::Validation(
                "time_spent_secs must not be negative".into(),
            ));
        }

        let index = match self.modules.iter().position(|m| m.module_id == module_id) {
            Some(i) => i,
            None => {
                self.modules.push(ModuleProgress {
                    module_id,
                    time_spent_secs: 0,
                    completed: false,
                    last_updated: now,
                });
                self.modules.len() - 1
            }
        };

        let entry = &mut self.modules[index];
        entry.time_spent_secs = entry.time_spent_secs.saturating_add(seconds);
        entry.last_updated = now;

        let mut newly_completed = false;
        if !entry.completed && entry.time_spent_secs >= completion_threshold_secs(duration_mins) {
            entry.completed = true;
            newly_completed = true;
        }
        let (time_spent_secs, completed) = (entry.time_spent_secs, entry.completed);

        if completed && !self.completed_module_ids.contains(&module_id) {
            self.completed_module_ids.push(module_id);
        }

        let counted = self
            .completed_module_ids
            .iter()
            .filter(|id| approved_module_ids.contains(id))
            .count();
        if let Some(pct) = percent_of(counted, approved_module_ids.len()) {
            self.percent_complete = pct;
        }

        Ok(RecordOutcome {
            module_id,
            time_spent_secs,
            completed,
            newly_completed,
            percent_complete: self.percent_complete,
        })
    }

    pub fn module(&self, module_id: DbId) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| m.module_id == module_id)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    #[test]
    fn test_default_threshold_is_eight_minutes() {
        assert_eq!(completion_threshold_secs(None), 480);
        assert_eq!(completion_threshold_secs(Some(0)), 480);
        assert_eq!(completion_threshold_secs(Some(10)), 480);
        assert_eq!(completion_threshold_secs(Some(25)), 1200);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(1, 3), Some(33));
        assert_eq!(percent_of(2, 3), Some(67));
        assert_eq!(percent_of(1, 2), Some(50));
        assert_eq!(percent_of(1, 8), Some(13));
        assert_eq!(percent_of(5, 4), Some(100));
        assert_eq!(percent_of(0, 0), None);
    }

    #[test]
    fn test_two_deltas_cross_threshold_on_second_call() {
        let mut progress = CourseProgress::default();
        let approved = [7, 8];

        let first = progress.record_time(7, None, 300, &approved, now()).unwrap();
        assert_eq!(first.time_spent_secs, 300);
        assert!(!first.completed);
        assert!(!first.newly_completed);
        assert_eq!(first.percent_complete, 0);

        let second = progress.record_time(7, None, 300, &approved, now()).unwrap();
        assert_eq!(second.time_spent_secs, 600);
        assert!(second.completed);
        assert!(second.newly_completed);
        assert_eq!(second.percent_complete, 50);
        assert_eq!(progress.completed_module_ids, vec![7]);
    }

    #[test]
    fn test_completion_is_monotonic_and_reported_once() {
        let mut progress = CourseProgress::default();
        let approved = [1];
        progress.record_time(1, Some(1), 60, &approved, now()).unwrap();
        let again = progress.record_time(1, Some(1), 10, &approved, now()).unwrap();
        assert!(again.completed);
        assert!(!again.newly_completed);
        assert_eq!(progress.completed_module_ids, vec![1]);

        // More modules approved later: completion stays, percent drops.
        let wider = [1, 2, 3, 4];
        let later = progress.record_time(1, Some(1), 0, &wider, now()).unwrap();
        assert!(later.completed);
        assert_eq!(later.percent_complete, 25);
    }

    #[test]
    fn test_zero_approved_modules_keeps_prior_percent() {
        let mut progress = CourseProgress {
            percent_complete: 40,
            ..CourseProgress::default()
        };
        let outcome = progress.record_time(3, None, 1000, &[], now()).unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.percent_complete, 40);
    }

    #[test]
    fn test_unapproved_completed_modules_not_counted() {
        let mut progress = CourseProgress::default();
        progress.record_time(1, Some(1), 60, &[1, 2], now()).unwrap();
        progress.record_time(2, Some(1), 60, &[1, 2], now()).unwrap();
        assert_eq!(progress.percent_complete, 100);

        // Module 2 has been unpublished since.
        let outcome = progress.record_time(1, Some(1), 5, &[1, 3], now()).unwrap();
        assert_eq!(outcome.percent_complete, 50);
    }

    #[test]
    fn test_repeated_calls_accumulate() {
        let mut progress = CourseProgress::default();
        for _ in 0..3 {
            progress.record_time(9, Some(60), 100, &[9], now()).unwrap();
        }
        assert_eq!(progress.module(9).unwrap().time_spent_secs, 300);
        assert_eq!(progress.modules.len(), 1);
    }

    #[test]
    fn test_negative_delta_rejected() {
        let mut progress = CourseProgress::default();
        let result = progress.record_time(1, None, -5, &[1], now());
        assert_matches!(result, Err(CoreError::Validation(_)));
        assert!(progress.modules.is_empty());
    }
}
