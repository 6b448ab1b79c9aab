use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Score and statistics for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    /// Sum of task scores; negative when estimates were overrun
    pub total_score: f64,
    /// Completed tasks, with or without an estimate
    pub tasks_completed: usize,
    /// Estimated tasks finished at or under the estimate
    pub tasks_beat_estimate: usize,
    pub tasks_over_estimate: usize,
    pub total_estimated_minutes: u64,
    pub total_actual_minutes: u64,
    /// actual / estimated; 1.0 when nothing was estimated
    pub efficiency_ratio: f64,
}

impl DailyScore {
    /// An empty score for `date`
    pub fn empty(date: NaiveDate) -> Self {
        DailyScore {
            date,
            total_score: 0.0,
            tasks_completed: 0,
            tasks_beat_estimate: 0,
            tasks_over_estimate: 0,
            total_estimated_minutes: 0,
            total_actual_minutes: 0,
            efficiency_ratio: 1.0,
        }
    }
}
