//! Estimation scoring.
//!
//! A completed, estimated task scores `(estimate - actual) * multiplier`
//! (both in minutes), with `multiplier = 100 / (estimate + 10)`. Shorter
//! estimates earn a larger multiplier.

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use crate::io::score_store::{ScoreHistory, read_score_history, write_score_history};
use crate::model::{DailyScore, DayList, Task};

/// `100 / (estimate_minutes + 10)`
pub fn calculate_efficiency_multiplier(estimated_seconds: u64) -> f64 {
    let minutes = estimated_seconds as f64 / 60.0;
    100.0 / (minutes + 10.0)
}

/// 0.0 for open or unestimated tasks
pub fn calculate_task_score(task: &Task) -> f64 {
    let Some(estimated) = task.estimated_seconds else {
        return 0.0;
    };
    if !task.completed {
        return 0.0;
    }
    let delta = estimated as f64 / 60.0 - task.actual_seconds as f64 / 60.0;
    delta * calculate_efficiency_multiplier(estimated)
}

/// Daily score history with optional persistence
#[derive(Debug, Clone, Default)]
pub struct ScoringSystem {
    history: ScoreHistory,
    path: Option<PathBuf>,
}

impl ScoringSystem {
    pub fn in_memory() -> Self {
        ScoringSystem::default()
    }

    /// Load history from `path` (empty if missing or corrupt)
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        ScoringSystem {
            history: read_score_history(&path),
            path: Some(path),
        }
    }

    /// Score `list` and record the result for its date, replacing any
    /// earlier score for that day.
    pub fn calculate_daily_score(&mut self, list: &DayList) -> DailyScore {
        let mut score = DailyScore::empty(list.date);

        for task in list.tasks().filter(|t| t.completed) {
            score.tasks_completed += 1;
            let Some(estimated) = task.estimated_seconds else {
                continue;
            };
            score.total_score += calculate_task_score(task);
            score.total_estimated_minutes = score.total_estimated_minutes.saturating_add(estimated / 60);
            score.total_actual_minutes = score.total_actual_minutes.saturating_add(task.actual_seconds / 60);
            if task.actual_seconds <= estimated {
                score.tasks_beat_estimate += 1;
            } else {
                score.tasks_over_estimate += 1;
            }
        }

        if score.total_estimated_minutes > 0 {
            score.efficiency_ratio =
                score.total_actual_minutes as f64 / score.total_estimated_minutes as f64;
        }

        debug!(date = %list.date, total = score.total_score, "scored day");
        self.record_score(score.clone());
        score
    }

    /// Store a score under its date and persist the history
    pub fn record_score(&mut self, score: DailyScore) {
        let key = score.date.format("%Y-%m-%d").to_string();
        self.history.daily_scores.insert(key, score);
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_score_history(path, &self.history) {
            warn!(path = %path.display(), error = %e, "could not persist score history");
        }
    }

    pub fn get_daily_score(&self, date: NaiveDate) -> Option<&DailyScore> {
        self.history
            .daily_scores
            .get(&date.format("%Y-%m-%d").to_string())
    }

    /// Consecutive days with a positive score, counting back from `date`.
    /// A missing day or a score of zero or less ends the streak.
    pub fn get_streak(&self, date: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut check = Some(date);
        while let Some(day) = check {
            match self.get_daily_score(day) {
                Some(score) if score.total_score > 0.0 => streak += 1,
                _ => break,
            }
            check = day.checked_sub_days(Days::new(1));
        }
        streak
    }

    /// Mean efficiency ratio over the `days` most recent scored days, or 1.0
    /// when nothing has been scored.
    pub fn get_average_efficiency(&self, days: usize) -> f64 {
        // Keys are ISO dates, so map order is date order.
        let recent: Vec<f64> = self
            .history
            .daily_scores
            .values()
            .rev()
            .take(days)
            .map(|s| s.efficiency_ratio)
            .collect();
        if recent.is_empty() {
            return 1.0;
        }
        recent.iter().sum::<f64>() / recent.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;
    use tempfile::TempDir;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, n).unwrap()
    }

    fn finished(estimated: Option<u64>, actual: u64) -> Task {
        Task {
            content: "Work".into(),
            completed: true,
            estimated_seconds: estimated,
            actual_seconds: actual,
            ..Default::default()
        }
    }

    fn scored(date: NaiveDate, total: f64) -> DailyScore {
        DailyScore {
            total_score: total,
            ..DailyScore::empty(date)
        }
    }

    #[test]
    fn multiplier_values() {
        assert_eq!(calculate_efficiency_multiplier(600), 5.0);
        assert!((calculate_efficiency_multiplier(3600) - 100.0 / 70.0).abs() < 1e-9);
        assert!(calculate_efficiency_multiplier(300) > calculate_efficiency_multiplier(600));
    }

    #[test]
    fn task_scores() {
        assert_eq!(calculate_task_score(&finished(Some(600), 300)), 25.0);
        assert_eq!(calculate_task_score(&finished(Some(600), 900)), -25.0);
        assert_eq!(calculate_task_score(&finished(Some(600), 600)), 0.0);
        assert_eq!(calculate_task_score(&finished(None, 300)), 0.0);

        let mut open = finished(Some(600), 300);
        open.completed = false;
        assert_eq!(calculate_task_score(&open), 0.0);
    }

    #[test]
    fn daily_score_counts_and_ratio() {
        let mut list = DayList::new(day(9));
        list.entries.push(Entry::from_task(finished(Some(600), 300), 0));
        list.entries.push(Entry::from_task(finished(Some(600), 900), 0));
        list.entries.push(Entry::from_task(finished(None, 100), 0));
        list.entries.push(Entry::task("Open", 0));
        list.entries.push(Entry::divider(None, 0));

        let mut scoring = ScoringSystem::in_memory();
        let score = scoring.calculate_daily_score(&list);
        assert_eq!(score.total_score, 0.0);
        assert_eq!(score.tasks_completed, 3);
        assert_eq!(score.tasks_beat_estimate, 1);
        assert_eq!(score.tasks_over_estimate, 1);
        assert_eq!(score.total_estimated_minutes, 20);
        assert_eq!(score.total_actual_minutes, 20);
        assert_eq!(score.efficiency_ratio, 1.0);
        assert_eq!(scoring.get_daily_score(day(9)), Some(&score));
    }

    #[test]
    fn minutes_are_truncated() {
        let mut list = DayList::new(day(9));
        list.entries.push(Entry::from_task(finished(Some(600), 659), 0));
        let score = ScoringSystem::in_memory().calculate_daily_score(&list);
        assert_eq!(score.total_actual_minutes, 10);
        assert_eq!(score.tasks_over_estimate, 1);
        assert!(score.total_score < 0.0);
    }

    #[test]
    fn recalculation_replaces_previous_score() {
        let mut scoring = ScoringSystem::in_memory();
        let mut list = DayList::new(day(9));
        list.entries.push(Entry::from_task(finished(Some(600), 300), 0));
        scoring.calculate_daily_score(&list);
        scoring.calculate_daily_score(&list);
        assert_eq!(scoring.get_daily_score(day(9)).unwrap().total_score, 25.0);
    }

    #[test]
    fn streak_breaks_on_negative_day() {
        let mut scoring = ScoringSystem::in_memory();
        scoring.record_score(scored(day(9), 10.0));
        scoring.record_score(scored(day(8), -5.0));
        scoring.record_score(scored(day(7), 10.0));
        assert_eq!(scoring.get_streak(day(9)), 1);
    }

    #[test]
    fn streak_counts_consecutive_positive_days() {
        let mut scoring = ScoringSystem::in_memory();
        for n in 6..=9 {
            scoring.record_score(scored(day(n), 5.0));
        }
        assert_eq!(scoring.get_streak(day(9)), 4);
        assert_eq!(scoring.get_streak(day(10)), 0);
    }

    #[test]
    fn zero_score_breaks_streak() {
        let mut scoring = ScoringSystem::in_memory();
        scoring.record_score(scored(day(9), 0.0));
        scoring.record_score(scored(day(8), 10.0));
        assert_eq!(scoring.get_streak(day(9)), 0);
        assert_eq!(scoring.get_streak(day(8)), 1);
    }

    #[test]
    fn average_efficiency_uses_most_recent_days() {
        let mut scoring = ScoringSystem::in_memory();
        assert_eq!(scoring.get_average_efficiency(7), 1.0);

        for (n, ratio) in [(1, 4.0), (2, 1.0), (3, 0.5)] {
            scoring.record_score(DailyScore {
                efficiency_ratio: ratio,
                ..DailyScore::empty(day(n))
            });
        }
        assert_eq!(scoring.get_average_efficiency(2), 0.75);
        assert_eq!(scoring.get_average_efficiency(7), 5.5 / 3.0);
    }

    #[test]
    fn history_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats/stats.json");
        {
            let mut scoring = ScoringSystem::load(&path);
            scoring.record_score(scored(day(9), 12.5));
        }
        let scoring = ScoringSystem::load(&path);
        assert_eq!(scoring.get_daily_score(day(9)).unwrap().total_score, 12.5);
        assert_eq!(scoring.get_streak(day(9)), 1);
    }
}
