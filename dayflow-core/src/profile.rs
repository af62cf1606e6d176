//! Per-user behavior profile: the continuously-learned model of
//! productivity patterns the adaptive overlay reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Observed energy/focus for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyPattern {
    /// 0-23.
    pub hour: u8,
    pub avg_energy: f64,
    pub avg_focus: f64,
    pub samples: u32,
}

impl EnergyPattern {
    /// Mean of the learned energy and focus for this hour.
    pub fn state_level(&self) -> f64 {
        (self.avg_energy + self.avg_focus) / 2.0
    }
}

/// Completion bookkeeping for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionStreak {
    pub date: NaiveDate,
    pub completed: u32,
    pub postponed: u32,
    /// Minutes, blended over the day's completions.
    #[serde(default)]
    pub avg_completion_min: f64,
}

impl CompletionStreak {
    pub fn completion_rate(&self) -> f64 {
        let total = self.completed + self.postponed;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(total)
    }
}

/// Postponement history for one cognitive-load bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostponePattern {
    pub count: u32,
    pub avg_postpone_count: f64,
    /// Most recent stated reasons, capped.
    #[serde(default)]
    pub recent_reasons: Vec<String>,
}

/// The per-user behavior model. Created with defaults on first use, updated
/// incrementally by the learning service, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Peak productivity window, start hour inclusive.
    pub peak_start_hour: u8,
    /// End hour, exclusive.
    pub peak_end_hour: u8,
    /// Minutes.
    pub preferred_task_duration: u32,
    /// 0-1; how much context switches hurt this user.
    pub context_switch_sensitivity: f64,
    /// Keyed by cognitive-load level 1..=5.
    #[serde(default)]
    pub postpone_patterns: HashMap<u8, PostponePattern>,
    /// Sorted by hour.
    #[serde(default)]
    pub energy_patterns: Vec<EnergyPattern>,
    /// Sorted by date, newest first; rolling 30 days.
    #[serde(default)]
    pub completion_streaks: Vec<CompletionStreak>,
    pub updated_at: DateTime<Utc>,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self {
            peak_start_hour: 9,
            peak_end_hour: 12,
            preferred_task_duration: 30,
            context_switch_sensitivity: 0.5,
            postpone_patterns: HashMap::new(),
            energy_patterns: Vec::new(),
            completion_streaks: Vec::new(),
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl BehaviorProfile {
    pub fn in_peak_window(&self, hour: u8) -> bool {
        hour >= self.peak_start_hour && hour < self.peak_end_hour
    }

    pub fn energy_pattern_at(&self, hour: u8) -> Option<&EnergyPattern> {
        self.energy_patterns.iter().find(|p| p.hour == hour)
    }

    pub fn postpone_pattern_for(&self, load_level: u8) -> Option<&PostponePattern> {
        self.postpone_patterns.get(&load_level)
    }

    /// Mean completion rate over the `days` most recent streak days.
    pub fn recent_completion_rate(&self, days: usize) -> Option<f64> {
        if self.completion_streaks.is_empty() {
            return None;
        }
        let recent: Vec<f64> = self
            .completion_streaks
            .iter()
            .take(days)
            .map(CompletionStreak::completion_rate)
            .collect();
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_documented_values() {
        let p = BehaviorProfile::default();
        assert_eq!(p.peak_start_hour, 9);
        assert_eq!(p.peak_end_hour, 12);
        assert_eq!(p.preferred_task_duration, 30);
        assert_eq!(p.context_switch_sensitivity, 0.5);
        assert!(p.energy_patterns.is_empty());
    }

    #[test]
    fn peak_window_end_is_exclusive() {
        let p = BehaviorProfile::default();
        assert!(p.in_peak_window(9));
        assert!(p.in_peak_window(11));
        assert!(!p.in_peak_window(12));
        assert!(!p.in_peak_window(8));
    }

    #[test]
    fn completion_rate_handles_empty_day() {
        let s = CompletionStreak {
            date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            completed: 0,
            postponed: 0,
            avg_completion_min: 0.0,
        };
        assert_eq!(s.completion_rate(), 0.0);

        let s2 = CompletionStreak { completed: 3, postponed: 1, ..s };
        assert_eq!(s2.completion_rate(), 0.75);
    }

    #[test]
    fn recent_completion_rate_averages_newest_days() {
        let day = |d: u32, done: u32, pushed: u32| CompletionStreak {
            date: NaiveDate::from_ymd_opt(2026, 8, d).unwrap(),
            completed: done,
            postponed: pushed,
            avg_completion_min: 0.0,
        };
        let mut p = BehaviorProfile::default();
        assert_eq!(p.recent_completion_rate(3), None);

        p.completion_streaks = vec![day(6, 4, 0), day(5, 1, 1), day(4, 0, 2), day(3, 9, 0)];
        let rate = p.recent_completion_rate(3).unwrap();
        assert!((rate - (1.0 + 0.5 + 0.0) / 3.0).abs() < 1e-9);
    }
}
