//! Behavior learning service: folds completion, postponement, and slider
//! events into the behavior profile through an injected profile store.
//!
//! Every update is a bounded moving average or a capped counter, so one
//! noisy day cannot wreck the model. Applying the same event twice shifts
//! the averages twice: event delivery must be exactly-once. Concurrent
//! sessions writing the same profile race last-write-wins; the store gives
//! no stronger guarantee.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::profile::{BehaviorProfile, CompletionStreak, EnergyPattern};
use crate::task::Task;

/// Weight of a new observation when blending into an existing average.
const BLEND_WEIGHT: f64 = 0.15;
/// Rolling window of streak days kept on the profile.
const STREAK_WINDOW_DAYS: usize = 30;
/// Stated postpone reasons kept per load bucket.
const REASON_CAP: usize = 5;
/// Hour buckets needed before peak hours are recomputed.
const PEAK_MIN_PATTERNS: usize = 6;
/// Samples an hour needs before it counts toward the peak window.
const PEAK_MIN_SAMPLES: u32 = 2;
/// Recent tasks needed before switch sensitivity is recomputed.
const SENSITIVITY_MIN_TASKS: usize = 10;

/// Repository interface for profile persistence. Injected so the learning
/// service never reaches into ambient state.
pub trait ProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<BehaviorProfile>>;
    fn save(&mut self, user_id: &str, profile: &BehaviorProfile) -> Result<()>;
}

/// A discrete behavior observation.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorEvent {
    TaskCompleted {
        task: Task,
        /// Minutes actually spent.
        actual_minutes: u32,
        /// Local hour of completion, 0-23.
        hour: u8,
        energy: u8,
        focus: u8,
        date: NaiveDate,
    },
    TaskPostponed {
        task: Task,
        date: NaiveDate,
        reason: Option<String>,
    },
    SlidersChanged {
        energy: u8,
        focus: u8,
        hour: u8,
    },
}

pub struct LearningService<S: ProfileStore> {
    store: S,
}

impl<S: ProfileStore> LearningService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load-modify-save one event into the user's profile, creating a
    /// default profile on first use.
    pub fn apply(
        &mut self,
        user_id: &str,
        event: &BehaviorEvent,
        now: DateTime<Utc>,
    ) -> Result<BehaviorProfile> {
        let mut profile = self.store.load(user_id)?.unwrap_or_default();
        apply_event(&mut profile, event);
        profile.updated_at = now;
        self.store.save(user_id, &profile)?;
        Ok(profile)
    }

    /// Recompute context-switch sensitivity from the caller's recent task
    /// history (chronological, completed flags intact). A no-op below the
    /// sample threshold.
    pub fn refresh_switch_sensitivity(
        &mut self,
        user_id: &str,
        recent: &[Task],
        now: DateTime<Utc>,
    ) -> Result<Option<f64>> {
        let Some(sensitivity) = switch_sensitivity(recent) else {
            return Ok(None);
        };
        let mut profile = self.store.load(user_id)?.unwrap_or_default();
        profile.context_switch_sensitivity = sensitivity;
        profile.updated_at = now;
        self.store.save(user_id, &profile)?;
        Ok(Some(sensitivity))
    }
}

/// Pure event fold, exposed for tests and replay tooling.
pub fn apply_event(profile: &mut BehaviorProfile, event: &BehaviorEvent) {
    match event {
        BehaviorEvent::TaskCompleted { actual_minutes, hour, energy, focus, date, .. } => {
            update_energy_pattern(&mut profile.energy_patterns, *hour, *energy, *focus);
            update_streak(&mut profile.completion_streaks, *date, true, Some(*actual_minutes));
            profile.preferred_task_duration =
                blend_preferred_duration(profile.preferred_task_duration, *actual_minutes);
            recompute_peak_hours(profile);
        }
        BehaviorEvent::TaskPostponed { task, date, reason } => {
            let pattern = profile
                .postpone_patterns
                .entry(task.cognitive_load.level())
                .or_default();
            pattern.count += 1;
            pattern.avg_postpone_count =
                (pattern.avg_postpone_count + f64::from(task.postpone_count)) / 2.0;
            if let Some(reason) = reason {
                pattern.recent_reasons.push(reason.clone());
                let overflow = pattern.recent_reasons.len().saturating_sub(REASON_CAP);
                if overflow > 0 {
                    pattern.recent_reasons.drain(..overflow);
                }
            }
            update_streak(&mut profile.completion_streaks, *date, false, None);
        }
        BehaviorEvent::SlidersChanged { energy, focus, hour } => {
            update_energy_pattern(&mut profile.energy_patterns, *hour, *energy, *focus);
            recompute_peak_hours(profile);
        }
    }
}

/// Incremental per-hour mean of energy and focus.
pub fn update_energy_pattern(patterns: &mut Vec<EnergyPattern>, hour: u8, energy: u8, focus: u8) {
    match patterns.iter_mut().find(|p| p.hour == hour) {
        Some(p) => {
            let n = f64::from(p.samples);
            p.avg_energy = (p.avg_energy * n + f64::from(energy)) / (n + 1.0);
            p.avg_focus = (p.avg_focus * n + f64::from(focus)) / (n + 1.0);
            p.samples += 1;
        }
        None => {
            patterns.push(EnergyPattern {
                hour,
                avg_energy: f64::from(energy),
                avg_focus: f64::from(focus),
                samples: 1,
            });
            patterns.sort_by_key(|p| p.hour);
        }
    }
}

/// Bump the day's streak counters; keep the window to the most recent days.
pub fn update_streak(
    streaks: &mut Vec<CompletionStreak>,
    date: NaiveDate,
    completed: bool,
    actual_minutes: Option<u32>,
) {
    match streaks.iter_mut().find(|s| s.date == date) {
        Some(s) => {
            if completed {
                s.completed += 1;
            } else {
                s.postponed += 1;
            }
            if let Some(minutes) = actual_minutes {
                s.avg_completion_min = if s.avg_completion_min == 0.0 {
                    f64::from(minutes)
                } else {
                    s.avg_completion_min * (1.0 - BLEND_WEIGHT) + f64::from(minutes) * BLEND_WEIGHT
                };
            }
        }
        None => {
            streaks.push(CompletionStreak {
                date,
                completed: u32::from(completed),
                postponed: u32::from(!completed),
                avg_completion_min: actual_minutes.map_or(0.0, f64::from),
            });
        }
    }

    streaks.sort_by(|a, b| b.date.cmp(&a.date));
    streaks.truncate(STREAK_WINDOW_DAYS);
}

/// Blend the preferred session length toward an actual completion,
/// clamped to a sane range.
pub fn blend_preferred_duration(current: u32, actual_minutes: u32) -> u32 {
    let blended =
        f64::from(current) * (1.0 - BLEND_WEIGHT) + f64::from(actual_minutes) * BLEND_WEIGHT;
    (blended.round() as i64).clamp(10, 120) as u32
}

/// Recompute the peak window once enough hour buckets exist: the top 3
/// hours by combined energy+focus (among hours with enough samples), taken
/// as a contiguous span. Returns whether the window moved.
pub fn recompute_peak_hours(profile: &mut BehaviorProfile) -> bool {
    if profile.energy_patterns.len() < PEAK_MIN_PATTERNS {
        return false;
    }

    let mut scored: Vec<(u8, f64)> = profile
        .energy_patterns
        .iter()
        .filter(|p| p.samples >= PEAK_MIN_SAMPLES)
        .map(|p| (p.hour, p.avg_energy + p.avg_focus))
        .collect();
    if scored.is_empty() {
        return false;
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut top: Vec<u8> = scored.iter().take(3).map(|(h, _)| *h).collect();
    top.sort_unstable();

    let start = top[0];
    let end = top[top.len() - 1] + 1;
    let moved = profile.peak_start_hour != start || profile.peak_end_hour != end;
    profile.peak_start_hour = start;
    profile.peak_end_hour = end;
    moved
}

/// Context-switch sensitivity from recent task history: how much completion
/// rates drop on context switches compared to staying in context. `None`
/// below the sample threshold.
pub fn switch_sensitivity(recent: &[Task]) -> Option<f64> {
    if recent.len() < SENSITIVITY_MIN_TASKS {
        return None;
    }

    let mut switches = 0u32;
    let mut switch_completions = 0u32;
    let mut stay_completions = 0u32;

    for pair in recent.windows(2) {
        let is_switch = pair[0].context_type != pair[1].context_type;
        if is_switch {
            switches += 1;
            if pair[1].completed {
                switch_completions += 1;
            }
        } else if pair[1].completed {
            stay_completions += 1;
        }
    }

    let switch_rate = if switches > 0 {
        f64::from(switch_completions) / f64::from(switches)
    } else {
        1.0
    };
    let stay_rate = f64::from(stay_completions) / (recent.len() as f64 - f64::from(switches));

    Some((0.5 + (stay_rate - switch_rate)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        profiles: HashMap<String, BehaviorProfile>,
    }

    impl ProfileStore for MemoryStore {
        fn load(&self, user_id: &str) -> Result<Option<BehaviorProfile>> {
            Ok(self.profiles.get(user_id).cloned())
        }

        fn save(&mut self, user_id: &str, profile: &BehaviorProfile) -> Result<()> {
            self.profiles.insert(user_id.to_string(), profile.clone());
            Ok(())
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_event_creates_a_default_profile() {
        let mut svc = LearningService::new(MemoryStore::default());
        let event = BehaviorEvent::TaskCompleted {
            task: Task::new("t", "t"),
            actual_minutes: 25,
            hour: 10,
            energy: 4,
            focus: 4,
            date: date(6),
        };

        let profile = svc.apply("user-1", &event, now()).unwrap();
        assert_eq!(profile.energy_patterns.len(), 1);
        assert_eq!(profile.completion_streaks.len(), 1);
        assert_eq!(profile.updated_at, now());
        assert!(svc.store().load("user-1").unwrap().is_some());
    }

    #[test]
    fn energy_pattern_moving_average() {
        let mut patterns = Vec::new();
        update_energy_pattern(&mut patterns, 10, 4, 2);
        update_energy_pattern(&mut patterns, 10, 2, 4);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].samples, 2);
        assert!((patterns[0].avg_energy - 3.0).abs() < 1e-9);
        assert!((patterns[0].avg_focus - 3.0).abs() < 1e-9);
    }

    #[test]
    fn patterns_stay_sorted_by_hour() {
        let mut patterns = Vec::new();
        update_energy_pattern(&mut patterns, 15, 3, 3);
        update_energy_pattern(&mut patterns, 9, 3, 3);
        let hours: Vec<u8> = patterns.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![9, 15]);
    }

    #[test]
    fn streak_window_is_capped_at_thirty_days() {
        let mut streaks = Vec::new();
        for d in 1..=31 {
            let day = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap() + chrono::Duration::days(d);
            update_streak(&mut streaks, day, true, Some(20));
        }
        assert_eq!(streaks.len(), 30);
        // newest first, oldest day dropped
        assert!(streaks[0].date > streaks[29].date);
        assert_eq!(streaks[29].date, NaiveDate::from_ymd_opt(2026, 7, 3).unwrap());
    }

    #[test]
    fn preferred_duration_blends_and_clamps() {
        assert_eq!(blend_preferred_duration(30, 30), 30);
        // 30 * 0.85 + 90 * 0.15 = 39
        assert_eq!(blend_preferred_duration(30, 90), 39);
        assert_eq!(blend_preferred_duration(10, 1), 10);
        assert_eq!(blend_preferred_duration(120, 500), 120);
    }

    #[test]
    fn postpone_event_updates_bucket_and_streak() {
        let mut profile = BehaviorProfile::default();
        let task = Task::new("t", "t").with_load(4).with_postpones(2);
        apply_event(
            &mut profile,
            &BehaviorEvent::TaskPostponed {
                task: task.clone(),
                date: date(6),
                reason: Some("too tired".to_string()),
            },
        );

        let pattern = profile.postpone_pattern_for(4).unwrap();
        assert_eq!(pattern.count, 1);
        assert!((pattern.avg_postpone_count - 1.0).abs() < 1e-9);
        assert_eq!(pattern.recent_reasons, vec!["too tired"]);
        assert_eq!(profile.completion_streaks[0].postponed, 1);
    }

    #[test]
    fn postpone_reasons_keep_only_the_most_recent() {
        let mut profile = BehaviorProfile::default();
        for i in 0..8 {
            apply_event(
                &mut profile,
                &BehaviorEvent::TaskPostponed {
                    task: Task::new("t", "t").with_load(2),
                    date: date(6),
                    reason: Some(format!("reason-{i}")),
                },
            );
        }
        let reasons = &profile.postpone_pattern_for(2).unwrap().recent_reasons;
        assert_eq!(reasons.len(), 5);
        assert_eq!(reasons[0], "reason-3");
        assert_eq!(reasons[4], "reason-7");
    }

    #[test]
    fn peak_hours_wait_for_enough_data() {
        let mut profile = BehaviorProfile::default();
        for hour in [8, 9, 10] {
            update_energy_pattern(&mut profile.energy_patterns, hour, 5, 5);
            update_energy_pattern(&mut profile.energy_patterns, hour, 5, 5);
        }
        assert!(!recompute_peak_hours(&mut profile));
        assert_eq!(profile.peak_start_hour, 9); // untouched default

        for hour in [14, 15, 16] {
            update_energy_pattern(&mut profile.energy_patterns, hour, 2, 2);
            update_energy_pattern(&mut profile.energy_patterns, hour, 2, 2);
        }
        assert!(recompute_peak_hours(&mut profile));
        assert_eq!(profile.peak_start_hour, 8);
        assert_eq!(profile.peak_end_hour, 11);
    }

    #[test]
    fn peak_hours_ignore_thin_buckets() {
        let mut profile = BehaviorProfile::default();
        // six buckets, but the spiky evening hour has a single sample
        for hour in [8, 9, 10, 11, 12] {
            update_energy_pattern(&mut profile.energy_patterns, hour, 3, 3);
            update_energy_pattern(&mut profile.energy_patterns, hour, 3, 3);
        }
        update_energy_pattern(&mut profile.energy_patterns, 22, 5, 5);

        recompute_peak_hours(&mut profile);
        assert!(profile.peak_end_hour <= 13, "thin 22h bucket must not win");
    }

    #[test]
    fn sensitivity_needs_ten_tasks() {
        let tasks: Vec<Task> = (0..9).map(|i| Task::new(format!("t{i}"), "t")).collect();
        assert_eq!(switch_sensitivity(&tasks), None);
    }

    #[test]
    fn sensitivity_rises_when_switches_kill_completions() {
        // runs of four per context; the switched-to task never completes
        let mut tasks = Vec::new();
        for i in 0..12 {
            let ctx_name = if (4..8).contains(&i) { "b" } else { "a" };
            let mut t = Task::new(format!("t{i}"), "t").with_context(ctx_name);
            if i != 4 && i != 8 {
                t = t.with_completed();
            }
            tasks.push(t);
        }
        let sensitivity = switch_sensitivity(&tasks).unwrap();
        assert!(sensitivity > 0.5);

        // uniform context, everything completes: switches never observed
        let calm: Vec<Task> = (0..12)
            .map(|i| Task::new(format!("c{i}"), "t").with_context("a").with_completed())
            .collect();
        let calm_sensitivity = switch_sensitivity(&calm).unwrap();
        assert!(calm_sensitivity <= 0.5);
    }

    #[test]
    fn refresh_sensitivity_is_noop_below_threshold() {
        let mut svc = LearningService::new(MemoryStore::default());
        let few: Vec<Task> = (0..3).map(|i| Task::new(format!("t{i}"), "t")).collect();
        let out = svc.refresh_switch_sensitivity("u", &few, now()).unwrap();
        assert_eq!(out, None);
        assert!(svc.store().load("u").unwrap().is_none());
    }
}
