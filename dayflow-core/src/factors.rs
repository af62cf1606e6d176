//! Standalone scoring factors: deadline urgency, priority weight,
//! cognitive-load penalty, postpone bonus.
//!
//! Each function is total and monotonic, and they compose into the
//! canonical ordering law:
//!
//! `score = deadline + priority - load_penalty + postpone_bonus`
//!
//! The postpone term is deliberately a *bonus*: a task deferred again and
//! again rises instead of sinking, so chronic avoidance resolves itself.

use chrono::{DateTime, Utc};

use crate::task::{CognitiveLoad, Priority, Task};

/// Deadline urgency, tiered by hours until due.
///
/// No deadline scores the floor; overdue scores the ceiling; in between,
/// tiers strictly decrease as the deadline moves away.
pub fn deadline_score(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(due) = due else {
        return 10.0;
    };

    let hours_until = (due - now).num_minutes() as f64 / 60.0;

    if hours_until < 0.0 {
        150.0
    } else if hours_until < 2.0 {
        100.0
    } else if hours_until < 4.0 {
        80.0
    } else if hours_until < 8.0 {
        60.0
    } else if hours_until < 24.0 {
        40.0
    } else if hours_until < 48.0 {
        30.0
    } else if hours_until < 168.0 {
        15.0
    } else {
        10.0
    }
}

/// Priority weight: level 1 (highest) earns the most.
pub fn priority_score(priority: Priority) -> f64 {
    match priority.level() {
        1 => 50.0,
        2 => 30.0,
        3 => 10.0,
        _ => 5.0,
    }
}

/// Linear penalty for mental effort: each load level costs 2 points, so an
/// easier task wins when everything else is tied.
pub fn cognitive_load_penalty(load: CognitiveLoad) -> f64 {
    f64::from(load.level()) * 2.0
}

/// Linear reward for deferrals: 5 points per postponement, zero at zero.
pub fn postpone_bonus(count: u32) -> f64 {
    f64::from(count) * 5.0
}

/// Per-factor breakdown of a composed score. `cognitive_load` is stored
/// signed (negative), ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorBreakdown {
    pub deadline: f64,
    pub priority: f64,
    pub cognitive_load: f64,
    pub postpone: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScore {
    pub total: f64,
    pub breakdown: FactorBreakdown,
}

/// Compose the four factors for one task.
pub fn task_score(task: &Task, now: DateTime<Utc>) -> FactorScore {
    let deadline = deadline_score(task.due_instant(), now);
    let priority = priority_score(task.priority);
    let load_penalty = cognitive_load_penalty(task.cognitive_load);
    let postpone = postpone_bonus(task.postpone_count);

    FactorScore {
        total: deadline + priority - load_penalty + postpone,
        breakdown: FactorBreakdown {
            deadline,
            priority,
            cognitive_load: -load_penalty,
            postpone,
        },
    }
}
