//! Adaptive scoring overlay: recomputes a task's score with
//! personalization from the behavior profile and reports how much the
//! profile can be trusted.
//!
//! Score and confidence are computed separately. Confidence grows with the
//! amount of history behind the profile, capped at 1.0, so callers can
//! discount low-confidence personalization instead of trusting it blindly.

use chrono::{DateTime, Utc};

use crate::profile::BehaviorProfile;
use crate::task::{DayContext, Task};

/// Grouped contributions, in the order they are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdaptiveBreakdown {
    pub base: f64,
    pub contextual: f64,
    pub predictive: f64,
    pub momentum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveScore {
    pub task_id: String,
    pub total: f64,
    pub breakdown: AdaptiveBreakdown,
    /// 0-1; how much history backs this score.
    pub confidence: f64,
    pub reasoning: Vec<String>,
}

/// Score one task with personalization.
///
/// `recent` is the user's recently completed tasks in chronological order;
/// `hour` is the local hour of day the session runs in. The profile is a
/// snapshot parameter, never ambient state.
pub fn adaptive_score(
    task: &Task,
    ctx: &DayContext,
    profile: &BehaviorProfile,
    recent: &[Task],
    now: DateTime<Utc>,
    hour: u8,
) -> AdaptiveScore {
    let mut reasoning = Vec::new();
    let mut breakdown = AdaptiveBreakdown::default();

    breakdown.base = enhanced_base(task, ctx, &mut reasoning);
    breakdown.contextual -= context_switch_cost(task, recent, profile, &mut reasoning);
    breakdown.contextual += time_of_day_fit(task, ctx, profile, hour, &mut reasoning);
    breakdown.predictive += completion_probability(task, profile, &mut reasoning);
    breakdown.momentum += momentum_bonus(task, recent, &mut reasoning);
    breakdown.contextual -= event_proximity_penalty(task, ctx, now, &mut reasoning);

    let total =
        (breakdown.base + breakdown.contextual + breakdown.predictive + breakdown.momentum).max(0.0);

    AdaptiveScore {
        task_id: task.id.clone(),
        total,
        breakdown,
        confidence: confidence(profile, recent.len()),
        reasoning,
    }
}

fn enhanced_base(task: &Task, ctx: &DayContext, reasoning: &mut Vec<String>) -> f64 {
    let mut score = 0.0;

    // priority with superlinear scaling; level 1 carries magnitude 4
    let magnitude = f64::from(5 - task.priority.level());
    score += magnitude.powf(1.5) * 8.0;
    if task.priority.level() == 1 {
        reasoning.push("top-priority task".to_string());
    }

    if let Some(due) = task.due_date {
        let days_until = due.signed_duration_since(ctx.today).num_days();
        if days_until < 0 {
            score += 50.0;
            reasoning.push(format!("overdue by {} day(s)", -days_until));
        } else if days_until == 0 {
            score += 35.0;
            reasoning.push("deadline today".to_string());
        } else if days_until == 1 {
            score += 20.0;
            reasoning.push("deadline tomorrow".to_string());
        } else if days_until <= 3 {
            score += 10.0;
        }
    }

    if task.is_must {
        score += 30.0;
        reasoning.push("pinned as MUST".to_string());
    }
    if task.is_important {
        score += 15.0;
    }

    score
}

fn context_switch_cost(
    task: &Task,
    recent: &[Task],
    profile: &BehaviorProfile,
    reasoning: &mut Vec<String>,
) -> f64 {
    let Some(last) = recent.last() else {
        return 0.0;
    };

    if let (Some(last_ctx), Some(task_ctx)) = (&last.context_type, &task.context_type) {
        if last_ctx != task_ctx {
            let cost = 15.0 * profile.context_switch_sensitivity;
            if cost > 5.0 {
                reasoning.push(format!("context switch from \"{last_ctx}\" to \"{task_ctx}\""));
            }
            return cost;
        }
    }

    let load_delta =
        i16::from(task.cognitive_load.level()) - i16::from(last.cognitive_load.level());
    if load_delta.abs() >= 3 {
        reasoning.push("large cognitive-load jump".to_string());
        return 10.0 * profile.context_switch_sensitivity;
    }

    0.0
}

fn time_of_day_fit(
    task: &Task,
    ctx: &DayContext,
    profile: &BehaviorProfile,
    hour: u8,
    reasoning: &mut Vec<String>,
) -> f64 {
    let mut bonus = 0.0;
    let load = f64::from(task.cognitive_load.level());

    if profile.in_peak_window(hour) {
        if task.cognitive_load.level() >= 4 {
            bonus += 15.0;
            reasoning.push("hard task in the peak-productivity window".to_string());
        } else if task.cognitive_load.level() <= 2 {
            // peak hours are too valuable for trivial work
            bonus -= 5.0;
        }
    }

    if let Some(pattern) = profile.energy_pattern_at(hour) {
        bonus += (5.0 - (pattern.state_level() - load).abs()) * 2.0;
    }

    let state_diff = (ctx.state_level() - load).abs();
    if state_diff <= 1.0 {
        bonus += 10.0;
        reasoning.push("matches current energy and focus".to_string());
    } else if state_diff >= 3.0 {
        bonus -= 8.0;
        if ctx.state_level() < load {
            reasoning.push("too demanding for the current state".to_string());
        }
    }

    bonus
}

fn completion_probability(
    task: &Task,
    profile: &BehaviorProfile,
    reasoning: &mut Vec<String>,
) -> f64 {
    let mut adjustment = 0.0;

    if task.postpone_count >= 3 {
        let pattern = profile.postpone_pattern_for(task.cognitive_load.level());
        match pattern {
            Some(p) if p.avg_postpone_count > 2.0 => {
                adjustment -= 20.0;
                reasoning.push(format!(
                    "tasks at this load level keep getting postponed ({}x so far)",
                    task.postpone_count
                ));
            }
            _ => {
                // no bad pattern behind it: escalate instead of burying it
                adjustment += 10.0;
                reasoning.push("time to finally do this one".to_string());
            }
        }
    }

    let preferred = f64::from(profile.preferred_task_duration);
    let estimate = f64::from(task.estimate_min);
    if (estimate - preferred).abs() <= 10.0 {
        adjustment += 8.0;
        reasoning.push("length matches the preferred session size".to_string());
    } else if estimate > preferred * 2.0 {
        adjustment -= 10.0;
    }

    if let Some(rate) = profile.recent_completion_rate(3) {
        if rate > 0.7 {
            adjustment += 5.0;
            reasoning.push("completion streak going strong".to_string());
        }
    }

    adjustment
}

fn momentum_bonus(task: &Task, recent: &[Task], reasoning: &mut Vec<String>) -> f64 {
    if recent.is_empty() {
        return 0.0;
    }

    let mut bonus = 0.0;
    let window = &recent[recent.len().saturating_sub(3)..];

    let same_context = window
        .iter()
        .filter(|t| t.context_type == task.context_type && task.context_type.is_some())
        .count();
    if same_context >= 2 {
        bonus += 12.0;
        if let Some(ctx_name) = &task.context_type {
            reasoning.push(format!("momentum in the \"{ctx_name}\" context"));
        }
    }

    let similar_load = window
        .iter()
        .filter(|t| {
            (i16::from(t.cognitive_load.level()) - i16::from(task.cognitive_load.level())).abs() <= 1
        })
        .count();
    if similar_load >= 2 {
        bonus += 8.0;
        reasoning.push("keeps a run of similar tasks going".to_string());
    }

    bonus
}

fn event_proximity_penalty(
    task: &Task,
    ctx: &DayContext,
    now: DateTime<Utc>,
    reasoning: &mut Vec<String>,
) -> f64 {
    let task_end = now + chrono::Duration::minutes(i64::from(task.estimate_min));

    for event in &ctx.events {
        let minutes_until = (event.start - now).num_minutes();

        if event.start < task_end && event.start > now {
            reasoning.push(format!(
                "meeting in {minutes_until} min would interrupt this task"
            ));
            return 25.0;
        }

        if minutes_until > 0 && minutes_until < i64::from(task.estimate_min) {
            reasoning.push(format!(
                "not enough room before the meeting ({minutes_until} min)"
            ));
            return 15.0;
        }
    }

    0.0
}

/// Confidence in the personalization, from the amount of history available.
fn confidence(profile: &BehaviorProfile, recent_task_count: usize) -> f64 {
    let mut confidence: f64 = 0.5;

    if profile.energy_patterns.len() >= 12 {
        confidence += 0.2;
    } else if profile.energy_patterns.len() >= 6 {
        confidence += 0.1;
    }

    if profile.completion_streaks.len() >= 7 {
        confidence += 0.15;
    } else if profile.completion_streaks.len() >= 3 {
        confidence += 0.1;
    }

    if recent_task_count >= 5 {
        confidence += 0.15;
    } else if recent_task_count >= 2 {
        confidence += 0.1;
    }

    confidence.min(1.0)
}
