//! Recommendation generator: turns a ranked task list plus the day context
//! into proactive, explainable suggestions.
//!
//! Every detector is an independent total function returning at most one
//! recommendation; the generator runs all of them and filters conflicts, so
//! one detector coming up empty (or refusing odd input) can never blank the
//! whole list.

use chrono::{DateTime, NaiveDate, Utc};

use crate::profile::BehaviorProfile;
use crate::proposal::{Proposal, ProposalAction};
use crate::score::{score_task, ScoreStrategy};
use crate::settings::PlannerSettings;
use crate::task::{DayContext, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    Batch,
    Move,
    Reorder,
    Decompose,
    Defer,
    ReserveMorning,
    SuggestBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn weight(&self) -> f64 {
        match self {
            Impact::High => 3.0,
            Impact::Medium => 2.0,
            Impact::Low => 1.0,
        }
    }
}

/// Projected effect of accepting a recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedOutcome {
    pub time_saved_min: u32,
    /// 0-1.
    pub stress_reduction: f64,
    /// 0-1.
    pub completion_probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmartRecommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub reasoning: Vec<String>,
    /// 0-1.
    pub confidence: f64,
    pub impact: Impact,
    pub actions: Vec<ProposalAction>,
    pub expected: ExpectedOutcome,
}

impl SmartRecommendation {
    /// Ordering key for conflict resolution: impact class, then confidence.
    pub fn rank_weight(&self) -> f64 {
        self.impact.weight() * self.confidence
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.task_id.as_str()).collect()
    }
}

/// Session facts the detectors need beyond the day context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationContext {
    pub today: NaiveDate,
    /// Free working minutes left today.
    pub available_minutes: u32,
}

/// Run every detector over the ranked task list, order the hits by
/// impact-then-confidence, and drop the ones that fight over a task.
pub fn generate_recommendations(
    tasks: &[Task],
    ctx: &DayContext,
    profile: &BehaviorProfile,
    rc: &RecommendationContext,
) -> Vec<SmartRecommendation> {
    let mut recs: Vec<SmartRecommendation> = [
        detect_batch(tasks, rc),
        detect_energy_mismatch(tasks, ctx, rc),
        detect_decompose(tasks, profile),
        detect_reorder(tasks, ctx),
        detect_defer(tasks, rc),
        detect_break(tasks, ctx),
    ]
    .into_iter()
    .flatten()
    .collect();

    recs.sort_by(|a, b| b.rank_weight().total_cmp(&a.rank_weight()));
    filter_conflicts(recs)
}

/// Keep a recommendation only if none of its task ids were claimed by a
/// higher-ranked one. Losers are dropped, not deferred.
pub fn filter_conflicts(recs: Vec<SmartRecommendation>) -> Vec<SmartRecommendation> {
    let mut claimed: Vec<String> = Vec::new();
    let mut kept = Vec::new();

    for rec in recs {
        let ids = rec.task_ids();
        if ids.iter().any(|id| claimed.iter().any(|c| c == id)) {
            continue;
        }
        claimed.extend(ids.into_iter().map(str::to_string));
        kept.push(rec);
    }

    kept
}

/// Batch: three or more open tasks share a context and fit the remaining
/// time together.
pub fn detect_batch(tasks: &[Task], rc: &RecommendationContext) -> Option<SmartRecommendation> {
    // first-seen group order keeps the detector deterministic
    let mut groups: Vec<(&str, Vec<&Task>)> = Vec::new();
    for task in tasks.iter().filter(|t| !t.completed) {
        let Some(ctx_name) = task.context_type.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == ctx_name) {
            Some((_, group)) => group.push(task),
            None => groups.push((ctx_name, vec![task])),
        }
    }

    for (ctx_name, group) in groups {
        if group.len() < 3 {
            continue;
        }
        let total: u32 = group.iter().map(|t| t.estimate_min).sum();
        if total > rc.available_minutes {
            continue;
        }

        let actions = group
            .iter()
            .enumerate()
            .map(|(i, t)| ProposalAction::reorder(&t.id, i as u32))
            .collect();

        return Some(SmartRecommendation {
            kind: RecommendationKind::Batch,
            title: format!("Batch {} \"{ctx_name}\" tasks together", group.len()),
            reasoning: vec![
                format!("{} open tasks share the \"{ctx_name}\" context", group.len()),
                "running them back to back avoids repeated context switches".to_string(),
                format!("combined time: {total} min"),
            ],
            confidence: 0.85,
            impact: Impact::High,
            actions,
            expected: ExpectedOutcome {
                time_saved_min: group.len() as u32 * 5,
                stress_reduction: 0.3,
                completion_probability: 0.8,
            },
        });
    }

    None
}

/// Energy mismatch: a task's load sits far from the current state. Too-hard
/// tasks get a move action; too-easy is surfaced as awareness only.
pub fn detect_energy_mismatch(
    tasks: &[Task],
    ctx: &DayContext,
    rc: &RecommendationContext,
) -> Option<SmartRecommendation> {
    let state = ctx.state_level();
    let worst = tasks
        .iter()
        .filter(|t| !t.completed)
        .find(|t| (f64::from(t.cognitive_load.level()) - state).abs() >= 3.0)?;

    let too_hard = f64::from(worst.cognitive_load.level()) > state;
    let tomorrow = rc.today.succ_opt()?;

    let actions = if too_hard {
        vec![ProposalAction::move_task(&worst.id, rc.today, tomorrow)]
    } else {
        Vec::new()
    };

    Some(SmartRecommendation {
        kind: RecommendationKind::Move,
        title: if too_hard {
            format!("\"{}\" is too demanding right now", worst.title)
        } else {
            "You could take on harder work".to_string()
        },
        reasoning: vec![
            if too_hard {
                format!("\"{}\" needs more than the current state offers", worst.title)
            } else {
                "current energy and focus leave headroom for heavier tasks".to_string()
            },
            format!("current state: {}/5 energy, {}/5 focus", ctx.energy, ctx.focus),
            format!("task load: {}/5", worst.cognitive_load.level()),
        ],
        confidence: 0.75,
        impact: if too_hard { Impact::High } else { Impact::Medium },
        actions,
        expected: ExpectedOutcome {
            time_saved_min: 0,
            stress_reduction: if too_hard { 0.4 } else { 0.1 },
            completion_probability: if too_hard { 0.7 } else { 0.85 },
        },
    })
}

/// Decompose: a long, repeatedly postponed task without subtasks.
pub fn detect_decompose(
    tasks: &[Task],
    profile: &BehaviorProfile,
) -> Option<SmartRecommendation> {
    let candidate = tasks.iter().filter(|t| !t.completed).find(|t| {
        t.estimate_min > profile.preferred_task_duration * 2
            && t.postpone_count >= 2
            && !t.has_subtasks
    })?;

    let target = profile.preferred_task_duration.min(25);

    Some(SmartRecommendation {
        kind: RecommendationKind::Decompose,
        title: format!("Break \"{}\" into smaller pieces", candidate.title),
        reasoning: vec![
            format!("\"{}\" is long ({} min)", candidate.title, candidate.estimate_min),
            format!("it has already been postponed {}x", candidate.postpone_count),
            format!("sessions of {target} min are far easier to start"),
        ],
        confidence: 0.8,
        impact: Impact::High,
        actions: vec![ProposalAction::decompose(&candidate.id, target)],
        expected: ExpectedOutcome {
            time_saved_min: 0,
            stress_reduction: 0.5,
            completion_probability: 0.75,
        },
    })
}

/// Reorder: both sliders high, a light task on top, a heavy one further
/// down. Exploit the good state while it lasts.
pub fn detect_reorder(tasks: &[Task], ctx: &DayContext) -> Option<SmartRecommendation> {
    if ctx.energy < 4 || ctx.focus < 4 {
        return None;
    }

    let open: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    if open.len() < 3 {
        return None;
    }

    let first = open[0];
    if first.cognitive_load.level() > 2 {
        return None;
    }
    let harder = open.iter().find(|t| t.cognitive_load.level() >= 4)?;

    Some(SmartRecommendation {
        kind: RecommendationKind::Reorder,
        title: "Use the high-energy window".to_string(),
        reasoning: vec![
            "energy and focus are both high right now".to_string(),
            format!("instead of the light \"{}\"", first.title),
            format!("\"{}\" would make better use of it", harder.title),
        ],
        confidence: 0.7,
        impact: Impact::Medium,
        actions: vec![ProposalAction::reorder(&harder.id, 0)],
        expected: ExpectedOutcome {
            time_saved_min: 10,
            stress_reduction: 0.2,
            completion_probability: 0.8,
        },
    })
}

/// Defer: a much-postponed, oversized, non-must task with no pressing
/// deadline. Better tomorrow with real time than today squeezed.
pub fn detect_defer(tasks: &[Task], rc: &RecommendationContext) -> Option<SmartRecommendation> {
    let deadline_horizon = rc.today + chrono::Duration::days(2);
    let candidate = tasks.iter().filter(|t| !t.completed && !t.is_must).find(|t| {
        let deadline_soon = t.due_date.is_some_and(|d| d <= deadline_horizon);
        t.postpone_count >= 4
            && f64::from(t.estimate_min) > f64::from(rc.available_minutes) * 0.5
            && !deadline_soon
    })?;

    let tomorrow = rc.today.succ_opt()?;

    Some(SmartRecommendation {
        kind: RecommendationKind::Defer,
        title: format!("Move \"{}\" to tomorrow", candidate.title),
        reasoning: vec![
            format!(
                "\"{}\" has been postponed {}x already",
                candidate.title, candidate.postpone_count
            ),
            format!(
                "it needs {} min and only {} min remain today",
                candidate.estimate_min, rc.available_minutes
            ),
            "a day with real room gives it a fair shot".to_string(),
        ],
        confidence: 0.65,
        impact: Impact::Medium,
        actions: vec![ProposalAction::move_task(&candidate.id, rc.today, tomorrow)],
        expected: ExpectedOutcome {
            time_saved_min: 0,
            stress_reduction: 0.3,
            completion_probability: 0.6,
        },
    })
}

/// Suggest a break once the completed work minutes pass the work mode's
/// threshold.
pub fn detect_break(tasks: &[Task], ctx: &DayContext) -> Option<SmartRecommendation> {
    let worked: u32 = tasks.iter().filter(|t| t.completed).map(|t| t.estimate_min).sum();
    let threshold = ctx.work_mode.break_after_minutes();
    if worked < threshold {
        return None;
    }

    Some(SmartRecommendation {
        kind: RecommendationKind::SuggestBreak,
        title: "Time for a break".to_string(),
        reasoning: vec![
            format!("roughly {worked} min of work done without a pause"),
            format!("{threshold} min is the limit for this work mode"),
            "15 minutes off buys the next hour back".to_string(),
        ],
        confidence: 0.8,
        impact: Impact::Low,
        actions: Vec::new(),
        expected: ExpectedOutcome {
            time_saved_min: 0,
            stress_reduction: 0.4,
            completion_probability: 0.85,
        },
    })
}

/// Light-load minutes completed today versus the configured budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightUsage {
    pub minutes: u32,
    pub limit: u32,
    pub exceeded: bool,
}

pub fn light_task_usage(tasks: &[Task], settings: &PlannerSettings) -> LightUsage {
    let minutes: u32 = tasks
        .iter()
        .filter(|t| t.completed && t.cognitive_load.level() <= 2)
        .map(|t| t.estimate_min)
        .sum();
    LightUsage {
        minutes,
        limit: settings.light_task_limit_minutes,
        exceeded: minutes >= settings.light_task_limit_minutes,
    }
}

/// Flow for a freshly added "today" task: propose moving the lowest-scoring
/// non-must task to tomorrow, with moving the new task itself (and
/// decomposing it, when long) as alternatives.
pub fn task_added_proposal(
    tasks: &[Task],
    new_task_id: &str,
    ctx: &DayContext,
    settings: &PlannerSettings,
    strategy: ScoreStrategy,
    now: DateTime<Utc>,
) -> Option<Proposal> {
    let new_task = tasks.iter().find(|t| t.id == new_task_id)?;

    let to_move = tasks
        .iter()
        .filter(|t| !t.completed && !t.is_must && t.id != new_task_id)
        .map(|t| (t, score_task(t, ctx, &[], strategy).total))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(t, _)| t)?;

    let tomorrow = ctx.today.succ_opt()?;
    let primary = ProposalAction::move_task(&to_move.id, ctx.today, tomorrow);

    let mut alternatives = vec![ProposalAction::move_task(new_task_id, ctx.today, tomorrow)];
    if new_task.estimate_min > settings.auto_decompose_threshold {
        alternatives.push(ProposalAction::decompose(new_task_id, 25));
    }

    let mut reason = format!("You added \"{}\" for today.", new_task.title);
    if to_move.postpone_count > 0 {
        reason.push_str(&format!(
            " Moving \"{}\" to tomorrow makes room (it has been moved {}x already).",
            to_move.title, to_move.postpone_count
        ));
    } else {
        reason.push_str(&format!(" Moving \"{}\" to tomorrow makes room.", to_move.title));
    }
    if new_task.due_date == Some(ctx.today) {
        reason.push_str(" The new task is due today.");
    }

    Some(Proposal::new(ctx.today, reason, primary, alternatives, now))
}

/// Flow for "not today": once the postpone count crosses the configured
/// threshold, propose a reserved morning slot instead of another
/// open-ended deferral. Below the threshold, the plain postpone stands.
pub fn postpone_escalation_proposal(
    task: &Task,
    settings: &PlannerSettings,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Option<Proposal> {
    if task.postpone_count < settings.max_postpones_before_escalation {
        return None;
    }

    let tomorrow = today.succ_opt()?;
    let primary = ProposalAction::reserve_morning(
        &task.id,
        tomorrow,
        settings.morning_block_start.clone(),
        settings.morning_block_minutes,
    );
    let alternatives = vec![ProposalAction::decompose(&task.id, 25)];

    let reason = format!(
        "\"{}\" has been moved {}x. Reserve {} min tomorrow at {} instead of another open-ended postpone?",
        task.title,
        task.postpone_count,
        settings.morning_block_minutes,
        settings.morning_block_start
    );

    Some(Proposal::new(tomorrow, reason, primary, alternatives, now))
}
