//! Base scorer: one task + the day context -> total, factor breakdown,
//! and human-readable reasoning.
//!
//! The scorer is a single configurable strategy. The only knob is the
//! postpone policy, kept as two named variants instead of two parallel
//! scorer implementations (see DESIGN.md for the policy decision).

use chrono::Datelike;

use crate::task::{DayContext, Task};

/// Named factor slots, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Priority,
    Deadline,
    Impact,
    EnergyFit,
    ContextFlow,
    Duration,
    Postpone,
    TieBreak,
}

impl Factor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Priority => "priority",
            Factor::Deadline => "deadline",
            Factor::Impact => "impact",
            Factor::EnergyFit => "energy_fit",
            Factor::ContextFlow => "context_flow",
            Factor::Duration => "duration",
            Factor::Postpone => "postpone",
            Factor::TieBreak => "tie_break",
        }
    }
}

/// One signed factor contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorContribution {
    pub factor: Factor,
    pub value: f64,
}

/// Score plus its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub task_id: String,
    pub total: f64,
    pub breakdown: Vec<FactorContribution>,
    pub reasoning: Vec<String>,
}

/// How repeated deferrals shift a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostponePolicy {
    /// Postponements cost 5 points each, but the penalty halves once a task
    /// has been pushed 3+ times, so chronic avoiders drift back up.
    HalvedPenalty,
    /// Postponements are a straight 5-point bonus each, the factor-library
    /// rule. The default.
    #[default]
    PureBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreStrategy {
    pub postpone_policy: PostponePolicy,
}

const PRIORITY_WEIGHT: f64 = 10.0;
const POSTPONE_STEP: f64 = 5.0;
const POSTPONE_ESCALATION_AT: u32 = 3;
const CONTEXT_RUN_STEP: f64 = 5.0;
const CONTEXT_RUN_CAP: f64 = 15.0;
const CONTEXT_SWITCH_PENALTY: f64 = 3.0;

/// Score one task against the day context and the tasks already placed in
/// this session. `placed` feeds the context-flow term only; pass an empty
/// slice when scoring tasks in isolation.
pub fn score_task(
    task: &Task,
    ctx: &DayContext,
    placed: &[&Task],
    strategy: ScoreStrategy,
) -> ScoreResult {
    let mut breakdown = Vec::with_capacity(8);
    let mut reasoning = Vec::new();

    // 1. Priority weight, monotonic in level (1 = highest).
    let priority = f64::from(5 - task.priority.level()) * PRIORITY_WEIGHT;
    breakdown.push(FactorContribution { factor: Factor::Priority, value: priority });
    reasoning.push(format!("priority P{} adds {priority:+.0}", task.priority.level()));

    // 2. Deadline proximity by calendar bucket.
    let (deadline, deadline_note) = deadline_proximity(task, ctx);
    breakdown.push(FactorContribution { factor: Factor::Deadline, value: deadline });
    reasoning.push(deadline_note);

    // 3. Impact of explicit flags.
    let impact = if task.is_must {
        reasoning.push("pinned as MUST".to_string());
        20.0
    } else if task.is_important {
        reasoning.push("marked important".to_string());
        10.0
    } else {
        0.0
    };
    breakdown.push(FactorContribution { factor: Factor::Impact, value: impact });

    // 4. Energy/focus fit.
    let fit = energy_fit(task, ctx, &mut reasoning);
    breakdown.push(FactorContribution { factor: Factor::EnergyFit, value: fit });

    // 5. Context flow against the already-placed session prefix.
    let (flow, flow_note) = context_flow(task, placed);
    breakdown.push(FactorContribution { factor: Factor::ContextFlow, value: flow });
    reasoning.push(flow_note);

    // 6. Duration penalty, staged.
    let duration = duration_penalty(task.estimate_min);
    breakdown.push(FactorContribution { factor: Factor::Duration, value: duration });
    if duration < 0.0 {
        reasoning.push(format!("{} min of work costs {duration:+.0}", task.estimate_min));
    }

    // 7. Postpone contribution per the selected policy.
    let postpone = postpone_term(task.postpone_count, strategy.postpone_policy, &mut reasoning);
    breakdown.push(FactorContribution { factor: Factor::Postpone, value: postpone });

    // 8. Deterministic tie-breaker: keeps totals unique without ever
    //    outweighing a real factor difference.
    let jitter = stable_jitter(task);
    breakdown.push(FactorContribution { factor: Factor::TieBreak, value: jitter });

    let total: f64 = breakdown.iter().map(|c| c.value).sum();

    ScoreResult {
        task_id: task.id.clone(),
        total,
        breakdown,
        reasoning,
    }
}

fn deadline_proximity(task: &Task, ctx: &DayContext) -> (f64, String) {
    let Some(due) = task.due_date else {
        return (0.0, "no deadline".to_string());
    };

    let days_until = due.signed_duration_since(ctx.today).num_days();
    if days_until < 0 {
        (30.0, format!("overdue by {} day(s)", -days_until))
    } else if days_until == 0 {
        (22.5, "due today".to_string())
    } else if days_until == 1 {
        (15.0, "due tomorrow".to_string())
    } else if days_until <= 3 {
        (7.5, format!("due in {days_until} days"))
    } else {
        (0.0, format!("due in {days_until} days, no urgency yet"))
    }
}

fn energy_fit(task: &Task, ctx: &DayContext, reasoning: &mut Vec<String>) -> f64 {
    let state = ctx.state_level();
    let load = f64::from(task.cognitive_load.level());
    let diff = (state - load).abs();

    let mut fit = 20.0 * (1.0 - diff / 5.0);

    if diff <= 1.0 {
        reasoning.push("good match for current energy and focus".to_string());
    } else if diff >= 3.0 && load > state {
        reasoning.push("too demanding for the current state".to_string());
    }

    if ctx.focus <= 2 && task.estimate_min <= 15 {
        fit += 10.0;
        reasoning.push("short task suits low focus".to_string());
    }
    if ctx.focus <= 2 && task.estimate_min > 45 {
        fit -= 15.0;
        reasoning.push("long task punishing at low focus".to_string());
    }

    fit.max(0.0)
}

fn context_flow(task: &Task, placed: &[&Task]) -> (f64, String) {
    let Some(prev) = placed.last() else {
        return (0.0, "first task of the session".to_string());
    };

    match (&task.context_type, &prev.context_type) {
        (Some(ctx), Some(prev_ctx)) if ctx == prev_ctx => {
            let run = placed
                .iter()
                .rev()
                .take_while(|t| t.context_type.as_deref() == Some(ctx.as_str()))
                .count();
            let bonus = (run as f64 * CONTEXT_RUN_STEP).min(CONTEXT_RUN_CAP);
            (bonus, format!("continues \"{ctx}\" context ({bonus:+.0})"))
        }
        (Some(_), Some(prev_ctx)) => (
            -CONTEXT_SWITCH_PENALTY,
            format!("switches away from \"{prev_ctx}\""),
        ),
        _ => (0.0, "no context continuity".to_string()),
    }
}

fn duration_penalty(estimate_min: u32) -> f64 {
    match estimate_min {
        0..=15 => 0.0,
        16..=30 => -2.0,
        31..=60 => -5.0,
        _ => -10.0,
    }
}

fn postpone_term(count: u32, policy: PostponePolicy, reasoning: &mut Vec<String>) -> f64 {
    if count == 0 {
        return 0.0;
    }
    match policy {
        PostponePolicy::PureBonus => {
            let bonus = f64::from(count) * POSTPONE_STEP;
            reasoning.push(format!("postponed {count}x, nudged up {bonus:+.0}"));
            bonus
        }
        PostponePolicy::HalvedPenalty => {
            let mut penalty = f64::from(count) * POSTPONE_STEP;
            if count >= POSTPONE_ESCALATION_AT {
                penalty *= 0.5;
                reasoning.push(format!(
                    "postponed {count}x, penalty relaxed to {:+.1} to force resolution",
                    -penalty
                ));
            } else {
                reasoning.push(format!("postponed {count}x, costs {:+.0}", -penalty));
            }
            -penalty
        }
    }
}

/// FNV-1a over the task id and creation timestamp, scaled into [0, 0.01).
/// Stable across runs; never random.
fn stable_jitter(task: &Task) -> f64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in task.id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    for byte in task.created_at.timestamp().to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    // also fold in the day-of-creation ordinal so id collisions across
    // reimports stay distinguishable
    hash ^= u64::from(task.created_at.date_naive().num_days_from_ce() as u32);

    (hash % 100_000) as f64 / 10_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn ctx() -> DayContext {
        DayContext::new(today(), 3, 3)
    }

    fn task(id: &str) -> Task {
        Task::new(id, id).with_due_date(today())
    }

    #[test]
    fn reasoning_always_names_priority_deadline_and_context() {
        let t = Task::new("t", "bare");
        let s = score_task(&t, &ctx(), &[], ScoreStrategy::default());
        assert!(s.reasoning.iter().any(|r| r.contains("priority")));
        assert!(s.reasoning.iter().any(|r| r.contains("deadline")));
        assert!(s.reasoning.iter().any(|r| r.contains("session") || r.contains("context")));
    }

    #[test]
    fn breakdown_keeps_factor_order() {
        let s = score_task(&task("t"), &ctx(), &[], ScoreStrategy::default());
        let order: Vec<Factor> = s.breakdown.iter().map(|c| c.factor).collect();
        assert_eq!(
            order,
            vec![
                Factor::Priority,
                Factor::Deadline,
                Factor::Impact,
                Factor::EnergyFit,
                Factor::ContextFlow,
                Factor::Duration,
                Factor::Postpone,
                Factor::TieBreak,
            ]
        );
    }

    #[test]
    fn identical_tasks_never_tie() {
        let a = task("task-a");
        let b = task("task-b");
        let sa = score_task(&a, &ctx(), &[], ScoreStrategy::default());
        let sb = score_task(&b, &ctx(), &[], ScoreStrategy::default());
        assert_ne!(sa.total, sb.total);
        // and the gap stays below any real factor step
        assert!((sa.total - sb.total).abs() < 0.01);
    }

    #[test]
    fn context_run_grows_then_switch_drops() {
        let d1 = task("dw-1").with_context("deep_work");
        let d2 = task("dw-2").with_context("deep_work");
        let d3 = task("dw-3").with_context("deep_work");
        let admin = task("adm-1").with_context("admin");
        let strategy = ScoreStrategy::default();

        let s1 = score_task(&d1, &ctx(), &[], strategy);
        let s2 = score_task(&d2, &ctx(), &[&d1], strategy);
        let s3 = score_task(&d3, &ctx(), &[&d1, &d2], strategy);
        let s4 = score_task(&admin, &ctx(), &[&d1, &d2, &d3], strategy);

        assert!(s2.total > s1.total, "second same-context task gains");
        assert!(s3.total > s2.total, "third same-context task gains more");
        assert!(s4.total < s3.total, "context switch scores lower");

        let flow = |s: &ScoreResult| {
            s.breakdown
                .iter()
                .find(|c| c.factor == Factor::ContextFlow)
                .map(|c| c.value)
                .unwrap()
        };
        assert_eq!(flow(&s1), 0.0);
        assert_eq!(flow(&s2), 5.0);
        assert_eq!(flow(&s3), 10.0);
        assert_eq!(flow(&s4), -3.0);
    }

    #[test]
    fn context_run_bonus_caps() {
        let run: Vec<Task> = (0..5)
            .map(|i| task(&format!("dw-{i}")).with_context("deep_work"))
            .collect();
        let refs: Vec<&Task> = run.iter().collect();
        let next = task("dw-next").with_context("deep_work");

        let s = score_task(&next, &ctx(), &refs, ScoreStrategy::default());
        let flow = s
            .breakdown
            .iter()
            .find(|c| c.factor == Factor::ContextFlow)
            .map(|c| c.value)
            .unwrap();
        assert_eq!(flow, 15.0);
    }

    #[test]
    fn halved_penalty_relaxes_at_three_postpones() {
        let strategy = ScoreStrategy { postpone_policy: PostponePolicy::HalvedPenalty };
        let take = |count: u32| {
            let t = task("t").with_postpones(count);
            score_task(&t, &ctx(), &[], strategy)
                .breakdown
                .iter()
                .find(|c| c.factor == Factor::Postpone)
                .map(|c| c.value)
                .unwrap()
        };

        assert_eq!(take(0), 0.0);
        assert_eq!(take(2), -10.0);
        // escalation: 3 * 5 halved
        assert_eq!(take(3), -7.5);
        assert_eq!(take(4), -10.0);
    }

    #[test]
    fn pure_bonus_grows_monotonically() {
        let strategy = ScoreStrategy::default();
        let score = |count: u32| {
            let t = task("t").with_postpones(count);
            score_task(&t, &ctx(), &[], strategy).total
        };
        assert!(score(1) > score(0));
        assert!(score(4) > score(1));
    }

    #[test]
    fn must_outweighs_important() {
        let strategy = ScoreStrategy::default();
        let must = task("a").with_must();
        let important = task("b").with_important();
        let plain = task("c");

        let sm = score_task(&must, &ctx(), &[], strategy).total;
        let si = score_task(&important, &ctx(), &[], strategy).total;
        let sp = score_task(&plain, &ctx(), &[], strategy).total;
        assert!(sm > si && si > sp);
    }

    #[test]
    fn low_focus_prefers_short_tasks() {
        let low = DayContext::new(today(), 2, 2);
        let strategy = ScoreStrategy::default();

        let short = task("s").with_estimate(10);
        let long = task("l").with_estimate(60);
        let s_short = score_task(&short, &low, &[], strategy).total;
        let s_long = score_task(&long, &low, &[], strategy).total;
        assert!(s_short > s_long);
    }

    #[test]
    fn deadline_buckets_are_monotonic() {
        let strategy = ScoreStrategy::default();
        let at = |days: i64| {
            let t = task("t").with_due_date(today() + chrono::Duration::days(days));
            score_task(&t, &ctx(), &[], strategy)
                .breakdown
                .iter()
                .find(|c| c.factor == Factor::Deadline)
                .map(|c| c.value)
                .unwrap()
        };
        assert_eq!(at(-1), 30.0);
        assert_eq!(at(0), 22.5);
        assert_eq!(at(1), 15.0);
        assert_eq!(at(3), 7.5);
        assert_eq!(at(10), 0.0);
    }
}
