//! Work-mode filter and context-aware ranker.
//!
//! Tasks are filtered by the active work mode, partitioned into date
//! buckets (overdue, due today, unscheduled, future), and scored bucket by
//! bucket as a fold over the accumulator of already-placed tasks, so the
//! context-flow term always sees the real session prefix. The fold runs in
//! input order; the displayed order inside each bucket is by score.

use thiserror::Error;

use crate::score::{score_task, ScoreResult, ScoreStrategy};
use crate::task::{DayContext, Task, WorkMode};

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    /// The work-mode filter removed every pending task. Distinct from an
    /// empty ranking so callers can prompt to relax the mode instead of
    /// showing an empty state.
    #[error("work mode {mode:?} left no eligible tasks ({dropped} filtered out)")]
    NoEligibleTasks { mode: WorkMode, dropped: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTask {
    pub task: Task,
    pub score: ScoreResult,
}

/// Total order over the eligible tasks, bucket-concatenated:
/// overdue, then due today, then unscheduled, then future.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub entries: Vec<RankedTask>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.task.id.as_str()).collect()
    }

    /// Tasks in ranked order, for feeding the recommendation detectors.
    pub fn tasks(&self) -> Vec<Task> {
        self.entries.iter().map(|e| e.task.clone()).collect()
    }
}

/// Rank a flat task list for one planning session.
///
/// An empty input produces an empty `Ranking`; a work-mode filter that
/// empties a non-empty pending set produces `RankError::NoEligibleTasks`.
pub fn rank(tasks: &[Task], ctx: &DayContext, strategy: ScoreStrategy) -> Result<Ranking, RankError> {
    let pending: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| match &ctx.context_filter {
            Some(wanted) => t.context_type.as_deref() == Some(wanted.as_str()),
            None => true,
        })
        .collect();

    if pending.is_empty() {
        return Ok(Ranking::default());
    }

    let eligible: Vec<&Task> = pending.iter().filter(|t| ctx.work_mode.keeps(t)).copied().collect();
    if eligible.is_empty() {
        return Err(RankError::NoEligibleTasks {
            mode: ctx.work_mode,
            dropped: pending.len(),
        });
    }

    let mut overdue = Vec::new();
    let mut due_today = Vec::new();
    let mut unscheduled = Vec::new();
    let mut future = Vec::new();
    for t in eligible {
        match t.due_date {
            Some(d) if d < ctx.today => overdue.push(t),
            Some(d) if d == ctx.today => due_today.push(t),
            Some(_) => future.push(t),
            None => unscheduled.push(t),
        }
    }

    let mut placed: Vec<&Task> = Vec::new();
    let mut entries = Vec::new();
    for bucket in [overdue, due_today, unscheduled, future] {
        entries.extend(score_bucket(bucket, ctx, &mut placed, strategy));
    }

    Ok(Ranking { entries })
}

/// Score one bucket against the accumulated session prefix, then order it.
/// MUST tasks stay above non-must tasks inside the bucket; within each
/// group the total decides (the tie-breaker already makes totals unique).
fn score_bucket<'a>(
    bucket: Vec<&'a Task>,
    ctx: &DayContext,
    placed: &mut Vec<&'a Task>,
    strategy: ScoreStrategy,
) -> Vec<RankedTask> {
    let mut scored: Vec<(&Task, ScoreResult)> = Vec::with_capacity(bucket.len());
    for task in bucket {
        let score = score_task(task, ctx, placed, strategy);
        placed.push(task);
        scored.push((task, score));
    }

    scored.sort_by(|a, b| {
        b.0.is_must
            .cmp(&a.0.is_must)
            .then(b.1.total.total_cmp(&a.1.total))
    });

    scored
        .into_iter()
        .map(|(task, score)| RankedTask { task: task.clone(), score })
        .collect()
}
