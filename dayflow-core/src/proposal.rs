//! Proposals: structured, expiring suggestions the outer layer can accept,
//! reject, or ignore. The engine only describes what should change; every
//! actual task mutation happens outside.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Hours a proposal stays valid. Validity is checked at read time; nothing
/// sweeps expired proposals in the background.
pub const PROPOSAL_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MoveTask,
    ReorderTask,
    DecomposeTask,
    ReserveMorning,
}

/// One operation the outer layer could execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalAction {
    pub kind: ActionKind,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_position: Option<u32>,
    /// Minutes per session for a decompose, or block length for a reserved slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_minutes: Option<u32>,
    /// Local "HH:MM" start for a reserved slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

impl ProposalAction {
    pub fn move_task(task_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            kind: ActionKind::MoveTask,
            task_id: task_id.into(),
            from_date: Some(from),
            to_date: Some(to),
            new_position: None,
            target_minutes: None,
            start_time: None,
        }
    }

    pub fn reorder(task_id: impl Into<String>, new_position: u32) -> Self {
        Self {
            kind: ActionKind::ReorderTask,
            task_id: task_id.into(),
            from_date: None,
            to_date: None,
            new_position: Some(new_position),
            target_minutes: None,
            start_time: None,
        }
    }

    pub fn decompose(task_id: impl Into<String>, target_minutes: u32) -> Self {
        Self {
            kind: ActionKind::DecomposeTask,
            task_id: task_id.into(),
            from_date: None,
            to_date: None,
            new_position: None,
            target_minutes: Some(target_minutes),
            start_time: None,
        }
    }

    pub fn reserve_morning(
        task_id: impl Into<String>,
        date: NaiveDate,
        start_time: impl Into<String>,
        minutes: u32,
    ) -> Self {
        Self {
            kind: ActionKind::ReserveMorning,
            task_id: task_id.into(),
            from_date: None,
            to_date: Some(date),
            new_position: None,
            target_minutes: Some(minutes),
            start_time: Some(start_time.into()),
        }
    }
}

/// A primary action plus alternatives, with a rationale and an expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub plan_date: NaiveDate,
    pub reason: String,
    pub primary: ProposalAction,
    pub alternatives: Vec<ProposalAction>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        plan_date: NaiveDate,
        reason: impl Into<String>,
        primary: ProposalAction,
        alternatives: Vec<ProposalAction>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            plan_date,
            reason: reason.into(),
            primary,
            alternatives,
            status: ProposalStatus::Pending,
            created_at: now,
            expires_at: now + Duration::hours(PROPOSAL_TTL_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Still actionable: pending and within its validity window.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == ProposalStatus::Pending && !self.is_expired(now)
    }

    pub fn accept(&mut self) {
        self.status = ProposalStatus::Accepted;
    }

    pub fn reject(&mut self) {
        self.status = ProposalStatus::Rejected;
    }
}
