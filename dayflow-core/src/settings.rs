//! Planner thresholds shared by the recommendation flows.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the recommendation flows.
///
/// The CLI reads these from `~/.dayflow/config.toml`; every field has a
/// default so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Tasks longer than this (minutes) get a decompose alternative.
    #[serde(default = "default_decompose_threshold")]
    pub auto_decompose_threshold: u32,
    /// Postpone count at which "not today" escalates to a reserved slot.
    #[serde(default = "default_max_postpones")]
    pub max_postpones_before_escalation: u32,
    /// Length of the reserved morning block, minutes.
    #[serde(default = "default_morning_block_minutes")]
    pub morning_block_minutes: u32,
    /// Local start time of the reserved morning block, "HH:MM".
    #[serde(default = "default_morning_block_start")]
    pub morning_block_start: String,
    /// Budget of low-load task minutes per day before a nudge.
    #[serde(default = "default_light_task_limit")]
    pub light_task_limit_minutes: u32,
    /// Seconds an action stays undoable in the outer layer.
    #[serde(default = "default_undo_window")]
    pub undo_window_secs: u32,
}

fn default_decompose_threshold() -> u32 {
    60
}

fn default_max_postpones() -> u32 {
    3
}

fn default_morning_block_minutes() -> u32 {
    30
}

fn default_morning_block_start() -> String {
    "08:00".to_string()
}

fn default_light_task_limit() -> u32 {
    120
}

fn default_undo_window() -> u32 {
    30
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            auto_decompose_threshold: default_decompose_threshold(),
            max_postpones_before_escalation: default_max_postpones(),
            morning_block_minutes: default_morning_block_minutes(),
            morning_block_start: default_morning_block_start(),
            light_task_limit_minutes: default_light_task_limit(),
            undo_window_secs: default_undo_window(),
        }
    }
}
