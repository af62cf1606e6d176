//! Task and day-context model for the dayflow engine.
//!
//! Loose inputs from external layers (priority strings like "P1", load
//! strings like "3/5", free-form dates) are normalized here, at the
//! boundary. Everything past this module works on typed, range-clamped
//! values only.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// Task priority, level 1 (highest) through 4 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(4);

    /// Clamp a numeric level into 1..=4.
    pub fn from_level(level: i64) -> Self {
        Priority(level.clamp(1, 4) as u8)
    }

    /// Parse loose priority input: "1".."4" or "P1".."P4" (case-insensitive).
    ///
    /// Unrecognized input resolves to the lowest level rather than failing,
    /// so one malformed record can never sink a whole ranking.
    pub fn parse(raw: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^[Pp]?([1-9])$").expect("static regex"));

        match re.captures(raw.trim()) {
            Some(caps) => {
                let level: i64 = caps[1].parse().unwrap_or(4);
                Priority::from_level(level)
            }
            None => Priority::LOWEST,
        }
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(3)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Priority::from_level(i64::deserialize(d)?))
    }
}

/// Self-reported mental effort of a task, 1 (trivial) through 5 (draining).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CognitiveLoad(u8);

impl CognitiveLoad {
    /// Clamp a numeric load into 1..=5.
    pub fn from_level(level: i64) -> Self {
        CognitiveLoad(level.clamp(1, 5) as u8)
    }

    /// Parse loose load input: "3" or "3/5". Unrecognized input resolves to
    /// the medium load.
    pub fn parse(raw: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^(\d+)(?:\s*/\s*5)?$").expect("static regex"));

        match re.captures(raw.trim()) {
            Some(caps) => {
                let level: i64 = caps[1].parse().unwrap_or(3);
                CognitiveLoad::from_level(level)
            }
            None => CognitiveLoad::default(),
        }
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CognitiveLoad {
    fn default() -> Self {
        CognitiveLoad(3)
    }
}

impl<'de> Deserialize<'de> for CognitiveLoad {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(CognitiveLoad::from_level(i64::deserialize(d)?))
    }
}

/// Validate a `YYYY-MM-DD` plan date. Malformed input yields `None` instead
/// of an error so date-scoped fetches degrade to an empty result.
pub fn parse_plan_date(raw: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

    if !re.is_match(raw.trim()) {
        return None;
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Core task record.
///
/// Kept small and serializable; storage and CRUD live in outer layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_must: bool,
    #[serde(default)]
    pub is_important: bool,

    /// Minutes.
    #[serde(default = "default_estimate_min")]
    pub estimate_min: u32,
    #[serde(default)]
    pub cognitive_load: CognitiveLoad,

    /// Free-form grouping tag ("admin", "deep_work", ...).
    #[serde(default)]
    pub context_type: Option<String>,

    /// Calendar day the task is planned for; drives the ranking buckets.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Precise deadline when one is known.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub postpone_count: u32,
    #[serde(default)]
    pub has_subtasks: bool,
    #[serde(default)]
    pub position: u32,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
}

fn default_estimate_min() -> u32 {
    30
}

fn default_created_at() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority: Priority::default(),
            is_must: false,
            is_important: false,
            estimate_min: default_estimate_min(),
            cognitive_load: CognitiveLoad::default(),
            context_type: None,
            due_date: None,
            due_at: None,
            completed: false,
            postpone_count: 0,
            has_subtasks: false,
            position: 0,
            created_at: default_created_at(),
        }
    }

    pub fn with_priority(mut self, level: i64) -> Self {
        self.priority = Priority::from_level(level);
        self
    }

    pub fn with_load(mut self, level: i64) -> Self {
        self.cognitive_load = CognitiveLoad::from_level(level);
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimate_min = minutes;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_type = Some(context.into());
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_due_at(mut self, due: DateTime<Utc>) -> Self {
        self.due_at = Some(due);
        self
    }

    pub fn with_postpones(mut self, count: u32) -> Self {
        self.postpone_count = count;
        self
    }

    pub fn with_must(mut self) -> Self {
        self.is_must = true;
        self
    }

    pub fn with_important(mut self) -> Self {
        self.is_important = true;
        self
    }

    pub fn with_completed(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn with_subtasks(mut self) -> Self {
        self.has_subtasks = true;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// The instant this task is due: the precise deadline when known,
    /// otherwise end-of-day on the planned date.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        if self.due_at.is_some() {
            return self.due_at;
        }
        self.due_date
            .and_then(|d| d.and_hms_opt(23, 59, 0))
            .map(|ndt| ndt.and_utc())
    }
}

/// Named filter preset narrowing the eligible task set before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    Standard,
    LowFocus,
    Hyperfocus,
    QuickWins,
}

impl WorkMode {
    /// Eligibility predicate applied before ranking.
    pub fn keeps(&self, task: &Task) -> bool {
        match self {
            WorkMode::Standard => true,
            WorkMode::LowFocus => task.cognitive_load.level() <= 2,
            WorkMode::Hyperfocus => task.cognitive_load.level() >= 4,
            WorkMode::QuickWins => task.estimate_min < 20,
        }
    }

    /// Minutes of consecutive work after which a break gets suggested.
    pub fn break_after_minutes(&self) -> u32 {
        match self {
            WorkMode::LowFocus => 45,
            WorkMode::QuickWins => 60,
            WorkMode::Standard => 90,
            WorkMode::Hyperfocus => 120,
        }
    }
}

impl Default for WorkMode {
    fn default() -> Self {
        WorkMode::Standard
    }
}

impl std::str::FromStr for WorkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(WorkMode::Standard),
            "low_focus" | "low-focus" => Ok(WorkMode::LowFocus),
            "hyperfocus" => Ok(WorkMode::Hyperfocus),
            "quick_wins" | "quick-wins" => Ok(WorkMode::QuickWins),
            other => Err(format!("unknown work mode: {other}")),
        }
    }
}

/// A fixed-time commitment (meeting, appointment) the planner must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Snapshot of the user's state for one planning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayContext {
    /// 1-5 energy.
    pub energy: u8,
    /// 1-5 focus.
    pub focus: u8,
    pub work_mode: WorkMode,
    pub today: NaiveDate,
    pub context_filter: Option<String>,
    pub events: Vec<FixedEvent>,
}

impl DayContext {
    pub fn new(today: NaiveDate, energy: i64, focus: i64) -> Self {
        Self {
            energy: energy.clamp(1, 5) as u8,
            focus: focus.clamp(1, 5) as u8,
            work_mode: WorkMode::Standard,
            today,
            context_filter: None,
            events: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: WorkMode) -> Self {
        self.work_mode = mode;
        self
    }

    pub fn with_filter(mut self, context: impl Into<String>) -> Self {
        self.context_filter = Some(context.into());
        self
    }

    pub fn with_events(mut self, events: Vec<FixedEvent>) -> Self {
        self.events = events;
        self
    }

    /// Mean of energy and focus, the working state tasks are matched against.
    pub fn state_level(&self) -> f64 {
        f64::from(self.energy + self.focus) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_priority_accepts_p_prefix_and_bare_digits() {
        assert_eq!(Priority::parse("P1"), Priority::from_level(1));
        assert_eq!(Priority::parse("p2"), Priority::from_level(2));
        assert_eq!(Priority::parse("3"), Priority::from_level(3));
        assert_eq!(Priority::parse(" 4 "), Priority::from_level(4));
    }

    #[test]
    fn parse_priority_falls_back_to_lowest() {
        assert_eq!(Priority::parse(""), Priority::LOWEST);
        assert_eq!(Priority::parse("urgent"), Priority::LOWEST);
        // out-of-range digits clamp
        assert_eq!(Priority::parse("9"), Priority::LOWEST);
    }

    #[test]
    fn parse_load_accepts_fraction_form() {
        assert_eq!(CognitiveLoad::parse("3/5"), CognitiveLoad::from_level(3));
        assert_eq!(CognitiveLoad::parse("5 / 5"), CognitiveLoad::from_level(5));
        assert_eq!(CognitiveLoad::parse("2"), CognitiveLoad::from_level(2));
    }

    #[test]
    fn parse_load_clamps_and_defaults() {
        assert_eq!(CognitiveLoad::parse("17"), CognitiveLoad::from_level(5));
        assert_eq!(CognitiveLoad::parse("hard"), CognitiveLoad::default());
        assert_eq!(CognitiveLoad::from_level(0), CognitiveLoad::from_level(1));
    }

    #[test]
    fn parse_plan_date_rejects_malformed_input() {
        assert!(parse_plan_date("2026-08-06").is_some());
        assert!(parse_plan_date("2026-8-6").is_none());
        assert!(parse_plan_date("tomorrow").is_none());
        assert!(parse_plan_date("2026-13-40").is_none());
    }

    #[test]
    fn due_instant_prefers_precise_deadline() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let precise = day.and_hms_opt(14, 0, 0).unwrap().and_utc();

        let t = Task::new("t1", "call").with_due_date(day).with_due_at(precise);
        assert_eq!(t.due_instant(), Some(precise));

        let t2 = Task::new("t2", "mail").with_due_date(day);
        let eod = t2.due_instant().unwrap();
        assert_eq!(eod.date_naive(), day);
    }

    #[test]
    fn task_json_clamps_out_of_range_fields() {
        let raw = r#"{
            "id": "t1",
            "title": "from sync",
            "priority": 9,
            "cognitive_load": 0,
            "estimate_min": 25,
            "due_date": "2026-08-06"
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.priority, Priority::LOWEST);
        assert_eq!(task.cognitive_load, CognitiveLoad::from_level(1));
        assert_eq!(task.estimate_min, 25);
        assert!(!task.completed);

        let back = serde_json::to_string(&task).unwrap();
        assert!(back.contains("\"priority\":4"));
    }

    #[test]
    fn day_context_clamps_sliders() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let ctx = DayContext::new(today, 9, 0);
        assert_eq!(ctx.energy, 5);
        assert_eq!(ctx.focus, 1);
        assert_eq!(ctx.state_level(), 3.0);
    }

    #[test]
    fn work_mode_predicates_match_thresholds() {
        let light = Task::new("a", "light").with_load(2).with_estimate(10);
        let heavy = Task::new("b", "heavy").with_load(4).with_estimate(50);
        let medium = Task::new("c", "medium").with_load(3).with_estimate(20);

        assert!(WorkMode::Standard.keeps(&light));
        assert!(WorkMode::Standard.keeps(&heavy));
        assert!(WorkMode::Standard.keeps(&medium));

        assert!(WorkMode::LowFocus.keeps(&light));
        assert!(!WorkMode::LowFocus.keeps(&heavy));
        assert!(!WorkMode::LowFocus.keeps(&medium));

        assert!(!WorkMode::Hyperfocus.keeps(&light));
        assert!(WorkMode::Hyperfocus.keeps(&heavy));

        // quick wins is a strict < 20 minutes cut
        assert!(WorkMode::QuickWins.keeps(&light));
        assert!(!WorkMode::QuickWins.keeps(&medium));
    }
}
