//! dayflow-core: scoring, ranking, learning, and recommendation engine for
//! an ADHD-oriented day planner.
//!
//! Everything here is a synchronous, pure transformation over in-memory
//! records: tasks and a day context go in, a ranked list and proposals come
//! out. Persistence, task CRUD, sync, and presentation all live in outer
//! layers; the only stateful seam is the [`learning::ProfileStore`]
//! repository the learning service writes through.

pub mod adaptive;
pub mod factors;
pub mod learning;
pub mod profile;
pub mod proposal;
pub mod ranker;
pub mod recommend;
pub mod score;
pub mod settings;
pub mod task;
pub mod time;

pub use adaptive::{adaptive_score, AdaptiveBreakdown, AdaptiveScore};
pub use factors::{
    cognitive_load_penalty, deadline_score, postpone_bonus, priority_score, task_score,
    FactorBreakdown, FactorScore,
};
pub use learning::{
    apply_event, blend_preferred_duration, recompute_peak_hours, switch_sensitivity,
    update_energy_pattern, update_streak, BehaviorEvent, LearningService, ProfileStore,
};
pub use profile::{BehaviorProfile, CompletionStreak, EnergyPattern, PostponePattern};
pub use proposal::{ActionKind, Proposal, ProposalAction, ProposalStatus, PROPOSAL_TTL_HOURS};
pub use ranker::{rank, RankError, RankedTask, Ranking};
pub use recommend::{
    detect_batch, detect_break, detect_decompose, detect_defer, detect_energy_mismatch,
    detect_reorder, filter_conflicts, generate_recommendations, light_task_usage,
    postpone_escalation_proposal, task_added_proposal, ExpectedOutcome, Impact, LightUsage,
    RecommendationContext, RecommendationKind, SmartRecommendation,
};
pub use score::{
    score_task, Factor, FactorContribution, PostponePolicy, ScoreResult, ScoreStrategy,
};
pub use settings::PlannerSettings;
pub use task::{
    parse_plan_date, CognitiveLoad, DayContext, FixedEvent, Priority, Task, WorkMode,
};
pub use time::parse_local_deadline_to_utc;
