use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Timelike, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use dayflow_core::{
    adaptive_score, generate_recommendations, light_task_usage, parse_local_deadline_to_utc,
    parse_plan_date, postpone_escalation_proposal, rank, task_added_proposal, BehaviorEvent,
    BehaviorProfile, DayContext, LearningService, PlannerSettings, PostponePolicy, ProfileStore,
    RankError, Ranking, RecommendationContext, ScoreStrategy, Task, WorkMode,
};

mod store;

use store::{default_state_dir, load_settings, JsonProfileStore};

#[derive(Parser, Debug)]
#[command(name = "dayflow", version, about = "Task prioritization for ADHD-friendly day planning")]
struct Cli {
    /// Name for the local profile state files
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the pending tasks and print recommendations
    Plan {
        /// JSON file holding the task list
        #[arg(long)]
        tasks: PathBuf,

        /// Current energy, 1-5
        #[arg(long, default_value_t = 3)]
        energy: i64,

        /// Current focus, 1-5
        #[arg(long, default_value_t = 3)]
        focus: i64,

        /// standard | low_focus | hyperfocus | quick_wins
        #[arg(long, default_value = "standard")]
        mode: String,

        /// Plan date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Only rank tasks carrying this context tag
        #[arg(long)]
        context: Option<String>,

        /// Free working minutes left today
        #[arg(long, default_value_t = 480)]
        available: u32,

        /// Score postpones as a relaxed penalty instead of a bonus
        #[arg(long)]
        halved_postpones: bool,

        /// Plan as of this local moment ("YYYY-MM-DD HH:MM") instead of now
        #[arg(long)]
        at: Option<String>,

        /// IANA timezone for --at (e.g. Europe/Warsaw)
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Preview the proposal for a task freshly added for today
    Added {
        /// JSON file holding the task list
        #[arg(long)]
        tasks: PathBuf,

        /// Id of the newly added task
        id: String,

        #[arg(long, default_value_t = 3)]
        energy: i64,

        #[arg(long, default_value_t = 3)]
        focus: i64,
    },

    /// Record a completed task into the behavior profile
    Complete {
        /// JSON file holding the task list
        #[arg(long)]
        tasks: PathBuf,

        /// Id of the completed task
        id: String,

        /// Minutes actually spent
        #[arg(long)]
        minutes: u32,

        #[arg(long, default_value_t = 3)]
        energy: i64,

        #[arg(long, default_value_t = 3)]
        focus: i64,
    },

    /// Record a "not today" postponement; prints the escalation proposal
    /// once the task has been pushed too often
    Postpone {
        /// JSON file holding the task list
        #[arg(long)]
        tasks: PathBuf,

        /// Id of the postponed task
        id: String,

        /// Optional stated reason
        #[arg(long)]
        reason: Option<String>,
    },

    /// Record an energy/focus slider change
    Sliders {
        #[arg(long)]
        energy: i64,

        #[arg(long)]
        focus: i64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let state_dir = default_state_dir();
    let settings = load_settings(&state_dir)?;
    log::debug!("state dir {}, settings {settings:?}", state_dir.display());

    match cli.command {
        Command::Plan {
            tasks,
            energy,
            focus,
            mode,
            date,
            context,
            available,
            halved_postpones,
            at,
            tz,
        } => {
            // a pinned --at moment makes planning runs reproducible
            let (now, hour) = match at {
                Some(local) => {
                    let now = parse_local_deadline_to_utc(&local, &tz)?;
                    let hour = local
                        .split_whitespace()
                        .nth(1)
                        .and_then(|t| t.split(':').next())
                        .and_then(|h| h.parse::<u8>().ok())
                        .unwrap_or(12);
                    (now, hour)
                }
                None => (Utc::now(), Local::now().hour() as u8),
            };

            plan(
                &cli.user,
                &state_dir,
                &settings,
                &tasks,
                energy,
                focus,
                &mode,
                date.as_deref(),
                context,
                available,
                halved_postpones,
                now,
                hour,
            )?;
        }

        Command::Added { tasks, id, energy, focus } => {
            let all = load_tasks(&tasks)?;
            let ctx = DayContext::new(Local::now().date_naive(), energy, focus);

            match task_added_proposal(&all, &id, &ctx, &settings, ScoreStrategy::default(), Utc::now())
            {
                Some(proposal) => {
                    println!("{}", proposal.reason);
                    println!(
                        "  primary: {:?} {} -> {}",
                        proposal.primary.kind,
                        proposal.primary.task_id,
                        proposal.primary.to_date.map(|d| d.to_string()).unwrap_or_default()
                    );
                    for alt in &proposal.alternatives {
                        println!("  alternative: {:?} {}", alt.kind, alt.task_id);
                    }
                }
                None => println!("Nothing movable; the day absorbs the new task as-is."),
            }
        }

        Command::Complete { tasks, id, minutes, energy, focus } => {
            let all = load_tasks(&tasks)?;
            let task = find_task(&all, &id)?;
            let local = Local::now();

            let mut service = LearningService::new(JsonProfileStore::new(&state_dir));
            let profile = service.apply(
                &cli.user,
                &BehaviorEvent::TaskCompleted {
                    task: task.clone(),
                    actual_minutes: minutes,
                    hour: local.hour() as u8,
                    energy: energy.clamp(1, 5) as u8,
                    focus: focus.clamp(1, 5) as u8,
                    date: local.date_naive(),
                },
                Utc::now(),
            )?;
            service.refresh_switch_sensitivity(&cli.user, &all, Utc::now())?;

            println!("Recorded completion of \"{}\" ({minutes} min).", task.title);
            println!(
                "Preferred session length is now {} min; peak window {:02}:00-{:02}:00.",
                profile.preferred_task_duration, profile.peak_start_hour, profile.peak_end_hour
            );
        }

        Command::Postpone { tasks, id, reason } => {
            let all = load_tasks(&tasks)?;
            let task = find_task(&all, &id)?;
            let local = Local::now();

            let mut service = LearningService::new(JsonProfileStore::new(&state_dir));
            service.apply(
                &cli.user,
                &BehaviorEvent::TaskPostponed {
                    task: task.clone(),
                    date: local.date_naive(),
                    reason,
                },
                Utc::now(),
            )?;

            println!("Recorded postponement of \"{}\".", task.title);

            // the external task layer bumps the stored count; mirror that
            // here so the escalation check sees the post-event state
            let bumped = task.clone().with_postpones(task.postpone_count + 1);
            match postpone_escalation_proposal(&bumped, &settings, local.date_naive(), Utc::now()) {
                Some(proposal) => {
                    println!("\n{}", proposal.reason);
                    println!(
                        "  primary: reserve {} min at {} on {}",
                        proposal.primary.target_minutes.unwrap_or(settings.morning_block_minutes),
                        proposal.primary.start_time.as_deref().unwrap_or("-"),
                        proposal.primary.to_date.map(|d| d.to_string()).unwrap_or_default()
                    );
                    for alt in &proposal.alternatives {
                        println!("  alternative: {:?} {}", alt.kind, alt.task_id);
                    }
                }
                None => {
                    println!(
                        "Moved {}x so far; escalation starts at {}.",
                        bumped.postpone_count, settings.max_postpones_before_escalation
                    );
                }
            }
        }

        Command::Sliders { energy, focus } => {
            let local = Local::now();
            let mut service = LearningService::new(JsonProfileStore::new(&state_dir));
            let profile = service.apply(
                &cli.user,
                &BehaviorEvent::SlidersChanged {
                    energy: energy.clamp(1, 5) as u8,
                    focus: focus.clamp(1, 5) as u8,
                    hour: local.hour() as u8,
                },
                Utc::now(),
            )?;
            println!(
                "Recorded state {}/5 energy, {}/5 focus at {:02}:00 ({} hour buckets learned).",
                energy.clamp(1, 5),
                focus.clamp(1, 5),
                local.hour(),
                profile.energy_patterns.len()
            );
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn plan(
    user: &str,
    state_dir: &Path,
    settings: &PlannerSettings,
    tasks_path: &Path,
    energy: i64,
    focus: i64,
    mode: &str,
    date: Option<&str>,
    context: Option<String>,
    available: u32,
    halved_postpones: bool,
    now: DateTime<Utc>,
    hour: u8,
) -> Result<()> {
    let tasks = load_tasks(tasks_path)?;

    let today = match date {
        Some(raw) => parse_plan_date(raw)
            .with_context(|| format!("invalid plan date '{raw}' (expected YYYY-MM-DD)"))?,
        None => now.date_naive(),
    };
    let work_mode: WorkMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut ctx = DayContext::new(today, energy, focus).with_mode(work_mode);
    if let Some(filter) = context {
        ctx = ctx.with_filter(filter);
    }

    let strategy = ScoreStrategy {
        postpone_policy: if halved_postpones {
            PostponePolicy::HalvedPenalty
        } else {
            PostponePolicy::PureBonus
        },
    };

    let ranking = match rank(&tasks, &ctx, strategy) {
        Ok(ranking) => ranking,
        Err(RankError::NoEligibleTasks { mode, dropped }) => {
            println!(
                "No eligible tasks: the {mode:?} work mode filtered out all {dropped} pending task(s)."
            );
            println!("Relax the mode (or pick another) to see them again.");
            return Ok(());
        }
    };

    if ranking.is_empty() {
        println!("Nothing pending for {today}. Enjoy the slack.");
        return Ok(());
    }

    print_ranking(&ranking);

    let usage = light_task_usage(&tasks, settings);
    if usage.exceeded {
        println!(
            "\nHeads up: {} min of light work done today (budget {} min); consider something heavier next.",
            usage.minutes, usage.limit
        );
    }

    let store = JsonProfileStore::new(state_dir);
    let profile = store.load(user)?;
    if let Some(profile) = &profile {
        print_adaptive(&ranking, &ctx, profile, &tasks, now, hour);
    }

    let rc = RecommendationContext { today, available_minutes: available };
    let recs = generate_recommendations(
        &ranking.tasks(),
        &ctx,
        &profile.unwrap_or_default(),
        &rc,
    );
    if recs.is_empty() {
        println!("\nNo recommendations; the plan looks workable as ranked.");
        return Ok(());
    }

    println!("\nRecommendations:");
    for rec in &recs {
        println!(
            "  [{:?}/{:.0}%] {}",
            rec.impact,
            rec.confidence * 100.0,
            rec.title
        );
        for reason in &rec.reasoning {
            println!("      - {reason}");
        }
        if rec.expected.time_saved_min > 0 {
            println!("      saves ~{} min", rec.expected.time_saved_min);
        }
    }

    Ok(())
}

fn print_ranking(ranking: &Ranking) {
    println!("Ranked plan ({} task(s)):", ranking.len());
    for (i, entry) in ranking.entries.iter().enumerate() {
        println!(
            "{:>3}. [{:6.1}] {}",
            i + 1,
            entry.score.total,
            entry.task.title
        );
        for reason in entry.score.reasoning.iter().take(3) {
            println!("      - {reason}");
        }
    }
}

fn print_adaptive(
    ranking: &Ranking,
    ctx: &DayContext,
    profile: &BehaviorProfile,
    all: &[Task],
    now: DateTime<Utc>,
    hour: u8,
) {
    let recent: Vec<Task> = all.iter().filter(|t| t.completed).cloned().collect();

    println!("\nPersonalized view (top 5):");
    for entry in ranking.entries.iter().take(5) {
        let adaptive = adaptive_score(&entry.task, ctx, profile, &recent, now, hour);
        println!(
            "  [{:6.1} @ {:.0}% confidence] {}",
            adaptive.total,
            adaptive.confidence * 100.0,
            entry.task.title
        );
        for reason in adaptive.reasoning.iter().take(2) {
            println!("      - {reason}");
        }
    }
}

fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    if !path.exists() {
        bail!("task file not found: {} (pass --tasks <path>)", path.display());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn find_task(tasks: &[Task], id: &str) -> Result<Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .with_context(|| format!("no task with id '{id}' in the task file"))
}
