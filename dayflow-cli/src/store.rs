//! File-backed state under `~/.dayflow/`: one JSON profile per user and an
//! optional `config.toml` with planner settings.

use anyhow::{Context, Result};
use dayflow_core::{BehaviorProfile, PlannerSettings, ProfileStore};
use std::fs;
use std::path::{Path, PathBuf};

pub fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dayflow")
}

/// Profile repository over plain JSON files. Two concurrent sessions
/// writing the same user race last-write-wins; the core documents that as
/// the expected store behavior.
pub struct JsonProfileStore {
    dir: PathBuf,
}

impl JsonProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("profile-{user_id}.json"))
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<BehaviorProfile>> {
        let path = self.path_for(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let profile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(profile))
    }

    fn save(&mut self, user_id: &str, profile: &BehaviorProfile) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(user_id);
        let raw = serde_json::to_string_pretty(profile)?;
        fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Read planner settings from `<dir>/config.toml`; a missing file means
/// defaults, and any present field overrides its default.
pub fn load_settings(dir: &Path) -> Result<PlannerSettings> {
    let path = dir.join("config.toml");
    if !path.exists() {
        return Ok(PlannerSettings::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
