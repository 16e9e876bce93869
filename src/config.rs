use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};
use crate::policy::ConflictPolicy;
use crate::registry::DEFAULT_SUGGESTION_THRESHOLD;

/// Project-level config file name.
pub const PROJECT_CONFIG: &str = "powerforge.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("POWERFORGE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                ForgeError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a config document without touching the environment.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| ForgeError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("powerforge/config.toml"))
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&project_root.join(PROJECT_CONFIG))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| ForgeError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| ForgeError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.resolution {
            self.resolution.merge(patch);
        }
        if let Some(patch) = patch.lint {
            self.lint.merge(patch);
        }
        if let Some(patch) = patch.batch {
            self.batch.merge(patch);
        }
        if let Some(patch) = patch.robot {
            self.robot.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if robot_requested_by_env() {
            self.robot.format = "json".to_string();
            self.robot.include_metadata = true;
        }

        if let Some(value) = env_string("POWERFORGE_CONFLICT_POLICY") {
            self.resolution.conflict_policy = value.parse().map_err(ForgeError::Config)?;
        }
        if let Some(value) = env_f64("POWERFORGE_SUGGESTION_THRESHOLD")? {
            self.resolution.suggestion_threshold = value;
        }
        if let Some(value) = env_bool("POWERFORGE_REDACT_AUDIT") {
            self.resolution.redact_audit_text = value;
        }

        if let Some(value) = env_bool("POWERFORGE_LINT_STRICT") {
            self.lint.strict = value;
        }
        if let Some(values) = env_list("POWERFORGE_LINT_DISABLED") {
            self.lint.disabled_rules = merge_unique(values, &self.lint.disabled_rules);
        }

        if let Some(value) = env_u32("POWERFORGE_BATCH_THREADS")? {
            self.batch.threads = value;
        }

        if let Some(value) = env_string("POWERFORGE_ROBOT_FORMAT") {
            self.robot.format = value;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.resolution.suggestion_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ForgeError::Config(format!(
                "resolution.suggestion_threshold must be within 0.0..=1.0 (got {threshold})"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default)]
    pub suggestion_threshold: f64,
    #[serde(default)]
    pub redact_audit_text: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Warn,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            redact_audit_text: true,
        }
    }
}

impl ResolutionConfig {
    fn merge(&mut self, patch: ResolutionPatch) {
        if let Some(value) = patch.conflict_policy {
            self.conflict_policy = value;
        }
        if let Some(value) = patch.suggestion_threshold {
            self.suggestion_threshold = value;
        }
        if let Some(value) = patch.redact_audit_text {
            self.redact_audit_text = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub strict: bool,
}

impl LintConfig {
    fn merge(&mut self, patch: LintPatch) {
        if let Some(values) = patch.disabled_rules {
            self.disabled_rules = merge_unique(values, &self.disabled_rules);
        }
        if let Some(value) = patch.strict {
            self.strict = value;
        }
    }
}

/// Parallel batch evaluation. `threads = 0` uses rayon's default pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub threads: u32,
}

impl BatchConfig {
    fn merge(&mut self, patch: BatchPatch) {
        if let Some(value) = patch.threads {
            self.threads = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub include_metadata: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            include_metadata: false,
        }
    }
}

impl RobotConfig {
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn merge(&mut self, patch: RobotPatch) {
        if let Some(value) = patch.format {
            self.format = value;
        }
        if let Some(value) = patch.include_metadata {
            self.include_metadata = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub resolution: Option<ResolutionPatch>,
    pub lint: Option<LintPatch>,
    pub batch: Option<BatchPatch>,
    pub robot: Option<RobotPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ResolutionPatch {
    pub conflict_policy: Option<ConflictPolicy>,
    pub suggestion_threshold: Option<f64>,
    pub redact_audit_text: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LintPatch {
    pub disabled_rules: Option<Vec<String>>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BatchPatch {
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RobotPatch {
    pub format: Option<String>,
    pub include_metadata: Option<bool>,
}

/// Whether `POWERFORGE_ROBOT` asks for JSON output.
#[must_use]
pub fn robot_requested_by_env() -> bool {
    env_bool("POWERFORGE_ROBOT").unwrap_or(false)
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u32>().map(Some).map_err(|err| {
            ForgeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<f64>().map(Some).map_err(|err| {
            ForgeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
