use euchre_bot::Validation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

const SEAT_COUNT: usize = 4;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Tournament description read from `bench.yaml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    /// Seated P1..P4 in order; entries 0/2 and 1/3 are partners.
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub rules: RulesConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) => return Err(ConfigError::Read { source, path }),
        };
        let mut config: BenchmarkConfig = match serde_yaml::from_str(&text) {
            Ok(config) => config,
            Err(source) => return Err(ConfigError::Parse { source, path }),
        };
        if let Err(source) = config.validate() {
            return Err(ConfigError::Invalid { path, source });
        }
        Ok(config)
    }

    /// Checks every section and fills in defaults; performs no I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_run_id(&self.run_id)?;
        self.games.check()?;
        check_lineup(&mut self.agents)?;
        self.outputs.check(&self.run_id)?;
        self.logging.check()
    }

    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        self.outputs.resolve(&self.run_id)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "GamesConfig::default_target")]
    pub target_score: u32,
    /// Shift agents one seat clockwise each game; partnerships stay intact.
    #[serde(default = "GamesConfig::default_rotation")]
    pub rotate_seats: bool,
}

impl GamesConfig {
    fn default_target() -> u32 {
        euchre_core::model::score::DEFAULT_TARGET_SCORE
    }

    fn default_rotation() -> bool {
        true
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(invalid("games.count", "at least one game is required"));
        }
        if self.target_score == 0 {
            return Err(invalid("games.target_score", "target score must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    /// Kind-specific options; only `monte_carlo` accepts any.
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Random,
    HighValue,
    LowValue,
    Cautious,
    MonteCarlo,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct RulesConfig {
    #[serde(default)]
    pub validation: Validation,
}

/// Output paths; each may contain `{run_id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    #[serde(default)]
    pub transcripts_dir: Option<String>,
}

impl OutputsConfig {
    fn check(&self, run_id: &str) -> Result<(), ValidationError> {
        let named = [
            ("outputs.jsonl", Some(&self.jsonl)),
            ("outputs.summary_md", Some(&self.summary_md)),
            ("outputs.transcripts_dir", self.transcripts_dir.as_ref()),
        ];
        for (field, template) in named {
            let Some(template) = template else { continue };
            if template.trim().is_empty() {
                return Err(invalid(field, "path is empty"));
            }
            if expand(run_id, template).components().next().is_none() {
                return Err(invalid(field, "path has no components after expansion"));
            }
        }
        Ok(())
    }

    fn resolve(&self, run_id: &str) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: expand(run_id, &self.jsonl),
            summary_md: expand(run_id, &self.summary_md),
            transcripts_dir: self
                .transcripts_dir
                .as_deref()
                .map(|template| expand(run_id, template)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    /// `trace`..`error`; empty or missing means `info`.
    #[serde(default)]
    pub tracing_level: Option<String>,
}

impl LoggingConfig {
    fn check(&self) -> Result<(), ValidationError> {
        match self.tracing_level.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() && Level::from_str(raw).is_err() => Err(invalid(
                "logging.tracing_level",
                &format!("unknown level '{raw}'"),
            )),
            _ => Ok(()),
        }
    }

    pub fn level(&self) -> Level {
        self.tracing_level
            .as_deref()
            .and_then(|raw| Level::from_str(raw.trim()).ok())
            .unwrap_or(Level::INFO)
    }
}

fn check_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(invalid("run_id", "run_id is empty"));
    }
    if let Some(bad) = run_id.chars().find(|c| !RUN_ID_ALLOWED.contains(*c)) {
        return Err(invalid(
            "run_id",
            &format!("character '{bad}' is not allowed; use letters, digits, '.', '_' or '-'"),
        ));
    }
    Ok(())
}

fn check_lineup(agents: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if agents.len() != SEAT_COUNT {
        return Err(ValidationError::SeatCount {
            found: agents.len(),
        });
    }

    let mut names = HashSet::with_capacity(SEAT_COUNT);
    for (index, agent) in agents.iter_mut().enumerate() {
        let field = format!("agents[{index}].name");
        if agent.name.trim().is_empty() {
            return Err(invalid(&field, "name is empty"));
        }
        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(invalid(&field, "name may only use letters, digits, '.', '_' or '-'"));
        }
        if !names.insert(agent.name.clone()) {
            return Err(ValidationError::DuplicateAgent(agent.name.clone()));
        }
        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        }
    }
    Ok(())
}

fn expand(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub transcripts_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("{path:?} failed validation: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("agents: a table seats exactly four agents, found {found}")]
    SeatCount { found: usize },
    #[error("agents: '{0}' appears more than once")]
    DuplicateAgent(String),
}
