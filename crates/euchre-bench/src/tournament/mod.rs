use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use euchre_bot::{
    EngineConfig, EngineError, GameEngine, GameSummary, HighValuePlayer, HighWithCautionPlayer,
    LowValuePlayer, MonteCarloConfig, MonteCarloPlayer, Player, RandomPlayer,
};
use euchre_core::game::transcript::Transcript;
use euchre_core::model::player::Seat;
use euchre_core::model::score::RoundOutcome;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};

const SEAT_COUNT: usize = 4;
const SEAT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub transcripts_dir: Option<PathBuf>,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let defaults = MonteCarloConfig::from_env();
        let agents = AgentBlueprint::from_configs(&config.agents, defaults)?;

        if agents.len() != SEAT_COUNT {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute the tournament, streaming one JSONL row per game to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if let Some(dir) = self.outputs.transcripts_dir.as_ref() {
            fs::create_dir_all(dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config);

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let outcome = self.play_game(game_index, game_seed)?;
            analytics.record_game(&outcome)?;
            write_game_row(&mut writer, &self.config, &self.agents, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            transcripts_dir: self.outputs.transcripts_dir.clone(),
            analytics: summary,
        })
    }

    fn play_game(&self, game_index: usize, game_seed: u64) -> Result<GameOutcome, RunnerError> {
        let seating = seating_for(game_index, self.config.games.rotate_seats);
        let players: [Box<dyn Player>; SEAT_COUNT] = std::array::from_fn(|seat| {
            self.agents[seating[seat]].spawn(seat_seed(game_seed, seat))
        });

        let mut engine = GameEngine::new(
            players,
            EngineConfig {
                validation: self.config.rules.validation,
                target_score: self.config.games.target_score,
            },
        );
        let mut state = engine.new_match(game_seed);
        let mut transcript = Transcript::new();
        let summary = engine
            .play_game(&mut state, &mut transcript)
            .map_err(|source| RunnerError::Engine { game_index, source })?;

        if let Some(dir) = self.outputs.transcripts_dir.as_ref() {
            transcript.save(&dir.join(format!("game_{game_index:05}.log")))?;
        }

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            let substitutions: usize = summary
                .rounds
                .iter()
                .map(|round| round.substitutions.len())
                .sum();
            event!(
                target: "euchre_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                game_seed,
                winner = %summary.winner,
                team0 = summary.scores[0],
                team1 = summary.scores[1],
                rounds = summary.rounds.len() as u32,
                substitutions = substitutions as u32
            );
        }

        Ok(GameOutcome {
            game_index,
            game_seed,
            seating,
            summary,
        })
    }
}

/// Agent index seated at each of P1..P4.
///
/// Rotation shifts every agent one seat per game, so agents 0 and 2 always sit
/// opposite each other and stay partners.
fn seating_for(game_index: usize, rotate: bool) -> [usize; SEAT_COUNT] {
    let offset = if rotate { game_index % SEAT_COUNT } else { 0 };
    std::array::from_fn(|seat| (seat + offset) % SEAT_COUNT)
}

fn seat_seed(game_seed: u64, seat: usize) -> u64 {
    game_seed ^ (seat as u64 + 1).wrapping_mul(SEAT_SEED_STRIDE)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    agents: &[AgentBlueprint],
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let summary = &outcome.summary;
    let seating = Seat::LOOP
        .iter()
        .map(|&seat| {
            let timing = summary.timings[seat.index()];
            SeatSnapshot {
                seat: seat.to_string(),
                team: seat.team().index() as u8,
                agent: agents[outcome.seating[seat.index()]].name.clone(),
                decisions: timing.decisions,
                mean_us: timing.mean_micros(),
            }
        })
        .collect::<Vec<_>>();
    let winning_agents = seating
        .iter()
        .filter(|snapshot| usize::from(snapshot.team) == summary.winner.index())
        .map(|snapshot| snapshot.agent.clone())
        .collect();

    let mut marches = [0u32; 2];
    let mut euchres = [0u32; 2];
    for round in &summary.rounds {
        let score = round.result.score;
        match score.outcome {
            RoundOutcome::March => marches[score.team.index()] += 1,
            RoundOutcome::Euchred => euchres[score.team.index()] += 1,
            RoundOutcome::Made => {}
        }
    }

    let row = GameLogRow {
        run_id: config.run_id.clone(),
        game_id: format!("G{:05}", outcome.game_index),
        game_index: outcome.game_index,
        game_seed: outcome.game_seed,
        seating,
        winner: summary.winner.index() as u8,
        winning_agents,
        scores: summary.scores,
        rounds: summary.rounds.len(),
        marches,
        euchres,
        substitutions: summary
            .rounds
            .iter()
            .map(|round| round.substitutions.len())
            .sum(),
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// One finished game plus the seating it was played with.
pub struct GameOutcome {
    pub game_index: usize,
    pub game_seed: u64,
    pub seating: [usize; SEAT_COUNT],
    pub summary: GameSummary,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub team: u8,
    pub agent: String,
    pub decisions: u64,
    pub mean_us: f64,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    game_seed: u64,
    seating: Vec<SeatSnapshot>,
    winner: u8,
    winning_agents: Vec<String>,
    scores: [u32; 2],
    rounds: usize,
    marches: [u32; 2],
    /// Indexed by the team that scored the euchre.
    euchres: [u32; 2],
    substitutions: usize,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game {game_index} failed: {source}")]
    Engine {
        game_index: usize,
        #[source]
        source: EngineError,
    },
    #[error("configuration requires exactly 4 agents but found {found}")]
    SeatCount { found: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent '{name}' does not take parameters of kind {kind:?}")]
    UnexpectedParams { name: String, kind: AgentKind },
    #[error("invalid monte carlo parameter for agent '{name}': {message}")]
    InvalidMonteCarloParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Random,
    HighValue,
    LowValue,
    Cautious,
    MonteCarlo(MonteCarloConfig),
}

impl AgentBlueprint {
    fn from_configs(
        configs: &[AgentConfig],
        defaults: MonteCarloConfig,
    ) -> Result<Vec<Self>, AgentError> {
        configs
            .iter()
            .map(|config| Self::from_config(config, defaults))
            .collect()
    }

    fn from_config(config: &AgentConfig, defaults: MonteCarloConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::MonteCarlo => AgentImplementation::MonteCarlo(monte_carlo_params(
                &config.name,
                &config.params,
                defaults,
            )?),
            kind => {
                if has_params(&config.params) {
                    return Err(AgentError::UnexpectedParams {
                        name: config.name.clone(),
                        kind,
                    });
                }
                match kind {
                    AgentKind::Random => AgentImplementation::Random,
                    AgentKind::HighValue => AgentImplementation::HighValue,
                    AgentKind::LowValue => AgentImplementation::LowValue,
                    _ => AgentImplementation::Cautious,
                }
            }
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn(&self, seed: u64) -> Box<dyn Player> {
        let name = self.name.clone();
        match &self.implementation {
            AgentImplementation::Random => Box::new(RandomPlayer::new(name, seed)),
            AgentImplementation::HighValue => Box::new(HighValuePlayer::new(name)),
            AgentImplementation::LowValue => Box::new(LowValuePlayer::new(name)),
            AgentImplementation::Cautious => Box::new(HighWithCautionPlayer::new(name)),
            AgentImplementation::MonteCarlo(config) => {
                Box::new(MonteCarloPlayer::new(name, *config, seed))
            }
        }
    }
}

fn has_params(params: &serde_yaml::Value) -> bool {
    match params {
        serde_yaml::Value::Null => false,
        serde_yaml::Value::Mapping(mapping) => !mapping.is_empty(),
        _ => true,
    }
}

fn monte_carlo_params(
    name: &str,
    params: &serde_yaml::Value,
    defaults: MonteCarloConfig,
) -> Result<MonteCarloConfig, AgentError> {
    let invalid = |message: &str| AgentError::InvalidMonteCarloParam {
        name: name.to_string(),
        message: message.to_string(),
    };

    if params.is_null() {
        return Ok(defaults);
    }

    let mapping = params
        .as_mapping()
        .ok_or_else(|| invalid("expected mapping for monte carlo params"))?;

    let mut config = defaults;
    for (key, value) in mapping {
        match key.as_str() {
            Some("trials") => {
                config.trials = value
                    .as_u64()
                    .filter(|&trials| trials > 0)
                    .map(|trials| trials as usize)
                    .ok_or_else(|| invalid("trials must be a positive integer"))?;
            }
            Some("parallel") => {
                config.parallel = value
                    .as_bool()
                    .ok_or_else(|| invalid("parallel must be a boolean"))?;
            }
            Some("pin_known_cards") => {
                config.pin_known_cards = value
                    .as_bool()
                    .ok_or_else(|| invalid("pin_known_cards must be a boolean"))?;
            }
            Some(other) => {
                return Err(AgentError::InvalidMonteCarloParam {
                    name: name.to_string(),
                    message: format!("unknown parameter '{other}'"),
                });
            }
            None => return Err(invalid("parameter names must be strings")),
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::FromIterator;

    fn defaults() -> MonteCarloConfig {
        MonteCarloConfig {
            trials: 1000,
            parallel: true,
            pin_known_cards: true,
        }
    }

    #[test]
    fn rotation_keeps_partnerships() {
        for game_index in 0..8 {
            let seating = seating_for(game_index, true);
            assert_eq!((seating[0] + 2) % 4, seating[2]);
            assert_eq!((seating[1] + 2) % 4, seating[3]);
            let mut sorted = seating;
            sorted.sort();
            assert_eq!(sorted, [0, 1, 2, 3]);
        }
        assert_eq!(seating_for(1, true), [1, 2, 3, 0]);
        assert_eq!(seating_for(5, false), [0, 1, 2, 3]);
    }

    #[test]
    fn seat_seeds_differ_per_seat() {
        let seeds: Vec<u64> = (0..4).map(|seat| seat_seed(42, seat)).collect();
        let mut unique = seeds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn monte_carlo_params_override_defaults() {
        let params = serde_yaml::Mapping::from_iter([
            (
                serde_yaml::Value::String("trials".into()),
                serde_yaml::Value::Number(64.into()),
            ),
            (
                serde_yaml::Value::String("parallel".into()),
                serde_yaml::Value::Bool(false),
            ),
        ]);
        let config =
            monte_carlo_params("mc", &serde_yaml::Value::Mapping(params), defaults()).unwrap();
        assert_eq!(config.trials, 64);
        assert!(!config.parallel);
        assert!(config.pin_known_cards);
    }

    #[test]
    fn monte_carlo_params_reject_zero_trials() {
        let params = serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("trials".into()),
            serde_yaml::Value::Number(0.into()),
        )]);
        let err = monte_carlo_params("mc", &serde_yaml::Value::Mapping(params), defaults())
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidMonteCarloParam { .. }));
    }

    #[test]
    fn simple_agents_reject_params() {
        let config = AgentConfig {
            name: "greedy".into(),
            kind: AgentKind::HighValue,
            params: serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter([(
                serde_yaml::Value::String("trials".into()),
                serde_yaml::Value::Number(10.into()),
            )])),
        };
        assert!(matches!(
            AgentBlueprint::from_config(&config, defaults()),
            Err(AgentError::UnexpectedParams { .. })
        ));
    }

    #[test]
    fn blueprints_spawn_named_players() {
        let config = AgentConfig {
            name: "careful".into(),
            kind: AgentKind::Cautious,
            params: serde_yaml::Value::Mapping(Default::default()),
        };
        let blueprint = AgentBlueprint::from_config(&config, defaults()).unwrap();
        assert_eq!(blueprint.spawn(7).name(), "careful");
    }
}
