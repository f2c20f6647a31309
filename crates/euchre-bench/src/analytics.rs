use std::fs;
use std::path::Path;

use euchre_bot::Validation;
use euchre_core::model::player::Seat;
use euchre_core::model::score::RoundOutcome;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::GameOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("seating references unknown agent index {0}")]
    UnknownAgent(usize),
    #[error("no games were recorded")]
    NoGames,
    #[error("statistics error: {0}")]
    Stats(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Accumulates per-agent and per-partnership results as games finish.
///
/// Agents 0 and 2 form partnership 0, agents 1 and 3 partnership 1; seat
/// rotation never separates them.
pub struct AnalyticsCollector {
    agents: Vec<AgentAccumulator>,
    partnerships: [PartnershipAccumulator; 2],
    games: usize,
    target_score: u32,
    validation: Validation,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let agents = config
            .agents
            .iter()
            .enumerate()
            .map(|(index, agent)| AgentAccumulator::new(agent.name.clone(), agent.kind, index % 2))
            .collect::<Vec<_>>();
        let partnerships = std::array::from_fn(|pair| {
            let members = agents
                .iter()
                .filter(|agent| agent.partnership == pair)
                .map(|agent| agent.name.as_str())
                .collect::<Vec<_>>()
                .join(" + ");
            PartnershipAccumulator::new(members)
        });

        Self {
            agents,
            partnerships,
            games: 0,
            target_score: config.games.target_score,
            validation: config.rules.validation,
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), AnalyticsError> {
        let summary = &outcome.summary;
        self.games += 1;

        let mut pair_recorded = [false; 2];
        for seat in Seat::LOOP {
            let agent_index = outcome.seating[seat.index()];
            let agent = self
                .agents
                .get_mut(agent_index)
                .ok_or(AnalyticsError::UnknownAgent(agent_index))?;
            let team = seat.team();
            let won = summary.winner == team;

            agent.games += 1;
            if won {
                agent.wins += 1;
            }
            let timing = summary.timings[seat.index()];
            agent.decisions += timing.decisions;
            agent.total_micros += timing.total_micros;

            for round in &summary.rounds {
                let result = &round.result;
                agent.rounds += 1;
                agent.points += u64::from(result.score.points_for(team));
                if result.declaration.team == team {
                    agent.declared += 1;
                    match result.score.outcome {
                        RoundOutcome::Made => agent.made += 1,
                        RoundOutcome::March => {
                            agent.made += 1;
                            agent.marches += 1;
                        }
                        RoundOutcome::Euchred => agent.euchred += 1,
                    }
                } else if result.score.outcome == RoundOutcome::Euchred {
                    agent.euchres_scored += 1;
                }
            }

            let pair = agent.partnership;
            if !pair_recorded[pair] {
                pair_recorded[pair] = true;
                let partnership = &mut self.partnerships[pair];
                partnership.games += 1;
                partnership.points += u64::from(summary.scores[team.index()]);
                if won {
                    partnership.wins += 1;
                }
            }
        }

        Ok(())
    }

    pub fn finalize(self) -> Result<AnalyticsSummary, AnalyticsError> {
        if self.games == 0 {
            return Err(AnalyticsError::NoGames);
        }
        let normal = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::Stats(e.to_string()))?;

        let partnerships = self
            .partnerships
            .into_iter()
            .map(|pair| pair.into_report(&normal))
            .collect();
        let agents = self
            .agents
            .into_iter()
            .map(AgentAccumulator::into_report)
            .collect();

        Ok(AnalyticsSummary {
            games: self.games,
            target_score: self.target_score,
            validation: self.validation,
            partnerships,
            agents,
        })
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    partnership: usize,
    games: usize,
    wins: usize,
    rounds: u64,
    points: u64,
    declared: u64,
    made: u64,
    marches: u64,
    euchred: u64,
    euchres_scored: u64,
    decisions: u64,
    total_micros: u64,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind, partnership: usize) -> Self {
        Self {
            name,
            kind,
            partnership,
            games: 0,
            wins: 0,
            rounds: 0,
            points: 0,
            declared: 0,
            made: 0,
            marches: 0,
            euchred: 0,
            euchres_scored: 0,
            decisions: 0,
            total_micros: 0,
        }
    }

    fn into_report(self) -> AgentReport {
        let win_rate = ratio(self.wins as u64, self.games as u64);
        AgentReport {
            ci95: proportion_interval(win_rate, self.games),
            win_rate,
            points_per_round: ratio(self.points, self.rounds),
            made_rate: ratio(self.made, self.declared),
            mean_us_per_decision: ratio(self.total_micros, self.decisions),
            name: self.name,
            kind: self.kind,
            partnership: self.partnership,
            games: self.games,
            wins: self.wins,
            declared: self.declared,
            marches: self.marches,
            euchred: self.euchred,
            euchres_scored: self.euchres_scored,
        }
    }
}

struct PartnershipAccumulator {
    members: String,
    games: usize,
    wins: usize,
    points: u64,
}

impl PartnershipAccumulator {
    fn new(members: String) -> Self {
        Self {
            members,
            games: 0,
            wins: 0,
            points: 0,
        }
    }

    fn into_report(self, normal: &Normal) -> PartnershipReport {
        let win_rate = ratio(self.wins as u64, self.games as u64);
        PartnershipReport {
            ci95: proportion_interval(win_rate, self.games),
            p_value: even_odds_p_value(self.wins, self.games, normal),
            avg_final_score: ratio(self.points, self.games as u64),
            members: self.members,
            games: self.games,
            wins: self.wins,
            win_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub games: usize,
    pub target_score: u32,
    pub validation: Validation,
    pub partnerships: Vec<PartnershipReport>,
    pub agents: Vec<AgentReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Games: {} to {} points, {:?} validation\n\n",
            self.games, self.target_score, self.validation
        ));

        rows.push_str("## Partnerships\n\n");
        rows.push_str("| Partnership | Games | Wins | Win % | 95% CI | Avg final score | p-value vs 50% |\n");
        rows.push_str("|-------------|-------|------|-------|--------|-----------------|----------------|\n");
        for pair in &self.partnerships {
            rows.push_str(&format!(
                "| {members} | {games} | {wins} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] | {score:.2} | {pval:.3} |\n",
                members = pair.members,
                games = pair.games,
                wins = pair.wins,
                win = pair.win_rate * 100.0,
                ci_low = pair.ci95.0,
                ci_high = pair.ci95.1,
                score = pair.avg_final_score,
                pval = pair.p_value,
            ));
        }

        rows.push_str("\n## Agents\n\n");
        rows.push_str("| Agent | Kind | Games | Win % | 95% CI | Points/round | Declared | Made % | Marches | Euchred | Euchres scored | Avg µs/decision |\n");
        rows.push_str("|-------|------|-------|-------|--------|--------------|----------|--------|---------|---------|----------------|-----------------|\n");
        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] | {ppr:.3} | {declared} | {made:.1}% | {marches} | {euchred} | {scored} | {latency:.1} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = agent.win_rate * 100.0,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                ppr = agent.points_per_round,
                declared = agent.declared,
                made = agent.made_rate * 100.0,
                marches = agent.marches,
                euchred = agent.euchred,
                scored = agent.euchres_scored,
                latency = agent.mean_us_per_decision,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnershipReport {
    pub members: String,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub avg_final_score: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub partnership: usize,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub points_per_round: f64,
    pub declared: u64,
    pub made_rate: f64,
    pub marches: u64,
    pub euchred: u64,
    pub euchres_scored: u64,
    pub mean_us_per_decision: f64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Normal-approximation interval for a win rate, clamped to [0, 1].
fn proportion_interval(rate: f64, samples: usize) -> (f64, f64) {
    if samples == 0 {
        return (0.0, 0.0);
    }
    let std_error = (rate * (1.0 - rate) / samples as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    ((rate - margin).max(0.0), (rate + margin).min(1.0))
}

/// Two-sided p-value for `wins` out of `games` against a fair coin.
fn even_odds_p_value(wins: usize, games: usize, normal: &Normal) -> f64 {
    if games == 0 {
        return 1.0;
    }
    let n = games as f64;
    let z = (wins as f64 - n / 2.0) / (n / 4.0).sqrt();
    (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use euchre_bot::{DecisionTiming, GameSummary, RoundSummary};
    use euchre_core::model::bidding::{Declaration, DeclarationKind};
    use euchre_core::model::player::Team;
    use euchre_core::model::round::RoundResult;
    use euchre_core::model::score::score_round;
    use euchre_core::model::suit::Suit;

    const CONFIG_YAML: &str = r#"
run_id: "analytics"
games:
  seed: 1
  count: 2
agents:
  - { name: "north_south", kind: "cautious" }
  - { name: "east_west", kind: "random" }
  - { name: "partner", kind: "high_value" }
  - { name: "other", kind: "low_value" }
outputs:
  jsonl: "out/games.jsonl"
  summary_md: "out/summary.md"
"#;

    fn config() -> BenchmarkConfig {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(CONFIG_YAML).expect("parse");
        cfg.validate().expect("valid");
        cfg
    }

    fn round(declarer: Seat, tricks: [u8; 2], scores: [u32; 2]) -> RoundSummary {
        let declaration = Declaration::new(Suit::Hearts, declarer, DeclarationKind::Called);
        RoundSummary {
            round: 1,
            dealer: Seat::P4,
            result: RoundResult {
                declaration,
                tricks,
                score: score_round(declarer.team(), tricks),
            },
            scores,
            substitutions: Vec::new(),
        }
    }

    fn outcome(game_index: usize, seating: [usize; 4]) -> GameOutcome {
        GameOutcome {
            game_index,
            game_seed: game_index as u64,
            seating,
            summary: GameSummary {
                winner: Team::A,
                scores: [10, 2],
                rounds: vec![
                    // Team A marches, then euchres Team B.
                    round(Seat::P1, [5, 0], [2, 0]),
                    round(Seat::P2, [3, 2], [4, 0]),
                ],
                timings: [DecisionTiming {
                    decisions: 4,
                    total_micros: 40,
                }; 4],
            },
        }
    }

    #[test]
    fn interval_matches_normal_approximation() {
        let (low, high) = proportion_interval(0.5, 100);
        assert!((low - 0.402).abs() < 1e-9);
        assert!((high - 0.598).abs() < 1e-9);
        assert_eq!(proportion_interval(1.0, 10), (1.0, 1.0));
        assert_eq!(proportion_interval(0.0, 0), (0.0, 0.0));
    }

    #[test]
    fn fair_record_has_unit_p_value() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        assert!((even_odds_p_value(50, 100, &normal) - 1.0).abs() < 1e-9);
        assert!(even_odds_p_value(90, 100, &normal) < 0.001);
    }

    #[test]
    fn records_rounds_from_the_agents_point_of_view() {
        let mut collector = AnalyticsCollector::new(&config());
        collector.record_game(&outcome(0, [0, 1, 2, 3])).unwrap();
        // Rotated: agent 1 now sits in P1 and wins with Team A.
        collector.record_game(&outcome(1, [1, 2, 3, 0])).unwrap();
        let summary = collector.finalize().unwrap();

        let north_south = &summary.agents[0];
        assert_eq!(north_south.games, 2);
        assert_eq!(north_south.wins, 1);
        assert_eq!(north_south.declared, 2);
        assert_eq!(north_south.marches, 1);
        assert_eq!(north_south.euchred, 1);
        assert_eq!(north_south.euchres_scored, 1);
        assert!((north_south.points_per_round - 1.0).abs() < 1e-9);
        assert!((north_south.mean_us_per_decision - 10.0).abs() < 1e-9);

        let pair = &summary.partnerships[0];
        assert_eq!(pair.members, "north_south + partner");
        assert_eq!(pair.games, 2);
        assert_eq!(pair.wins, 1);
        assert!((pair.avg_final_score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_seating_is_rejected() {
        let mut collector = AnalyticsCollector::new(&config());
        assert!(matches!(
            collector.record_game(&outcome(0, [0, 1, 2, 7])),
            Err(AnalyticsError::UnknownAgent(7))
        ));
    }

    #[test]
    fn empty_run_cannot_be_summarised() {
        let collector = AnalyticsCollector::new(&config());
        assert!(matches!(collector.finalize(), Err(AnalyticsError::NoGames)));
    }

    #[test]
    fn markdown_lists_partnerships_and_agents() {
        let mut collector = AnalyticsCollector::new(&config());
        collector.record_game(&outcome(0, [0, 1, 2, 3])).unwrap();
        let summary = collector.finalize().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        summary.write_markdown(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("# Tournament Summary"));
        assert!(text.contains("| north_south + partner | 1 | 1 |"));
        assert!(text.contains("| east_west | Random |"));
    }
}
