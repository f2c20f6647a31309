use crate::policy::cautious_choice;
use euchre_core::belief::{ChanceChart, DealSampler, SamplingError};
use euchre_core::model::bidding::Declaration;
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::{Seat, Team};
use euchre_core::model::round::{PlaySetup, RoundError, RoundState};
use euchre_core::model::trick::Trick;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{Level, event};

const DEFAULT_TRIALS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloConfig {
    /// Rollouts per candidate card.
    pub trials: usize,
    pub parallel: bool,
    /// Seat cards the tracker has confirmed before shuffling the rest.
    pub pin_known_cards: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            parallel: true,
            pin_known_cards: true,
        }
    }
}

impl MonteCarloConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let trials = read("EUCHRE_MC_TRIALS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&value| value > 0)
            .unwrap_or(defaults.trials);
        let parallel = read("EUCHRE_MC_PARALLEL")
            .map(|raw| flag_enabled(&raw))
            .unwrap_or(defaults.parallel);
        let pin_known_cards = read("EUCHRE_MC_PIN_KNOWN")
            .map(|raw| flag_enabled(&raw))
            .unwrap_or(defaults.pin_known_cards);

        Self {
            trials,
            parallel,
            pin_known_cards,
        }
    }
}

fn flag_enabled(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON")
}

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("cannot sample hidden hands: {0}")]
    Sampling(#[from] SamplingError),
    #[error("monte carlo evaluation cancelled")]
    Cancelled,
    #[error("{0} has no legal card")]
    NoLegalCards(Seat),
    #[error("rollout left the rules: {0}")]
    Round(#[from] RoundError),
    #[error("rollout ended before the round was scored")]
    Incomplete,
}

/// Everything a rollout needs about the decision point.
pub struct RolloutRequest<'a> {
    pub seat: Seat,
    pub hand: &'a Hand,
    pub trick: &'a Trick,
    pub declaration: Declaration,
    pub dealer: Seat,
    pub upcard: Card,
    pub tricks_won: [u8; 2],
    pub chart: &'a ChanceChart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateValue {
    pub card: Card,
    /// Mean points the deciding seat's team gains in the round, from 0 to 2.
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub card: Card,
    pub candidates: Vec<CandidateValue>,
    pub trials_run: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
}

impl MonteCarloEngine {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MonteCarloConfig {
        self.config
    }

    /// Picks the legal card with the best mean rollout value, ties to the first candidate.
    ///
    /// A single legal card is returned without running any trial. `cancel` is polled between
    /// candidates.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        request: &RolloutRequest,
        rng: &mut R,
        cancel: Option<&AtomicBool>,
    ) -> Result<Decision, RolloutError> {
        let trump = request.trick.trump();
        let legal = request.hand.legal_cards(request.trick.lead_suit(), trump);
        match legal.as_slice() {
            [] => return Err(RolloutError::NoLegalCards(request.seat)),
            [only] => {
                return Ok(Decision {
                    card: *only,
                    candidates: Vec::new(),
                    trials_run: 0,
                });
            }
            _ => {}
        }

        let sampler = DealSampler::new(request.chart, request.hand, self.config.pin_known_cards)?;
        let base_seed: u64 = rng.r#gen();
        let trials = self.config.trials.max(1);

        let mut candidates = Vec::with_capacity(legal.len());
        for &card in &legal {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(RolloutError::Cancelled);
            }
            let total = self.evaluate(request, &sampler, card, base_seed, trials)?;
            candidates.push(CandidateValue {
                card,
                mean: total as f64 / trials as f64,
            });
        }

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.mean > best.mean {
                best = *candidate;
            }
        }

        log_decision(request.seat, best, &candidates, trials);
        Ok(Decision {
            card: best.card,
            trials_run: trials * candidates.len(),
            candidates,
        })
    }

    fn evaluate(
        &self,
        request: &RolloutRequest,
        sampler: &DealSampler,
        candidate: Card,
        base_seed: u64,
        trials: usize,
    ) -> Result<i64, RolloutError> {
        // Every candidate sees the same deal stream, so means are compared on identical deals.
        let run = |trial: usize| {
            let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(trial as u64));
            rollout(request, sampler, candidate, &mut rng)
        };

        if self.config.parallel {
            (0..trials)
                .into_par_iter()
                .map(run)
                .try_reduce(|| 0, |a, b| Ok(a + b))
        } else {
            let mut total = 0;
            for trial in 0..trials {
                total += run(trial)?;
            }
            Ok(total)
        }
    }
}

/// Plays `candidate`, then finishes the round with every seat on the cautious policy.
fn rollout(
    request: &RolloutRequest,
    sampler: &DealSampler,
    candidate: Card,
    rng: &mut SmallRng,
) -> Result<i64, RolloutError> {
    let deal = sampler.sample(rng);
    let mut round = RoundState::resume_play(PlaySetup {
        dealer: request.dealer,
        upcard: request.upcard,
        declaration: request.declaration,
        hands: deal.into_hands(),
        trick: request.trick.clone(),
        tricks_won: request.tricks_won,
    });

    round.play_card(request.seat, candidate)?;
    while let Some(seat) = round.expected_actor() {
        let trick = round.current_trick().ok_or(RolloutError::Incomplete)?;
        let legal = round.legal_cards(seat);
        let card = cautious_choice(&legal, trick, seat).ok_or(RolloutError::NoLegalCards(seat))?;
        round.play_card(seat, card)?;
    }

    team_points(&round, request.seat.team())
}

/// Points `team` gained in a finished round.
fn team_points(round: &RoundState, team: Team) -> Result<i64, RolloutError> {
    round
        .result()
        .map(|result| i64::from(result.score.points_for(team)))
        .ok_or(RolloutError::Incomplete)
}

fn log_decision(seat: Seat, best: CandidateValue, candidates: &[CandidateValue], trials: usize) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let values: Vec<String> = candidates
        .iter()
        .map(|c| format!("{}={:.3}", c.card, c.mean))
        .collect();
    event!(
        target: "euchre_bot::monte_carlo",
        Level::DEBUG,
        seat = %seat,
        chosen = %best.card,
        value = best.mean,
        trials,
        candidates = ?values,
        "monte carlo decision"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use euchre_core::model::bidding::DeclarationKind;
    use euchre_core::model::suit::Suit;
    use std::collections::HashMap;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn last_trick(tricks_won: [u8; 2]) -> RoundState {
        let hands = ["A♣", "9♥", "K♦", "10♠"].map(|text| Hand::with_cards(vec![card(text)]));
        RoundState::resume_play(PlaySetup {
            dealer: Seat::P4,
            upcard: card("J♠"),
            declaration: Declaration::new(Suit::Clubs, Seat::P1, DeclarationKind::Called),
            hands,
            trick: Trick::new(Seat::P1, Suit::Clubs),
            tricks_won,
        })
    }

    #[test]
    fn unfinished_round_has_no_team_points() {
        let round = last_trick([2, 2]);
        assert!(matches!(
            team_points(&round, Team::A),
            Err(RolloutError::Incomplete)
        ));
    }

    #[test]
    fn team_points_count_only_what_the_team_gains() {
        let mut round = last_trick([2, 2]);
        for (seat, text) in [
            (Seat::P1, "A♣"),
            (Seat::P2, "9♥"),
            (Seat::P3, "K♦"),
            (Seat::P4, "10♠"),
        ] {
            round.play_card(seat, card(text)).unwrap();
        }
        assert_eq!(round.tricks_won(), [3, 2]);
        assert_eq!(team_points(&round, Team::A).unwrap(), 1);
        assert_eq!(team_points(&round, Team::B).unwrap(), 0);
    }

    #[test]
    fn config_from_env_default_fallbacks() {
        let config = MonteCarloConfig::from_reader(|_| None);
        assert_eq!(config, MonteCarloConfig::default());
        assert_eq!(config.trials, 1000);
        assert!(config.parallel);
        assert!(config.pin_known_cards);
    }

    #[test]
    fn config_from_env_respects_overrides() {
        let mut vars = HashMap::new();
        vars.insert("EUCHRE_MC_TRIALS".to_string(), "64".to_string());
        vars.insert("EUCHRE_MC_PARALLEL".to_string(), "off".to_string());
        vars.insert("EUCHRE_MC_PIN_KNOWN".to_string(), "1".to_string());

        let config = MonteCarloConfig::from_reader(|key| vars.get(key).cloned());
        assert_eq!(config.trials, 64);
        assert!(!config.parallel);
        assert!(config.pin_known_cards);
    }

    #[test]
    fn config_ignores_zero_or_garbage_trials() {
        let mut vars = HashMap::new();
        vars.insert("EUCHRE_MC_TRIALS".to_string(), "0".to_string());
        assert_eq!(MonteCarloConfig::from_reader(|key| vars.get(key).cloned()).trials, 1000);
        vars.insert("EUCHRE_MC_TRIALS".to_string(), "lots".to_string());
        assert_eq!(MonteCarloConfig::from_reader(|key| vars.get(key).cloned()).trials, 1000);
    }
}
