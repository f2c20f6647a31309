use crate::player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
use crate::policy::lowest_card;
use euchre_core::game::events::{EventSink, GameEvent};
use euchre_core::game::match_state::MatchState;
use euchre_core::model::bidding::{BidProgress, BidStage, Declaration};
use euchre_core::model::card::Card;
use euchre_core::model::player::{Seat, Team};
use euchre_core::model::round::{PlayOutcome, RoundError, RoundResult, RoundState};
use euchre_core::model::score::DEFAULT_TARGET_SCORE;
use euchre_core::model::suit::Suit;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Level, event};

/// How the engine treats an agent answer the rules reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    /// Abort the game with the rule error.
    #[default]
    Strict,
    /// Substitute a legal fallback and keep playing.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub validation: Validation,
    pub target_score: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation: Validation::Strict,
            target_score: DEFAULT_TARGET_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPoint {
    Bid,
    ForcedTrump,
    Discard,
    Play,
}

/// A rejected answer replaced by the engine in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub round: u32,
    pub seat: Seat,
    pub decision: DecisionPoint,
    pub reason: String,
    pub fallback: String,
}

/// Wall-clock cost of one seat's card decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionTiming {
    pub decisions: u64,
    pub total_micros: u64,
}

impl DecisionTiming {
    fn record(&mut self, elapsed: Duration) {
        self.decisions += 1;
        self.total_micros += elapsed.as_micros() as u64;
    }

    pub fn mean_micros(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.total_micros as f64 / self.decisions as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub dealer: Seat,
    pub result: RoundResult,
    pub scores: [u32; 2],
    pub substitutions: Vec<Substitution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub winner: Team,
    pub scores: [u32; 2],
    pub rounds: Vec<RoundSummary>,
    pub timings: [DecisionTiming; 4],
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("round {round}: {source}")]
    Rules {
        round: u32,
        #[source]
        source: RoundError,
    },
    #[error("round {round}: agent at {seat} failed: {source}")]
    Agent {
        round: u32,
        seat: Seat,
        #[source]
        source: AgentError,
    },
    #[error("round {round} finished without a result")]
    NoResult { round: u32 },
}

enum BidApplied {
    Passed(BidProgress),
    Declared(Declaration),
}

/// Drives a match: asks each seat for decisions, validates them and broadcasts events.
pub struct GameEngine {
    config: EngineConfig,
    players: [Box<dyn Player>; 4],
    pending: Vec<Substitution>,
    timings: [DecisionTiming; 4],
}

impl GameEngine {
    pub fn new(players: [Box<dyn Player>; 4], config: EngineConfig) -> Self {
        Self {
            config,
            players,
            pending: Vec::new(),
            timings: [DecisionTiming::default(); 4],
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn player(&self, seat: Seat) -> &dyn Player {
        self.players[seat.index()].as_ref()
    }

    /// Seeded match using this engine's target score, first dealer P1.
    pub fn new_match(&self, seed: u64) -> MatchState {
        MatchState::with_seed(Seat::P1, seed).with_target_score(self.config.target_score)
    }

    /// Plays rounds until a team reaches the match target.
    pub fn play_game<S: EventSink + ?Sized>(
        &mut self,
        state: &mut MatchState,
        sink: &mut S,
    ) -> Result<GameSummary, EngineError> {
        self.timings = [DecisionTiming::default(); 4];
        let mut rounds = Vec::new();
        while !state.is_over() {
            rounds.push(self.play_round(state, sink)?);
        }

        let Some(winner) = state.winner() else {
            return Err(EngineError::NoResult {
                round: state.round_number(),
            });
        };
        let scores = *state.scores().standings();
        let number = state.round_number();
        self.emit(
            number,
            sink,
            GameEvent::GameEnded {
                winner,
                scores,
                rounds: rounds.len() as u32,
            },
        )?;
        event!(
            target: "euchre_bot::engine",
            Level::INFO,
            winner = %winner,
            team0 = scores[0],
            team1 = scores[1],
            rounds = rounds.len(),
            "game finished"
        );

        Ok(GameSummary {
            winner,
            scores,
            rounds,
            timings: self.timings,
        })
    }

    /// Plays the current deal of `state` to completion, scores it and deals the next one.
    pub fn play_round<S: EventSink + ?Sized>(
        &mut self,
        state: &mut MatchState,
        sink: &mut S,
    ) -> Result<RoundSummary, EngineError> {
        let number = state.round_number();
        let scores = *state.scores().standings();
        let round = state.round_mut();
        let dealer = round.dealer();
        let upcard = round.upcard();
        self.pending.clear();

        for seat in Seat::LOOP {
            let player = &mut self.players[seat.index()];
            player.reset();
            player.set_hand(seat, round.hand(seat));
        }
        let hands = Seat::LOOP.map(|seat| Some(round.hand(seat).cards().to_vec()));
        self.emit(
            number,
            sink,
            GameEvent::RoundStarted {
                round: number,
                dealer,
                hands,
                upcard,
            },
        )?;

        self.run_bidding(number, scores, round, sink)?;
        self.run_tricks(number, round, sink)?;

        let Some(result) = state.finish_round_and_start_next() else {
            return Err(EngineError::NoResult { round: number });
        };
        let scores = *state.scores().standings();
        self.emit(number, sink, GameEvent::RoundEnded { result, scores })?;
        event!(
            target: "euchre_bot::engine",
            Level::INFO,
            round = number,
            dealer = %dealer,
            trump = %result.declaration.trump,
            chooser = %result.declaration.chooser,
            tricks = ?result.tricks,
            outcome = ?result.score.outcome,
            points = result.score.points,
            team0 = scores[0],
            team1 = scores[1],
            "round finished"
        );

        Ok(RoundSummary {
            round: number,
            dealer,
            result,
            scores,
            substitutions: std::mem::take(&mut self.pending),
        })
    }

    fn run_bidding<S: EventSink + ?Sized>(
        &mut self,
        number: u32,
        scores: [u32; 2],
        round: &mut RoundState,
        sink: &mut S,
    ) -> Result<(), EngineError> {
        let dealer = round.dealer();
        let upcard = round.upcard();

        while let Some(stage) = round.bid_stage() {
            let Some(seat) = round.expected_actor() else {
                break;
            };
            let ctx = BidContext {
                seat,
                dealer,
                upcard,
                stage,
                hand: round.hand(seat),
                scores,
            };

            if stage == BidStage::DealerForced {
                let choice = self.players[seat.index()].forced_trump(&ctx, upcard.suit);
                let suit = match round.force_trump(seat, choice) {
                    Ok(_) => choice,
                    Err(source) => {
                        let fallback = first_allowed_suit(upcard.suit);
                        self.substitute(
                            number,
                            seat,
                            DecisionPoint::ForcedTrump,
                            rules(number, source),
                            fallback.to_string(),
                        )?;
                        round
                            .force_trump(seat, fallback)
                            .map_err(|source| rules(number, source))?;
                        fallback
                    }
                };
                self.emit(number, sink, GameEvent::TrumpForced { dealer: seat, suit })?;
                continue;
            }

            let bid = match self.players[seat.index()].choose_trump(&ctx) {
                // Naming the upcard suit in round one is the same as ordering it up.
                Bid::Call(suit) if stage == BidStage::RoundOne && suit == upcard.suit => {
                    Bid::OrderUp
                }
                bid => bid,
            };
            let (bid, applied) = match apply_bid(round, seat, bid) {
                Ok(applied) => (bid, applied),
                Err(source) => {
                    self.substitute(
                        number,
                        seat,
                        DecisionPoint::Bid,
                        rules(number, source),
                        "pass".to_string(),
                    )?;
                    let applied =
                        apply_bid(round, seat, Bid::Pass).map_err(|source| rules(number, source))?;
                    (Bid::Pass, applied)
                }
            };

            match (bid, applied) {
                (_, BidApplied::Passed(BidProgress::UpcardTurnedDown { upcard })) => {
                    self.emit(number, sink, GameEvent::UpcardTurnedDown { upcard })?;
                }
                (_, BidApplied::Passed(_)) => {}
                (Bid::Call(suit), BidApplied::Declared(_)) => {
                    self.emit(number, sink, GameEvent::TrumpCalled { seat, suit })?;
                }
                (_, BidApplied::Declared(declaration)) => {
                    self.emit(number, sink, GameEvent::OrderedUp { seat, dealer })?;
                    let discard = self.run_discard(number, round, declaration.trump)?;
                    self.emit(
                        number,
                        sink,
                        GameEvent::DealerPickedUp {
                            dealer,
                            upcard,
                            discard: Some(discard),
                        },
                    )?;
                }
            }
        }

        let Some(declaration) = round.declaration().copied() else {
            return Err(EngineError::NoResult { round: number });
        };
        event!(
            target: "euchre_bot::engine",
            Level::DEBUG,
            round = number,
            trump = %declaration.trump,
            chooser = %declaration.chooser,
            kind = ?declaration.kind,
            "trump set"
        );
        self.emit(number, sink, GameEvent::TrumpSet { declaration })
    }

    fn run_discard(
        &mut self,
        number: u32,
        round: &mut RoundState,
        trump: Suit,
    ) -> Result<Card, EngineError> {
        let dealer = round.dealer();
        let ctx = DiscardContext {
            seat: dealer,
            trump,
            hand: round.hand(dealer),
            upcard: round.upcard(),
        };
        let choice = self.players[dealer.index()].discard(&ctx);
        match round.discard(dealer, choice) {
            Ok(()) => Ok(choice),
            Err(source) => {
                let fallback = lowest_card(round.hand(dealer).cards(), trump, None)
                    .ok_or_else(|| rules(number, source.clone()))?;
                self.substitute(
                    number,
                    dealer,
                    DecisionPoint::Discard,
                    rules(number, source),
                    fallback.to_string(),
                )?;
                round
                    .discard(dealer, fallback)
                    .map_err(|source| rules(number, source))?;
                Ok(fallback)
            }
        }
    }

    fn run_tricks<S: EventSink + ?Sized>(
        &mut self,
        number: u32,
        round: &mut RoundState,
        sink: &mut S,
    ) -> Result<(), EngineError> {
        let Some(declaration) = round.declaration().copied() else {
            return Err(EngineError::NoResult { round: number });
        };
        let trump = declaration.trump;

        while let Some(seat) = round.expected_actor() {
            let Some(trick) = round.current_trick() else {
                break;
            };
            let lead = trick.lead_suit();
            let legal = round.legal_cards(seat);
            let ctx = PlayContext {
                seat,
                hand: round.hand(seat),
                trick,
                declaration,
                dealer: round.dealer(),
                upcard: round.upcard(),
                tricks_won: round.tricks_won(),
                legal: &legal,
            };

            let started = Instant::now();
            let choice = self.players[seat.index()].play_card(&ctx);
            self.timings[seat.index()].record(started.elapsed());

            let rejected = match choice {
                Ok(card) => match round.play_card(seat, card) {
                    Ok(outcome) => Ok((card, outcome)),
                    Err(source) => Err(rules(number, source)),
                },
                Err(source) => Err(EngineError::Agent {
                    round: number,
                    seat,
                    source,
                }),
            };
            let (card, outcome) = match rejected {
                Ok(played) => played,
                Err(error) => {
                    let fallback = lowest_card(&legal, trump, lead).ok_or(EngineError::Agent {
                        round: number,
                        seat,
                        source: AgentError::NoLegalCards,
                    })?;
                    self.substitute(number, seat, DecisionPoint::Play, error, fallback.to_string())?;
                    let outcome = round
                        .play_card(seat, fallback)
                        .map_err(|source| rules(number, source))?;
                    (fallback, outcome)
                }
            };

            self.emit(
                number,
                sink,
                GameEvent::CardPlayed {
                    seat,
                    card,
                    lead: lead.unwrap_or_else(|| card.effective_suit(trump)),
                },
            )?;

            if let PlayOutcome::TrickCompleted { winner } | PlayOutcome::RoundCompleted { winner, .. } =
                outcome
            {
                self.emit(
                    number,
                    sink,
                    GameEvent::TrickWon {
                        winner: winner.seat,
                        card: winner.card,
                        tricks: round.tricks_won(),
                    },
                )?;
            }
        }
        Ok(())
    }

    fn substitute(
        &mut self,
        number: u32,
        seat: Seat,
        decision: DecisionPoint,
        error: EngineError,
        fallback: String,
    ) -> Result<(), EngineError> {
        if self.config.validation == Validation::Strict {
            return Err(error);
        }
        event!(
            target: "euchre_bot::engine",
            Level::WARN,
            round = number,
            seat = %seat,
            decision = ?decision,
            error = %error,
            fallback = %fallback,
            "substituting fallback for rejected decision"
        );
        self.pending.push(Substitution {
            round: number,
            seat,
            decision,
            reason: error.to_string(),
            fallback,
        });
        Ok(())
    }

    /// Sends `event` to the sink and a redacted copy to every seat.
    fn emit<S: EventSink + ?Sized>(
        &mut self,
        number: u32,
        sink: &mut S,
        event: GameEvent,
    ) -> Result<(), EngineError> {
        sink.record(&event);
        for seat in Seat::LOOP {
            let view = event.redacted_for(seat);
            if let Err(source) = self.players[seat.index()].observe(&view) {
                if self.config.validation == Validation::Strict {
                    return Err(EngineError::Agent {
                        round: number,
                        seat,
                        source,
                    });
                }
                event!(
                    target: "euchre_bot::engine",
                    Level::WARN,
                    round = number,
                    seat = %seat,
                    error = %source,
                    "agent failed to observe event"
                );
            }
        }
        Ok(())
    }
}

fn apply_bid(round: &mut RoundState, seat: Seat, bid: Bid) -> Result<BidApplied, RoundError> {
    match bid {
        Bid::Pass => round.pass(seat).map(BidApplied::Passed),
        Bid::OrderUp => round.order_up(seat).map(BidApplied::Declared),
        Bid::Call(suit) => round.call_trump(seat, suit).map(BidApplied::Declared),
    }
}

fn rules(round: u32, source: RoundError) -> EngineError {
    EngineError::Rules { round, source }
}

fn first_allowed_suit(forbidden: Suit) -> Suit {
    Suit::ALL
        .into_iter()
        .find(|&suit| suit != forbidden)
        .unwrap_or(forbidden.partner())
}
