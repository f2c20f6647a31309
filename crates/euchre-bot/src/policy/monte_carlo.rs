use super::{heuristic_bid, heuristic_discard, heuristic_forced};
use crate::monte_carlo::{MonteCarloConfig, MonteCarloEngine, RolloutRequest};
use crate::player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
use euchre_core::belief::{ChanceChart, Holder};
use euchre_core::game::events::GameEvent;
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::Seat;
use euchre_core::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks a [`ChanceChart`] from table events and plays by Monte Carlo rollouts.
pub struct MonteCarloPlayer {
    name: String,
    engine: MonteCarloEngine,
    rng: SmallRng,
    seat: Option<Seat>,
    hand: Hand,
    chart: Option<ChanceChart>,
    trump: Option<Suit>,
    cancel: Arc<AtomicBool>,
}

impl MonteCarloPlayer {
    pub fn new(name: impl Into<String>, config: MonteCarloConfig, seed: u64) -> Self {
        Self {
            name: name.into(),
            engine: MonteCarloEngine::new(config),
            rng: SmallRng::seed_from_u64(seed),
            seat: None,
            hand: Hand::new(),
            chart: None,
            trump: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that aborts an in-flight evaluation when set. Each new decision clears it.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn chart(&self) -> Option<&ChanceChart> {
        self.chart.as_ref()
    }

    fn chart_mut(&mut self) -> Result<&mut ChanceChart, AgentError> {
        self.chart
            .as_mut()
            .ok_or_else(|| AgentError::NotSeated(self.name.clone()))
    }
}

impl Player for MonteCarloPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.chart = None;
        self.trump = None;
        self.cancel.store(false, Ordering::Relaxed);
    }

    fn set_hand(&mut self, seat: Seat, hand: &Hand) {
        self.seat = Some(seat);
        self.hand = hand.clone();
    }

    fn choose_trump(&mut self, ctx: &BidContext) -> Bid {
        heuristic_bid(ctx)
    }

    fn forced_trump(&mut self, ctx: &BidContext, forbidden: Suit) -> Suit {
        heuristic_forced(ctx, forbidden)
    }

    fn discard(&mut self, ctx: &DiscardContext) -> Card {
        heuristic_discard(ctx)
    }

    fn play_card(&mut self, ctx: &PlayContext) -> Result<Card, AgentError> {
        let chart = self
            .chart
            .as_ref()
            .ok_or_else(|| AgentError::NotSeated(self.name.clone()))?;
        let request = RolloutRequest {
            seat: ctx.seat,
            hand: ctx.hand,
            trick: ctx.trick,
            declaration: ctx.declaration,
            dealer: ctx.dealer,
            upcard: ctx.upcard,
            tricks_won: ctx.tricks_won,
            chart,
        };
        self.cancel.store(false, Ordering::Relaxed);
        let decision = self
            .engine
            .decide(&request, &mut self.rng, Some(self.cancel.as_ref()))?;
        Ok(decision.card)
    }

    fn observe(&mut self, event: &GameEvent) -> Result<(), AgentError> {
        match event {
            GameEvent::RoundStarted { hands, upcard, .. } => {
                let Some(seat) = self.seat else {
                    return Err(AgentError::NotSeated(self.name.clone()));
                };
                if let Some(cards) = &hands[seat.index()] {
                    self.hand = Hand::with_cards(cards.clone());
                }
                self.chart = Some(ChanceChart::new(seat, &self.hand, *upcard)?);
            }
            GameEvent::UpcardTurnedDown { upcard } => {
                let chart = self.chart_mut()?;
                chart.card_played(Holder::Kitty, *upcard)?;
                chart.recompute_probabilities()?;
            }
            GameEvent::DealerPickedUp {
                dealer,
                upcard,
                discard,
            } => {
                self.chart_mut()?.note_pickup(*dealer, *upcard, *discard)?;
            }
            GameEvent::TrumpSet { declaration } => {
                self.trump = Some(declaration.trump);
            }
            GameEvent::CardPlayed { seat, card, lead } => {
                let trump = self.trump;
                let chart = self.chart_mut()?;
                chart.card_played(Holder::Seat(*seat), *card)?;
                if let Some(trump) = trump {
                    if card.effective_suit(trump) != *lead {
                        chart.did_not_follow(Holder::Seat(*seat), *lead, trump)?;
                    }
                }
            }
            GameEvent::TrickWon { .. } => {
                self.chart_mut()?.recompute_probabilities()?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euchre_core::model::bidding::{Declaration, DeclarationKind};
    use euchre_core::model::deck::Deck;
    use euchre_core::model::trick::Trick;

    fn seated_player() -> (MonteCarloPlayer, Hand, Card) {
        let deal = Deck::standard().deal();
        let hand = deal.hands[0].clone();
        let upcard = deal.upcard();
        let config = MonteCarloConfig {
            trials: 8,
            parallel: false,
            pin_known_cards: true,
        };
        let mut player = MonteCarloPlayer::new("mc", config, 5);
        player.set_hand(Seat::P1, &hand);
        player
            .observe(&GameEvent::RoundStarted {
                round: 1,
                dealer: Seat::P4,
                hands: [Some(hand.cards().to_vec()), None, None, None],
                upcard,
            })
            .unwrap();
        player
            .observe(&GameEvent::UpcardTurnedDown { upcard })
            .unwrap();
        (player, hand, upcard)
    }

    fn lead(player: &mut MonteCarloPlayer, hand: &Hand, upcard: Card) -> Result<Card, AgentError> {
        let trick = Trick::new(Seat::P1, Suit::Clubs);
        let legal = hand.legal_cards(None, Suit::Clubs);
        player.play_card(&PlayContext {
            seat: Seat::P1,
            hand,
            trick: &trick,
            declaration: Declaration::new(Suit::Clubs, Seat::P1, DeclarationKind::Called),
            dealer: Seat::P4,
            upcard,
            tricks_won: [0, 0],
            legal: &legal,
        })
    }

    #[test]
    fn earlier_cancel_does_not_abort_the_next_decision() {
        let (mut player, hand, upcard) = seated_player();
        let cancel = player.cancel_handle();
        cancel.store(true, Ordering::Relaxed);

        let card = lead(&mut player, &hand, upcard).unwrap();
        assert!(hand.contains(card));
        assert!(!cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn reset_clears_a_pending_cancel() {
        let (mut player, _, _) = seated_player();
        let cancel = player.cancel_handle();
        cancel.store(true, Ordering::Relaxed);
        player.reset();
        assert!(!cancel.load(Ordering::Relaxed));
        assert!(player.chart().is_none());
    }
}
