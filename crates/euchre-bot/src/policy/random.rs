use crate::player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
use euchre_core::model::bidding::BidStage;
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::Seat;
use euchre_core::model::suit::Suit;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const BID_CHANCE: f64 = 0.3;

/// Bids on a coin flip and plays a uniformly random legal card.
pub struct RandomPlayer {
    name: String,
    rng: SmallRng,
}

impl RandomPlayer {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn random_suit(&mut self, forbidden: Suit) -> Suit {
        let allowed: Vec<Suit> = Suit::ALL.into_iter().filter(|&s| s != forbidden).collect();
        allowed
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(forbidden.partner())
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_hand(&mut self, _seat: Seat, _hand: &Hand) {}

    fn choose_trump(&mut self, ctx: &BidContext) -> Bid {
        if ctx.stage == BidStage::RoundOne {
            if self.rng.gen_bool(BID_CHANCE) {
                return Bid::OrderUp;
            }
            return Bid::Pass;
        }
        if self.rng.gen_bool(BID_CHANCE) {
            Bid::Call(self.random_suit(ctx.upcard.suit))
        } else {
            Bid::Pass
        }
    }

    fn forced_trump(&mut self, _ctx: &BidContext, forbidden: Suit) -> Suit {
        self.random_suit(forbidden)
    }

    fn discard(&mut self, ctx: &DiscardContext) -> Card {
        ctx.hand
            .cards()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ctx.upcard)
    }

    fn play_card(&mut self, ctx: &PlayContext) -> Result<Card, AgentError> {
        ctx.legal
            .choose(&mut self.rng)
            .copied()
            .ok_or(AgentError::NoLegalCards)
    }
}
