use super::{heuristic_bid, heuristic_discard, heuristic_forced, highest_card, lowest_card};
use crate::player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::Seat;
use euchre_core::model::suit::Suit;

/// Always plays the legal card with the highest trick value.
pub struct HighValuePlayer {
    name: String,
}

impl HighValuePlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Player for HighValuePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_hand(&mut self, _seat: Seat, _hand: &Hand) {}

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
        highest_card(ctx.legal, ctx.trump(), ctx.lead_suit()).ok_or(AgentError::NoLegalCards)
    }
}

/// Always plays the legal card with the lowest trick value.
pub struct LowValuePlayer {
    name: String,
}

impl LowValuePlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Player for LowValuePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_hand(&mut self, _seat: Seat, _hand: &Hand) {}

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
        lowest_card(ctx.legal, ctx.trump(), ctx.lead_suit()).ok_or(AgentError::NoLegalCards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euchre_core::model::bidding::{Declaration, DeclarationKind};
    use euchre_core::model::trick::Trick;

    fn cards(text: &[&str]) -> Vec<Card> {
        text.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn value_players_pick_opposite_ends_of_the_legal_set() {
        let hand = Hand::with_cards(cards(&["9♠", "A♠", "J♣", "K♦"]));
        let mut trick = Trick::new(Seat::P1, Suit::Spades);
        trick.play(Seat::P1, "10♠".parse().unwrap()).unwrap();
        let legal = hand.legal_cards(trick.lead_suit(), Suit::Spades);
        let ctx = PlayContext {
            seat: Seat::P2,
            hand: &hand,
            trick: &trick,
            declaration: Declaration::new(Suit::Spades, Seat::P3, DeclarationKind::Called),
            dealer: Seat::P4,
            upcard: "9♥".parse().unwrap(),
            tricks_won: [0, 0],
            legal: &legal,
        };

        assert_eq!(
            HighValuePlayer::new("high").play_card(&ctx).unwrap(),
            "J♣".parse().unwrap()
        );
        assert_eq!(
            LowValuePlayer::new("low").play_card(&ctx).unwrap(),
            "9♠".parse().unwrap()
        );
    }

    #[test]
    fn empty_legal_set_is_an_error() {
        let hand = Hand::new();
        let trick = Trick::new(Seat::P1, Suit::Hearts);
        let ctx = PlayContext {
            seat: Seat::P1,
            hand: &hand,
            trick: &trick,
            declaration: Declaration::new(Suit::Hearts, Seat::P1, DeclarationKind::OrderedUp),
            dealer: Seat::P4,
            upcard: "9♥".parse().unwrap(),
            tricks_won: [0, 0],
            legal: &[],
        };
        assert!(matches!(
            LowValuePlayer::new("low").play_card(&ctx),
            Err(AgentError::NoLegalCards)
        ));
    }
}
