use super::{heuristic_bid, heuristic_discard, heuristic_forced, highest_card, lowest_card};
use crate::player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::Seat;
use euchre_core::model::suit::Suit;
use euchre_core::model::trick::Trick;

/// High-value play that does not overtake a winning partner or waste a card on a lost trick.
///
/// Leads its best card. When following: lowest card if the partner is winning, otherwise the
/// highest card if anything in hand beats the current winner, else the lowest card.
pub fn cautious_choice(legal: &[Card], trick: &Trick, seat: Seat) -> Option<Card> {
    let trump = trick.trump();
    let lead = trick.lead_suit();
    let Some(winning) = trick.current_winner() else {
        return highest_card(legal, trump, None);
    };

    if winning.seat == seat.partner() {
        return lowest_card(legal, trump, lead);
    }

    let to_beat = winning.card.value(trump, lead);
    if legal.iter().any(|card| card.value(trump, lead) > to_beat) {
        highest_card(legal, trump, lead)
    } else {
        lowest_card(legal, trump, lead)
    }
}

pub struct HighWithCautionPlayer {
    name: String,
}

impl HighWithCautionPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Player for HighWithCautionPlayer {
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
        cautious_choice(ctx.legal, ctx.trick, ctx.seat).ok_or(AgentError::NoLegalCards)
    }
}
