mod cautious;
mod greedy;
mod monte_carlo;
mod random;

pub use cautious::{HighWithCautionPlayer, cautious_choice};
pub use greedy::{HighValuePlayer, LowValuePlayer};
pub use monte_carlo::MonteCarloPlayer;
pub use random::RandomPlayer;

use crate::player::{Bid, BidContext, DiscardContext};
use euchre_core::model::bidding::BidStage;
use euchre_core::model::card::Card;
use euchre_core::model::rank::Rank;
use euchre_core::model::suit::Suit;

/// Hand strength at or above which the heuristic bidders take trump.
pub const ORDER_UP_THRESHOLD: u32 = 32;

/// First card with the highest trick value.
pub fn highest_card(cards: &[Card], trump: Suit, lead: Option<Suit>) -> Option<Card> {
    cards.iter().copied().reduce(|best, card| {
        if card.value(trump, lead) > best.value(trump, lead) {
            card
        } else {
            best
        }
    })
}

/// First card with the lowest trick value.
pub fn lowest_card(cards: &[Card], trump: Suit, lead: Option<Suit>) -> Option<Card> {
    cards.iter().copied().reduce(|best, card| {
        if card.value(trump, lead) < best.value(trump, lead) {
            card
        } else {
            best
        }
    })
}

/// Rough trick-taking weight of one card if `trump` were named.
pub fn card_strength(card: Card, trump: Suit) -> u32 {
    if card.is_right_bower(trump) {
        return 13;
    }
    if card.is_left_bower(trump) {
        return 12;
    }
    if card.suit == trump {
        return match card.rank {
            Rank::Ace => 11,
            Rank::King => 10,
            Rank::Queen => 9,
            Rank::Ten => 8,
            Rank::Nine | Rank::Jack => 7,
        };
    }
    match card.rank {
        Rank::Ace => 4,
        Rank::King => 1,
        _ => 0,
    }
}

pub fn hand_strength(cards: &[Card], trump: Suit) -> u32 {
    cards.iter().map(|&card| card_strength(card, trump)).sum()
}

/// Strongest suit other than `forbidden`, ties to the earlier suit in `Suit::ALL`.
pub fn best_suit(cards: &[Card], forbidden: Suit) -> (Suit, u32) {
    let mut best = (forbidden.partner(), hand_strength(cards, forbidden.partner()));
    for suit in Suit::ALL {
        if suit == forbidden {
            continue;
        }
        let strength = hand_strength(cards, suit);
        if strength > best.1 {
            best = (suit, strength);
        }
    }
    best
}

/// Threshold bidding shared by the deterministic policies.
pub fn heuristic_bid(ctx: &BidContext) -> Bid {
    let trump = ctx.upcard.suit;
    match ctx.stage {
        BidStage::RoundOne => {
            let strength = if ctx.is_dealer() {
                // The dealer keeps the best five of six after picking up.
                let mut cards = ctx.hand.cards().to_vec();
                cards.push(ctx.upcard);
                let weakest = cards
                    .iter()
                    .map(|&card| card_strength(card, trump))
                    .min()
                    .unwrap_or(0);
                hand_strength(&cards, trump) - weakest
            } else if ctx.dealer == ctx.seat.partner() {
                hand_strength(ctx.hand.cards(), trump) + card_strength(ctx.upcard, trump) / 2
            } else {
                hand_strength(ctx.hand.cards(), trump)
            };
            if strength >= ORDER_UP_THRESHOLD {
                Bid::OrderUp
            } else {
                Bid::Pass
            }
        }
        BidStage::RoundTwo => {
            let (suit, strength) = best_suit(ctx.hand.cards(), trump);
            if strength >= ORDER_UP_THRESHOLD {
                Bid::Call(suit)
            } else {
                Bid::Pass
            }
        }
        BidStage::DealerForced => Bid::Pass,
    }
}

pub fn heuristic_forced(ctx: &BidContext, forbidden: Suit) -> Suit {
    best_suit(ctx.hand.cards(), forbidden).0
}

/// Throws the lowest-valued card under the new trump.
pub fn heuristic_discard(ctx: &DiscardContext) -> Card {
    lowest_card(ctx.hand.cards(), ctx.trump, None).unwrap_or(ctx.upcard)
}
