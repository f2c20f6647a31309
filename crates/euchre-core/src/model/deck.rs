use crate::model::card::{Card, DECK_SIZE};
use crate::model::hand::Hand;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::array;

pub const HAND_SIZE: usize = 5;
pub const KITTY_SIZE: usize = DECK_SIZE - 4 * HAND_SIZE;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Four five-card hands plus the kitty; the kitty's first card is the upcard.
#[derive(Debug, Clone)]
pub struct Deal {
    pub hands: [Hand; 4],
    pub kitty: Vec<Card>,
}

impl Deal {
    pub fn upcard(&self) -> Card {
        self.kitty[0]
    }
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Deals consecutive blocks of five in seat order; the rest forms the kitty.
    pub fn deal(&self) -> Deal {
        let hands = array::from_fn(|seat| {
            let start = seat * HAND_SIZE;
            Hand::with_cards(self.cards[start..start + HAND_SIZE].to_vec())
        });
        let kitty = self.cards[4 * HAND_SIZE..].to_vec();
        Deal { hands, kitty }
    }
}
