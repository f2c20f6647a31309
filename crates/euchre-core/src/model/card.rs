use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 24;

const RIGHT_BOWER_VALUE: u8 = 200;
const LEFT_BOWER_VALUE: u8 = 199;
const TRUMP_BASE: u8 = 100;
const LEAD_BASE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Dense id in `0..24`, suit-major.
    pub const fn to_id(self) -> u8 {
        self.suit as u8 * 6 + self.rank as u8
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        let suit = match Suit::from_index((id / 6) as usize) {
            Some(suit) => suit,
            None => return None,
        };
        match Rank::from_index((id % 6) as usize) {
            Some(rank) => Some(Card::new(rank, suit)),
            None => None,
        }
    }

    pub fn all() -> impl Iterator<Item = Card> {
        (0..DECK_SIZE as u8).filter_map(Card::from_id)
    }

    pub fn is_right_bower(self, trump: Suit) -> bool {
        self.rank == Rank::Jack && self.suit == trump
    }

    pub fn is_left_bower(self, trump: Suit) -> bool {
        self.rank == Rank::Jack && self.suit == trump.partner()
    }

    /// Suit the card counts as for following: both bowers belong to trump.
    pub fn effective_suit(self, trump: Suit) -> Suit {
        if self.is_right_bower(trump) || self.is_left_bower(trump) {
            trump
        } else {
            self.suit
        }
    }

    pub fn is_trump(self, trump: Suit) -> bool {
        self.effective_suit(trump) == trump
    }

    /// Total order used to resolve tricks. Off-suit cards keep their bare rank index.
    pub fn value(self, trump: Suit, lead: Option<Suit>) -> u8 {
        if self.is_right_bower(trump) {
            return RIGHT_BOWER_VALUE;
        }
        if self.is_left_bower(trump) {
            return LEFT_BOWER_VALUE;
        }
        let rank = self.rank.index();
        if self.suit == trump {
            TRUMP_BASE + rank
        } else if Some(self.suit) == lead {
            LEAD_BASE + rank
        } else {
            rank
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let symbol = trimmed
            .chars()
            .last()
            .ok_or_else(|| "empty card text".to_string())?;
        let suit = Suit::from_symbol(symbol).ok_or_else(|| format!("unknown suit in '{trimmed}'"))?;
        let rank_text = &trimmed[..trimmed.len() - symbol.len_utf8()];
        let rank =
            Rank::from_symbol(rank_text).ok_or_else(|| format!("unknown rank in '{trimmed}'"))?;
        Ok(Card::new(rank, suit))
    }
}
