//! Per-card ownership tracking from one seat's point of view.

use crate::model::card::{Card, DECK_SIZE};
use crate::model::deck::{HAND_SIZE, KITTY_SIZE};
use crate::model::hand::Hand;
use crate::model::player::Seat;
use crate::model::suit::Suit;
use core::fmt;
use serde::Serialize;
use thiserror::Error;

pub const HOLDER_COUNT: usize = 5;

/// Anywhere an unseen card can be: one of the four seats or the undealt kitty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Holder {
    Seat(Seat),
    Kitty,
}

impl Holder {
    pub const ALL: [Holder; HOLDER_COUNT] = [
        Holder::Seat(Seat::P1),
        Holder::Seat(Seat::P2),
        Holder::Seat(Seat::P3),
        Holder::Seat(Seat::P4),
        Holder::Kitty,
    ];

    pub const fn index(self) -> usize {
        match self {
            Holder::Seat(seat) => seat.index(),
            Holder::Kitty => 4,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            4 => Some(Holder::Kitty),
            _ => match Seat::from_index(index) {
                Some(seat) => Some(Holder::Seat(seat)),
                None => None,
            },
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Seat(seat) => write!(f, "{seat}"),
            Holder::Kitty => f.write_str("Kitty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardState {
    Unknown,
    Has,
    Lacks,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeliefError {
    #[error("{holder} was {was:?} for {card} and cannot become {now:?}")]
    Inconsistent {
        holder: Holder,
        card: Card,
        was: CardState,
        now: CardState,
    },
    #[error("no holder left for unplayed card {card}")]
    NoCandidate { card: Card },
}

/// Tri-state ownership table plus size-proportional probabilities.
///
/// Unknown holders of an unaccounted card get weight `hand_size / remaining_cards`; the weights
/// are rescaled so each column sums to one. This is a heuristic, not an exact posterior.
#[derive(Debug, Clone)]
pub struct ChanceChart {
    perspective: Seat,
    states: [[CardState; DECK_SIZE]; HOLDER_COUNT],
    probs: [[f32; DECK_SIZE]; HOLDER_COUNT],
    accounted: [bool; DECK_SIZE],
    hand_sizes: [u8; HOLDER_COUNT],
    remaining_cards: u8,
}

impl ChanceChart {
    /// Fresh chart for a new deal: own cards and the upcard are known, the rest is open.
    pub fn new(perspective: Seat, hand: &Hand, upcard: Card) -> Result<Self, BeliefError> {
        let mut chart = Self {
            perspective,
            states: [[CardState::Unknown; DECK_SIZE]; HOLDER_COUNT],
            probs: [[0.0; DECK_SIZE]; HOLDER_COUNT],
            accounted: [false; DECK_SIZE],
            hand_sizes: [
                HAND_SIZE as u8,
                HAND_SIZE as u8,
                HAND_SIZE as u8,
                HAND_SIZE as u8,
                KITTY_SIZE as u8,
            ],
            remaining_cards: DECK_SIZE as u8,
        };

        let me = Holder::Seat(perspective);
        for &card in hand.iter() {
            chart.confirmed_holder(me, card)?;
        }
        chart.confirmed_holder(Holder::Kitty, upcard)?;
        for id in 0..DECK_SIZE {
            if !chart.accounted[id] {
                chart.states[me.index()][id] = CardState::Lacks;
            }
        }
        chart.recompute_probabilities()?;
        Ok(chart)
    }

    pub fn perspective(&self) -> Seat {
        self.perspective
    }

    pub fn state(&self, holder: Holder, card: Card) -> CardState {
        self.states[holder.index()][card.to_id() as usize]
    }

    pub fn probability(&self, holder: Holder, card: Card) -> f32 {
        self.probs[holder.index()][card.to_id() as usize]
    }

    pub fn is_accounted(&self, card: Card) -> bool {
        self.accounted[card.to_id() as usize]
    }

    pub fn hand_size(&self, holder: Holder) -> u8 {
        self.hand_sizes[holder.index()]
    }

    pub fn remaining_cards(&self) -> u8 {
        self.remaining_cards
    }

    pub fn column_mass(&self, card: Card) -> f32 {
        let id = card.to_id() as usize;
        Holder::ALL
            .iter()
            .map(|holder| self.probs[holder.index()][id])
            .sum()
    }

    /// Cards still in play that the perspective seat does not hold.
    pub fn unseen_pool(&self) -> Vec<Card> {
        let me = Holder::Seat(self.perspective).index();
        Card::all()
            .filter(|card| {
                let id = card.to_id() as usize;
                self.is_live(id) && self.states[me][id] != CardState::Has
            })
            .collect()
    }

    /// Cards pinned to a specific other holder.
    pub fn pinned(&self) -> Vec<(Holder, Card)> {
        let me = Holder::Seat(self.perspective);
        let mut pinned = Vec::new();
        for card in Card::all() {
            let id = card.to_id() as usize;
            if !self.accounted[id] {
                continue;
            }
            for holder in Holder::ALL {
                if holder != me && self.states[holder.index()][id] == CardState::Has {
                    pinned.push((holder, card));
                }
            }
        }
        pinned
    }

    pub fn confirmed_holder(&mut self, holder: Holder, card: Card) -> Result<(), BeliefError> {
        let id = card.to_id() as usize;
        match self.states[holder.index()][id] {
            CardState::Lacks => Err(BeliefError::Inconsistent {
                holder,
                card,
                was: CardState::Lacks,
                now: CardState::Has,
            }),
            _ if self.accounted[id] => Ok(()),
            _ => {
                self.place(id, holder);
                Ok(())
            }
        }
    }

    pub fn card_played(&mut self, holder: Holder, card: Card) -> Result<(), BeliefError> {
        let id = card.to_id() as usize;
        let h = holder.index();
        if self.states[h][id] == CardState::Lacks {
            return Err(BeliefError::Inconsistent {
                holder,
                card,
                was: CardState::Lacks,
                now: CardState::Has,
            });
        }

        self.clear_column(id);
        self.accounted[id] = true;
        self.hand_sizes[h] = self.hand_sizes[h].saturating_sub(1);
        self.remaining_cards = self.remaining_cards.saturating_sub(1);
        Ok(())
    }

    /// `holder` broke suit: they hold nothing whose effective suit is `lead`, bowers included.
    pub fn did_not_follow(
        &mut self,
        holder: Holder,
        lead: Suit,
        trump: Suit,
    ) -> Result<(), BeliefError> {
        let h = holder.index();
        let suited: Vec<Card> = Card::all()
            .filter(|card| card.effective_suit(trump) == lead)
            .collect();

        if let Some(&card) = suited
            .iter()
            .find(|card| self.states[h][card.to_id() as usize] == CardState::Has)
        {
            return Err(BeliefError::Inconsistent {
                holder,
                card,
                was: CardState::Has,
                now: CardState::Lacks,
            });
        }

        for card in suited {
            let id = card.to_id() as usize;
            if !self.accounted[id] {
                self.states[h][id] = CardState::Lacks;
                self.probs[h][id] = 0.0;
            }
        }
        Ok(())
    }

    /// Records the dealer taking the upcard. `discard` is only known to the dealer.
    pub fn note_pickup(
        &mut self,
        dealer: Seat,
        upcard: Card,
        discard: Option<Card>,
    ) -> Result<(), BeliefError> {
        let dealer_holder = Holder::Seat(dealer);
        match discard {
            Some(discard) if dealer == self.perspective => {
                self.place(upcard.to_id() as usize, dealer_holder);
                let id = discard.to_id() as usize;
                if self.states[dealer_holder.index()][id] != CardState::Has {
                    return Err(BeliefError::Inconsistent {
                        holder: dealer_holder,
                        card: discard,
                        was: self.states[dealer_holder.index()][id],
                        now: CardState::Has,
                    });
                }
                self.place(id, Holder::Kitty);
            }
            _ => {
                // The upcard is with the dealer unless it went straight back as the discard.
                let id = upcard.to_id() as usize;
                self.clear_column(id);
                self.accounted[id] = false;
                self.states[dealer_holder.index()][id] = CardState::Unknown;
                self.states[Holder::Kitty.index()][id] = CardState::Unknown;
            }
        }
        self.recompute_probabilities()
    }

    pub fn recompute_probabilities(&mut self) -> Result<(), BeliefError> {
        for holder in Holder::ALL {
            let h = holder.index();
            if self.hand_sizes[h] > 0 {
                continue;
            }
            for id in 0..DECK_SIZE {
                if !self.accounted[id] && self.states[h][id] == CardState::Unknown {
                    self.states[h][id] = CardState::Lacks;
                    self.probs[h][id] = 0.0;
                }
            }
        }

        for card in Card::all() {
            let id = card.to_id() as usize;
            if self.accounted[id] {
                continue;
            }

            let candidates: Vec<Holder> = Holder::ALL
                .iter()
                .copied()
                .filter(|holder| self.states[holder.index()][id] == CardState::Unknown)
                .collect();

            match candidates.as_slice() {
                [] => return Err(BeliefError::NoCandidate { card }),
                [only] => self.confirmed_holder(*only, card)?,
                _ => {
                    let remaining = f32::from(self.remaining_cards.max(1));
                    for holder in candidates {
                        let h = holder.index();
                        self.probs[h][id] = f32::from(self.hand_sizes[h]) / remaining;
                    }
                    self.renormalize_column(id);
                }
            }
        }
        Ok(())
    }

    fn is_live(&self, id: usize) -> bool {
        !self.accounted[id]
            || Holder::ALL
                .iter()
                .any(|holder| self.states[holder.index()][id] == CardState::Has)
    }

    fn place(&mut self, id: usize, holder: Holder) {
        self.clear_column(id);
        self.states[holder.index()][id] = CardState::Has;
        self.probs[holder.index()][id] = 1.0;
        self.accounted[id] = true;
    }

    fn clear_column(&mut self, id: usize) {
        for holder in Holder::ALL {
            self.states[holder.index()][id] = CardState::Lacks;
            self.probs[holder.index()][id] = 0.0;
        }
    }

    fn renormalize_column(&mut self, id: usize) {
        let total: f32 = Holder::ALL
            .iter()
            .map(|holder| self.probs[holder.index()][id])
            .sum();
        if total == 0.0 {
            return;
        }
        for holder in Holder::ALL {
            self.probs[holder.index()][id] /= total;
        }
    }
}
