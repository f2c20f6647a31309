use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::suit::Suit;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    leader: Seat,
    trump: Suit,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Play {
    pub seat: Seat,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
}

impl Trick {
    pub fn new(leader: Seat, trump: Suit) -> Self {
        Self {
            leader,
            trump,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn trump(&self) -> Suit {
        self.trump
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    /// Effective suit of the opening card.
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays
            .first()
            .map(|play| play.card.effective_suit(self.trump))
    }

    pub fn expected_seat(&self) -> Seat {
        self.plays
            .last()
            .map(|play| play.seat.next())
            .unwrap_or(self.leader)
    }

    pub fn play(&mut self, seat: Seat, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        let expected = self.expected_seat();
        if expected != seat {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: seat,
            });
        }

        self.plays.push(Play { seat, card });
        Ok(())
    }

    /// Highest play so far under the trick's trump and lead.
    pub fn current_winner(&self) -> Option<Play> {
        let lead = self.lead_suit();
        self.plays
            .iter()
            .copied()
            .max_by_key(|play| play.card.value(self.trump, lead))
    }

    pub fn winner(&self) -> Option<Play> {
        if !self.is_complete() {
            return None;
        }
        self.current_winner()
    }
}
