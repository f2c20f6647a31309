use crate::model::card::Card;
use crate::model::player::{Seat, Team};
use crate::model::round::{InvalidMove, RoundError, RuleViolation};
use crate::model::suit::Suit;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BidStage {
    /// Bidders may order the dealer to pick up the upcard.
    RoundOne,
    /// Upcard is turned down; bidders may name any other suit.
    RoundTwo,
    /// Everyone passed twice; the dealer must name a suit.
    DealerForced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    OrderedUp,
    Called,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub trump: Suit,
    pub chooser: Seat,
    pub team: Team,
    pub kind: DeclarationKind,
}

impl Declaration {
    pub fn new(trump: Suit, chooser: Seat, kind: DeclarationKind) -> Self {
        Self {
            trump,
            chooser,
            team: chooser.team(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidProgress {
    Continue { next: Seat },
    /// Round one ended with four passes.
    UpcardTurnedDown { upcard: Card },
    /// Round two ended with four passes.
    DealerMustChoose { dealer: Seat },
}

/// Trump selection protocol for one deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bidding {
    dealer: Seat,
    upcard: Card,
    stage: BidStage,
    polled: usize,
}

impl Bidding {
    pub fn new(dealer: Seat, upcard: Card) -> Self {
        Self {
            dealer,
            upcard,
            stage: BidStage::RoundOne,
            polled: 0,
        }
    }

    pub fn stage(&self) -> BidStage {
        self.stage
    }

    pub fn upcard(&self) -> Card {
        self.upcard
    }

    /// Polling order for both rounds: clockwise from the dealer's left, dealer last.
    pub fn order(&self) -> [Seat; 4] {
        self.dealer.next().clockwise()
    }

    pub fn expected_bidder(&self) -> Seat {
        match self.stage {
            BidStage::RoundOne | BidStage::RoundTwo => self.order()[self.polled],
            BidStage::DealerForced => self.dealer,
        }
    }

    pub fn pass(&mut self, seat: Seat) -> Result<BidProgress, RoundError> {
        self.check_turn(seat)?;
        if self.stage == BidStage::DealerForced {
            return Err(RoundError::RuleViolation {
                seat,
                reason: RuleViolation::DealerCannotPass,
            });
        }

        self.polled += 1;
        if self.polled < 4 {
            return Ok(BidProgress::Continue {
                next: self.expected_bidder(),
            });
        }

        self.polled = 0;
        match self.stage {
            BidStage::RoundOne => {
                self.stage = BidStage::RoundTwo;
                Ok(BidProgress::UpcardTurnedDown {
                    upcard: self.upcard,
                })
            }
            _ => {
                self.stage = BidStage::DealerForced;
                Ok(BidProgress::DealerMustChoose {
                    dealer: self.dealer,
                })
            }
        }
    }

    pub fn order_up(&mut self, seat: Seat) -> Result<Declaration, RoundError> {
        self.check_turn(seat)?;
        if self.stage != BidStage::RoundOne {
            return Err(RoundError::RuleViolation {
                seat,
                reason: RuleViolation::OrderUpAfterRoundOne,
            });
        }
        Ok(Declaration::new(
            self.upcard.suit,
            seat,
            DeclarationKind::OrderedUp,
        ))
    }

    pub fn call(&mut self, seat: Seat, suit: Suit) -> Result<Declaration, RoundError> {
        self.check_turn(seat)?;
        match self.stage {
            BidStage::RoundOne => Err(RoundError::RuleViolation {
                seat,
                reason: RuleViolation::CallDuringRoundOne(suit),
            }),
            BidStage::DealerForced => Err(RoundError::RuleViolation {
                seat,
                reason: RuleViolation::DealerMustForce,
            }),
            BidStage::RoundTwo => {
                self.check_allowed(seat, suit)?;
                Ok(Declaration::new(suit, seat, DeclarationKind::Called))
            }
        }
    }

    pub fn force(&mut self, seat: Seat, suit: Suit) -> Result<Declaration, RoundError> {
        self.check_turn(seat)?;
        if self.stage != BidStage::DealerForced {
            return Err(RoundError::InvalidMove {
                seat,
                reason: InvalidMove::WrongPhase("forced trump"),
            });
        }
        self.check_allowed(seat, suit)?;
        Ok(Declaration::new(suit, seat, DeclarationKind::Forced))
    }

    fn check_allowed(&self, seat: Seat, suit: Suit) -> Result<(), RoundError> {
        if suit == self.upcard.suit {
            return Err(RoundError::RuleViolation {
                seat,
                reason: RuleViolation::ForbiddenSuit(suit),
            });
        }
        Ok(())
    }

    fn check_turn(&self, seat: Seat) -> Result<(), RoundError> {
        let expected = self.expected_bidder();
        if expected != seat {
            return Err(RoundError::InvalidMove {
                seat,
                reason: InvalidMove::OutOfTurn { expected },
            });
        }
        Ok(())
    }
}
