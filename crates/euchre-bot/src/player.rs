use crate::monte_carlo::RolloutError;
use euchre_core::belief::BeliefError;
use euchre_core::game::events::GameEvent;
use euchre_core::model::bidding::{BidStage, Declaration};
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::Seat;
use euchre_core::model::suit::Suit;
use euchre_core::model::trick::Trick;
use thiserror::Error;

/// Answer to a bidding turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bid {
    Pass,
    /// Round one only: the dealer picks up the upcard and its suit becomes trump.
    OrderUp,
    /// Round two only: name any suit except the turned-down one.
    Call(Suit),
}

pub struct BidContext<'a> {
    pub seat: Seat,
    pub dealer: Seat,
    pub upcard: Card,
    pub stage: BidStage,
    pub hand: &'a Hand,
    pub scores: [u32; 2],
}

impl BidContext<'_> {
    pub fn is_dealer(&self) -> bool {
        self.seat == self.dealer
    }
}

pub struct DiscardContext<'a> {
    pub seat: Seat,
    pub trump: Suit,
    /// Six cards: the dealt hand plus the upcard.
    pub hand: &'a Hand,
    pub upcard: Card,
}

pub struct PlayContext<'a> {
    pub seat: Seat,
    pub hand: &'a Hand,
    pub trick: &'a Trick,
    pub declaration: Declaration,
    pub dealer: Seat,
    pub upcard: Card,
    pub tricks_won: [u8; 2],
    pub legal: &'a [Card],
}

impl PlayContext<'_> {
    pub fn trump(&self) -> Suit {
        self.declaration.trump
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.trick.lead_suit()
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0} was asked to act before being seated")]
    NotSeated(String),
    #[error("no legal card to choose from")]
    NoLegalCards,
    #[error(transparent)]
    Belief(#[from] BeliefError),
    #[error(transparent)]
    Rollout(#[from] RolloutError),
}

/// A seat at the table. Every answer is validated by the engine against the authoritative round.
pub trait Player: Send {
    fn name(&self) -> &str;

    /// Called once per deal before bidding starts.
    fn reset(&mut self) {}

    fn set_hand(&mut self, seat: Seat, hand: &Hand);

    fn choose_trump(&mut self, ctx: &BidContext) -> Bid;

    /// Dealer's obligatory pick once every seat passed twice; `forbidden` is the upcard suit.
    fn forced_trump(&mut self, ctx: &BidContext, forbidden: Suit) -> Suit;

    fn discard(&mut self, ctx: &DiscardContext) -> Card;

    fn play_card(&mut self, ctx: &PlayContext) -> Result<Card, AgentError>;

    /// Receives every table event, already redacted for this seat.
    fn observe(&mut self, _event: &GameEvent) -> Result<(), AgentError> {
        Ok(())
    }
}
