use crate::model::bidding::{BidProgress, BidStage, Bidding, Declaration};
use crate::model::card::Card;
use crate::model::deck::{Deal, HAND_SIZE};
use crate::model::hand::Hand;
use crate::model::player::Seat;
use crate::model::score::{RoundScore, score_round};
use crate::model::suit::Suit;
use crate::model::trick::{Play, Trick, TrickError};
use serde::Serialize;
use thiserror::Error;

pub const TRICKS_PER_ROUND: usize = HAND_SIZE;

#[derive(Debug, Clone)]
pub struct RoundState {
    dealer: Seat,
    hands: [Hand; 4],
    kitty: Vec<Card>,
    upcard: Card,
    phase: RoundPhase,
    declaration: Option<Declaration>,
    current_trick: Option<Trick>,
    trick_history: Vec<Trick>,
    out_of_play: Vec<Card>,
    tricks_won: [u8; 2],
}

#[derive(Debug, Clone)]
pub enum RoundPhase {
    Bidding(Bidding),
    /// Dealer picked up the upcard and owes a discard.
    Discarding,
    Playing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: Play },
    RoundCompleted { winner: Play, result: RoundResult },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub declaration: Declaration,
    pub tricks: [u8; 2],
    pub score: RoundScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("invalid move by {seat}: {reason}")]
    InvalidMove { seat: Seat, reason: InvalidMove },
    #[error("rule violation by {seat}: {reason}")]
    RuleViolation { seat: Seat, reason: RuleViolation },
}

impl RoundError {
    pub fn seat(&self) -> Seat {
        match self {
            RoundError::InvalidMove { seat, .. } | RoundError::RuleViolation { seat, .. } => *seat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("{0} is not in hand")]
    CardNotInHand(Card),
    #[error("{card} does not follow {lead} while holding {lead}")]
    MustFollowSuit { card: Card, lead: Suit },
    #[error("expected {expected} to act")]
    OutOfTurn { expected: Seat },
    #[error("{0} is not accepted in the current phase")]
    WrongPhase(&'static str),
    #[error(transparent)]
    Trick(#[from] TrickError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("{0} is the turned-down upcard suit")]
    ForbiddenSuit(Suit),
    #[error("the upcard can only be ordered up in round one")]
    OrderUpAfterRoundOne,
    #[error("{0} cannot be called before the upcard is turned down")]
    CallDuringRoundOne(Suit),
    #[error("the dealer cannot pass once everyone else has")]
    DealerCannotPass,
    #[error("the dealer names trump through the forced choice")]
    DealerMustForce,
}

/// State needed to continue a round from the middle of trick play.
#[derive(Debug, Clone)]
pub struct PlaySetup {
    pub dealer: Seat,
    pub upcard: Card,
    pub declaration: Declaration,
    pub hands: [Hand; 4],
    pub trick: Trick,
    pub tricks_won: [u8; 2],
}

impl RoundState {
    pub fn deal(deal: Deal, dealer: Seat) -> Self {
        let upcard = deal.upcard();
        Self {
            dealer,
            hands: deal.hands,
            kitty: deal.kitty,
            upcard,
            phase: RoundPhase::Bidding(Bidding::new(dealer, upcard)),
            declaration: None,
            current_trick: None,
            trick_history: Vec::new(),
            out_of_play: Vec::new(),
            tricks_won: [0; 2],
        }
    }

    /// Rebuilds a round already in trick play; kitty and history are left empty.
    pub fn resume_play(setup: PlaySetup) -> Self {
        Self {
            dealer: setup.dealer,
            hands: setup.hands,
            kitty: Vec::new(),
            upcard: setup.upcard,
            phase: RoundPhase::Playing,
            declaration: Some(setup.declaration),
            current_trick: Some(setup.trick),
            trick_history: Vec::new(),
            out_of_play: Vec::new(),
            tricks_won: setup.tricks_won,
        }
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn upcard(&self) -> Card {
        self.upcard
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn out_of_play(&self) -> &[Card] {
        &self.out_of_play
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    pub fn trump(&self) -> Option<Suit> {
        self.declaration.map(|declaration| declaration.trump)
    }

    pub fn current_trick(&self) -> Option<&Trick> {
        self.current_trick.as_ref()
    }

    pub fn trick_history(&self) -> &[Trick] {
        &self.trick_history
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn tricks_won(&self) -> [u8; 2] {
        self.tricks_won
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, RoundPhase::Complete)
    }

    pub fn bid_stage(&self) -> Option<BidStage> {
        match &self.phase {
            RoundPhase::Bidding(bidding) => Some(bidding.stage()),
            _ => None,
        }
    }

    /// Hands, out-of-play pile and kitty together; 24 for a dealt round.
    pub fn card_count(&self) -> usize {
        self.hands.iter().map(Hand::len).sum::<usize>() + self.out_of_play.len() + self.kitty.len()
    }

    /// Seat whose decision the round is waiting on.
    pub fn expected_actor(&self) -> Option<Seat> {
        match &self.phase {
            RoundPhase::Bidding(bidding) => Some(bidding.expected_bidder()),
            RoundPhase::Discarding => Some(self.dealer),
            RoundPhase::Playing => self.current_trick.as_ref().map(Trick::expected_seat),
            RoundPhase::Complete => None,
        }
    }

    pub fn pass(&mut self, seat: Seat) -> Result<BidProgress, RoundError> {
        let progress = self.bidding_mut(seat, "pass")?.pass(seat)?;
        if let BidProgress::UpcardTurnedDown { upcard } = progress {
            self.turn_down(upcard);
        }
        Ok(progress)
    }

    pub fn order_up(&mut self, seat: Seat) -> Result<Declaration, RoundError> {
        let declaration = self.bidding_mut(seat, "order up")?.order_up(seat)?;
        if let Some(index) = self.kitty.iter().position(|&card| card == self.upcard) {
            let upcard = self.kitty.remove(index);
            self.hands[self.dealer.index()].add(upcard);
        }
        self.declaration = Some(declaration);
        self.phase = RoundPhase::Discarding;
        Ok(declaration)
    }

    pub fn call_trump(&mut self, seat: Seat, suit: Suit) -> Result<Declaration, RoundError> {
        let declaration = self.bidding_mut(seat, "call")?.call(seat, suit)?;
        self.start_play(declaration);
        Ok(declaration)
    }

    pub fn force_trump(&mut self, seat: Seat, suit: Suit) -> Result<Declaration, RoundError> {
        let declaration = self.bidding_mut(seat, "forced trump")?.force(seat, suit)?;
        self.start_play(declaration);
        Ok(declaration)
    }

    pub fn discard(&mut self, seat: Seat, card: Card) -> Result<(), RoundError> {
        if !matches!(self.phase, RoundPhase::Discarding) {
            return Err(invalid(seat, InvalidMove::WrongPhase("discard")));
        }
        if seat != self.dealer {
            return Err(invalid(
                seat,
                InvalidMove::OutOfTurn {
                    expected: self.dealer,
                },
            ));
        }

        let hand = &mut self.hands[seat.index()];
        let taken = hand
            .position(card)
            .and_then(|index| hand.take(index))
            .ok_or_else(|| invalid(seat, InvalidMove::CardNotInHand(card)))?;
        self.out_of_play.push(taken);

        if let Some(declaration) = self.declaration {
            self.start_play(declaration);
        }
        Ok(())
    }

    pub fn legal_cards(&self, seat: Seat) -> Vec<Card> {
        match (&self.phase, self.current_trick.as_ref()) {
            (RoundPhase::Playing, Some(trick)) => {
                self.hands[seat.index()].legal_cards(trick.lead_suit(), trick.trump())
            }
            _ => Vec::new(),
        }
    }

    pub fn play_card(&mut self, seat: Seat, card: Card) -> Result<PlayOutcome, RoundError> {
        if !matches!(self.phase, RoundPhase::Playing) {
            return Err(invalid(seat, InvalidMove::WrongPhase("card play")));
        }
        let Some(trick) = self.current_trick.as_mut() else {
            return Err(invalid(seat, InvalidMove::WrongPhase("card play")));
        };

        let expected = trick.expected_seat();
        if expected != seat {
            return Err(invalid(seat, InvalidMove::OutOfTurn { expected }));
        }

        let hand = &mut self.hands[seat.index()];
        let Some(index) = hand.position(card) else {
            return Err(invalid(seat, InvalidMove::CardNotInHand(card)));
        };
        if let Some(lead) = trick.lead_suit() {
            if !hand.is_legal(card, Some(lead), trick.trump()) {
                return Err(invalid(seat, InvalidMove::MustFollowSuit { card, lead }));
            }
        }

        trick
            .play(seat, card)
            .map_err(|err| invalid(seat, err.into()))?;
        let _ = hand.take(index);
        self.out_of_play.push(card);

        let Some(winner) = trick.winner() else {
            return Ok(PlayOutcome::Played);
        };

        self.tricks_won[winner.seat.team().index()] += 1;
        let next = Trick::new(winner.seat, trick.trump());
        if let Some(finished) = self.current_trick.replace(next) {
            self.trick_history.push(finished);
        }

        if self.hands.iter().all(Hand::is_empty) {
            self.current_trick = None;
            self.phase = RoundPhase::Complete;
            if let Some(result) = self.result() {
                return Ok(PlayOutcome::RoundCompleted { winner, result });
            }
        }
        Ok(PlayOutcome::TrickCompleted { winner })
    }

    pub fn result(&self) -> Option<RoundResult> {
        if !self.is_complete() {
            return None;
        }
        let declaration = self.declaration?;
        Some(RoundResult {
            declaration,
            tricks: self.tricks_won,
            score: score_round(declaration.team, self.tricks_won),
        })
    }

    fn bidding_mut(&mut self, seat: Seat, action: &'static str) -> Result<&mut Bidding, RoundError> {
        match &mut self.phase {
            RoundPhase::Bidding(bidding) => Ok(bidding),
            _ => Err(invalid(seat, InvalidMove::WrongPhase(action))),
        }
    }

    fn turn_down(&mut self, upcard: Card) {
        if let Some(index) = self.kitty.iter().position(|&card| card == upcard) {
            self.out_of_play.push(self.kitty.remove(index));
        }
    }

    fn start_play(&mut self, declaration: Declaration) {
        self.declaration = Some(declaration);
        self.current_trick = Some(Trick::new(self.dealer.next(), declaration.trump));
        self.phase = RoundPhase::Playing;
    }
}

fn invalid(seat: Seat, reason: InvalidMove) -> RoundError {
    RoundError::InvalidMove { seat, reason }
}

#[cfg(test)]
mod tests {
    use super::{InvalidMove, PlayOutcome, RoundError, RoundPhase, RoundState, RuleViolation};
    use crate::model::bidding::{BidProgress, BidStage, DeclarationKind};
    use crate::model::card::{Card, DECK_SIZE};
    use crate::model::deck::Deck;
    use crate::model::player::{Seat, Team};
    use crate::model::score::RoundOutcome;
    use crate::model::suit::Suit;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    // P1: 9♥..K♥, P2: A♥ 9♦..Q♦, P3: K♦ A♦ 9♣ 10♣ J♣, P4: Q♣ K♣ A♣ 9♠ 10♠, kitty: J♠ Q♠ K♠ A♠.
    fn standard_round(dealer: Seat) -> RoundState {
        RoundState::deal(Deck::standard().deal(), dealer)
    }

    fn play_out(round: &mut RoundState) {
        while let Some(seat) = round.expected_actor() {
            let card = round.legal_cards(seat)[0];
            round.play_card(seat, card).unwrap();
            assert_eq!(round.card_count(), DECK_SIZE);
        }
    }

    #[test]
    fn dealing_gives_five_cards_and_upcard_from_kitty() {
        let round = standard_round(Seat::P4);
        for seat in Seat::LOOP {
            assert_eq!(round.hand(seat).len(), 5);
        }
        assert_eq!(round.kitty().len(), 4);
        assert_eq!(round.upcard(), card("J♠"));
        assert_eq!(round.bid_stage(), Some(BidStage::RoundOne));
        assert_eq!(round.expected_actor(), Some(Seat::P1));
        assert_eq!(round.card_count(), DECK_SIZE);
    }

    #[test]
    fn order_up_moves_upcard_to_dealer_then_requires_discard() {
        let mut round = standard_round(Seat::P4);
        let declaration = round.order_up(Seat::P1).unwrap();
        assert_eq!(declaration.trump, Suit::Spades);
        assert_eq!(declaration.team, Team::A);
        assert!(matches!(round.phase(), RoundPhase::Discarding));
        assert_eq!(round.hand(Seat::P4).len(), 6);
        assert!(round.hand(Seat::P4).contains(card("J♠")));
        assert_eq!(round.card_count(), DECK_SIZE);

        let err = round.discard(Seat::P4, card("A♥")).unwrap_err();
        assert_eq!(
            err,
            RoundError::InvalidMove {
                seat: Seat::P4,
                reason: InvalidMove::CardNotInHand(card("A♥")),
            }
        );

        round.discard(Seat::P4, card("Q♣")).unwrap();
        assert_eq!(round.hand(Seat::P4).len(), 5);
        assert_eq!(round.out_of_play(), &[card("Q♣")]);
        assert_eq!(round.expected_actor(), Some(Seat::P1));
        assert_eq!(round.card_count(), DECK_SIZE);
    }

    #[test]
    fn turned_down_upcard_goes_out_of_play() {
        let mut round = standard_round(Seat::P1);
        for seat in Seat::P2.clockwise() {
            let progress = round.pass(seat).unwrap();
            if seat == Seat::P1 {
                assert!(matches!(progress, BidProgress::UpcardTurnedDown { .. }));
            }
        }
        assert_eq!(round.out_of_play(), &[card("J♠")]);
        assert_eq!(round.kitty().len(), 3);
        assert_eq!(round.card_count(), DECK_SIZE);

        let err = round.call_trump(Seat::P2, Suit::Spades).unwrap_err();
        assert!(matches!(
            err,
            RoundError::RuleViolation {
                reason: RuleViolation::ForbiddenSuit(Suit::Spades),
                ..
            }
        ));
        let declaration = round.call_trump(Seat::P2, Suit::Diamonds).unwrap();
        assert_eq!(declaration.kind, DeclarationKind::Called);
        assert_eq!(round.hand(Seat::P1).len(), 5);
    }

    #[test]
    fn forced_dealer_cannot_name_upcard_suit() {
        let mut round = standard_round(Seat::P2);
        for _ in 0..8 {
            let seat = round.expected_actor().unwrap();
            round.pass(seat).unwrap();
        }
        assert_eq!(round.bid_stage(), Some(BidStage::DealerForced));
        assert!(matches!(
            round.force_trump(Seat::P2, Suit::Spades),
            Err(RoundError::RuleViolation { .. })
        ));
        let declaration = round.force_trump(Seat::P2, Suit::Hearts).unwrap();
        assert_eq!(declaration.team, Team::B);
        assert_eq!(round.expected_actor(), Some(Seat::P3));
    }

    #[test]
    fn follow_suit_is_enforced_with_effective_suits() {
        let mut round = standard_round(Seat::P4);
        round.order_up(Seat::P1).unwrap();
        round.discard(Seat::P4, card("Q♣")).unwrap();

        round.play_card(Seat::P1, card("9♥")).unwrap();
        let err = round.play_card(Seat::P2, card("9♦")).unwrap_err();
        assert_eq!(
            err,
            RoundError::InvalidMove {
                seat: Seat::P2,
                reason: InvalidMove::MustFollowSuit {
                    card: card("9♦"),
                    lead: Suit::Hearts,
                },
            }
        );
        round.play_card(Seat::P2, card("A♥")).unwrap();
        // P3 is void in hearts and may trump with the left bower.
        assert_eq!(round.legal_cards(Seat::P3).len(), 5);
        let outcome = round.play_card(Seat::P3, card("J♣")).unwrap();
        assert_eq!(outcome, PlayOutcome::Played);
        let outcome = round.play_card(Seat::P4, card("J♠")).unwrap();
        match outcome {
            PlayOutcome::TrickCompleted { winner } => assert_eq!(winner.seat, Seat::P4),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(round.tricks_won(), [0, 1]);
        assert_eq!(round.expected_actor(), Some(Seat::P4));
    }

    #[test]
    fn out_of_turn_play_is_rejected() {
        let mut round = standard_round(Seat::P4);
        round.order_up(Seat::P1).unwrap();
        round.discard(Seat::P4, card("Q♣")).unwrap();
        assert!(matches!(
            round.play_card(Seat::P2, card("A♥")),
            Err(RoundError::InvalidMove {
                reason: InvalidMove::OutOfTurn { expected: Seat::P1 },
                ..
            })
        ));
    }

    #[test]
    fn full_round_keeps_all_cards_accounted_and_scores() {
        let mut round = standard_round(Seat::P4);
        round.order_up(Seat::P1).unwrap();
        round.discard(Seat::P4, card("Q♣")).unwrap();
        play_out(&mut round);

        assert!(round.is_complete());
        assert_eq!(round.tricks_completed(), 5);
        let result = round.result().unwrap();
        assert_eq!(result.tricks.iter().sum::<u8>(), 5);
        let declaring = result.tricks[Team::A.index()];
        match result.score.outcome {
            RoundOutcome::Euchred => assert!(declaring < 3),
            RoundOutcome::Made => assert!((3..5).contains(&declaring)),
            RoundOutcome::March => assert_eq!(declaring, 5),
        }
    }

    #[test]
    fn shuffled_rounds_play_to_completion() {
        for seed in 0..20 {
            let deal = Deck::shuffled_with_seed(seed).deal();
            let mut round = RoundState::deal(deal, Seat::P3);
            for _ in 0..4 {
                let seat = round.expected_actor().unwrap();
                round.pass(seat).unwrap();
            }
            let upcard_suit = round.upcard().suit;
            let suit = Suit::ALL
                .iter()
                .copied()
                .find(|suit| *suit != upcard_suit)
                .unwrap();
            round.call_trump(Seat::P4, suit).unwrap();
            play_out(&mut round);
            assert!(round.result().is_some());
        }
    }
}
