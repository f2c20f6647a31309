use crate::model::bidding::Declaration;
use crate::model::card::Card;
use crate::model::player::{Seat, Team};
use crate::model::round::RoundResult;
use crate::model::suit::Suit;
use serde::Serialize;

/// Structured record of everything that happens at the table, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        dealer: Seat,
        /// Dealt hands by seat index; `None` where hidden from the viewer.
        hands: [Option<Vec<Card>>; 4],
        upcard: Card,
    },
    UpcardTurnedDown {
        upcard: Card,
    },
    OrderedUp {
        seat: Seat,
        dealer: Seat,
    },
    TrumpCalled {
        seat: Seat,
        suit: Suit,
    },
    TrumpForced {
        dealer: Seat,
        suit: Suit,
    },
    DealerPickedUp {
        dealer: Seat,
        upcard: Card,
        discard: Option<Card>,
    },
    TrumpSet {
        declaration: Declaration,
    },
    CardPlayed {
        seat: Seat,
        card: Card,
        /// Effective suit led in this trick, including this play when it is the lead.
        lead: Suit,
    },
    TrickWon {
        winner: Seat,
        card: Card,
        tricks: [u8; 2],
    },
    RoundEnded {
        result: RoundResult,
        scores: [u32; 2],
    },
    GameEnded {
        winner: Team,
        scores: [u32; 2],
        rounds: u32,
    },
}

impl GameEvent {
    /// Copy of the event as `viewer` is allowed to see it.
    pub fn redacted_for(&self, viewer: Seat) -> GameEvent {
        match self {
            GameEvent::RoundStarted {
                round,
                dealer,
                hands,
                upcard,
            } => {
                let mut visible: [Option<Vec<Card>>; 4] = Default::default();
                visible[viewer.index()] = hands[viewer.index()].clone();
                GameEvent::RoundStarted {
                    round: *round,
                    dealer: *dealer,
                    hands: visible,
                    upcard: *upcard,
                }
            }
            GameEvent::DealerPickedUp {
                dealer,
                upcard,
                discard,
            } => GameEvent::DealerPickedUp {
                dealer: *dealer,
                upcard: *upcard,
                discard: if viewer == *dealer { *discard } else { None },
            },
            other => other.clone(),
        }
    }
}

pub trait EventSink {
    fn record(&mut self, event: &GameEvent);
}

impl EventSink for () {
    fn record(&mut self, _event: &GameEvent) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &GameEvent) {
        (**self).record(event);
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn record(&mut self, event: &GameEvent) {
        self.0.record(event);
        self.1.record(event);
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{EventLog, EventSink, GameEvent};
    use crate::model::card::Card;
    use crate::model::player::Seat;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn round_started() -> GameEvent {
        GameEvent::RoundStarted {
            round: 1,
            dealer: Seat::P4,
            hands: [
                Some(vec![card("9♥")]),
                Some(vec![card("10♥")]),
                Some(vec![card("J♥")]),
                Some(vec![card("Q♥")]),
            ],
            upcard: card("A♠"),
        }
    }

    #[test]
    fn redaction_hides_other_hands() {
        let event = round_started().redacted_for(Seat::P2);
        match event {
            GameEvent::RoundStarted { hands, .. } => {
                assert_eq!(hands[1], Some(vec![card("10♥")]));
                assert!(hands[0].is_none());
                assert!(hands[2].is_none());
                assert!(hands[3].is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn redaction_hides_discard_from_non_dealers() {
        let event = GameEvent::DealerPickedUp {
            dealer: Seat::P4,
            upcard: card("A♠"),
            discard: Some(card("9♣")),
        };
        assert_eq!(event.redacted_for(Seat::P4), event);
        assert!(matches!(
            event.redacted_for(Seat::P1),
            GameEvent::DealerPickedUp { discard: None, .. }
        ));
    }

    #[test]
    fn event_log_collects_in_order_and_serializes() {
        let mut log = EventLog::new();
        let mut both = (&mut log, ());
        both.record(&round_started());
        both.record(&GameEvent::UpcardTurnedDown { upcard: card("A♠") });
        assert_eq!(log.len(), 2);
        let json = serde_json::to_string(&log.events()[1]).unwrap();
        assert!(json.contains("\"event\":\"upcard_turned_down\""));
    }
}
