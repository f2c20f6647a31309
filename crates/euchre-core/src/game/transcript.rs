use crate::game::events::{EventSink, GameEvent};
use crate::model::card::Card;
use crate::model::player::{Seat, Team};
use std::fs;
use std::io;
use std::path::Path;

/// Renders events into the line-oriented game log read by external checkers.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render())
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

fn card_list(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl EventSink for Transcript {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::RoundStarted {
                round,
                dealer,
                hands,
                upcard,
            } => {
                self.push(String::new());
                self.push(format!("--- ROUND #{round} ---"));
                self.push(format!("Dealer: {dealer}"));
                self.push(format!("Upcard: {upcard}"));
                for seat in Seat::LOOP {
                    if let Some(cards) = &hands[seat.index()] {
                        self.push(format!("{seat} hand: [{}]", card_list(cards)));
                    }
                }
                self.push(String::new());
            }
            GameEvent::UpcardTurnedDown { .. } => {}
            GameEvent::OrderedUp { seat, dealer } => {
                self.push(format!("{seat} orders up {dealer}"));
            }
            GameEvent::DealerPickedUp {
                dealer,
                upcard,
                discard,
            } => match discard {
                Some(discard) => {
                    self.push(format!("{dealer} picks up [{upcard}] and discards [{discard}]"))
                }
                None => self.push(format!("{dealer} picks up [{upcard}]")),
            },
            GameEvent::TrumpCalled { seat, suit } => {
                self.push(format!("{seat} calls {suit} as trump"));
            }
            GameEvent::TrumpForced { dealer, suit } => {
                self.push(format!("Dealer {dealer} chooses {suit} as trump"));
            }
            GameEvent::TrumpSet { declaration } => {
                self.push(format!(
                    "Trump: {} (chosen by {})",
                    declaration.trump, declaration.chooser
                ));
                self.push(String::new());
            }
            GameEvent::CardPlayed { seat, card, .. } => {
                self.push(format!("  {seat} plays {card}"));
            }
            GameEvent::TrickWon { winner, card, .. } => {
                self.push(format!("  Winner: {winner} ({card})"));
            }
            GameEvent::RoundEnded { result, scores } => {
                self.push(String::new());
                self.push("Round result:".to_string());
                for team in Team::BOTH {
                    self.push(format!(
                        "  {team}:         {} tricks",
                        result.tricks[team.index()]
                    ));
                }
                self.push(format!("  Called By:      {}", result.declaration.team));
                self.push(format!(
                    "  Scores:         Team 0: {}, Team 1: {}",
                    scores[0], scores[1]
                ));
            }
            GameEvent::GameEnded { .. } => {}
        }
    }
}
