use crate::model::card::Card;
use crate::model::suit::Suit;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(6),
        }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
        self.sort();
    }

    pub fn position(&self, card: Card) -> Option<usize> {
        self.cards.iter().position(|&c| c == card)
    }

    /// Removes the card at `index`, keeping the remaining order.
    pub fn take(&mut self, index: usize) -> Option<Card> {
        (index < self.cards.len()).then(|| self.cards.remove(index))
    }

    pub fn remove(&mut self, card: Card) -> bool {
        self.position(card)
            .and_then(|index| self.take(index))
            .is_some()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn has_effective_suit(&self, suit: Suit, trump: Suit) -> bool {
        self.cards
            .iter()
            .any(|card| card.effective_suit(trump) == suit)
    }

    /// Cards that may be played onto a trick led with `lead` (all cards when leading or void).
    pub fn legal_cards(&self, lead: Option<Suit>, trump: Suit) -> Vec<Card> {
        match lead {
            Some(suit) if self.has_effective_suit(suit, trump) => self
                .cards
                .iter()
                .copied()
                .filter(|card| card.effective_suit(trump) == suit)
                .collect(),
            _ => self.cards.clone(),
        }
    }

    pub fn is_legal(&self, card: Card, lead: Option<Suit>, trump: Suit) -> bool {
        if !self.contains(card) {
            return false;
        }
        match lead {
            Some(suit) => {
                card.effective_suit(trump) == suit || !self.has_effective_suit(suit, trump)
            }
            None => true,
        }
    }

    fn sort(&mut self) {
        self.cards
            .sort_by(|a, b| a.suit.cmp(&b.suit).then(a.rank.cmp(&b.rank)));
    }
}
