use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn joker() -> Self {
        Self::new(Rank::Joker, Suit::Joker)
    }

    pub const fn is_wild(self) -> bool {
        self.rank.is_wild()
    }

    pub const fn is_reset(self) -> bool {
        self.rank.is_reset()
    }

    pub const fn is_special(self) -> bool {
        self.rank.is_special()
    }

    pub const fn is_natural(self) -> bool {
        self.rank.is_natural()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardParseError {
    UnknownSymbol(char),
    Empty,
}

impl fmt::Display for CardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardParseError::UnknownSymbol(symbol) => write!(f, "unknown card symbol '{symbol}'"),
            CardParseError::Empty => write!(f, "no cards given"),
        }
    }
}

impl std::error::Error for CardParseError {}

/// Parses rank symbols such as `"1 1 K 2"` or `"11K2"` into cards.
///
/// Suits are handed out round-robin per rank so repeated symbols stay distinct.
pub fn parse_cards(text: &str) -> Result<Vec<Card>, CardParseError> {
    let mut seen = [0usize; Rank::SLOTS];
    let mut cards = Vec::new();
    for symbol in text.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let rank = Rank::from_symbol(symbol).ok_or(CardParseError::UnknownSymbol(symbol))?;
        let slot = &mut seen[rank.value() as usize];
        let suit = if rank.is_reset() {
            Suit::Joker
        } else {
            Suit::STANDARD[*slot % Suit::STANDARD.len()]
        };
        *slot += 1;
        cards.push(Card::new(rank, suit));
    }
    if cards.is_empty() {
        return Err(CardParseError::Empty);
    }
    Ok(cards)
}

/// Renders cards as space separated rank symbols, the inverse of [`parse_cards`].
pub fn format_cards(cards: &[Card]) -> String {
    let symbols: Vec<String> = cards.iter().map(|card| card.rank.symbol().to_string()).collect();
    symbols.join(" ")
}

#[cfg(test)]
mod tests {
    use super::{Card, CardParseError, format_cards, parse_cards};
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn specials_are_classified_by_rank() {
        assert!(Card::joker().is_reset());
        assert!(Card::new(Rank::Two, Suit::Clubs).is_wild());
        assert!(Card::new(Rank::Ace, Suit::Spades).is_natural());
    }

    #[test]
    fn parse_assigns_distinct_suits_to_repeats() {
        let cards = parse_cards("1 1 0 X").unwrap();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].rank, Rank::Ace);
        assert_ne!(cards[0], cards[1]);
        assert_eq!(cards[2], Card::joker());
        assert_eq!(cards[3].rank, Rank::Ten);
    }

    #[test]
    fn parse_rejects_unknown_symbols() {
        assert_eq!(parse_cards("3 Z"), Err(CardParseError::UnknownSymbol('Z')));
        assert_eq!(parse_cards("  "), Err(CardParseError::Empty));
    }

    #[test]
    fn format_is_inverse_of_parse() {
        let cards = parse_cards("3 3 K 2 0").unwrap();
        assert_eq!(format_cards(&cards), "3 3 K 2 0");
    }
}
