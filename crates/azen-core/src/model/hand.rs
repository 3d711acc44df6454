use crate::model::card::Card;
use crate::model::counts::RankCounts;
use crate::model::rank::Rank;
use std::vec::Vec;

/// A player's cards, kept sorted by rank then suit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
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

    pub fn extend<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.extend(cards);
        self.sort();
    }

    /// Removes one card of the given rank, whatever its suit.
    pub fn remove_rank(&mut self, rank: Rank) -> Option<Card> {
        let index = self.cards.iter().position(|c| c.rank == rank)?;
        Some(self.cards.remove(index))
    }

    /// Removes a card of the same rank as `card`. Returns `false` when none is held.
    pub fn remove(&mut self, card: Card) -> bool {
        self.remove_rank(card.rank).is_some()
    }

    /// Removes all given cards (matched by rank) or nothing at all.
    pub fn remove_all(&mut self, cards: &[Card]) -> bool {
        if !self.holds(cards) {
            return false;
        }
        for card in cards {
            self.remove(*card);
        }
        true
    }

    /// Whether the hand covers every card in `cards`, counting repeats.
    pub fn holds(&self, cards: &[Card]) -> bool {
        self.counts().contains(&RankCounts::from_cards(cards))
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn count_of(&self, rank: Rank) -> usize {
        self.cards.iter().filter(|c| c.rank == rank).count()
    }

    pub fn counts(&self) -> RankCounts {
        RankCounts::from_cards(&self.cards)
    }

    /// Cards of the given rank, in suit order.
    pub fn of_rank(&self, rank: Rank) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |c| c.rank == rank)
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

    pub fn clear(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }

    fn sort(&mut self) {
        self.cards
            .sort_by(|a, b| a.rank.cmp(&b.rank).then(a.suit.cmp(&b.suit)));
    }
}
