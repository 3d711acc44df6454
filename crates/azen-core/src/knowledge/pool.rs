use crate::model::card::Card;
use crate::model::counts::RankCounts;
use crate::model::suit::Suit;

/// Materialises rank counts as cards, cycling suits within each rank.
pub fn cards_from_counts(counts: &RankCounts) -> Vec<Card> {
    let mut cards = Vec::with_capacity(counts.total());
    for (rank, count) in counts.iter() {
        for copy in 0..count as usize {
            let suit = if rank.is_reset() {
                Suit::Joker
            } else {
                Suit::STANDARD[copy % Suit::STANDARD.len()]
            };
            cards.push(Card::new(rank, suit));
        }
    }
    cards
}
