use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::table::CARDS_PER_DECK;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Result of dealing a deck: one hand per seat plus the undealt remainder.
#[derive(Debug, Clone)]
pub struct Deal {
    pub hands: Vec<Hand>,
    pub dead: Vec<Card>,
}

impl Deck {
    /// One deck: Three through Two in four suits plus two jokers.
    pub fn standard() -> Self {
        Self::with_decks(1)
    }

    pub fn with_decks(decks: usize) -> Self {
        let mut cards = Vec::with_capacity(CARDS_PER_DECK * decks);
        for _ in 0..decks {
            for suit in Suit::STANDARD.iter().copied() {
                for rank in Rank::ORDERED.iter().copied().filter(|r| !r.is_reset()) {
                    cards.push(Card::new(rank, suit));
                }
            }
            cards.push(Card::joker());
            cards.push(Card::joker());
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(decks: usize, rng: &mut R) -> Self {
        let mut deck = Self::with_decks(decks);
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(decks: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(decks, &mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Deals `hand_size` cards to each of `players` seats round-robin.
    /// Cards beyond that stay out of play.
    pub fn deal(&self, players: usize, hand_size: usize) -> Deal {
        let dealt = (players * hand_size).min(self.cards.len());
        let mut hands: Vec<Vec<Card>> = vec![Vec::with_capacity(hand_size); players];
        for (index, card) in self.cards[..dealt].iter().enumerate() {
            hands[index % players].push(*card);
        }
        Deal {
            hands: hands.into_iter().map(Hand::with_cards).collect(),
            dead: self.cards[dealt..].to_vec(),
        }
    }
}
