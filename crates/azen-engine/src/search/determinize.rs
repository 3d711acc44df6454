//! Sampling concrete deals consistent with what the searcher knows.

use azen_core::game::position::Position;
use azen_core::knowledge::KnowledgeModel;
use azen_core::model::card::Card;
use azen_core::model::counts::{RankCounts, RankSet};
use azen_core::model::hand::Hand;
use azen_core::model::player::PlayerId;
use azen_core::model::rank::Rank;
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
struct OpponentBeliefs {
    player: PlayerId,
    need: usize,
    suspected: RankCounts,
    excluded: RankSet,
}

/// Builds sampled worlds from a knowledge snapshot.
///
/// Each opponent is filled in seat order: suspected cards first, then cards
/// it is not known to lack (aces and twos ahead), then anything left.
#[derive(Debug, Clone)]
pub struct Determinizer {
    pool: Vec<Card>,
    opponents: Vec<OpponentBeliefs>,
    full_information: bool,
}

impl Determinizer {
    pub fn new(knowledge: &KnowledgeModel, full_information: bool) -> Self {
        let observer = knowledge.observer();
        let opponents = PlayerId::all(knowledge.table().players)
            .filter(|player| *player != observer)
            .map(|player| OpponentBeliefs {
                player,
                need: knowledge.hand_count(player),
                suspected: *knowledge.suspicions(player),
                excluded: knowledge.excluded_ranks(player),
            })
            .collect();
        Self {
            pool: knowledge.possible_opponent_cards(),
            opponents,
            full_information,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Returns `None` when the pool cannot cover some opponent's hand.
    pub fn sample<R: Rng + ?Sized>(&self, position: &Position, rng: &mut R) -> Option<Position> {
        if self.full_information {
            return Some(position.clone());
        }

        let mut shuffled = self.pool.clone();
        shuffled.shuffle(rng);
        let mut used = vec![false; shuffled.len()];
        let mut world = position.clone();

        for beliefs in &self.opponents {
            let mut granted = RankCounts::new();
            let mut suspected = Vec::new();
            let mut open = Vec::new();
            let mut excluded = Vec::new();
            for (index, card) in shuffled.iter().enumerate() {
                if used[index] {
                    continue;
                }
                if granted.get(card.rank) < beliefs.suspected.get(card.rank) {
                    granted.add(card.rank, 1);
                    suspected.push(index);
                } else if !beliefs.excluded.contains(card.rank) {
                    open.push(index);
                } else {
                    excluded.push(index);
                }
            }

            if beliefs.need > 0 {
                let (mut strong, weak): (Vec<usize>, Vec<usize>) = open
                    .into_iter()
                    .partition(|index| matches!(shuffled[*index].rank, Rank::Ace | Rank::Two));
                strong.extend(weak);
                open = strong;
            }

            let ordered: Vec<usize> = suspected.into_iter().chain(open).chain(excluded).collect();
            if ordered.len() < beliefs.need {
                return None;
            }

            let mut hand = Hand::new();
            for index in ordered.into_iter().take(beliefs.need) {
                used[index] = true;
                hand.add(shuffled[index]);
            }
            world.set_hand(beliefs.player, hand);
        }

        Some(world)
    }
}

#[cfg(test)]
mod tests {
    use super::Determinizer;
    use azen_core::game::position::Position;
    use azen_core::knowledge::KnowledgeModel;
    use azen_core::model::card::parse_cards;
    use azen_core::model::hand::Hand;
    use azen_core::model::player::PlayerId;
    use azen_core::model::rank::Rank;
    use azen_core::model::table::TableConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn position(hands: &[&str]) -> Position {
        let table = TableConfig::new(hands.len(), 1, 8).unwrap();
        let hands = hands
            .iter()
            .map(|text| Hand::with_cards(parse_cards(text).unwrap()))
            .collect();
        Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap()
    }

    #[test]
    fn sampled_hands_match_sizes_and_keep_own_hand() {
        let position = position(&["3 4 5 6", "7 8 9", "X J Q K A"]);
        let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
        let determinizer = Determinizer::new(&knowledge, false);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let world = determinizer.sample(&position, &mut rng).unwrap();
            assert_eq!(world.hand(PlayerId(0)), position.hand(PlayerId(0)));
            assert_eq!(world.hand_len(PlayerId(1)), 3);
            assert_eq!(world.hand_len(PlayerId(2)), 5);
            let full = position.table().full_counts();
            let mut seen = position.hand(PlayerId(0)).counts();
            for seat in [PlayerId(1), PlayerId(2)] {
                for card in world.hand(seat).iter() {
                    seen.add(card.rank, 1);
                }
            }
            assert!(full.contains(&seen));
        }
    }

    #[test]
    fn exclusions_push_ranks_to_other_opponents() {
        let position = position(&["3 4", "5 6", "7 8"]);
        let mut knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
        knowledge.clear_suspicions(PlayerId(1));
        knowledge.clear_suspicions(PlayerId(2));
        let everything_but_fives: Vec<_> = knowledge
            .possible_opponent_cards()
            .into_iter()
            .filter(|card| card.rank != Rank::Five)
            .collect();
        knowledge.add_exclusion(PlayerId(1), &everything_but_fives);

        let determinizer = Determinizer::new(&knowledge, false);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let world = determinizer.sample(&position, &mut rng).unwrap();
            assert!(world.hand(PlayerId(1)).iter().all(|card| card.rank == Rank::Five));
        }
    }

    #[test]
    fn suspected_cards_are_placed_first() {
        let table = TableConfig::new(3, 1, 2).unwrap();
        let own = Hand::with_cards(parse_cards("3 4").unwrap());
        let hands = vec![
            own.clone(),
            Hand::with_cards(parse_cards("5 6").unwrap()),
            Hand::with_cards(parse_cards("7 8").unwrap()),
        ];
        let position = Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap();
        let knowledge = KnowledgeModel::new(table, PlayerId(0), &own, &[]);
        let determinizer = Determinizer::new(&knowledge, false);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let world = determinizer.sample(&position, &mut rng).unwrap();
            assert_eq!(world.hand(PlayerId(1)).count_of(Rank::Two), 1);
            assert_eq!(world.hand(PlayerId(2)).count_of(Rank::Two), 1);
        }
    }

    #[test]
    fn open_tier_deals_aces_and_twos_before_anything_else() {
        let table = TableConfig::new(2, 1, 1).unwrap();
        let own = Hand::with_cards(parse_cards("3").unwrap());
        let hands = vec![own.clone(), Hand::with_cards(parse_cards("4").unwrap())];
        let position = Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap();
        let mut knowledge = KnowledgeModel::new(table, PlayerId(0), &own, &[]);
        knowledge.clear_suspicions(PlayerId(1));

        let determinizer = Determinizer::new(&knowledge, false);
        let mut rng = StdRng::seed_from_u64(7);
        let (mut aces, mut twos) = (0, 0);
        for _ in 0..200 {
            let world = determinizer.sample(&position, &mut rng).unwrap();
            let hand = world.hand(PlayerId(1));
            assert_eq!(hand.len(), 1);
            let rank = hand.iter().next().unwrap().rank;
            match rank {
                Rank::Ace => aces += 1,
                Rank::Two => twos += 1,
                other => panic!("dealt {other} while aces and twos were available"),
            }
        }
        assert!(aces > 0 && twos > 0);
    }

    #[test]
    fn full_information_returns_the_true_deal() {
        let position = position(&["3 4", "5 6", "7 8"]);
        let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
        let determinizer = Determinizer::new(&knowledge, true);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(determinizer.sample(&position, &mut rng), Some(position));
    }
}
