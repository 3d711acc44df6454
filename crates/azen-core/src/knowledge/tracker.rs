//! Per-observer bookkeeping of seen cards, hand sizes and inferred holdings.

use super::pool::cards_from_counts;
use crate::game::moves::Move;
use crate::game::position::Position;
use crate::game::round::RoundDescriptor;
use crate::model::card::Card;
use crate::model::counts::{RankCounts, RankSet};
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::table::TableConfig;
use serde::{Deserialize, Serialize};

/// A pass on a single-card round, recorded as evidence the passer could not beat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    pub count: usize,
    pub table_rank: Option<Rank>,
}

/// Belief state held by one observer.
///
/// Suspicions are ranks the observer believes an opponent holds; exclusions
/// are ranks believed absent. Both only ever shrink as cards are seen played.
#[derive(Debug, Clone)]
pub struct KnowledgeModel {
    table: TableConfig,
    observer: PlayerId,
    own_hand: Hand,
    played: Vec<Card>,
    dead: Vec<Card>,
    hand_counts: Vec<usize>,
    played_by: Vec<Vec<Card>>,
    pass_records: Vec<Vec<PassRecord>>,
    suspicions: Vec<RankCounts>,
    exclusions: Vec<RankCounts>,
}

impl KnowledgeModel {
    /// Starts tracking at the deal. `dead` lists undealt cards the observer
    /// knows about; pass an empty slice when they are hidden.
    ///
    /// Every opponent starts suspected of one Two, the dealing guarantee.
    pub fn new(table: TableConfig, observer: PlayerId, hand: &Hand, dead: &[Card]) -> Self {
        let players = table.players;
        let mut model = Self {
            table,
            observer,
            own_hand: hand.clone(),
            played: Vec::new(),
            dead: dead.to_vec(),
            hand_counts: vec![table.hand_size; players],
            played_by: vec![Vec::new(); players],
            pass_records: vec![Vec::new(); players],
            suspicions: vec![RankCounts::new(); players],
            exclusions: vec![RankCounts::new(); players],
        };
        let guaranteed_wild = [Card::new(Rank::Two, Suit::Hearts)];
        for player in PlayerId::all(players) {
            model.add_suspicion(player, &guaranteed_wild);
        }
        model
    }

    /// Builds knowledge for a position joined mid-game: hand sizes and the
    /// played pile are read from the table, attribution and passes are unknown.
    pub fn from_position(position: &Position, observer: PlayerId) -> Self {
        let players = position.players();
        Self {
            table: *position.table(),
            observer,
            own_hand: position.hand(observer).clone(),
            played: position.played().to_vec(),
            dead: Vec::new(),
            hand_counts: position.hands().iter().map(Hand::len).collect(),
            played_by: vec![Vec::new(); players],
            pass_records: vec![Vec::new(); players],
            suspicions: vec![RankCounts::new(); players],
            exclusions: vec![RankCounts::new(); players],
        }
    }

    pub fn observer(&self) -> PlayerId {
        self.observer
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn own_hand(&self) -> &Hand {
        &self.own_hand
    }

    pub fn played(&self) -> &[Card] {
        &self.played
    }

    pub fn played_by(&self, player: PlayerId) -> &[Card] {
        &self.played_by[player.index()]
    }

    pub fn dead(&self) -> &[Card] {
        &self.dead
    }

    /// Estimated number of cards `player` still holds.
    pub fn hand_count(&self, player: PlayerId) -> usize {
        self.hand_counts[player.index()]
    }

    pub fn pass_records(&self, player: PlayerId) -> &[PassRecord] {
        &self.pass_records[player.index()]
    }

    pub fn suspicions(&self, player: PlayerId) -> &RankCounts {
        &self.suspicions[player.index()]
    }

    pub fn exclusions(&self, player: PlayerId) -> &RankCounts {
        &self.exclusions[player.index()]
    }

    /// Cards held by anyone else, summed over their estimated hand sizes.
    pub fn total_opponent_cards(&self) -> usize {
        PlayerId::all(self.hand_counts.len())
            .filter(|&p| p != self.observer)
            .map(|p| self.hand_count(p))
            .sum()
    }

    /// Unseen cards by rank: the full table minus own hand, played and dead piles.
    pub fn possible_opponent_counts(&self) -> RankCounts {
        self.table
            .full_counts()
            .saturating_sub(&self.own_hand.counts())
            .saturating_sub(&RankCounts::from_cards(&self.played))
            .saturating_sub(&RankCounts::from_cards(&self.dead))
    }

    pub fn possible_opponent_cards(&self) -> Vec<Card> {
        cards_from_counts(&self.possible_opponent_counts())
    }

    pub fn record_move(&mut self, mv: &Move) {
        if mv.pass || mv.cards.is_empty() {
            return;
        }
        let player = mv.player.index();
        self.played.extend_from_slice(&mv.cards);
        self.played_by[player].extend_from_slice(&mv.cards);
        self.hand_counts[player] = self.hand_counts[player].saturating_sub(mv.cards.len());
        if mv.player == self.observer {
            self.own_hand.remove_all(&mv.cards);
        }
        self.shrink_beliefs(&mv.counts());
    }

    /// Records a pass made against `round`. Only a single-card response
    /// passed by a short-handed opponent says anything about their cards.
    pub fn record_pass(&mut self, player: PlayerId, round: &RoundDescriptor) {
        if player == self.observer || round.open || round.count != 1 {
            return;
        }
        if self.hand_count(player) >= self.table.pass_inference_limit() {
            return;
        }
        self.pass_records[player.index()].push(PassRecord {
            count: round.count,
            table_rank: round.table_rank,
        });
    }

    /// Asserts `player` holds `cards`. Each card is accepted only while the
    /// unseen pool, less everyone's suspicions, still has one of its rank.
    /// Returns how many were accepted.
    pub fn add_suspicion(&mut self, player: PlayerId, cards: &[Card]) -> usize {
        if player == self.observer {
            return 0;
        }
        let mut available = self.possible_opponent_counts();
        for suspected in &self.suspicions {
            available = available.saturating_sub(suspected);
        }
        let mut added = 0;
        for card in cards {
            if available.remove(card.rank, 1) == 1 {
                self.suspicions[player.index()].add(card.rank, 1);
                self.exclusions[player.index()].set(card.rank, 0);
                added += 1;
            }
        }
        added
    }

    pub fn clear_suspicions(&mut self, player: PlayerId) {
        self.suspicions[player.index()] = RankCounts::new();
    }

    /// Asserts `player` does not hold `cards`, capped by the unseen pool.
    /// Returns how many were accepted.
    pub fn add_exclusion(&mut self, player: PlayerId, cards: &[Card]) -> usize {
        if player == self.observer {
            return 0;
        }
        let pool = self.possible_opponent_counts();
        let mut added = 0;
        for card in cards {
            let excluded = &mut self.exclusions[player.index()];
            if excluded.get(card.rank) < pool.get(card.rank) {
                excluded.add(card.rank, 1);
                self.suspicions[player.index()].set(card.rank, 0);
                added += 1;
            }
        }
        added
    }

    pub fn clear_exclusions(&mut self, player: PlayerId) {
        self.exclusions[player.index()] = RankCounts::new();
    }

    /// Ranks `player` is believed not to hold, from pass records and manual exclusions.
    pub fn excluded_ranks(&self, player: PlayerId) -> RankSet {
        let mut excluded = RankSet::new();
        for record in self.pass_records(player) {
            excluded.insert(Rank::Joker);
            excluded.insert(Rank::Two);
            for rank in Rank::NATURAL {
                if record.table_rank.is_none_or(|table| rank > table) {
                    excluded.insert(rank);
                }
            }
        }
        for (rank, _) in self.exclusions(player).iter() {
            excluded.insert(rank);
        }
        excluded
    }

    fn shrink_beliefs(&mut self, seen: &RankCounts) {
        for (rank, count) in seen.iter() {
            for suspected in &mut self.suspicions {
                suspected.remove(rank, count);
            }
            for excluded in &mut self.exclusions {
                excluded.remove(rank, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KnowledgeModel;
    use crate::game::moves::Move;
    use crate::game::round::RoundDescriptor;
    use crate::model::card::parse_cards;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerId;
    use crate::model::rank::Rank;
    use crate::model::table::TableConfig;

    fn model(hand: &str) -> KnowledgeModel {
        let table = TableConfig::for_players(3).unwrap();
        let hand = Hand::with_cards(parse_cards(hand).unwrap());
        KnowledgeModel::new(table, PlayerId(0), &hand, &[])
    }

    #[test]
    fn opponents_start_suspected_of_a_wild() {
        let model = model("3 4 5");
        assert_eq!(model.suspicions(PlayerId(0)).total(), 0);
        assert_eq!(model.suspicions(PlayerId(1)).get(Rank::Two), 1);
        assert_eq!(model.suspicions(PlayerId(2)).get(Rank::Two), 1);
    }

    #[test]
    fn pool_excludes_own_hand_and_played_cards() {
        let mut model = model("1 1 0");
        assert_eq!(model.possible_opponent_counts().get(Rank::Ace), 2);
        assert_eq!(model.possible_opponent_counts().get(Rank::Joker), 1);
        model.record_move(&Move::play(PlayerId(1), parse_cards("1").unwrap()));
        assert_eq!(model.possible_opponent_counts().get(Rank::Ace), 1);
        assert_eq!(model.hand_count(PlayerId(1)), 17);
        assert_eq!(model.possible_opponent_cards().len(), 54 - 3 - 1);
    }

    #[test]
    fn own_moves_leave_the_hand() {
        let mut model = model("6 6 9");
        model.record_move(&Move::play(PlayerId(0), parse_cards("6 6").unwrap()));
        assert_eq!(model.own_hand().len(), 1);
        assert_eq!(model.played_by(PlayerId(0)).len(), 2);
    }

    #[test]
    fn playing_a_rank_shrinks_suspicions_everywhere() {
        let mut model = model("3");
        model.record_move(&Move::play(PlayerId(2), parse_cards("2").unwrap()));
        assert_eq!(model.suspicions(PlayerId(1)).get(Rank::Two), 0);
        assert_eq!(model.suspicions(PlayerId(2)).get(Rank::Two), 0);
    }

    #[test]
    fn suspicions_are_capped_by_the_pool() {
        let mut model = model("K K K");
        assert_eq!(model.add_suspicion(PlayerId(1), &parse_cards("K K").unwrap()), 1);
        assert_eq!(model.add_suspicion(PlayerId(2), &parse_cards("K").unwrap()), 0);
        assert_eq!(model.add_suspicion(PlayerId(0), &parse_cards("Q").unwrap()), 0);
    }

    #[test]
    fn exclusions_relax_when_the_rank_appears() {
        let mut model = model("3");
        assert_eq!(model.add_exclusion(PlayerId(1), &parse_cards("Q Q").unwrap()), 2);
        assert!(model.excluded_ranks(PlayerId(1)).contains(Rank::Queen));
        model.record_move(&Move::play(PlayerId(1), parse_cards("Q").unwrap()));
        assert_eq!(model.exclusions(PlayerId(1)).get(Rank::Queen), 1);
        model.record_move(&Move::play(PlayerId(2), parse_cards("Q").unwrap()));
        assert!(!model.excluded_ranks(PlayerId(1)).contains(Rank::Queen));
    }

    #[test]
    fn pass_inference_needs_a_short_hand_and_single_round() {
        let mut model = model("3");
        let single = RoundDescriptor::response(1, Some(Rank::Nine), PlayerId(2));
        model.record_pass(PlayerId(1), &single);
        assert!(model.pass_records(PlayerId(1)).is_empty());

        let pair = RoundDescriptor::response(2, Some(Rank::Nine), PlayerId(2));
        let open = RoundDescriptor::open(PlayerId(2));
        for _ in 0..11 {
            model.record_move(&Move::play(PlayerId(1), parse_cards("4").unwrap()));
        }
        model.record_pass(PlayerId(1), &pair);
        model.record_pass(PlayerId(1), &open);
        assert!(model.pass_records(PlayerId(1)).is_empty());
        model.record_pass(PlayerId(1), &single);
        assert_eq!(model.pass_records(PlayerId(1)).len(), 1);
    }

    #[test]
    fn clearing_beliefs_resets_them() {
        let mut model = model("3");
        model.add_exclusion(PlayerId(2), &parse_cards("8").unwrap());
        model.clear_exclusions(PlayerId(2));
        model.clear_suspicions(PlayerId(2));
        assert!(model.excluded_ranks(PlayerId(2)).is_empty());
        assert_eq!(model.suspicions(PlayerId(2)).total(), 0);
        assert_eq!(model.total_opponent_cards(), 36);
    }
}
