use azen_core::game::moves::Move;
use azen_core::game::position::Position;
use azen_core::model::player::PlayerId;
use azen_core::model::table::TableConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;

const GAMES: usize = 24;
const MOVE_LIMIT: usize = 2_000;

fn game_seeds() -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(20260417);
    (0..GAMES).map(|_| rng.next_u64()).collect()
}

fn random_subset(position: &Position, rng: &mut StdRng) -> Move {
    let player = position.turn();
    let mut cards = position.hand(player).cards().to_vec();
    cards.shuffle(rng);
    let take = rng.gen_range(1..=cards.len().min(7));
    cards.truncate(take);
    Move::play(player, cards)
}

fn play_random_game(seed: u64, players: usize) {
    let table = TableConfig::for_players(players).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let starter = PlayerId(rng.gen_range(0..players));
    let mut position = Position::deal(table, starter, &mut rng);
    let total = position.total_cards();

    for _ in 0..MOVE_LIMIT {
        if position.is_terminal() {
            break;
        }
        let moves = position.legal_moves();
        let keys: HashSet<_> = moves.iter().map(Move::key).collect();
        assert_eq!(keys.len(), moves.len(), "duplicate multiset in {moves:?}");

        for mv in &moves {
            assert!(position.validate_move(mv).is_ok(), "listed move rejected: {mv}");
        }
        for _ in 0..8 {
            let candidate = random_subset(&position, &mut rng);
            let accepted = position.validate_move(&candidate).is_ok();
            assert_eq!(
                accepted,
                keys.contains(&candidate.key()),
                "validate and legal_moves disagree on {candidate}"
            );
        }

        // Bias towards playing so games finish.
        let choice = if moves.len() > 1 && rng.gen_bool(0.85) {
            moves[rng.gen_range(1..moves.len())].clone()
        } else {
            moves[0].clone()
        };
        position.apply_move(&choice).unwrap();

        assert_eq!(position.total_cards(), total);
        for player in PlayerId::all(players) {
            if position.is_finished(player) {
                assert!(position.hand(player).is_empty());
            }
        }
    }

    assert!(position.is_terminal(), "seed {seed} did not finish");
    let order: HashSet<_> = position.finish_order().iter().copied().collect();
    assert_eq!(order.len(), players);
    assert_eq!(position.finish_order().len(), players);
}

#[test]
fn random_games_conserve_cards_and_agree_on_legality() {
    for (index, seed) in game_seeds().into_iter().enumerate() {
        play_random_game(seed, 2 + index % 3);
    }
}

#[test]
fn every_position_offers_a_pass_first() {
    let table = TableConfig::for_players(4).unwrap();
    let position = Position::deal_with_seed(table, PlayerId(3), 11);
    let moves = position.legal_moves();
    assert!(moves[0].is_pass());
    assert!(moves.iter().skip(1).all(|mv| !mv.is_pass()));
    assert!(moves.iter().all(|mv| mv.player == PlayerId(3)));
}
