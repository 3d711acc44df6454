use azen_core::game::moves::Move;
use azen_core::game::position::Position;
use azen_core::game::round::RoundDescriptor;
use azen_core::knowledge::KnowledgeModel;
use azen_core::model::card::parse_cards;
use azen_core::model::hand::Hand;
use azen_core::model::player::PlayerId;
use azen_core::model::rank::Rank;
use azen_core::model::table::TableConfig;

#[test]
fn three_single_card_passes_exclude_everything_above_nine() {
    let table = TableConfig::for_players(4).unwrap();
    let hand = Hand::with_cards(parse_cards("3 4 5").unwrap());
    let mut model = KnowledgeModel::new(table, PlayerId(0), &hand, &[]);
    let passer = PlayerId(2);

    // Eleven cards out of eighteen leaves seven in hand.
    for _ in 0..11 {
        model.record_move(&Move::play(passer, parse_cards("6").unwrap()));
    }
    assert_eq!(model.hand_count(passer), 7);

    let round = RoundDescriptor::response(1, Some(Rank::Nine), PlayerId(1));
    for _ in 0..3 {
        model.record_pass(passer, &round);
    }
    assert_eq!(model.pass_records(passer).len(), 3);

    let excluded = model.excluded_ranks(passer);
    for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace] {
        assert!(excluded.contains(rank), "{rank} should be excluded");
    }
    assert!(excluded.contains(Rank::Two));
    assert!(excluded.contains(Rank::Joker));
    assert!(!excluded.contains(Rank::Nine));
    assert!(!excluded.contains(Rank::Three));
}

#[test]
fn tracking_a_real_game_matches_the_position() {
    let table = TableConfig::for_players(3).unwrap();
    let mut position = Position::deal_with_seed(table, PlayerId(0), 77);
    let observer = PlayerId(1);
    let mut model = KnowledgeModel::new(table, observer, position.hand(observer), position.dead());

    for _ in 0..12 {
        if position.is_terminal() {
            break;
        }
        let moves = position.legal_moves();
        let mv = moves.last().unwrap().clone();
        position.apply_move(&mv).unwrap();
        model.record_move(&mv);
    }

    assert_eq!(model.own_hand().counts(), position.hand(observer).counts());
    for player in PlayerId::all(3) {
        assert_eq!(model.hand_count(player), position.hand_len(player));
    }
    let hidden: usize = PlayerId::all(3)
        .filter(|&p| p != observer)
        .map(|p| position.hand_len(p))
        .sum();
    assert_eq!(model.possible_opponent_counts().total(), hidden);
    assert_eq!(model.total_opponent_cards(), hidden);
}
