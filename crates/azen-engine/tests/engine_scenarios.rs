use azen_core::game::position::Position;
use azen_core::game::round::RoundDescriptor;
use azen_core::knowledge::KnowledgeModel;
use azen_core::model::card::{format_cards, parse_cards};
use azen_core::model::hand::Hand;
use azen_core::model::player::PlayerId;
use azen_core::model::rank::Rank;
use azen_core::model::table::TableConfig;
use azen_engine::{Engine, EngineError, SearchConfig, find_move};

fn position(hands: &[&str], hand_size: usize) -> Position {
    let table = TableConfig::new(hands.len(), 1, hand_size).unwrap();
    let hands = hands
        .iter()
        .map(|text| Hand::with_cards(parse_cards(text).unwrap()))
        .collect();
    Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap()
}

#[test]
fn single_winning_answer_is_played_at_once() {
    let mut position = position(&["A", "3 4 5"], 18);
    position.set_round(
        RoundDescriptor::response(1, Some(Rank::King), PlayerId(1)),
        PlayerId(0),
    );
    let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
    let mut engine = Engine::new(SearchConfig::for_testing(3));

    let decision = engine.best_move(&position, &knowledge).unwrap();
    assert_eq!(format_cards(&decision.mv.cards), "A");
    assert_eq!(decision.evaluation.score, 1.0);
    assert_eq!(decision.evaluation.visits, 1);
    assert!(decision.evaluation.forced);
}

#[test]
fn same_master_seed_repeats_the_decision() {
    let table = TableConfig::for_players(3).unwrap();
    let position = Position::deal_with_seed(table, PlayerId(0), 2024);
    let knowledge = KnowledgeModel::new(table, PlayerId(0), position.hand(PlayerId(0)), &[]);

    for workers in [1, 3] {
        let config = SearchConfig::for_testing(99)
            .with_iterations(300)
            .with_workers(workers);
        let first = Engine::new(config.clone())
            .best_move(&position, &knowledge)
            .unwrap();
        let second = Engine::new(config).best_move(&position, &knowledge).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn search_statistics_are_consistent() {
    let table = TableConfig::default();
    let position = Position::deal_with_seed(table, PlayerId(0), 31);
    let knowledge = KnowledgeModel::new(table, PlayerId(0), position.hand(PlayerId(0)), &[]);
    let config = SearchConfig::for_testing(5).with_workers(2);
    let mut engine = Engine::new(config);

    let decision = engine.best_move(&position, &knowledge).unwrap();
    let evaluation = &decision.evaluation;
    assert!(position.validate_move(&decision.mv).is_ok());
    assert_eq!(evaluation.iterations, 400);
    let visits: u32 = evaluation.details.iter().map(|detail| detail.visits).sum();
    assert_eq!(visits as usize, evaluation.iterations - evaluation.skipped);
    assert!(
        evaluation
            .details
            .windows(2)
            .all(|pair| pair[0].visits >= pair[1].visits)
    );
    assert!(find_move(evaluation, &decision.mv).is_some());
    assert!((0.0..=1.0).contains(&evaluation.score));
}

#[test]
fn trailing_badly_never_passes() {
    let mut position = position(&["3 4 5 6 7 8 9 X J Q", "K K A", "3 5 7"], 18);
    position.set_round(
        RoundDescriptor::response(1, Some(Rank::Five), PlayerId(2)),
        PlayerId(0),
    );
    let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
    for seed in [1, 2, 3] {
        let mut engine = Engine::new(SearchConfig::for_testing(seed));
        let decision = engine.best_move(&position, &knowledge).unwrap();
        assert!(!decision.mv.is_pass(), "seed {seed} passed");
    }
}

#[test]
fn analysis_agrees_with_search_when_everything_is_visible() {
    let position = position(&["0 0 K K K K", "3 4 5 6 7 8 9"], 18);
    let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
    let mut config = SearchConfig::for_testing(17).with_iterations(600);
    config.full_information = true;
    config.analysis_samples = 300;
    let mut engine = Engine::new(config);

    let decision = engine.best_move(&position, &knowledge).unwrap();
    assert!(!decision.evaluation.forced);
    let analysis = engine
        .analyze_move(&position, &knowledge, &decision.mv)
        .unwrap();
    assert_eq!(analysis.visits, 300);
    assert!((analysis.win_rate - decision.evaluation.score).abs() < 0.05);
}

#[test]
fn finished_games_are_rejected() {
    let mut position = position(&["9", "3 4"], 18);
    let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
    let mut engine = Engine::new(SearchConfig::for_testing(1));
    let win = engine.best_move(&position, &knowledge).unwrap();
    position.apply_move(&win.mv).unwrap();
    assert!(position.is_terminal());
    assert!(matches!(
        engine.best_move(&position, &knowledge),
        Err(EngineError::GameOver)
    ));
}
