use std::sync::Arc;

use xqpuzzles_core::{Board, Dialect, GameStatus, MoveGenerator, XiangqiRules};

#[test]
fn legal_moves_match_perft_in_both_dialects() {
    for dialect in [Dialect::Uci, Dialect::Ucci] {
        let board = Board::new(dialect);
        let first = board.legal_moves().unwrap();
        assert_eq!(first.len(), 44);

        let total: usize = first
            .iter()
            .map(|mv| {
                let mut next = board.copy();
                next.push(&[mv.as_str()], dialect).unwrap();
                next.legal_moves().unwrap().len()
            })
            .sum();
        assert_eq!(total, 1_920);
    }
}

#[test]
fn replaying_the_stack_from_root_reproduces_fen() {
    let rules: Arc<dyn MoveGenerator> = Arc::new(XiangqiRules::new());
    let mut board = Board::with_generator(rules.clone(), Dialect::Ucci);
    board
        .push(&["h2e2", "h9g7", "h0g2", "i9h9", "i0h0", "b9c7"], Dialect::Ucci)
        .unwrap();

    let mut replay = Board::from_fen(rules, board.root_fen(), Dialect::Ucci).unwrap();
    replay.push(&board.stack(), Dialect::Ucci).unwrap();
    assert_eq!(replay.fen(), board.fen());
    assert_eq!(replay.game_status().unwrap(), None::<GameStatus>);
}
