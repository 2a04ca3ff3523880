//! Exhaustive checks over every reachable tic-tac-toe game.

use duel_tictactoe::{BOARD_SIZE, Board, Cell, Mark, Outcome, PlaceError, rules};

#[derive(Default)]
struct Tally {
    games: usize,
    x_wins: usize,
    o_wins: usize,
    draws: usize,
}

/// Walks every legal game from `board`, asserting invariants at each step.
fn explore(board: &Board, to_move: Mark, tally: &mut Tally) {
    if let Some(outcome) = board.outcome() {
        tally.games += 1;
        match outcome {
            Outcome::Won(Mark::X) => tally.x_wins += 1,
            Outcome::Won(Mark::O) => tally.o_wins += 1,
            Outcome::Draw => tally.draws += 1,
        }
        return;
    }

    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let mut next = board.clone();
            match board.cell(row, col) {
                Some(Cell::Empty) => {
                    next.place_mark(row, col, to_move).unwrap();
                    // Previously marked cells are untouched.
                    for r in 0..BOARD_SIZE {
                        for c in 0..BOARD_SIZE {
                            if let Some(Cell::Marked(m)) = board.cell(r, c) {
                                assert_eq!(next.cell(r, c), Some(Cell::Marked(m)));
                            }
                        }
                    }
                    assert_eq!(next.marked_count(), board.marked_count() + 1);
                    explore(&next, to_move.opponent(), tally);
                }
                Some(Cell::Marked(_)) => {
                    assert_eq!(
                        next.place_mark(row, col, to_move),
                        Err(PlaceError::AlreadyOccupied { row, col })
                    );
                    assert_eq!(&next, board);
                }
                None => unreachable!("in-range cell"),
            }
        }
    }
}

#[test]
fn test_full_game_tree_counts() {
    let mut tally = Tally::default();
    explore(&Board::new(), Mark::X, &mut tally);

    // Well-known totals for tic-tac-toe played to completion.
    assert_eq!(tally.games, 255_168);
    assert_eq!(tally.x_wins, 131_184);
    assert_eq!(tally.o_wins, 77_904);
    assert_eq!(tally.draws, 46_080);
}

#[test]
fn test_draw_only_when_full_without_line() {
    use Mark::{O, X};
    let layout = [[X, O, X], [X, O, O], [O, X, X]];
    let mut board = Board::new();
    for (row, marks) in layout.iter().enumerate() {
        for (col, mark) in marks.iter().enumerate() {
            assert_eq!(board.outcome(), None);
            board.place_mark(row, col, *mark).unwrap();
        }
    }
    assert!(rules::is_draw(&board));
    assert_eq!(board.outcome(), Some(Outcome::Draw));
}
