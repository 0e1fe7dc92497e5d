use std::fmt::Write;

use chainsweeper_core::{Cell, GameSession, GameStatus, LedgerLink};
use chrono::{DateTime, Utc};

fn glyph(session: &GameSession, cell: &Cell) -> char {
    let state = cell.state();
    let lost = session.status() == GameStatus::Lost;
    if session.detonated() == Some(cell.coords()) {
        'X'
    } else if state.is_flagged() {
        if lost && !cell.is_mine() { 'x' } else { 'F' }
    } else if state.is_open() || (lost && cell.is_mine()) {
        match (cell.is_mine(), cell.adjacent_mines()) {
            (true, _) => '*',
            (false, 0) => '.',
            (false, n) => char::from(b'0' + n),
        }
    } else {
        '#'
    }
}

pub fn status_line(session: &GameSession, now: DateTime<Utc>) -> String {
    let link = match session.ledger().link() {
        LedgerLink::AwaitingGame(handle) => format!("awaiting ledger {}", handle),
        LedgerLink::Linked(game) => format!("ledger game {}", game),
        LedgerLink::Unlinked => "offline".to_owned(),
    };
    let unconfirmed = session.ledger().unconfirmed().count();
    let rejected = session.ledger().rejected().count();
    let mut line = format!(
        "{:?} | mines left {} | moves {} | {}s | {} ({} unconfirmed, {} rejected)",
        session.status(),
        session.mines_left(),
        session.moves_count(),
        session.elapsed_secs(now),
        link,
        unconfirmed,
        rejected,
    );
    if session.status().is_finished() {
        let _ = write!(
            line,
            " | flags correct {}/{}",
            session.board().correct_flag_count(),
            session.flags_placed()
        );
    }
    line
}

pub fn board(session: &GameSession) -> String {
    let board = session.board();
    let mut out = String::from("   ");
    for x in 0..board.width() {
        let _ = write!(out, "{}", x % 10);
    }
    out.push('\n');
    for y in 0..board.height() {
        let _ = write!(out, "{:>2} ", y);
        for x in 0..board.width() {
            out.push(glyph(session, &board[(x, y)]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainsweeper_core::{Difficulty, FixedMineGenerator, LedgerIntent, SessionController};

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn renders_numbers_flags_and_the_detonation() {
        let mines = [
            (0, 0),
            (8, 0),
            (0, 8),
            (8, 8),
            (4, 0),
            (4, 8),
            (0, 4),
            (8, 4),
            (2, 2),
            (6, 6),
        ];
        let mut controller =
            SessionController::new(FixedMineGenerator::new(mines), Vec::<LedgerIntent>::new());
        let mut session = controller.start(Difficulty::Beginner).unwrap();

        controller.reveal(&mut session, (1, 0), t(0)).unwrap();
        controller.toggle_flag(&mut session, (3, 0)).unwrap();
        let rendered = board(&session);
        let top = rendered.lines().nth(1).unwrap();
        assert_eq!(top, " 0 #1#F#####");
        assert!(!status_line(&session, t(1)).contains("flags correct"));

        controller.reveal(&mut session, (0, 0), t(3)).unwrap();
        let rendered = board(&session);
        let top = rendered.lines().nth(1).unwrap();
        assert_eq!(top, " 0 X1#x*###*");
        let status = status_line(&session, t(10));
        assert!(status.starts_with("Lost | mines left 9 | moves 2 | 3s"));
        assert!(status.ends_with(" | flags correct 0/1"));
    }
}
