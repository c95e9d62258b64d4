use async_trait::async_trait;
use chess_quest::board::InvalidMove;
use chess_quest::coordinator::{LogSource, TurnCoordinator, TurnState, play_opponent_turn};
use chess_quest::opponent::{Difficulty, OpponentReply, OpponentSource};
use shakmaty::{Color, Role, Square};

const START_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w";

fn coordinator() -> TurnCoordinator {
    TurnCoordinator::with_seed(Difficulty::Easy, 42)
}

fn reply(token: &str) -> OpponentReply {
    OpponentReply {
        move_token: token.to_string(),
        ..Default::default()
    }
}

/// Drive one opponent ply synchronously with a scripted token.
fn opponent_plays(coordinator: &mut TurnCoordinator, token: &str) {
    let ticket = coordinator.begin_opponent_turn().expect("opponent to move");
    coordinator
        .complete_opponent_turn(ticket, reply(token))
        .expect("scripted reply should commit");
}

fn human_plays(coordinator: &mut TurnCoordinator, from: Square, to: Square) {
    coordinator
        .submit_human_move(from, to, None)
        .expect("scripted human move should be legal");
}

#[test]
fn ply_parity_holds_across_alternating_turns() {
    let mut coordinator = coordinator();
    assert_eq!(coordinator.snapshot().side_to_move, Color::White);

    human_plays(&mut coordinator, Square::E2, Square::E4);
    assert_eq!(coordinator.snapshot().side_to_move, Color::Black);
    assert_eq!(coordinator.snapshot().move_history.len(), 1);

    opponent_plays(&mut coordinator, "e7e5");
    assert_eq!(coordinator.snapshot().side_to_move, Color::White);
    assert_eq!(coordinator.snapshot().move_history.len(), 2);

    human_plays(&mut coordinator, Square::G1, Square::F3);
    opponent_plays(&mut coordinator, "b8c6");
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.side_to_move, Color::White);
    assert_eq!(snapshot.move_history.len(), 4);
    // the snapshot never disagrees with its own history
    assert_eq!(
        snapshot.last_move.as_ref().unwrap().san,
        *snapshot.move_history.last().unwrap()
    );
}

#[test]
fn human_move_rejected_while_opponent_is_thinking() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);
    assert_eq!(coordinator.state(), TurnState::AwaitingOpponent);

    let fen_before = coordinator.snapshot().fen.clone();
    let result = coordinator.submit_human_move(Square::D2, Square::D4, None);
    assert!(matches!(result, Err(InvalidMove::NotYourTurn)));
    assert_eq!(coordinator.snapshot().fen, fen_before);
    assert_eq!(coordinator.snapshot().move_history.len(), 1);
}

#[test]
fn human_move_rejected_after_checkmate() {
    let mut coordinator = coordinator();
    // fool's mate against the human
    human_plays(&mut coordinator, Square::F2, Square::F3);
    opponent_plays(&mut coordinator, "e7e5");
    human_plays(&mut coordinator, Square::G2, Square::G4);
    opponent_plays(&mut coordinator, "d8h4");

    assert_eq!(coordinator.state(), TurnState::Terminal);
    assert!(coordinator.snapshot().is_checkmate);
    let result = coordinator.submit_human_move(Square::A2, Square::A3, None);
    assert!(matches!(result, Err(InvalidMove::GameOver)));
}

#[test]
fn cannot_move_opponent_pieces_or_empty_squares() {
    let mut coordinator = coordinator();
    assert!(matches!(
        coordinator.submit_human_move(Square::E7, Square::E5, None),
        Err(InvalidMove::NotYourPiece(Square::E7))
    ));
    assert!(matches!(
        coordinator.submit_human_move(Square::E4, Square::E5, None),
        Err(InvalidMove::NotYourPiece(Square::E4))
    ));
    assert!(coordinator.snapshot().move_history.is_empty());
}

#[test]
fn empty_reply_falls_back_to_a_random_legal_move() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);

    let ticket = coordinator.begin_opponent_turn().unwrap();
    let record = coordinator
        .complete_opponent_turn(ticket, OpponentReply::none())
        .expect("fallback must still commit a move");

    assert_eq!(coordinator.snapshot().move_history.len(), 2);
    assert_eq!(coordinator.state(), TurnState::AwaitingHuman);
    assert_eq!(record.san, *coordinator.snapshot().move_history.last().unwrap());
    // degraded operation shows up in the narration feed
    assert!(
        coordinator
            .log()
            .iter()
            .any(|entry| entry.source == LogSource::Narration)
    );
}

#[test]
fn illegal_token_falls_back_instead_of_corrupting_state() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);

    // "e2e4" was legal a ply ago but is not a black move now
    let ticket = coordinator.begin_opponent_turn().unwrap();
    let record = coordinator.complete_opponent_turn(ticket, reply("e2e4"));
    assert!(record.is_some());

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.move_history.len(), 2);
    assert_eq!(snapshot.side_to_move, Color::White);
    assert_eq!(coordinator.state(), TurnState::AwaitingHuman);
}

#[test]
fn stale_reply_after_reset_is_discarded() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);
    let ticket = coordinator.begin_opponent_turn().unwrap();

    coordinator.reset();
    let discarded = coordinator.complete_opponent_turn(ticket, reply("e7e5"));

    assert!(discarded.is_none());
    let snapshot = coordinator.snapshot();
    assert!(snapshot.move_history.is_empty());
    assert!(snapshot.fen.starts_with(START_PLACEMENT));
    assert_eq!(coordinator.state(), TurnState::AwaitingHuman);
}

#[test]
fn at_most_one_opponent_request_in_flight() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);

    let ticket = coordinator.begin_opponent_turn().unwrap();
    assert!(coordinator.begin_opponent_turn().is_none());

    coordinator.complete_opponent_turn(ticket, reply("e7e5"));
    // the ply is over, nothing further to claim
    assert!(coordinator.begin_opponent_turn().is_none());
}

#[test]
fn reset_restores_everything_to_defaults() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);
    opponent_plays(&mut coordinator, "e7e5");
    assert!(coordinator.stats().xp > 0);

    coordinator.reset();
    let snapshot = coordinator.snapshot();
    assert!(snapshot.fen.starts_with(START_PLACEMENT));
    assert_eq!(snapshot.side_to_move, Color::White);
    assert!(snapshot.move_history.is_empty());
    assert!(snapshot.last_move.is_none());
    assert!(coordinator.missions().iter().all(|m| !m.completed));
    assert_eq!(coordinator.stats().xp, 0);
    assert_eq!(coordinator.stats().level, 1);

    // idempotent
    coordinator.reset();
    assert_eq!(coordinator.state(), TurnState::AwaitingHuman);
}

#[test]
fn center_mission_completes_on_e4_and_awards_xp() {
    let mut coordinator = coordinator();
    let record = coordinator
        .submit_human_move(Square::E2, Square::E4, None)
        .unwrap();

    assert_eq!(record.to, Square::E4);
    assert_eq!(record.piece, Role::Pawn);
    assert!(!record.is_capture);
    assert!(
        coordinator
            .missions()
            .iter()
            .any(|m| m.id == "m1" && m.completed)
    );
    assert_eq!(coordinator.stats().xp, 20);
    assert_eq!(coordinator.stats().tickets_closed, 1);
    assert_eq!(coordinator.state(), TurnState::AwaitingOpponent);
}

#[test]
fn center_mission_does_not_complete_early_and_never_reopens() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::A2, Square::A3);
    assert!(
        coordinator
            .missions()
            .iter()
            .all(|m| m.id != "m1" || !m.completed)
    );

    opponent_plays(&mut coordinator, "e7e5");
    human_plays(&mut coordinator, Square::D2, Square::D4);
    assert!(
        coordinator
            .missions()
            .iter()
            .any(|m| m.id == "m1" && m.completed)
    );

    // a later quiet move must not reopen it
    opponent_plays(&mut coordinator, "b8c6");
    human_plays(&mut coordinator, Square::H2, Square::H3);
    assert!(
        coordinator
            .missions()
            .iter()
            .any(|m| m.id == "m1" && m.completed)
    );
}

#[test]
fn opponent_moves_never_advance_missions() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::A2, Square::A3);
    // opponent occupies the center; the learner's mission stays open
    opponent_plays(&mut coordinator, "e7e5");
    assert!(
        coordinator
            .missions()
            .iter()
            .all(|m| m.id != "m1" || !m.completed)
    );
    assert_eq!(coordinator.stats().xp, 0);
}

#[test]
fn legal_targets_only_for_own_pieces_on_own_turn() {
    let mut coordinator = coordinator();
    assert_eq!(
        coordinator.request_legal_targets(Square::E2),
        [Square::E3, Square::E4]
    );
    assert!(coordinator.request_legal_targets(Square::E7).is_empty());
    assert!(coordinator.request_legal_targets(Square::E4).is_empty());

    human_plays(&mut coordinator, Square::E2, Square::E4);
    // opponent's turn now, the board is read-only for the human
    assert!(coordinator.request_legal_targets(Square::D2).is_empty());
}

#[test]
fn human_can_deliver_checkmate() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);
    opponent_plays(&mut coordinator, "e7e5");
    human_plays(&mut coordinator, Square::F1, Square::C4);
    opponent_plays(&mut coordinator, "b8c6");
    human_plays(&mut coordinator, Square::D1, Square::H5);
    opponent_plays(&mut coordinator, "g8f6");
    human_plays(&mut coordinator, Square::H5, Square::F7);

    assert_eq!(coordinator.state(), TurnState::Terminal);
    let snapshot = coordinator.snapshot();
    assert!(snapshot.is_checkmate);
    assert_eq!(snapshot.side_to_move, Color::Black);
    assert!(snapshot.move_history.last().unwrap().ends_with('#'));
}

struct Scripted {
    token: &'static str,
    opening: Option<&'static str>,
}

#[async_trait]
impl OpponentSource for Scripted {
    async fn request_move(
        &mut self,
        _fen: &str,
        _played: &[String],
        _difficulty: Difficulty,
    ) -> OpponentReply {
        OpponentReply {
            move_token: self.token.to_string(),
            commentary: None,
            opening_name: self.opening.map(str::to_string),
        }
    }
}

#[tokio::test]
async fn play_opponent_turn_commits_one_reply() {
    let mut coordinator = coordinator();
    human_plays(&mut coordinator, Square::E2, Square::E4);

    let mut source = Scripted {
        token: "c7c5",
        opening: Some("Sicilian Defence"),
    };
    let record = play_opponent_turn(&mut coordinator, &mut source)
        .await
        .expect("opponent ply should commit");

    assert_eq!(record.san, "c5");
    assert_eq!(coordinator.state(), TurnState::AwaitingHuman);
    assert!(
        coordinator
            .log()
            .iter()
            .any(|entry| entry.source == LogSource::Narration
                && entry.text.contains("Sicilian Defence"))
    );

    // no opponent turn pending, the driver is a no-op
    assert!(play_opponent_turn(&mut coordinator, &mut source).await.is_none());
}
