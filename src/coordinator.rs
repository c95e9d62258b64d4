//! Turn orchestration: the single writer over the rules board.
//!
//! Human moves come in synchronously, opponent moves through a split
//! begin/complete handshake so the asynchronous request can run without
//! holding the coordinator. A generation counter plus the ply at issue time
//! tag every outstanding request; replies that no longer match are stale and
//! are dropped without touching any state.

use std::time::Duration;

use log::{info, warn};
use rand::{SeedableRng, rngs::StdRng};
use shakmaty::{Color, Role, Square};
use tokio::time::sleep;

use crate::board::{InvalidMove, MoveRecord, RulesBoard};
use crate::commentary;
use crate::missions::{Mission, MissionTracker, ProgressStats};
use crate::opponent::{Difficulty, OpponentReply, OpponentSource};

/// Artificial minimum thinking time, so an instant engine reply still reads
/// like a considered move. Runs concurrently with the request itself.
pub const MIN_THINK_TIME: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingHuman,
    AwaitingOpponent,
    Terminal,
}

/// Immutable view of the game after the latest commit. Replaced wholesale,
/// never mutated in place.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub fen: String,
    pub side_to_move: Color,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub move_history: Vec<String>,
    pub last_move: Option<MoveRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Human-facing analysis of the learner's own moves.
    Analysis,
    /// System and opponent narration.
    Narration,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub source: LogSource,
    pub text: String,
}

/// Handed out by [`TurnCoordinator::begin_opponent_turn`]; identifies the
/// request so a late reply can be recognized as stale.
pub struct ReplyTicket {
    generation: u64,
    ply: u32,
    pub fen: String,
    pub played: Vec<String>,
}

pub struct TurnCoordinator {
    board: RulesBoard,
    state: TurnState,
    snapshot: GameSnapshot,
    generation: u64,
    request_in_flight: bool,
    rng: StdRng,
    tracker: MissionTracker,
    stats: ProgressStats,
    log: Vec<LogEntry>,
    human: Color,
    difficulty: Difficulty,
}

impl TurnCoordinator {
    pub fn new(difficulty: Difficulty) -> TurnCoordinator {
        Self::with_rng(difficulty, StdRng::from_os_rng())
    }

    /// Deterministic fallback selection for tests.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> TurnCoordinator {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(difficulty: Difficulty, rng: StdRng) -> TurnCoordinator {
        let board = RulesBoard::new();
        let snapshot = initial_snapshot(&board);
        TurnCoordinator {
            board,
            state: TurnState::AwaitingHuman,
            snapshot,
            generation: 0,
            request_in_flight: false,
            rng,
            tracker: MissionTracker::new(),
            stats: ProgressStats::default(),
            log: Vec::new(),
            human: Color::White,
            difficulty,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    pub fn missions(&self) -> &[Mission] {
        self.tracker.missions()
    }

    pub fn stats(&self) -> &ProgressStats {
        &self.stats
    }

    /// Append-only commentary feed.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Validate and commit a human move. Rejections leave every piece of
    /// state exactly as it was.
    pub fn submit_human_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<MoveRecord, InvalidMove> {
        match self.state {
            TurnState::Terminal => return Err(InvalidMove::GameOver),
            TurnState::AwaitingOpponent => return Err(InvalidMove::NotYourTurn),
            TurnState::AwaitingHuman => {}
        }
        match self.board.piece_at(from) {
            Some(piece) if piece.color == self.human => {}
            _ => return Err(InvalidMove::NotYourPiece(from)),
        }

        let record = self.board.apply(from, to, promotion)?;
        info!("human played {}", record.san);

        let outcome = self.tracker.on_move_committed(&record);
        self.stats.record_outcome(&outcome);
        for mission in &outcome.completed {
            info!("mission complete: {} (+{} xp)", mission.title, mission.xp_reward);
            self.push_log(
                LogSource::Narration,
                format!("Mission complete: {} (+{} xp)", mission.title, mission.xp_reward),
            );
        }
        let line = commentary::describe(&record, None);
        self.push_log(LogSource::Analysis, line);

        self.commit(record.clone());
        Ok(record)
    }

    /// Legal destinations for the human's piece on `from`. Empty outside
    /// `AwaitingHuman` and for empty or opponent-owned squares.
    pub fn request_legal_targets(&self, from: Square) -> Vec<Square> {
        if self.state != TurnState::AwaitingHuman {
            return Vec::new();
        }
        match self.board.piece_at(from) {
            Some(piece) if piece.color == self.human => self.board.legal_targets(from),
            _ => Vec::new(),
        }
    }

    /// Claim the pending opponent ply. None when it is not the opponent's
    /// turn or a request is already outstanding (reentrancy guard).
    pub fn begin_opponent_turn(&mut self) -> Option<ReplyTicket> {
        if self.state != TurnState::AwaitingOpponent || self.request_in_flight {
            return None;
        }
        self.request_in_flight = true;
        Some(ReplyTicket {
            generation: self.generation,
            ply: self.board.ply(),
            fen: self.board.fen(),
            played: self.board.history().to_vec(),
        })
    }

    /// Apply the opponent's reply. Stale tickets (reset or advanced ply since
    /// issue) are discarded silently. An empty, unparseable or illegal token
    /// falls back to a uniformly random legal move, so the game always makes
    /// progress no matter how the opponent source is doing.
    pub fn complete_opponent_turn(
        &mut self,
        ticket: ReplyTicket,
        reply: OpponentReply,
    ) -> Option<MoveRecord> {
        if ticket.generation != self.generation || ticket.ply != self.board.ply() {
            return None;
        }
        self.request_in_flight = false;

        let record = if reply.is_empty() {
            None
        } else {
            self.board.apply_token(&reply.move_token).ok()
        };
        let record = match record {
            Some(record) => record,
            None => {
                warn!(
                    "opponent source had no usable move ({:?}), falling back to a random legal move",
                    reply.move_token
                );
                self.push_log(LogSource::Narration, commentary::engine_silent().to_string());
                // never None here, AwaitingOpponent implies a non-terminal position
                self.board.random_legal(&mut self.rng)?
            }
        };
        info!("opponent played {}", record.san);

        let line = commentary::describe(&record, reply.opening_name.as_deref());
        self.push_log(LogSource::Narration, line);
        if let Some(commentary) = reply.commentary {
            self.push_log(LogSource::Narration, commentary);
        }

        self.commit(record.clone());
        Some(record)
    }

    /// Back to the starting position: fresh board, missions and stats. Any
    /// outstanding opponent request is orphaned and its reply will be
    /// recognized as stale. Idempotent, always succeeds.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.request_in_flight = false;
        self.board = RulesBoard::new();
        self.snapshot = initial_snapshot(&self.board);
        self.tracker.reset();
        self.stats = ProgressStats::default();
        self.state = TurnState::AwaitingHuman;
        info!("game reset");
    }

    fn commit(&mut self, record: MoveRecord) {
        self.snapshot = GameSnapshot {
            fen: self.board.fen(),
            side_to_move: self.board.turn(),
            is_check: self.board.is_check(),
            is_checkmate: self.board.is_checkmate(),
            move_history: self.board.history().to_vec(),
            last_move: Some(record),
        };
        self.state = if self.board.is_terminal() {
            TurnState::Terminal
        } else if self.board.turn() == self.human {
            TurnState::AwaitingHuman
        } else {
            TurnState::AwaitingOpponent
        };
    }

    fn push_log(&mut self, source: LogSource, text: String) {
        self.log.push(LogEntry { source, text });
    }
}

fn initial_snapshot(board: &RulesBoard) -> GameSnapshot {
    GameSnapshot {
        fen: board.fen(),
        side_to_move: board.turn(),
        is_check: false,
        is_checkmate: false,
        move_history: Vec::new(),
        last_move: None,
    }
}

/// Drive one full opponent ply: issue the request and the pacing delay
/// concurrently, wait for both, then apply whichever reply came back.
pub async fn play_opponent_turn<S>(
    coordinator: &mut TurnCoordinator,
    source: &mut S,
) -> Option<MoveRecord>
where
    S: OpponentSource + ?Sized,
{
    let ticket = coordinator.begin_opponent_turn()?;
    let difficulty = coordinator.difficulty();
    let (reply, _) = tokio::join!(
        source.request_move(&ticket.fen, &ticket.played, difficulty),
        sleep(MIN_THINK_TIME),
    );
    coordinator.complete_opponent_turn(ticket, reply)
}
