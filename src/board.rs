//! Thin wrapper around shakmaty: position, move validation and SAN history.
//!
//! Everything chess-rules related lives behind this type. The rest of the
//! crate never touches squares, legality or notation directly.

use std::str::FromStr;

use anyhow::Result;
use rand::{Rng, rngs::StdRng};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Role, Square, fen::Fen,
    san::San, uci::UciMove,
};
use thiserror::Error;

/// Rejection reasons for a move request. No variant mutates any state.
#[derive(Debug, Error)]
pub enum InvalidMove {
    #[error("it is not your turn")]
    NotYourTurn,

    #[error("the game is already over")]
    GameOver,

    #[error("no piece of yours on {0}")]
    NotYourPiece(Square),

    #[error("illegal move {from}{to}")]
    Illegal { from: Square, to: Square },

    #[error("unusable move token '{0}'")]
    BadToken(String),
}

/// A committed move and everything derived from it at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Option<Square>,
    pub to: Square,
    pub promotion: Option<Role>,
    pub piece: Role,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_castle: bool,
    pub san: String,
}

/// The live rules object: one per game, replaced wholesale on reset.
pub struct RulesBoard {
    pos: Chess,
    history: Vec<String>,
}

impl RulesBoard {
    pub fn new() -> RulesBoard {
        RulesBoard {
            pos: Chess::new(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<RulesBoard> {
        let pos = Fen::from_str(fen)?.into_position(CastlingMode::Standard)?;
        Ok(RulesBoard {
            pos,
            history: Vec::new(),
        })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    /// Checkmate, stalemate or insufficient material.
    pub fn is_terminal(&self) -> bool {
        self.pos.is_game_over()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pos.board().piece_at(square)
    }

    /// SAN lines of every committed move since the start of the game.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn ply(&self) -> u32 {
        self.history.len() as u32
    }

    /// Destination squares of every legal move starting on `from`.
    /// Castling is reported as the king's two-step destination.
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .pos
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .map(|m| destination(*m))
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Validate and apply a coordinate move. Fails without mutating.
    pub fn apply(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<MoveRecord, InvalidMove> {
        let uci = UciMove::Normal {
            from,
            to,
            promotion,
        };
        let m = uci
            .to_move(&self.pos)
            .map_err(|_| InvalidMove::Illegal { from, to })?;
        Ok(self.apply_move(m))
    }

    /// Same as [`apply`](Self::apply), but from a compact move token such as
    /// an engine would emit ("e7e5", "e7e8q").
    pub fn apply_token(&mut self, token: &str) -> Result<MoveRecord, InvalidMove> {
        let uci = UciMove::from_str(token.trim())
            .map_err(|_| InvalidMove::BadToken(token.to_string()))?;
        let m = uci
            .to_move(&self.pos)
            .map_err(|_| InvalidMove::BadToken(token.to_string()))?;
        Ok(self.apply_move(m))
    }

    /// Uniformly random legal move, used when the opponent source has nothing
    /// usable to offer. None only in a terminal position.
    pub fn random_legal(&mut self, rng: &mut StdRng) -> Option<MoveRecord> {
        let legals = self.pos.legal_moves();
        if legals.is_empty() {
            return None;
        }
        let pick = rng.random_range(0..legals.len());
        let m = *legals.get(pick)?;
        Some(self.apply_move(m))
    }

    fn apply_move(&mut self, m: Move) -> MoveRecord {
        // SAN depends on the position before the move, check suffix on the one after
        let san = San::from_move(&self.pos, m).to_string();
        let record = MoveRecord {
            from: m.from(),
            to: destination(m),
            promotion: m.promotion(),
            piece: m.role(),
            is_capture: m.is_capture(),
            is_check: false,
            is_castle: matches!(m, Move::Castle { .. }),
            san,
        };

        self.pos.play_unchecked(m);

        let is_check = self.pos.is_check();
        let suffix = if self.pos.is_checkmate() {
            "#"
        } else if is_check {
            "+"
        } else {
            ""
        };
        let record = MoveRecord {
            is_check,
            san: format!("{}{}", record.san, suffix),
            ..record
        };
        self.history.push(record.san.clone());
        record
    }
}

impl Default for RulesBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Castling moves are encoded king-takes-rook internally; report the square
/// the king actually lands on.
fn destination(m: Move) -> Square {
    match m.to_uci(CastlingMode::Standard) {
        UciMove::Normal { to, .. } => to,
        _ => m.to(),
    }
}
