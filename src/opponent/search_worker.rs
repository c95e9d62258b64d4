//! Local opponent: a persistent worker task spoken to over line-oriented
//! request/response messages, one exchange per ply.
//!
//! Protocol: `go fen <FEN> depth <d>` -> `bestmove <uci>` or `bestmove (none)`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use shakmaty::{CastlingMode, Chess, Move, Position, fen::Fen};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::{Difficulty, OpponentReply, OpponentSource, openings};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

const MATE_EVAL: i32 = 100_000;

pub struct SearchWorker {
    request_tx: mpsc::Sender<String>,
    reply_rx: mpsc::Receiver<String>,
}

impl SearchWorker {
    /// One worker per game session. The coordinator guarantees a single
    /// request in flight, so replies correlate with requests by order.
    pub fn spawn() -> SearchWorker {
        let (request_tx, mut request_rx) = mpsc::channel::<String>(4);
        let (reply_tx, reply_rx) = mpsc::channel::<String>(4);

        tokio::spawn(async move {
            while let Some(line) = request_rx.recv().await {
                let reply = respond(&line);
                if reply_tx.send(reply).await.is_err() {
                    break;
                }
            }
            debug!("search worker shutting down");
        });

        SearchWorker {
            request_tx,
            reply_rx,
        }
    }
}

#[async_trait]
impl OpponentSource for SearchWorker {
    async fn request_move(
        &mut self,
        fen: &str,
        _played: &[String],
        difficulty: Difficulty,
    ) -> OpponentReply {
        // book first, the worker only searches once theory runs out
        if let Some(entry) = openings::lookup(fen) {
            debug!("book hit: {}", entry.name);
            return OpponentReply {
                move_token: entry.reply.to_string(),
                commentary: None,
                opening_name: Some(entry.name.to_string()),
            };
        }

        // a reply from an earlier exchange that timed out may still be
        // queued; drop it so replies keep correlating with requests
        while self.reply_rx.try_recv().is_ok() {}

        let request = format!("go fen {fen} depth {}", difficulty.depth());
        if self.request_tx.send(request).await.is_err() {
            warn!("search worker is gone");
            return OpponentReply::none();
        }

        let line = match timeout(REPLY_TIMEOUT, self.reply_rx.recv()).await {
            Ok(Some(line)) => line,
            _ => {
                warn!("search worker reply timed out");
                return OpponentReply::none();
            }
        };

        match line.strip_prefix("bestmove ") {
            Some(token) if token != "(none)" => OpponentReply {
                move_token: token.to_string(),
                ..Default::default()
            },
            _ => OpponentReply::none(),
        }
    }
}

fn respond(line: &str) -> String {
    match best_move_for(line) {
        Some(uci) => format!("bestmove {uci}"),
        None => "bestmove (none)".to_string(),
    }
}

fn best_move_for(line: &str) -> Option<String> {
    let rest = line.strip_prefix("go fen ")?;
    let (fen_str, depth_str) = rest.rsplit_once(" depth ")?;
    let depth: u8 = depth_str.trim().parse().ok()?;
    let pos: Chess = Fen::from_str(fen_str)
        .ok()?
        .into_position(CastlingMode::Standard)
        .ok()?;
    pick_move(&pos, depth).map(|m| m.to_uci(CastlingMode::Standard).to_string())
}

/// Material-only negamax, random choice among equally good moves.
fn pick_move(pos: &Chess, depth: u8) -> Option<Move> {
    let legals = pos.legal_moves();
    if legals.is_empty() {
        return None;
    }

    let mut best: Vec<Move> = Vec::new();
    let mut best_eval = i32::MIN;
    for m in &legals {
        let mut child = pos.clone();
        child.play_unchecked(*m);
        let eval = -negamax(&child, depth.saturating_sub(1));
        if eval > best_eval {
            best_eval = eval;
            best.clear();
            best.push(*m);
        } else if eval == best_eval {
            best.push(*m);
        }
    }

    let pick = rand::rng().random_range(0..best.len());
    best.get(pick).copied()
}

fn negamax(pos: &Chess, depth: u8) -> i32 {
    if pos.is_checkmate() {
        return -MATE_EVAL;
    }
    if pos.is_stalemate() || pos.is_insufficient_material() {
        return 0;
    }
    if depth == 0 {
        return material(pos);
    }

    pos.legal_moves()
        .iter()
        .map(|m| {
            let mut child = pos.clone();
            child.play_unchecked(*m);
            -negamax(&child, depth - 1)
        })
        .max()
        .unwrap_or(0)
}

/// Material balance from the perspective of the side to move.
fn material(pos: &Chess) -> i32 {
    let side = pos.turn();
    pos.board()
        .iter()
        .map(|(_, piece)| {
            let value = piece_value(piece.role);
            if piece.color == side { value } else { -value }
        })
        .sum()
}

fn piece_value(role: shakmaty::Role) -> i32 {
    match role {
        shakmaty::Role::Pawn => 100,
        shakmaty::Role::Knight => 300,
        shakmaty::Role::Bishop => 320,
        shakmaty::Role::Rook => 500,
        shakmaty::Role::Queen => 900,
        shakmaty::Role::King => 0,
    }
}
