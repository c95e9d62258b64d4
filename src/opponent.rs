pub mod cloud;
pub mod openings;
pub mod search_worker;

use std::env;

use async_trait::async_trait;
use log::info;

use cloud::CloudOpponent;
use search_worker::SearchWorker;

/// What an opponent source hands back for one move request. An empty
/// `move_token` means "no answer" and triggers the coordinator's fallback.
#[derive(Debug, Clone, Default)]
pub struct OpponentReply {
    pub move_token: String,
    pub commentary: Option<String>,
    pub opening_name: Option<String>,
}

impl OpponentReply {
    pub fn none() -> OpponentReply {
        OpponentReply::default()
    }

    pub fn is_empty(&self) -> bool {
        self.move_token.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Search depth for the local worker.
    pub fn depth(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_env() -> Difficulty {
        match env::var("CHESS_QUEST_DIFFICULTY")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Ok("easy") => Difficulty::Easy,
            Ok("hard") => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// Pick the opponent realization: hosted if a credential is configured,
/// the local search worker otherwise. Both sit behind the same contract.
pub fn init_opponent() -> Box<dyn OpponentSource> {
    match CloudOpponent::from_env() {
        Some(remote) => {
            info!("hosted opponent configured");
            Box::new(remote)
        }
        None => {
            info!("no API credential found, spawning local search worker");
            Box::new(SearchWorker::spawn())
        }
    }
}

/// A source of opponent moves. Expected failure modes (worker gone, network
/// down, malformed reply) never surface as errors, only as an empty reply.
#[async_trait]
pub trait OpponentSource: Send + Sync {
    async fn request_move(
        &mut self,
        fen: &str,
        played: &[String],
        difficulty: Difficulty,
    ) -> OpponentReply;
}
