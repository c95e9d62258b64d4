pub mod board;
pub mod commentary;
pub mod coordinator;
pub mod missions;
pub mod opponent;
pub mod util;
