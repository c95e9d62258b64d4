//! Gameplay missions: one-shot goals keyed to attributes of a single
//! committed move, plus the xp/level bookkeeping they feed.

use shakmaty::{Role, Square};

use crate::board::MoveRecord;

pub const CENTER_SQUARES: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Level thresholds in xp. Level = number of thresholds reached.
const LEVEL_THRESHOLDS: [u32; 5] = [0, 50, 120, 250, 500];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionCondition {
    ControlsCenterSquare,
    MovesPieceOfType(Role),
    Castles,
}

#[derive(Debug, Clone)]
pub struct Mission {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u32,
    pub condition: MissionCondition,
    pub completed: bool,
}

fn templates() -> Vec<Mission> {
    vec![
        Mission {
            id: "m1",
            title: "Claim the Center",
            description: "Land a piece or pawn on one of the four center squares.",
            xp_reward: 20,
            condition: MissionCondition::ControlsCenterSquare,
            completed: false,
        },
        Mission {
            id: "m2",
            title: "Knight Shift",
            description: "Develop a knight.",
            xp_reward: 30,
            condition: MissionCondition::MovesPieceOfType(Role::Knight),
            completed: false,
        },
        Mission {
            id: "m3",
            title: "Safe House",
            description: "Castle your king.",
            xp_reward: 50,
            condition: MissionCondition::Castles,
            completed: false,
        },
    ]
}

/// What a single committed move earned.
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub xp_delta: u32,
    pub completed: Vec<Mission>,
}

/// Evaluates the mission list against human moves. Completion is monotonic,
/// missions never reopen except through [`reset`](MissionTracker::reset).
pub struct MissionTracker {
    missions: Vec<Mission>,
}

impl MissionTracker {
    pub fn new() -> MissionTracker {
        MissionTracker {
            missions: templates(),
        }
    }

    pub fn reset(&mut self) {
        self.missions = templates();
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    /// Evaluate every still-open mission against the most recent move only.
    /// Several missions may complete on the same move.
    pub fn on_move_committed(&mut self, record: &MoveRecord) -> MissionOutcome {
        let mut xp_delta = 0;
        let mut completed = Vec::new();
        for mission in self.missions.iter_mut().filter(|m| !m.completed) {
            if condition_met(mission.condition, record) {
                mission.completed = true;
                xp_delta += mission.xp_reward;
                completed.push(mission.clone());
            }
        }
        MissionOutcome {
            xp_delta,
            completed,
        }
    }
}

impl Default for MissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn condition_met(condition: MissionCondition, record: &MoveRecord) -> bool {
    match condition {
        MissionCondition::ControlsCenterSquare => CENTER_SQUARES.contains(&record.to),
        MissionCondition::MovesPieceOfType(role) => record.piece == role,
        MissionCondition::Castles => record.is_castle,
    }
}

/// Process-wide learner progress. Owned by the UI layer, reset with the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    pub level: u32,
    pub xp: u32,
    pub streak: u32,
    pub tickets_closed: u32,
}

impl Default for ProgressStats {
    fn default() -> Self {
        ProgressStats {
            level: level_for_xp(0),
            xp: 0,
            streak: 0,
            tickets_closed: 0,
        }
    }
}

impl ProgressStats {
    /// Fold one move's mission outcome in. The streak counts consecutive
    /// human moves that completed at least one mission.
    pub fn record_outcome(&mut self, outcome: &MissionOutcome) {
        if outcome.completed.is_empty() {
            self.streak = 0;
        } else {
            self.xp += outcome.xp_delta;
            self.streak += 1;
            self.tickets_closed += outcome.completed.len() as u32;
        }
        self.level = level_for_xp(self.xp);
    }
}

pub fn level_for_xp(xp: u32) -> u32 {
    LEVEL_THRESHOLDS.iter().filter(|t| **t <= xp).count() as u32
}
