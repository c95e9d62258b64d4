//! Short status lines derived from a committed move.

use rand::Rng;

use crate::board::MoveRecord;

const OPENING_LEADS: [&str; 3] = [
    "Right out of the book:",
    "Known theory so far:",
    "A classic line:",
];

const CHECK_PHRASES: [&str; 3] = [
    "Check! The king is under fire.",
    "Check, and the reply is forced.",
    "The king is rattled. Check!",
];

const CAPTURE_PHRASES: [&str; 3] = [
    "Material changes hands.",
    "A capture sharpens the position.",
    "Something had to give; a piece comes off the board.",
];

const CASTLE_PHRASES: [&str; 2] = [
    "The king tucks away safely.",
    "Castled, and the rook joins the game.",
];

const QUIET_PHRASES: [&str; 3] = [
    "A quiet developing move.",
    "Keeping the tension.",
    "Solid, flexible play.",
];

const ENGINE_SILENT: &str = "The opponent falls silent; a move is improvised.";

/// One line about a committed move. Opening beats check beats capture beats
/// castle; phrasing within a category is picked at random.
pub fn describe(record: &MoveRecord, opening: Option<&str>) -> String {
    if let Some(name) = opening {
        return format!("{} {}.", pick(&OPENING_LEADS), name);
    }
    if record.is_check {
        return format!("{} {}", record.san, pick(&CHECK_PHRASES));
    }
    if record.is_capture {
        return format!("{} {}", record.san, pick(&CAPTURE_PHRASES));
    }
    if record.is_castle {
        return format!("{} {}", record.san, pick(&CASTLE_PHRASES));
    }
    format!("{} {}", record.san, pick(&QUIET_PHRASES))
}

/// Fallback line when the opponent source had nothing usable to say.
pub fn engine_silent() -> &'static str {
    ENGINE_SILENT
}

fn pick<'a>(set: &[&'a str]) -> &'a str {
    set[rand::rng().random_range(0..set.len())]
}
