//! Tiny opening book, keyed by the position with move counters stripped.

pub struct BookEntry {
    /// First four FEN fields: placement, side to move, castling, en passant.
    pub prefix: &'static str,
    /// Name of the line the book reply steers into.
    pub name: &'static str,
    /// Reply move in coordinate notation.
    pub reply: &'static str,
}

static BOOK: &[BookEntry] = &[
    BookEntry {
        prefix: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -",
        name: "Sicilian Defence",
        reply: "c7c5",
    },
    BookEntry {
        prefix: "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq -",
        name: "Indian Defence",
        reply: "g8f6",
    },
    BookEntry {
        prefix: "rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq -",
        name: "English Opening",
        reply: "e7e5",
    },
    BookEntry {
        prefix: "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq -",
        name: "Réti Opening",
        reply: "d7d5",
    },
    BookEntry {
        prefix: "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq -",
        name: "Open Game",
        reply: "b8c6",
    },
    BookEntry {
        prefix: "rnbqkbnr/ppp1pppp/8/3p4/2PP4/8/PP2PPPP/RNBQKBNR b KQkq -",
        name: "Queen's Gambit Declined",
        reply: "e7e6",
    },
];

/// Match a full FEN against the book, ignoring halfmove/fullmove counters.
pub fn lookup(fen: &str) -> Option<&'static BookEntry> {
    let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
    if fields.len() < 4 {
        return None;
    }
    let prefix = fields.join(" ");
    BOOK.iter().find(|entry| entry.prefix == prefix)
}
