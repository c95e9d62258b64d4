use std::str::FromStr;

use anyhow::{Result, bail};
use shakmaty::{Role, Square, uci::UciMove};

/// Parse user input like "e2e4" or "e7e8q" into a square pair and an
/// optional promotion piece.
pub fn parse_coordinate_move(input: &str) -> Result<(Square, Square, Option<Role>)> {
    match UciMove::from_str(input.trim())? {
        UciMove::Normal {
            from,
            to,
            promotion,
        } => Ok((from, to, promotion)),
        other => bail!("expected a from-to move, got '{other}'"),
    }
}

pub fn parse_square(input: &str) -> Result<Square> {
    let square = Square::from_str(input.trim())?;
    Ok(square)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_promotion_moves() {
        let (from, to, promotion) = parse_coordinate_move("e2e4").unwrap();
        assert_eq!((from, to, promotion), (Square::E2, Square::E4, None));

        let (_, _, promotion) = parse_coordinate_move(" e7e8q ").unwrap();
        assert_eq!(promotion, Some(Role::Queen));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_coordinate_move("castles").is_err());
        assert!(parse_coordinate_move("0000").is_err());
        assert!(parse_square("z9").is_err());
    }
}
