//! FEN records and board-field transforms.

use std::fmt;
use std::str::FromStr;

use boardshot_core::Piece;
use serde::{Deserialize, Serialize};

use crate::{ActiveColor, CastlingRights, FenError, GameState, Perspective, Position};

type Rank = [Option<char>; 8];

/// Expand a board field into 8 ranks of optional piece letters.
pub(crate) fn split_board_field(field: &str, sep: char) -> Result<Vec<Rank>, FenError> {
    let ranks: Vec<&str> = field.split(sep).collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidRankCount { found: ranks.len() });
    }
    ranks
        .iter()
        .enumerate()
        .map(|(i, rank)| expand_rank(rank, i + 1))
        .collect()
}

fn expand_rank(rank: &str, number: usize) -> Result<Rank, FenError> {
    let mut out = [None; 8];
    let mut squares = 0usize;
    for c in rank.chars() {
        match c {
            '1'..='8' => squares += c as usize - '0' as usize,
            _ => {
                if Piece::from_fen_char(c).is_none() {
                    return Err(FenError::InvalidSymbol { symbol: c });
                }
                if squares < 8 {
                    out[squares] = Some(c);
                }
                squares += 1;
            }
        }
    }
    if squares != 8 {
        return Err(FenError::InvalidRank { rank: number, squares });
    }
    Ok(out)
}

/// Run-length encode one rank.
pub(crate) fn compress_rank(cells: impl IntoIterator<Item = Option<char>>) -> String {
    let mut out = String::with_capacity(8);
    let mut gap = 0u8;
    for cell in cells {
        match cell {
            None => gap += 1,
            Some(c) => {
                if gap > 0 {
                    out.push(char::from(b'0' + gap));
                    gap = 0;
                }
                out.push(c);
            }
        }
    }
    if gap > 0 {
        out.push(char::from(b'0' + gap));
    }
    out
}

/// Turn a board field by 180°: reverse the rank order and the files within
/// each rank, then re-encode. Applying it twice returns the input field in
/// canonical run-length form.
pub fn flip_board_field(field: &str) -> Result<String, FenError> {
    let ranks = split_board_field(field, '/')?;
    Ok(ranks
        .iter()
        .rev()
        .map(|rank| compress_rank(rank.iter().rev().copied()))
        .collect::<Vec<_>>()
        .join("/"))
}

/// A six-field FEN record. `board` is always seen from White's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenRecord {
    pub board: String,
    pub active_color: ActiveColor,
    pub castling: CastlingRights,
    pub en_passant: String,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl FenRecord {
    /// Encode an image-oriented position with the caller's overrides.
    ///
    /// En passant, halfmove clock and fullmove number cannot be read off a
    /// single image and are fixed at `-`, `0` and `1`.
    pub fn new(position: &Position, state: &GameState) -> Self {
        let oriented = match state.perspective {
            Perspective::WhiteBottom => *position,
            Perspective::BlackBottom => position.rotated(),
        };
        Self {
            board: oriented.board_field(),
            active_color: state.active_color,
            castling: state.castling,
            en_passant: "-".to_owned(),
            halfmove: 0,
            fullmove: 1,
        }
    }

    /// The standard space-separated six-field string.
    pub fn standard(&self) -> String {
        self.to_string()
    }

    /// Board field only, ranks separated by `-`.
    pub fn simplified(&self) -> String {
        self.board.replace('/', "-")
    }

    pub fn position(&self) -> Result<Position, FenError> {
        Position::from_board_field(&self.board)
    }
}

impl fmt::Display for FenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.board, self.active_color, self.castling, self.en_passant, self.halfmove, self.fullmove
        )
    }
}

impl FromStr for FenRecord {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::InvalidFieldCount { found: fields.len() });
        }
        let invalid = |field: &'static str, value: &str| FenError::InvalidField {
            field,
            value: value.to_owned(),
        };
        // Validates the board field.
        split_board_field(fields[0], '/')?;
        let en_passant = fields[3];
        let ep_ok = en_passant == "-"
            || matches!(en_passant.as_bytes(), [f, r] if (b'a'..=b'h').contains(f) && (*r == b'3' || *r == b'6'));
        if !ep_ok {
            return Err(invalid("en passant", en_passant));
        }
        Ok(Self {
            board: fields[0].to_owned(),
            active_color: fields[1].parse()?,
            castling: fields[2].parse()?,
            en_passant: en_passant.to_owned(),
            halfmove: fields[4].parse().map_err(|_| invalid("halfmove", fields[4]))?,
            fullmove: fields[5].parse().map_err(|_| invalid("fullmove", fields[5]))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn starting_position_record() {
        let rec = FenRecord::new(&Position::starting(), &GameState::default());
        assert_eq!(rec.standard(), START_FEN);
        assert_eq!(rec.simplified(), "rnbqkbnr-pppppppp-8-8-8-8-PPPPPPPP-RNBQKBNR");
    }

    #[test]
    fn black_bottom_screenshot_is_rotated() {
        // Black at the bottom of the screen: the image grid is the start
        // position turned around.
        let seen = Position::starting().rotated();
        let state = GameState {
            perspective: Perspective::BlackBottom,
            ..GameState::default()
        };
        assert_eq!(FenRecord::new(&seen, &state).standard(), START_FEN);
    }

    #[test]
    fn flip_matches_rotation() {
        let pos: Position = "r3k2r/pp1n1ppp/2p5/3Pp3/1b6/2N2N2/PPP2PPP/R3KB1R".parse().unwrap();
        assert_eq!(
            flip_board_field(&pos.board_field()).unwrap(),
            pos.rotated().board_field()
        );
    }

    #[test]
    fn flip_canonicalises_split_runs() {
        // "44" is two runs of four; the flip re-encodes it as one run.
        assert_eq!(
            flip_board_field("44/8/8/8/8/8/8/8").unwrap(),
            "8/8/8/8/8/8/8/8"
        );
    }

    #[test]
    fn malformed_board_fields() {
        assert_eq!(
            flip_board_field("8/8/8"),
            Err(FenError::InvalidRankCount { found: 3 })
        );
        assert_eq!(
            flip_board_field("8/8/8/8/8/8/8/7"),
            Err(FenError::InvalidRank { rank: 8, squares: 7 })
        );
        assert_eq!(
            flip_board_field("8/8/8/8/8/8/8/x7"),
            Err(FenError::InvalidSymbol { symbol: 'x' })
        );
        assert_eq!(
            flip_board_field("9/8/8/8/8/8/8/8"),
            Err(FenError::InvalidSymbol { symbol: '9' })
        );
    }

    #[test]
    fn parse_round_trip() {
        let rec: FenRecord = START_FEN.parse().unwrap();
        assert_eq!(rec.to_string(), START_FEN);
        let rec: FenRecord = "8/8/8/3pP3/8/8/8/8 b - d6 12 40".parse().unwrap();
        assert_eq!(rec.active_color, ActiveColor::Black);
        assert_eq!(rec.castling, CastlingRights::none());
        assert_eq!(rec.en_passant, "d6");
        assert_eq!(rec.fullmove, 40);
    }

    #[test]
    fn parse_rejects_bad_fields() {
        assert!(matches!(
            "8/8/8/8/8/8/8/8 w".parse::<FenRecord>(),
            Err(FenError::InvalidFieldCount { found: 2 })
        ));
        assert!(matches!(
            "8/8/8/8/8/8/8/8 x - - 0 1".parse::<FenRecord>(),
            Err(FenError::InvalidField { field: "active color", .. })
        ));
        assert!(matches!(
            "8/8/8/8/8/8/8/8 w - e4 0 1".parse::<FenRecord>(),
            Err(FenError::InvalidField { field: "en passant", .. })
        ));
    }
}
