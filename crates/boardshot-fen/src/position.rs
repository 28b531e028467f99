use std::fmt;
use std::str::FromStr;

use boardshot_core::{Piece, PieceColor, PieceKind, SquareClass};
use serde::{Deserialize, Serialize};

use crate::fen::{compress_rank, split_board_field};
use crate::FenError;

/// 8×8 grid of square classes, `[row][col]` as the board appears in the
/// image: row 0 is the top rank on screen, col 0 the leftmost file.
///
/// Serialised as its board field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    squares: [[SquareClass; 8]; 8],
}

impl Position {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The initial position with White at the bottom.
    pub fn starting() -> Self {
        use PieceKind::*;
        const BACK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut squares = [[SquareClass::Empty; 8]; 8];
        for col in 0..8 {
            squares[0][col] = SquareClass::Occupied(Piece::new(PieceColor::Black, BACK[col]));
            squares[1][col] = SquareClass::Occupied(Piece::new(PieceColor::Black, Pawn));
            squares[6][col] = SquareClass::Occupied(Piece::new(PieceColor::White, Pawn));
            squares[7][col] = SquareClass::Occupied(Piece::new(PieceColor::White, BACK[col]));
        }
        Self { squares }
    }

    pub fn from_rows(squares: [[SquareClass; 8]; 8]) -> Self {
        Self { squares }
    }

    /// Fold 64 classes given in row-major order.
    pub fn from_classes<I>(classes: I) -> Result<Self, FenError>
    where
        I: IntoIterator<Item = SquareClass>,
    {
        let mut squares = [[SquareClass::Empty; 8]; 8];
        let mut found = 0;
        for class in classes {
            if found < 64 {
                squares[found / 8][found % 8] = class;
            }
            found += 1;
        }
        if found != 64 {
            return Err(FenError::InvalidSquareCount { found });
        }
        Ok(Self { squares })
    }

    pub fn get(&self, row: usize, col: usize) -> SquareClass {
        self.squares[row][col]
    }

    pub fn rows(&self) -> &[[SquareClass; 8]; 8] {
        &self.squares
    }

    /// Row-major iterator over `(row, col, class)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, SquareClass)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .flat_map(|(r, rank)| rank.iter().enumerate().map(move |(c, &s)| (r, c, s)))
    }

    /// The same board turned by 180°.
    pub fn rotated(&self) -> Self {
        let mut squares = self.squares;
        squares.reverse();
        for rank in &mut squares {
            rank.reverse();
        }
        Self { squares }
    }

    pub fn count(&self, class: SquareClass) -> usize {
        self.iter().filter(|&(_, _, s)| s == class).count()
    }

    /// Board field of the grid exactly as stored (top row first).
    pub fn board_field(&self) -> String {
        self.squares
            .iter()
            .map(|rank| compress_rank(rank.iter().map(|s| s.piece().map(Piece::fen_char))))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn from_board_field(field: &str) -> Result<Self, FenError> {
        let ranks = split_board_field(field, '/')?;
        let mut squares = [[SquareClass::Empty; 8]; 8];
        for (row, rank) in ranks.iter().enumerate() {
            for (col, cell) in rank.iter().enumerate() {
                if let Some(c) = cell {
                    let piece = Piece::from_fen_char(*c).ok_or(FenError::InvalidSymbol { symbol: *c })?;
                    squares[row][col] = SquareClass::Occupied(piece);
                }
            }
        }
        Ok(Self { squares })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.board_field())
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_board_field(s)
    }
}

impl TryFrom<String> for Position {
    type Error = FenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(value: Position) -> Self {
        value.board_field()
    }
}
