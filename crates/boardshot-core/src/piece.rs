//! The 13-way square vocabulary shared by classifiers and the FEN encoder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of square classes: six black pieces, six white pieces, empty.
pub const NUM_CLASSES: usize = 13;

/// Class labels in index order.
const LABELS: [&str; NUM_CLASSES] = [
    "p", "r", "b", "n", "k", "q", "P", "R", "B", "N", "K", "Q", "empty",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    White,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Bishop,
    Knight,
    King,
    Queen,
}

impl PieceKind {
    const ORDER: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::King,
        PieceKind::Queen,
    ];

    fn offset(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Rook => 1,
            PieceKind::Bishop => 2,
            PieceKind::Knight => 3,
            PieceKind::King => 4,
            PieceKind::Queen => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: PieceColor,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: PieceColor, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn fen_char(self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
        };
        match self.color {
            PieceColor::White => c.to_ascii_uppercase(),
            PieceColor::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'r' => PieceKind::Rook,
            'b' => PieceKind::Bishop,
            'n' => PieceKind::Knight,
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            PieceColor::White
        } else {
            PieceColor::Black
        };
        Some(Self { color, kind })
    }
}

/// Content of one board square.
///
/// Classes are indexed `p r b n k q P R B N K Q empty`, which is the output
/// order of every classifier in the ensemble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SquareClass {
    #[default]
    Empty,
    Occupied(Piece),
}

impl SquareClass {
    /// All classes in index order.
    pub fn all() -> impl Iterator<Item = SquareClass> {
        (0..NUM_CLASSES).filter_map(SquareClass::from_index)
    }

    pub fn index(self) -> usize {
        match self {
            SquareClass::Empty => NUM_CLASSES - 1,
            SquareClass::Occupied(p) => {
                let base = match p.color {
                    PieceColor::Black => 0,
                    PieceColor::White => 6,
                };
                base + p.kind.offset()
            }
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0..=5 => Some(SquareClass::Occupied(Piece::new(
                PieceColor::Black,
                PieceKind::ORDER[idx],
            ))),
            6..=11 => Some(SquareClass::Occupied(Piece::new(
                PieceColor::White,
                PieceKind::ORDER[idx - 6],
            ))),
            12 => Some(SquareClass::Empty),
            _ => None,
        }
    }

    /// Short label: the FEN letter, or `"empty"`.
    pub fn label(self) -> &'static str {
        LABELS[self.index()]
    }

    pub fn piece(self) -> Option<Piece> {
        match self {
            SquareClass::Empty => None,
            SquareClass::Occupied(p) => Some(p),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, SquareClass::Empty)
    }
}

impl fmt::Display for SquareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown square class label {0:?}")]
pub struct ParseSquareClassError(pub String);

impl FromStr for SquareClass {
    type Err = ParseSquareClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LABELS
            .iter()
            .position(|&l| l == s)
            .and_then(SquareClass::from_index)
            .ok_or_else(|| ParseSquareClassError(s.to_owned()))
    }
}

impl TryFrom<String> for SquareClass {
    type Error = ParseSquareClassError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SquareClass> for String {
    fn from(value: SquareClass) -> Self {
        value.label().to_owned()
    }
}
