//! Caller-supplied game state that an image cannot reveal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FenError;

/// Side to move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveColor {
    #[default]
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl fmt::Display for ActiveColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActiveColor::White => "w",
            ActiveColor::Black => "b",
        })
    }
}

impl FromStr for ActiveColor {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" => Ok(ActiveColor::White),
            "b" => Ok(ActiveColor::Black),
            _ => Err(FenError::InvalidField {
                field: "active color",
                value: s.to_owned(),
            }),
        }
    }
}

/// Four independent castling flags, trusted verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

impl CastlingRights {
    pub const fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    fn flags(&self) -> [(char, bool); 4] {
        [
            ('K', self.white_kingside),
            ('Q', self.white_queenside),
            ('k', self.black_kingside),
            ('q', self.black_queenside),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.flags().iter().all(|&(_, on)| !on)
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (c, on) in self.flags() {
            if on {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for CastlingRights {
    type Err = FenError;

    /// Accepts `-` or any subset of `KQkq` in canonical order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FenError::InvalidField {
            field: "castling",
            value: s.to_owned(),
        };
        if s == "-" {
            return Ok(Self::none());
        }
        let mut rights = Self::none();
        let mut last = None;
        for c in s.chars() {
            let (idx, flag) = match c {
                'K' => (0, &mut rights.white_kingside),
                'Q' => (1, &mut rights.white_queenside),
                'k' => (2, &mut rights.black_kingside),
                'q' => (3, &mut rights.black_queenside),
                _ => return Err(invalid()),
            };
            if last.is_some_and(|l| l >= idx) {
                return Err(invalid());
            }
            *flag = true;
            last = Some(idx);
        }
        if last.is_none() {
            return Err(invalid());
        }
        Ok(rights)
    }
}

/// Which side of the board is nearest the bottom of the screenshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    #[default]
    WhiteBottom,
    BlackBottom,
}

impl Perspective {
    /// Algebraic name (`"e4"`) of an image square.
    pub fn square_name(self, row: usize, col: usize) -> String {
        let (file, rank) = match self {
            Perspective::WhiteBottom => (col, 7 - row),
            Perspective::BlackBottom => (7 - col, row),
        };
        format!("{}{}", char::from(b'a' + file as u8), rank + 1)
    }
}

/// Per-request overrides merged at encoding time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub active_color: ActiveColor,
    pub castling: CastlingRights,
    pub perspective: Perspective,
}
