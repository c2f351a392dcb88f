//! Piece codes and the static template catalog.
//! Each of the 14 Xiangqi pieces has a single-character code (uppercase = Red, lowercase = Black)
//! and exactly one reference template file. The side is carried as an explicit `Side` tag
//! so matching never has to look at letter case.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two factions, distinguished on screen by dominant color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Black,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Red => write!(f, "red"),
            Side::Black => write!(f, "black"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Chariot,
    Horse,
    Elephant,
    Advisor,
    General,
    Cannon,
    Soldier,
}

impl PieceKind {
    /// Uppercase letter used in position strings.
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Chariot => 'R',
            PieceKind::Horse => 'N',
            PieceKind::Elephant => 'B',
            PieceKind::Advisor => 'A',
            PieceKind::General => 'K',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }

    /// Stem of the template file name, e.g. `chariot` in `red_chariot.png`.
    pub const fn file_stem(self) -> &'static str {
        match self {
            PieceKind::Chariot => "chariot",
            PieceKind::Horse => "horse",
            PieceKind::Elephant => "elephant",
            PieceKind::Advisor => "advisor",
            PieceKind::General => "general",
            PieceKind::Cannon => "cannon",
            PieceKind::Soldier => "soldier",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'R' => Some(PieceKind::Chariot),
            'N' => Some(PieceKind::Horse),
            'B' => Some(PieceKind::Elephant),
            'A' => Some(PieceKind::Advisor),
            'K' => Some(PieceKind::General),
            'C' => Some(PieceKind::Cannon),
            'P' => Some(PieceKind::Soldier),
            _ => None,
        }
    }
}

/// A piece identity: side plus kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Single-character code: uppercase for Red, lowercase for Black.
    pub fn code(self) -> char {
        match self.side {
            Side::Red => self.kind.letter(),
            Side::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        let kind = PieceKind::from_letter(code.to_ascii_uppercase())?;
        let side = if code.is_ascii_uppercase() { Side::Red } else { Side::Black };
        Some(Self::new(side, kind))
    }

    /// Template file name relative to the template directory.
    pub fn template_file(self) -> String {
        format!("{}_{}.png", self.side, self.kind.file_stem())
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = char::deserialize(deserializer)?;
        Piece::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown piece code '{code}'")))
    }
}

const fn red(kind: PieceKind) -> Piece {
    Piece::new(Side::Red, kind)
}

const fn black(kind: PieceKind) -> Piece {
    Piece::new(Side::Black, kind)
}

/// Every piece in catalog order. Matching iterates in this order, so ties go to the earlier entry.
pub const CATALOG: [Piece; 14] = [
    red(PieceKind::Chariot),
    red(PieceKind::Horse),
    red(PieceKind::Elephant),
    red(PieceKind::Advisor),
    red(PieceKind::General),
    red(PieceKind::Cannon),
    red(PieceKind::Soldier),
    black(PieceKind::Chariot),
    black(PieceKind::Horse),
    black(PieceKind::Elephant),
    black(PieceKind::Advisor),
    black(PieceKind::General),
    black(PieceKind::Cannon),
    black(PieceKind::Soldier),
];
