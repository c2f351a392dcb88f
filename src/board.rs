//! Board grid and position encoding.
//! The grid is always fully populated: a cell is either a piece or empty, never unknown.
//! Position strings run row 0 to row 9, empty runs collapsed to digits, rows joined by `/`.

use crate::piece::Piece;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

pub const ROWS: usize = 10;
pub const COLS: usize = 9;

/// Side-to-move and move counters appended after the board field. Not derived from detection.
pub const POSITION_SUFFIX: &str = " w - - 0 1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Piece>; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[[Option<Piece>; COLS]; ROWS] {
        &self.cells
    }

    pub fn piece_count(&self) -> usize {
        self.cells.iter().flatten().flatten().count()
    }

    /// Board field of the position string.
    pub fn to_position(&self) -> String {
        let mut out = String::with_capacity(ROWS * (COLS + 1));
        for (i, row) in self.cells.iter().enumerate() {
            let mut empty = 0;
            for cell in row {
                match cell {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.code());
                    }
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if i + 1 < ROWS {
                out.push('/');
            }
        }
        out
    }

    /// Parses a board field (anything after the first space is ignored).
    /// Returns `None` unless there are exactly 10 rows of exactly 9 cells.
    pub fn from_position(position: &str) -> Option<Self> {
        let field = position.split_whitespace().next()?;
        let rows: Vec<&str> = field.split('/').collect();
        if rows.len() != ROWS {
            return None;
        }
        let mut board = Self::new();
        for (r, row) in rows.iter().enumerate() {
            let mut c = 0;
            for ch in row.chars() {
                if let Some(n) = ch.to_digit(10) {
                    if n == 0 {
                        return None;
                    }
                    c += n as usize;
                } else {
                    if c >= COLS {
                        return None;
                    }
                    board.cells[r][c] = Some(Piece::from_code(ch)?);
                    c += 1;
                }
                if c > COLS {
                    return None;
                }
            }
            if c != COLS {
                return None;
            }
        }
        Some(board)
    }

    /// Cells where `self` and `other` disagree, as `(row, col, ours, theirs)`.
    pub fn diff(&self, other: &Board) -> Vec<(usize, usize, Option<Piece>, Option<Piece>)> {
        let mut out = Vec::new();
        for r in 0..ROWS {
            for c in 0..COLS {
                if self.cells[r][c] != other.cells[r][c] {
                    out.push((r, c, self.cells[r][c], other.cells[r][c]));
                }
            }
        }
        out
    }
}

impl Index<(usize, usize)> for Board {
    type Output = Option<Piece>;
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.cells[row][col]
    }
}

impl IndexMut<(usize, usize)> for Board {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        &mut self.cells[row][col]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_position())
    }
}
