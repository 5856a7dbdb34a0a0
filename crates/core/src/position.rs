//! Position algebra: `(offset, column, line)` triples with delta arithmetic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An absolute position in a source text.
///
/// `offset` is the authoritative ordering key; `column` and `line` are
/// carried for reporting but never compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the source, 0-based.
    pub offset: usize,
    /// Column within the current line, 0-based.
    pub col: usize,
    /// Line number, 1-based.
    pub line: usize,
}

/// The start of any source: `(0, 0, 1)`.
pub const ORIGIN: Position = Position {
    offset: 0,
    col: 0,
    line: 1,
};

impl Position {
    /// Construct a position directly.
    pub const fn new(offset: usize, col: usize, line: usize) -> Self {
        Self { offset, col, line }
    }

    /// Advance by `n` plain characters, none of which may be a newline.
    pub fn advance(self, n: usize) -> Self {
        Self {
            offset: self.offset + n,
            col: self.col + n,
            line: self.line,
        }
    }

    /// Advance past a single newline: next line, column reset to 0.
    pub fn newline(self) -> Self {
        Self {
            offset: self.offset + 1,
            col: 0,
            line: self.line + 1,
        }
    }

    /// Advance past a single source character, which may be multi-byte.
    ///
    /// `offset` advances by the character's UTF-8 length; `col` advances by
    /// one (one character, not one byte) unless `ch` is a newline, which
    /// resets `col` to 0 and advances `line` instead.
    pub fn advance_char(self, ch: char) -> Self {
        if ch == '\n' {
            self.newline()
        } else {
            Self {
                offset: self.offset + ch.len_utf8(),
                col: self.col + 1,
                line: self.line,
            }
        }
    }

    /// The position reached by starting at [`ORIGIN`] and consuming `s`.
    pub fn from_source(s: &str) -> Self {
        ORIGIN + Delta::from_source(s)
    }

    /// `self - other`, as a [`Delta`].
    ///
    /// # Panics
    ///
    /// Panics if `self < other` (see [`PositionError::OutOfRange`] for the
    /// fallible form used by call sites that must not panic).
    pub fn checked_sub(self, other: Self) -> Result<Delta, PositionError> {
        if self.offset < other.offset {
            return Err(PositionError::OutOfRange);
        }
        if self.offset == other.offset {
            return Ok(Delta::ZERO);
        }
        Ok(Delta {
            offset: self.offset - other.offset,
            col: if self.line == other.line {
                self.col - other.col
            } else {
                self.col
            },
            line: self.line - other.line,
        })
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl std::ops::Add<usize> for Position {
    type Output = Position;
    fn add(self, n: usize) -> Position {
        self.advance(n)
    }
}

impl std::ops::Add<Delta> for Position {
    type Output = Position;
    fn add(self, delta: Delta) -> Position {
        Position {
            offset: self.offset + delta.offset,
            col: if delta.line > 0 { delta.col } else { self.col + delta.col },
            line: self.line + delta.line,
        }
    }
}

impl std::ops::Sub for Position {
    type Output = Delta;
    fn sub(self, other: Self) -> Delta {
        self.checked_sub(other)
            .expect("Position subtraction requires self >= other")
    }
}

/// A signed advance in `(offset, col, line)`, produced by "consuming" a substring.
///
/// Shares [`Position`]'s representation but is a distinct type: a delta with
/// `line == 0` is not the same thing as [`ORIGIN`], and the two are never
/// silently interchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Number of bytes consumed.
    pub offset: usize,
    /// Column advance on the final line.
    pub col: usize,
    /// Number of newlines consumed.
    pub line: usize,
}

impl Delta {
    /// The empty delta: consuming zero characters.
    pub const ZERO: Delta = Delta {
        offset: 0,
        col: 0,
        line: 0,
    };

    /// Construct a delta directly.
    pub const fn new(offset: usize, col: usize, line: usize) -> Self {
        Self { offset, col, line }
    }

    /// The delta produced by consuming `s`.
    ///
    /// If `s` contains newlines, `(len(s), len(last_line), newline_count)`;
    /// otherwise `(len(s), len(s), 0)`.
    pub fn from_source(s: &str) -> Self {
        if s.is_empty() {
            return Delta::ZERO;
        }
        let newline_count = s.bytes().filter(|&b| b == b'\n').count();
        if newline_count == 0 {
            return Delta {
                offset: s.len(),
                col: s.chars().count(),
                line: 0,
            };
        }
        let last_line = s.rsplit('\n').next().unwrap_or("");
        Delta {
            offset: s.len(),
            col: last_line.chars().count(),
            line: newline_count,
        }
    }
}

/// Errors raised by the position algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// A subtraction would require a negative delta.
    #[error("position arithmetic violated monotonicity")]
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_zero_zero_one() {
        assert_eq!(ORIGIN, Position::new(0, 0, 1));
    }

    #[test]
    fn delta_from_source_no_newline() {
        let d = Delta::from_source("abc");
        assert_eq!(d, Delta::new(3, 3, 0));
    }

    #[test]
    fn delta_from_source_with_newline() {
        // S6
        let d = Delta::from_source("abc\ndef");
        assert_eq!(d, Delta::new(7, 3, 1));
    }

    #[test]
    fn from_source_position_with_newline() {
        // S6
        let p = Position::from_source("abc\ndef");
        assert_eq!(p, Position::new(7, 3, 2));
    }

    #[test]
    fn delta_from_empty_is_zero() {
        assert_eq!(Delta::from_source(""), Delta::ZERO);
    }

    #[test]
    fn add_delta_without_newline_advances_column() {
        let p = ORIGIN + Delta::new(3, 3, 0);
        assert_eq!(p, Position::new(3, 3, 1));
    }

    #[test]
    fn add_delta_with_newline_resets_column_to_delta_col() {
        let p = Position::new(10, 5, 2) + Delta::new(7, 3, 1);
        assert_eq!(p, Position::new(17, 3, 3));
    }

    #[test]
    fn sub_recovers_delta() {
        let start = ORIGIN;
        let end = start + Delta::new(7, 3, 1);
        assert_eq!(end - start, Delta::new(7, 3, 1));
    }

    #[test]
    fn sub_same_position_is_zero() {
        assert_eq!(ORIGIN - ORIGIN, Delta::ZERO);
    }

    #[test]
    #[should_panic]
    fn sub_requires_non_decreasing() {
        let _ = ORIGIN - Position::new(5, 5, 1);
    }

    #[test]
    fn total_order_by_offset() {
        let a = Position::new(1, 99, 1);
        let b = Position::new(2, 0, 1);
        assert!(a < b);
    }

    #[test]
    fn delta_correctness_for_any_split() {
        // Property 4: from_source(a ++ b) == from_source(a) + delta_from(b)
        let cases = [("abc", "def"), ("abc\n", "def"), ("", "abc"), ("a\nb\nc", "\n\nd")];
        for (a, b) in cases {
            let whole = Position::from_source(&format!("{a}{b}"));
            let split = Position::from_source(a) + Delta::from_source(b);
            assert_eq!(whole, split, "split {a:?} + {b:?}");
        }
    }
}
