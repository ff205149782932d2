//! Pagination cursor for an account's connection pages
//!
//! The remote hands back opaque integer cursors. Two values are reserved:
//! `-1` asks for the first page and `0` means there are no more pages.
use std::fmt;

/// Position within a seed's connection pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Start of the connection list
    #[default]
    First,

    /// A cursor returned by the remote for the next page
    Next(i64),

    /// No more pages for this seed
    Exhausted,
}

impl Cursor {
    pub const FIRST_RAW: i64 = -1;
    pub const EXHAUSTED_RAW: i64 = 0;

    /// Converts a raw cursor value (as stored or as sent by the remote)
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            Self::FIRST_RAW => Self::First,
            Self::EXHAUSTED_RAW => Self::Exhausted,
            other => Self::Next(other),
        }
    }

    /// Returns the raw value for persistence and for the remote query string
    pub fn as_raw(&self) -> i64 {
        match self {
            Self::First => Self::FIRST_RAW,
            Self::Next(raw) => *raw,
            Self::Exhausted => Self::EXHAUSTED_RAW,
        }
    }

    /// Returns true once the seed has no more pages
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}
