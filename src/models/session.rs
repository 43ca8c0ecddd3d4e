//! Play session models.
//!
//! Raw rows arrive from the session log adapter; the normalizer turns them
//! into [`PlaySessionRecord`]s with a resolved difficulty level.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A game difficulty level between 1 and 4.
///
/// # Example
///
/// ```
/// use wage_engine::models::GameLevel;
///
/// assert_eq!(GameLevel::new(3).map(GameLevel::get), Some(3));
/// assert!(GameLevel::new(5).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GameLevel(u8);

impl GameLevel {
    /// The easiest level.
    pub const MIN: u8 = 1;
    /// The hardest level.
    pub const MAX: u8 = 4;

    /// Creates a level, returning `None` outside 1-4.
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// Returns the numeric level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// All levels in ascending order.
    pub fn all() -> impl Iterator<Item = GameLevel> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl TryFrom<u8> for GameLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "game level must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )
        })
    }
}

impl From<GameLevel> for u8 {
    fn from(level: GameLevel) -> Self {
        level.0
    }
}

impl fmt::Display for GameLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One row from an activity log export, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSessionRow {
    /// The day the session was logged.
    pub date: NaiveDate,
    /// The game name as typed in the log.
    pub game_name: String,
}

impl RawSessionRow {
    /// Creates a raw row.
    pub fn new(date: NaiveDate, game_name: impl Into<String>) -> Self {
        Self {
            date,
            game_name: game_name.into(),
        }
    }
}

/// A logged play session after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySessionRecord {
    /// The day the session was logged.
    pub date: NaiveDate,
    /// Canonical catalog name when classified, otherwise the trimmed log text.
    pub game_name: String,
    /// The difficulty level, or `None` when the name matched no catalog entry.
    pub game_level: Option<GameLevel>,
}

impl PlaySessionRecord {
    /// Returns true if the session can be priced.
    pub fn is_classified(&self) -> bool {
        self.game_level.is_some()
    }
}
