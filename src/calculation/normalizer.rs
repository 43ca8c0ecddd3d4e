//! Play record normalization.
//!
//! Activity logs are typed by hand, so game names drift in wording and
//! punctuation. This module drops journal-prompt rows and classifies the rest
//! against the game catalog using a single matching policy, [`labels_match`].

use crate::config::GameCatalog;
use crate::models::{GameLevel, PlaySessionRecord, RawSessionRow};

/// A catalog entry that a log name was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMatch<'a> {
    /// The canonical catalog name.
    pub canonical_name: &'a str,
    /// The catalog level.
    pub level: GameLevel,
}

/// The normalized sessions for one log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSessions {
    /// Sessions that survived exclusion, in log order.
    pub records: Vec<PlaySessionRecord>,
    /// Rows dropped as journal entries.
    pub excluded_count: u32,
}

/// The name matching policy shared by exclusion and classification.
///
/// Two labels match when, after trimming and lowercasing, either one contains
/// the other. A blank label never matches anything.
///
/// # Examples
///
/// ```
/// use wage_engine::calculation::labels_match;
///
/// assert!(labels_match("Mood check", "mood check!"));
/// assert!(labels_match("Puzzle Garden (2nd try)", "puzzle garden"));
/// assert!(!labels_match("Puzzle Garden", "Word Chain"));
/// assert!(!labels_match("", "anything"));
/// ```
pub fn labels_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Returns true if the log name is one of the catalog's excluded journal labels.
pub fn is_excluded(game_name: &str, catalog: &GameCatalog) -> bool {
    catalog
        .excluded_labels
        .iter()
        .any(|label| labels_match(game_name, label))
}

/// Classifies a log name against the catalog.
///
/// A case-insensitive exact match wins outright. Otherwise the longest
/// catalog name that matches under [`labels_match`] is chosen, so "Word Chain
/// Plus" does not fall back to a shorter "Word" entry; equal lengths go to the
/// entry listed first.
pub fn classify_game<'a>(game_name: &str, catalog: &'a GameCatalog) -> Option<GameMatch<'a>> {
    let wanted = game_name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    let to_match = |entry: &'a crate::config::GameEntry| GameMatch {
        canonical_name: entry.name.as_str(),
        level: entry.level,
    };

    if let Some(entry) = catalog
        .games
        .iter()
        .find(|entry| entry.name.trim().to_lowercase() == wanted)
    {
        return Some(to_match(entry));
    }

    catalog
        .games
        .iter()
        .filter(|entry| labels_match(&entry.name, game_name))
        .fold(None, |best: Option<&crate::config::GameEntry>, entry| match best {
            Some(current) if current.name.trim().len() >= entry.name.trim().len() => Some(current),
            _ => Some(entry),
        })
        .map(to_match)
}

/// Drops excluded rows and resolves a level for each remaining row.
///
/// Rows that match no catalog entry are kept with `game_level = None` so they
/// stay visible for auditing without being paid.
pub fn normalize_sessions(rows: &[RawSessionRow], catalog: &GameCatalog) -> NormalizedSessions {
    let mut records = Vec::with_capacity(rows.len());
    let mut excluded_count = 0u32;

    for row in rows {
        if is_excluded(&row.game_name, catalog) {
            excluded_count += 1;
            continue;
        }

        let record = match classify_game(&row.game_name, catalog) {
            Some(found) => PlaySessionRecord {
                date: row.date,
                game_name: found.canonical_name.to_string(),
                game_level: Some(found.level),
            },
            None => PlaySessionRecord {
                date: row.date,
                game_name: row.game_name.trim().to_string(),
                game_level: None,
            },
        };
        records.push(record);
    }

    NormalizedSessions {
        records,
        excluded_count,
    }
}
