//! # Sorting of entry lists
//!
//! [`SortState`] holds the active sort field and direction and implements the
//! toggle rule used by every store: asking for the active field again flips
//! the direction, asking for another field switches to it ascending.
//!
//! Ordering uses [`locale_cmp`], a case-sensitive, locale-style collation:
//! whitespace sorts before punctuation and symbols, those before digits, digits
//! before letters. Letters compare case- and accent-insensitively first, so
//! "é" sorts with "e" rather than after "z". When two strings differ only in
//! case, lowercase sorts first; when they differ only in accents, the unaccented
//! form sorts first. Remaining ties fall back to code point order. Sorting is stable in both directions, so entries that compare
//! equal keep their insertion order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Entry, EntryField};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort field and direction. Starts at name, ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: EntryField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: EntryField::Name,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Apply the toggle rule for a click on `field`.
    pub fn toggle(&mut self, field: EntryField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }

    /// Stable in-place sort of `entries`.
    pub fn apply(&self, entries: &mut [Entry]) {
        let field = self.field;
        match self.direction {
            SortDirection::Ascending => {
                entries.sort_by(|a, b| locale_cmp(a.field_value(field), b.field_value(field)))
            }
            SortDirection::Descending => {
                entries.sort_by(|a, b| locale_cmp(b.field_value(field), a.field_value(field)))
            }
        }
    }

    /// Sorted copy of `entries`.
    pub fn sorted(&self, entries: &[Entry]) -> Vec<Entry> {
        let mut sorted = entries.to_vec();
        self.apply(&mut sorted);
        sorted
    }

    /// Header suffix for `field`: both arrows when inactive, otherwise the direction.
    pub fn indicator(&self, field: EntryField) -> &'static str {
        if self.field != field {
            return " ↕️";
        }
        match self.direction {
            SortDirection::Ascending => " ↑",
            SortDirection::Descending => " ↓",
        }
    }
}

/// Case-sensitive, locale-style string comparison.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(primary_key(b))
        .then_with(|| case_cmp(a, b))
        .then_with(|| a.nfd().cmp(b.nfd()))
        .then_with(|| a.cmp(b))
}

/// Characters with accents stripped.
fn base_chars(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().filter(|c| !is_combining_mark(*c))
}

fn primary_key(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    base_chars(s).flat_map(|c| {
        let class = char_class(c);
        c.to_lowercase().map(move |lower| (class, lower))
    })
}

fn char_class(c: char) -> u8 {
    if c.is_whitespace() {
        0
    } else if c.is_alphabetic() {
        3
    } else if c.is_numeric() {
        2
    } else {
        1
    }
}

/// First difference in case decides: lowercase before uppercase.
fn case_cmp(a: &str, b: &str) -> Ordering {
    for (x, y) in base_chars(a).zip(base_chars(b)) {
        match (x.is_lowercase() && y.is_uppercase(), x.is_uppercase() && y.is_lowercase()) {
            (true, _) => return Ordering::Less,
            (_, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}
