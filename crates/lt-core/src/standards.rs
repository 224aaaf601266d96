//! Skill-tier ("standard") cutoff tables and rank resolution.
//!
//! The game's community grades times against named brackets, e.g.
//! `God > Myth A..C > Titan A..C > ... > Beg C`, each defined by an
//! upper-bound cutoff time. A time at or below a cutoff belongs to that
//! bracket; anything slower than the last cutoff is Unranked.

use serde::Serialize;
use thiserror::Error;

use crate::lap_time::{LapTime, TimeError};

/// Sentinel name for times slower than every cutoff.
pub const UNRANKED: &str = "Unranked";

/// Errors from building or using standards tables.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StandardsError {
    /// Tier names and cutoffs differ in count.
    #[error("standard names and cutoffs are different lengths: {names} vs {cutoffs}")]
    LengthMismatch { names: usize, cutoffs: usize },

    /// A standards set with no tiers is meaningless.
    #[error("standards set must have at least one tier")]
    Empty,

    /// Cutoffs must be supplied fastest tier first.
    ///
    /// Using the table in the opposite order would silently resolve every
    /// time into the wrong rank, so ordering is validated on construction.
    #[error("cutoffs must be ordered fastest to slowest: {prev} is followed by {next}")]
    NotSorted { prev: LapTime, next: LapTime },

    /// A cutoff string failed to parse.
    #[error("invalid cutoff for tier {name:?}: {source}")]
    InvalidCutoff {
        name: String,
        #[source]
        source: TimeError,
    },
}

/// A resolved rank for one time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rank {
    /// 1-based tier position; `tier_count + 1` for Unranked.
    pub ordinal: usize,
    /// Tier name, or [`UNRANKED`].
    pub name: String,
    /// Distance to the next-*better* tier's cutoff; zero at the top tier.
    /// For Unranked this is the distance past the slowest cutoff.
    pub to_next: LapTime,
}

impl Rank {
    /// Whether the time fell past the slowest cutoff.
    #[must_use]
    pub fn is_unranked(&self) -> bool {
        self.name == UNRANKED
    }
}

/// An ordered set of (tier name, cutoff) pairs, fastest tier first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardSet {
    entries: Vec<(String, LapTime)>,
}

impl StandardSet {
    /// Builds a set from aligned name and cutoff lists.
    ///
    /// Validates that both lists are the same non-zero length and that the
    /// cutoffs read fastest to slowest.
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        cutoffs: impl IntoIterator<Item = LapTime>,
    ) -> Result<Self, StandardsError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let cutoffs: Vec<LapTime> = cutoffs.into_iter().collect();
        if names.len() != cutoffs.len() {
            return Err(StandardsError::LengthMismatch {
                names: names.len(),
                cutoffs: cutoffs.len(),
            });
        }
        if names.is_empty() {
            return Err(StandardsError::Empty);
        }
        for pair in cutoffs.windows(2) {
            if pair[0] > pair[1] {
                return Err(StandardsError::NotSorted {
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self {
            entries: names.into_iter().zip(cutoffs).collect(),
        })
    }

    /// Builds a set from names and cutoff strings in `M:SS.mmm` form.
    pub fn from_strs<N, C>(
        names: impl IntoIterator<Item = N>,
        cutoffs: impl IntoIterator<Item = C>,
    ) -> Result<Self, StandardsError>
    where
        N: Into<String>,
        C: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut parsed = Vec::new();
        for (i, cutoff) in cutoffs.into_iter().enumerate() {
            let time: LapTime =
                cutoff
                    .as_ref()
                    .parse()
                    .map_err(|source| StandardsError::InvalidCutoff {
                        name: names.get(i).cloned().unwrap_or_else(|| format!("#{i}")),
                        source,
                    })?;
            parsed.push(time);
        }
        Self::new(names, parsed)
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tier names, fastest first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Resolves a time into its tier.
    ///
    /// The first tier whose cutoff is at or above the time is the match.
    /// "Next" in `to_next` means one rank *better*: the distance to the
    /// previous, faster cutoff.
    #[must_use]
    pub fn resolve(&self, time: LapTime) -> Rank {
        for (i, (name, cutoff)) in self.entries.iter().enumerate() {
            if time <= *cutoff {
                let to_next = match i.checked_sub(1) {
                    Some(better) => time - self.entries[better].1,
                    None => LapTime::ZERO,
                };
                return Rank {
                    ordinal: i + 1,
                    name: name.clone(),
                    to_next,
                };
            }
        }
        let slowest = self.entries[self.entries.len() - 1].1;
        Rank {
            ordinal: self.entries.len() + 1,
            name: UNRANKED.to_string(),
            to_next: time - slowest,
        }
    }
}

/// Per-track standards: one [`StandardSet`] per track, index-aligned with
/// the track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardsTable {
    rows: Vec<StandardSet>,
}

impl StandardsTable {
    #[must_use]
    pub const fn new(rows: Vec<StandardSet>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The standards row for a 0-based track index, if present.
    #[must_use]
    pub fn row(&self, track_index: usize) -> Option<&StandardSet> {
        self.rows.get(track_index)
    }

    /// Tier names shared by the table, taken from the first row.
    ///
    /// All rows of one table carry the same bracket names; only the cutoffs
    /// vary per track.
    #[must_use]
    pub fn tier_names(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|set| set.names().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
