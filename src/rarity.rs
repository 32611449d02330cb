//! Rarity scoring
//!
//! A path is rare when few other catalog paths share any of its words.

use std::fmt;
use std::time::Duration;

use crate::text::rarity_words;

/// Discrete rarity tier, declared from most common to rarest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RarityRank {
    /// Most common
    D,
    /// Common
    C,
    /// Uncommon
    B,
    /// Rare
    A,
    /// Super rare
    S,
    /// Double super rare
    SS,
    /// Rarest
    SSS,
}

/// Rank upper bounds on the appearance rate, checked in ascending order
pub const RARITY_THRESHOLDS: [(RarityRank, f64); 7] = [
    (RarityRank::SSS, 0.001),
    (RarityRank::SS, 0.005),
    (RarityRank::S, 0.01),
    (RarityRank::A, 0.05),
    (RarityRank::B, 0.1),
    (RarityRank::C, 0.2),
    (RarityRank::D, 1.0),
];

impl RarityRank {
    /// Every rank from most common to rarest
    pub const ALL: [Self; 7] = [Self::D, Self::C, Self::B, Self::A, Self::S, Self::SS, Self::SSS];

    /// Rank for an appearance rate: the first threshold the rate does not exceed
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        RARITY_THRESHOLDS
            .iter()
            .find(|(_, threshold)| rate <= *threshold)
            .map_or(Self::D, |(rank, _)| *rank)
    }

    /// Display color as a `#RRGGBB` string
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::D => "#808080",
            Self::C => "#00FF00",
            Self::B => "#0000FF",
            Self::A => "#800080",
            Self::S => "#FFD700",
            Self::SS => "#FF69B4",
            Self::SSS => "#FF0000",
        }
    }

    /// Rank letters
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
            Self::SS => "SS",
            Self::SSS => "SSS",
        }
    }
}

impl fmt::Display for RarityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank and appearance rate of one catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityInfo {
    /// Discrete tier
    pub rank:            RarityRank,
    /// Fraction of other entries sharing at least one word, in `[0, 1]`
    pub appearance_rate: f64,
}

impl RarityInfo {
    /// Fallback for paths with no words or no other entries
    pub const COMMON: Self = Self { rank: RarityRank::D, appearance_rate: 1.0 };
}

/// Compute the rarity of `path` against every path in the catalog.
///
/// Total and deterministic: paths without words, or catalogs with nothing
/// besides `path`, get [`RarityInfo::COMMON`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_rarity<'a, I>(path: &str, all_paths: I) -> RarityInfo
where
    I: IntoIterator<Item = &'a str>,
{
    let target = rarity_words(path);
    if target.is_empty() {
        return RarityInfo::COMMON;
    }

    let mut others = 0_usize;
    let mut matching = 0_usize;
    for other in all_paths.into_iter().filter(|other| *other != path) {
        others += 1;
        if rarity_words(other).iter().any(|word| target.contains(word)) {
            matching += 1;
        }
    }

    if others == 0 {
        return RarityInfo::COMMON;
    }

    let appearance_rate = matching as f64 / others as f64;
    RarityInfo { rank: RarityRank::from_rate(appearance_rate), appearance_rate }
}

/// Total length of the rank reveal animation
pub const REVEAL_DURATION: Duration = Duration::from_millis(250);

/// Interval between two flashed ranks
pub const REVEAL_FLASH_INTERVAL: Duration = Duration::from_millis(10);

/// Hold before the final rank is shown
pub const REVEAL_FINAL_PAUSE: Duration = Duration::from_millis(15);

/// Timeline of the rank reveal: ranks flash from D towards SSS, then the real
/// rank settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealAnimation {
    rank: RarityRank,
}

impl RevealAnimation {
    /// Animation that ends on `rank`
    #[must_use]
    pub const fn new(rank: RarityRank) -> Self {
        Self { rank }
    }

    /// Number of flash steps before the final pause
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn steps() -> u32 {
        ((REVEAL_DURATION.as_millis() - REVEAL_FINAL_PAUSE.as_millis())
            / REVEAL_FLASH_INTERVAL.as_millis()) as u32
    }

    /// Moment the final rank appears
    #[must_use]
    pub fn settle_time() -> Duration {
        REVEAL_FLASH_INTERVAL * (Self::steps() + 1) + REVEAL_FINAL_PAUSE
    }

    /// Rank displayed `elapsed` after the animation started
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rank_at(&self, elapsed: Duration) -> RarityRank {
        if self.is_done(elapsed) {
            return self.rank;
        }
        let steps = Self::steps();
        let ticks = (elapsed.as_millis() / REVEAL_FLASH_INTERVAL.as_millis()) as u32;
        if ticks == 0 {
            return RarityRank::D;
        }
        let step = ticks.min(steps) - 1;
        let ranks = RarityRank::ALL.len() as u32;
        let index = (step * ranks / steps).min(ranks - 1);
        RarityRank::ALL[index as usize]
    }

    /// Returns true once the final rank is displayed
    #[must_use]
    pub fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= Self::settle_time()
    }
}
