//! Quadratic level curve.
//!
//! `level = floor(0.1 * sqrt(xp))`, so level `n` starts at `(10n)^2` XP:
//! 0, 100, 400, 900, ... Early levels are cheap, later ones expensive.

use serde::{Deserialize, Serialize};

/// Level and position within the level for a given XP total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp: i64,
    pub level: u32,
    /// XP at which the current level started.
    pub current_level_xp: i64,
    /// XP at which the next level starts.
    pub next_level_xp: i64,
    /// Fraction of the way to the next level, in `[0, 1]`.
    pub xp_pct: f64,
}

fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.saturating_mul(root) > n {
        root -= 1;
    }
    while (root + 1).saturating_mul(root + 1) <= n {
        root += 1;
    }
    root
}

/// XP needed to reach `level`, saturating at `i64::MAX`.
pub fn xp_for_level(level: u32) -> i64 {
    let base = i128::from(level) * 10;
    i64::try_from(base * base).unwrap_or(i64::MAX)
}

/// Level reached with `xp`. Negative totals count as zero.
pub fn level_for_xp(xp: i64) -> u32 {
    let xp = xp.max(0) as u64;
    (isqrt(xp) / 10) as u32
}

/// Full level breakdown for `xp`.
pub fn level_progress(xp: i64) -> LevelProgress {
    let level = level_for_xp(xp);
    let current_level_xp = xp_for_level(level);
    let next_level_xp = xp_for_level(level + 1);
    let span = next_level_xp - current_level_xp;
    let xp_pct = if span <= 0 {
        0.0
    } else {
        ((xp.max(0) - current_level_xp) as f64 / span as f64).clamp(0.0, 1.0)
    };
    LevelProgress {
        xp,
        level,
        current_level_xp,
        next_level_xp,
        xp_pct,
    }
}
