use crate::models::BetMode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Selectable (range, multiplier, chances) tuple. Tighter ranges pay less
/// and allow fewer guesses.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RangeOption {
    pub range: i64,
    pub multiplier: f64,
    pub chances: i64,
}

pub const RANGE_OPTIONS: &[RangeOption] = &[
    RangeOption {
        range: 10,
        multiplier: 1.2,
        chances: 3,
    },
    RangeOption {
        range: 50,
        multiplier: 3.0,
        chances: 5,
    },
    RangeOption {
        range: 100,
        multiplier: 5.0,
        chances: 7,
    },
];

pub fn find_range_option(range: i64) -> Option<&'static RangeOption> {
    RANGE_OPTIONS.iter().find(|option| option.range == range)
}

/// In-flight wager state for one user. Held only in memory; nothing is
/// persisted (and no funds move) until the session settles.
#[derive(Debug, Clone)]
pub struct WagerSession {
    pub target_number: i64,
    pub range: i64,
    pub multiplier: f64,
    pub chances: i64,
    pub remaining_chances: i64,
    pub bet_amount: i64,
    pub mode: BetMode,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceBetRequest {
    pub range: i64,
    pub guess: i64,
    /// Decimal BRL. Locked in when the session starts; ignored on
    /// follow-up guesses of an active session.
    pub amount: f64,
    pub mode: BetMode,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectRangeRequest {
    pub range: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HintDirection {
    Higher,
    Lower,
}

/// Outcome of a single guess. `Hint` leaves the session open; `Win` and
/// `Loss` are settled and carry the revealed target plus the new balance.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BetOutcome {
    Hint {
        direction: HintDirection,
        remaining_chances: i64,
    },
    Win {
        target_number: i64,
        bet_amount: f64,
        result_amount: f64,
        new_balance: f64,
    },
    Loss {
        target_number: i64,
        bet_amount: f64,
        new_balance: f64,
    },
}

/// The target is "higher" whenever the guess undershoots, "lower" whenever
/// it overshoots. Callers only invoke this on a mismatch.
pub fn hint_for(guess: i64, target: i64) -> HintDirection {
    if guess < target {
        HintDirection::Higher
    } else {
        HintDirection::Lower
    }
}
