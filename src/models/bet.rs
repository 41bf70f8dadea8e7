use crate::utils::to_brl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Which balance column a wager plays against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BetMode {
    Real,
    Demo,
}

impl std::fmt::Display for BetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetMode::Real => write!(f, "real"),
            BetMode::Demo => write!(f, "demo"),
        }
    }
}

/// Append-only summary of one settled wager session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BetRecord {
    pub id: i64,
    pub user_id: String,
    pub target_number: i64,
    pub bet_amount: i64,
    pub result_amount: i64,
    pub is_win: bool,
    pub range_min: i64,
    pub range_max: i64,
    pub multiplier: f64,
    pub chances: i64,
    pub mode: BetMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BetResponse {
    pub id: i64,
    pub target_number: i64,
    pub bet_amount: f64,
    pub result_amount: f64,
    pub is_win: bool,
    pub range_min: i64,
    pub range_max: i64,
    pub multiplier: f64,
    pub chances: i64,
    pub mode: BetMode,
    pub created_at: DateTime<Utc>,
}

impl From<BetRecord> for BetResponse {
    fn from(record: BetRecord) -> Self {
        Self {
            id: record.id,
            target_number: record.target_number,
            bet_amount: to_brl(record.bet_amount),
            result_amount: to_brl(record.result_amount),
            is_win: record.is_win,
            range_min: record.range_min,
            range_max: record.range_max,
            multiplier: record.multiplier,
            chances: record.chances,
            mode: record.mode,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentBetsQuery {
    pub limit: Option<u32>,
}
