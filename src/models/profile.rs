use crate::utils::to_brl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One row per user. Monetary columns are integer centavos; responses
/// convert to decimal BRL at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub balance: i64,
    pub balance_demo: i64,
    pub total_bets: i64,
    pub total_wins: i64,
    pub total_profit: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub balance: f64,
    pub balance_demo: f64,
    pub total_bets: i64,
    pub total_wins: i64,
    pub total_profit: f64,
    /// Percentage, 0 when no bets were settled yet.
    pub win_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let win_rate = if profile.total_bets > 0 {
            profile.total_wins as f64 / profile.total_bets as f64 * 100.0
        } else {
            0.0
        };

        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            balance: to_brl(profile.balance),
            balance_demo: to_brl(profile.balance_demo),
            total_bets: profile.total_bets,
            total_wins: profile.total_wins,
            total_profit: to_brl(profile.total_profit),
            win_rate,
            created_at: profile.created_at,
        }
    }
}
