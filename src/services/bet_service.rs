use crate::database::DbPool;
use crate::error::AppResult;
use crate::models::{BetRecord, BetResponse, TransactionRecord, TransactionResponse};
use crate::utils::{PaginatedResponse, PaginationParams};

/// Read side of the bet and transaction ledgers. Writes happen inside the
/// wager settlement and payment flows.
#[derive(Clone)]
pub struct BetService {
    pool: DbPool,
}

impl BetService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Latest settled bets, newest first. Backs the table under the game.
    pub async fn recent_bets(&self, user_id: &str, limit: Option<u32>) -> AppResult<Vec<BetResponse>> {
        let limit = limit.unwrap_or(5).clamp(1, 50) as i64;

        let records = sqlx::query_as::<_, BetRecord>(
            r#"
            SELECT * FROM bets
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(BetResponse::from).collect())
    }

    pub async fn bet_history(
        &self,
        user_id: &str,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<BetResponse>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bets WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let records = sqlx::query_as::<_, BetRecord>(
            r#"
            SELECT * FROM bets
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<BetResponse> = records.into_iter().map(BetResponse::from).collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn transaction_history(
        &self,
        user_id: &str,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<TransactionResponse> =
            records.into_iter().map(TransactionResponse::from).collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}
