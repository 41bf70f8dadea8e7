use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{BetMode, Profile};
use chrono::Utc;

#[derive(Clone)]
pub struct ProfileService {
    pool: DbPool,
}

impl ProfileService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, name, balance, balance_demo,
                   total_bets, total_wins, total_profit, created_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn get(&self, user_id: &str) -> AppResult<Profile> {
        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Fetches the caller's profile, creating it with zero balances on the
    /// first authenticated load. Safe to call repeatedly.
    pub async fn load_or_create(&self, user_id: &str, email: &str) -> AppResult<Profile> {
        if let Some(profile) = self.find(user_id).await? {
            return Ok(profile);
        }

        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, name, balance, balance_demo,
                                  total_bets, total_wins, total_profit, created_at)
            VALUES (?, ?, NULL, 0, 0, 0, 0, 0, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        log::info!("Created profile for user {user_id}");

        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::InternalError("Profile row missing after insert".to_string()))
    }

    /// Atomic balance mutation. `delta` may be negative; the guarded update
    /// refuses to drive the balance below zero and reports
    /// `InsufficientFunds` instead. Callers are expected to have resolved
    /// the profile already, so an unmatched row means the guard fired.
    pub async fn apply_balance_delta<'e, E>(
        &self,
        executor: E,
        user_id: &str,
        mode: BetMode,
        delta: i64,
    ) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let column = match mode {
            BetMode::Real => "balance",
            BetMode::Demo => "balance_demo",
        };

        let sql = format!(
            "UPDATE profiles SET {column} = {column} + ? WHERE id = ? AND {column} + ? >= 0"
        );

        let result = sqlx::query(&sql)
            .bind(delta)
            .bind(user_id)
            .bind(delta)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InsufficientFunds);
        }

        Ok(())
    }
}
