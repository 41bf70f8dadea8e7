use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    BetMode, BetOutcome, PlaceBetRequest, RANGE_OPTIONS, RangeOption, WagerSession,
    find_range_option, hint_for,
};
use crate::services::ProfileService;
use crate::utils::{to_brl, to_centavos};
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the guess/chances state machine. Sessions live only in memory,
/// keyed by user id; the mutex serializes every settlement of the same
/// user, and the balance itself only moves through guarded atomic updates.
#[derive(Clone)]
pub struct WagerService {
    pool: DbPool,
    profile_service: ProfileService,
    sessions: Arc<Mutex<HashMap<String, WagerSession>>>,
}

impl WagerService {
    pub fn new(pool: DbPool, profile_service: ProfileService) -> Self {
        Self {
            pool,
            profile_service,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn range_options(&self) -> &'static [RangeOption] {
        RANGE_OPTIONS
    }

    /// Picking a tuple discards any in-flight session for the caller. No
    /// funds move; nothing is escrowed before settlement.
    pub async fn select_range(&self, user_id: &str, range: i64) -> AppResult<RangeOption> {
        let option = find_range_option(range)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown range: {range}")))?;

        self.sessions.lock().await.remove(user_id);

        Ok(*option)
    }

    /// One guess. Starts a session when none is active (drawing the secret
    /// target and locking the tuple), otherwise plays against the active
    /// one. Settlement happens here too: exact match wins, exhausting the
    /// chances loses.
    pub async fn place_bet(
        &self,
        user_id: &str,
        request: PlaceBetRequest,
    ) -> AppResult<BetOutcome> {
        // The amount only locks in when a session starts, but every guess
        // must still carry a valid one; a bad amount never consumes a chance.
        if to_centavos(request.amount) <= 0 {
            return Err(AppError::ValidationError(
                "Bet amount must be positive".to_string(),
            ));
        }

        let mut sessions = self.sessions.lock().await;

        // A different tuple while a session is running is a forced reset;
        // the guess then plays against a fresh session.
        if let Some(active) = sessions.get(user_id)
            && active.range != request.range
        {
            sessions.remove(user_id);
        }

        let session = match sessions.remove(user_id) {
            Some(active) => {
                if request.guess < 1 || request.guess > active.range {
                    let range = active.range;
                    sessions.insert(user_id.to_string(), active);
                    return Err(AppError::ValidationError(format!(
                        "Please choose a number between 1 and {range}"
                    )));
                }
                active
            }
            None => self.start_session(user_id, &request).await?,
        };

        if request.guess == session.target_number {
            let (result_amount, new_balance) = self.settle(user_id, &session, true).await?;
            return Ok(BetOutcome::Win {
                target_number: session.target_number,
                bet_amount: to_brl(session.bet_amount),
                result_amount: to_brl(result_amount),
                new_balance: to_brl(new_balance),
            });
        }

        let mut session = session;
        session.remaining_chances -= 1;

        if session.remaining_chances == 0 {
            let (_, new_balance) = self.settle(user_id, &session, false).await?;
            return Ok(BetOutcome::Loss {
                target_number: session.target_number,
                bet_amount: to_brl(session.bet_amount),
                new_balance: to_brl(new_balance),
            });
        }

        let direction = hint_for(request.guess, session.target_number);
        let remaining_chances = session.remaining_chances;
        sessions.insert(user_id.to_string(), session);

        Ok(BetOutcome::Hint {
            direction,
            remaining_chances,
        })
    }

    /// Validates the opening guess and builds the session. The balance
    /// check here is an entry gate only; the settlement update re-checks
    /// atomically.
    async fn start_session(
        &self,
        user_id: &str,
        request: &PlaceBetRequest,
    ) -> AppResult<WagerSession> {
        let option = find_range_option(request.range)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown range: {}", request.range)))?;

        if request.guess < 1 || request.guess > option.range {
            return Err(AppError::ValidationError(format!(
                "Please choose a number between 1 and {}",
                option.range
            )));
        }

        let bet_amount = to_centavos(request.amount);
        let profile = self.profile_service.get(user_id).await?;
        let available = match request.mode {
            BetMode::Real => profile.balance,
            BetMode::Demo => profile.balance_demo,
        };
        if bet_amount > available {
            return Err(AppError::ValidationError(format!(
                "Insufficient {} balance for this bet",
                request.mode
            )));
        }

        let target_number = rand::thread_rng().gen_range(1..=option.range);

        Ok(WagerSession {
            target_number,
            range: option.range,
            multiplier: option.multiplier,
            chances: option.chances,
            remaining_chances: option.chances,
            bet_amount,
            mode: request.mode,
        })
    }

    /// Settles one session: guarded balance mutation, aggregate bump and
    /// the bet row, all in one transaction. A win credits the full prize
    /// without first debiting the stake; a loss debits the stake. The net
    /// effect matches since the stake was never escrowed.
    async fn settle(
        &self,
        user_id: &str,
        session: &WagerSession,
        is_win: bool,
    ) -> AppResult<(i64, i64)> {
        let result_amount = if is_win {
            (session.bet_amount as f64 * session.multiplier).round() as i64
        } else {
            0
        };
        let delta = if is_win {
            result_amount
        } else {
            -session.bet_amount
        };

        let mut tx = self.pool.begin().await?;

        // If the balance was drained elsewhere mid-session the loss can no
        // longer be covered; the wager is voided instead of overdrawn.
        self.profile_service
            .apply_balance_delta(&mut *tx, user_id, session.mode, delta)
            .await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET total_bets = total_bets + 1,
                total_wins = total_wins + ?,
                total_profit = total_profit + ?
            WHERE id = ?
            "#,
        )
        .bind(if is_win { 1i64 } else { 0i64 })
        .bind(delta)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO bets (user_id, target_number, bet_amount, result_amount, is_win,
                              range_min, range_max, multiplier, chances, mode, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(session.target_number)
        .bind(session.bet_amount)
        .bind(result_amount)
        .bind(is_win)
        .bind(1i64)
        .bind(session.range)
        .bind(session.multiplier)
        .bind(session.chances)
        .bind(session.mode)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Settled {} wager for user {user_id}: {} R${:.2}",
            session.mode,
            if is_win { "won" } else { "lost" },
            to_brl(if is_win { result_amount } else { session.bet_amount }),
        );

        let profile = self.profile_service.get(user_id).await?;
        let new_balance = match session.mode {
            BetMode::Real => profile.balance,
            BetMode::Demo => profile.balance_demo,
        };

        Ok((result_amount, new_balance))
    }

    #[cfg(test)]
    pub(crate) async fn inject_session(&self, user_id: &str, session: WagerSession) {
        self.sessions.lock().await.insert(user_id.to_string(), session);
    }

    #[cfg(test)]
    pub(crate) async fn has_session(&self, user_id: &str) -> bool {
        self.sessions.lock().await.contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetRecord, HintDirection};
    use sqlx::sqlite::SqlitePoolOptions;

    const USER: &str = "9f3c6a1e-0000-4000-8000-000000000001";

    async fn setup(balance: i64, balance_demo: i64) -> (WagerService, DbPool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let profiles = ProfileService::new(pool.clone());
        profiles.load_or_create(USER, "player@example.com").await.unwrap();
        sqlx::query("UPDATE profiles SET balance = ?, balance_demo = ? WHERE id = ?")
            .bind(balance)
            .bind(balance_demo)
            .bind(USER)
            .execute(&pool)
            .await
            .unwrap();

        (WagerService::new(pool.clone(), profiles), pool)
    }

    fn session(target: i64, remaining: i64, bet_amount: i64, mode: BetMode) -> WagerSession {
        WagerSession {
            target_number: target,
            range: 10,
            multiplier: 1.2,
            chances: 3,
            remaining_chances: remaining,
            bet_amount,
            mode,
        }
    }

    fn bet_request(guess: i64) -> PlaceBetRequest {
        PlaceBetRequest {
            range: 10,
            guess,
            amount: 10.0,
            mode: BetMode::Real,
        }
    }

    async fn bet_rows(pool: &DbPool) -> Vec<BetRecord> {
        sqlx::query_as::<_, BetRecord>("SELECT * FROM bets ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_out_of_range_guess_rejected_without_state_change() {
        let (service, pool) = setup(5000, 0).await;

        let err = service.place_bet(USER, bet_request(11)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        assert!(!service.has_session(USER).await);
        assert!(bet_rows(&pool).await.is_empty());

        let profile = ProfileService::new(pool).get(USER).await.unwrap();
        assert_eq!(profile.balance, 5000);
        assert_eq!(profile.total_bets, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_guess_keeps_active_session() {
        let (service, _pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 3, 1000, BetMode::Real))
            .await;

        let err = service.place_bet(USER, bet_request(0)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(service.has_session(USER).await);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_mid_session() {
        let (service, pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 3, 1000, BetMode::Real))
            .await;

        for amount in [-5.0, 0.0] {
            let request = PlaceBetRequest {
                range: 10,
                guess: 3,
                amount,
                mode: BetMode::Real,
            };
            let err = service.place_bet(USER, request).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }

        // The session is untouched: a follow-up miss still reports the full
        // two remaining chances.
        match service.place_bet(USER, bet_request(3)).await.unwrap() {
            BetOutcome::Hint {
                remaining_chances, ..
            } => assert_eq!(remaining_chances, 2),
            other => panic!("expected hint, got {other:?}"),
        }
        assert!(bet_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected() {
        let (service, pool) = setup(500, 0).await;

        let err = service.place_bet(USER, bet_request(5)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(bet_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_win_credits_bet_times_multiplier() {
        let (service, pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 3, 1000, BetMode::Real))
            .await;

        let outcome = service.place_bet(USER, bet_request(7)).await.unwrap();
        match outcome {
            BetOutcome::Win {
                target_number,
                result_amount,
                new_balance,
                ..
            } => {
                assert_eq!(target_number, 7);
                assert_eq!(result_amount, 12.0);
                assert_eq!(new_balance, 62.0);
            }
            other => panic!("expected win, got {other:?}"),
        }

        let rows = bet_rows(&pool).await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_win);
        assert_eq!(rows[0].bet_amount, 1000);
        assert_eq!(rows[0].result_amount, 1200);
        assert_eq!(rows[0].multiplier, 1.2);

        let profile = ProfileService::new(pool).get(USER).await.unwrap();
        assert_eq!(profile.balance, 6200);
        assert_eq!(profile.total_bets, 1);
        assert_eq!(profile.total_wins, 1);
        assert_eq!(profile.total_profit, 1200);
        assert!(!service.has_session(USER).await);
    }

    #[tokio::test]
    async fn test_loss_debits_stake_when_chances_run_out() {
        let (service, pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 1, 1000, BetMode::Real))
            .await;

        let outcome = service.place_bet(USER, bet_request(3)).await.unwrap();
        match outcome {
            BetOutcome::Loss {
                target_number,
                bet_amount,
                new_balance,
            } => {
                assert_eq!(target_number, 7);
                assert_eq!(bet_amount, 10.0);
                assert_eq!(new_balance, 40.0);
            }
            other => panic!("expected loss, got {other:?}"),
        }

        let rows = bet_rows(&pool).await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_win);
        assert_eq!(rows[0].result_amount, 0);

        let profile = ProfileService::new(pool).get(USER).await.unwrap();
        assert_eq!(profile.balance, 4000);
        assert_eq!(profile.total_bets, 1);
        assert_eq!(profile.total_wins, 0);
        assert_eq!(profile.total_profit, -1000);
    }

    #[tokio::test]
    async fn test_hint_decrements_chances_and_points_at_target() {
        let (service, pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 3, 1000, BetMode::Real))
            .await;

        match service.place_bet(USER, bet_request(3)).await.unwrap() {
            BetOutcome::Hint {
                direction,
                remaining_chances,
            } => {
                assert_eq!(direction, HintDirection::Higher);
                assert_eq!(remaining_chances, 2);
            }
            other => panic!("expected hint, got {other:?}"),
        }

        match service.place_bet(USER, bet_request(9)).await.unwrap() {
            BetOutcome::Hint {
                direction,
                remaining_chances,
            } => {
                assert_eq!(direction, HintDirection::Lower);
                assert_eq!(remaining_chances, 1);
            }
            other => panic!("expected hint, got {other:?}"),
        }

        // Nothing settles while chances remain.
        assert!(bet_rows(&pool).await.is_empty());
        assert!(service.has_session(USER).await);
    }

    #[tokio::test]
    async fn test_example_session_end_to_end() {
        // range=10, chances=3, multiplier=1.2, bet=10, target=7,
        // guesses [3, 7]: hint "higher" with 2 left, then a win of +12.00.
        let (service, pool) = setup(10000, 0).await;
        service
            .inject_session(USER, session(7, 3, 1000, BetMode::Real))
            .await;

        match service.place_bet(USER, bet_request(3)).await.unwrap() {
            BetOutcome::Hint {
                direction,
                remaining_chances,
            } => {
                assert_eq!(direction, HintDirection::Higher);
                assert_eq!(remaining_chances, 2);
            }
            other => panic!("expected hint, got {other:?}"),
        }

        match service.place_bet(USER, bet_request(7)).await.unwrap() {
            BetOutcome::Win {
                target_number,
                bet_amount,
                result_amount,
                new_balance,
            } => {
                assert_eq!(target_number, 7);
                assert_eq!(bet_amount, 10.0);
                assert_eq!(result_amount, 12.0);
                assert_eq!(new_balance, 112.0);
            }
            other => panic!("expected win, got {other:?}"),
        }

        let rows = bet_rows(&pool).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].target_number, 7);
        assert_eq!(rows[0].bet_amount, 1000);
        assert_eq!(rows[0].result_amount, 1200);
        assert!(rows[0].is_win);
    }

    #[tokio::test]
    async fn test_demo_mode_settles_against_demo_balance() {
        let (service, pool) = setup(5000, 2000).await;
        service
            .inject_session(USER, session(4, 1, 2000, BetMode::Demo))
            .await;

        let request = PlaceBetRequest {
            range: 10,
            guess: 9,
            amount: 20.0,
            mode: BetMode::Demo,
        };
        match service.place_bet(USER, request).await.unwrap() {
            BetOutcome::Loss { new_balance, .. } => assert_eq!(new_balance, 0.0),
            other => panic!("expected loss, got {other:?}"),
        }

        let profile = ProfileService::new(pool).get(USER).await.unwrap();
        assert_eq!(profile.balance, 5000);
        assert_eq!(profile.balance_demo, 0);
    }

    #[tokio::test]
    async fn test_select_range_resets_active_session() {
        let (service, _pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 2, 1000, BetMode::Real))
            .await;

        service.select_range(USER, 50).await.unwrap();
        assert!(!service.has_session(USER).await);

        let err = service.select_range(USER, 25).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_range_change_mid_session_starts_fresh() {
        let (service, pool) = setup(5000, 0).await;
        service
            .inject_session(USER, session(7, 1, 1000, BetMode::Real))
            .await;

        // Same request with a different tuple: the old session (one chance
        // left) is dropped, a new one starts with full chances, so this
        // guess cannot settle as a loss.
        let request = PlaceBetRequest {
            range: 50,
            guess: 25,
            amount: 10.0,
            mode: BetMode::Real,
        };
        let outcome = service.place_bet(USER, request).await.unwrap();

        match outcome {
            BetOutcome::Hint {
                remaining_chances, ..
            } => assert_eq!(remaining_chances, 4),
            BetOutcome::Win { target_number, .. } => assert_eq!(target_number, 25),
            BetOutcome::Loss { .. } => panic!("fresh session cannot lose on its first guess"),
        }

        // The forfeited session never settled.
        let settled: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bets WHERE range_max = 10")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(settled, 0);
    }
}
