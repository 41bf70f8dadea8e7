use crate::config::PaymentConfig;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::external::{MailerService, PagSeguroService};
use crate::models::{
    BalanceResponse, BetMode, CreatePixChargeRequest, PixChargeResponse, PixWebhookPayload,
    TransactionStatus, TransactionType, WithdrawRequest, WithdrawResponse,
};
use crate::services::ProfileService;
use crate::utils::{to_brl, to_centavos};
use chrono::Utc;
use uuid::Uuid;

/// Bridges the game to the payment gateway and the operator: Pix deposits
/// in, manual withdrawals out. Deposits settle asynchronously through the
/// gateway webhook; nothing here credits a balance synchronously.
#[derive(Clone)]
pub struct PaymentService {
    pool: DbPool,
    profile_service: ProfileService,
    pagseguro: PagSeguroService,
    mailer: MailerService,
    config: PaymentConfig,
}

impl PaymentService {
    pub fn new(
        pool: DbPool,
        profile_service: ProfileService,
        pagseguro: PagSeguroService,
        mailer: MailerService,
        config: PaymentConfig,
    ) -> Self {
        Self {
            pool,
            profile_service,
            pagseguro,
            mailer,
            config,
        }
    }

    /// Requests a Pix charge from the gateway and hands the QR code back to
    /// the browser. The charge references the raw user id; the webhook
    /// resolves the depositor from it later.
    pub async fn create_deposit(
        &self,
        request: CreatePixChargeRequest,
    ) -> AppResult<PixChargeResponse> {
        if request.user_id.is_empty() || request.email.is_empty() {
            return Err(AppError::ValidationError(
                "amount, email and user_id are required".to_string(),
            ));
        }
        if request.amount < self.config.min_deposit {
            return Err(AppError::ValidationError(format!(
                "Minimum deposit is R$ {:.2}",
                self.config.min_deposit
            )));
        }

        let charge = self
            .pagseguro
            .create_pix_charge(&request.user_id, to_centavos(request.amount), &request.email)
            .await?;

        let qr = charge
            .qr_codes
            .first()
            .and_then(|qr| match (&qr.base64, &qr.text) {
                (Some(base64), Some(text)) => Some((base64.clone(), text.clone())),
                _ => None,
            });

        match qr {
            Some((qr_code, qr_code_text)) => Ok(PixChargeResponse {
                id: charge.id,
                status: charge.status,
                qr_code,
                qr_code_text,
            }),
            None => {
                log::error!("Unexpected PagSeguro response, no QR code: {charge:?}");
                Err(AppError::ExternalApiError(
                    "Unexpected PagSeguro response: missing QR code".to_string(),
                ))
            }
        }
    }

    /// Settles a paid charge delivered by the gateway webhook. Every
    /// shortfall here degrades to a logged no-op: the handler acknowledges
    /// 200 regardless, and the gateway does not retry.
    pub async fn handle_pix_webhook(&self, payload: PixWebhookPayload) -> AppResult<()> {
        let status = match payload.status.as_deref() {
            Some(status) if status == "PAID" || status == "SUCCEEDED" => status,
            _ => return Ok(()),
        };

        let Some(reference) = payload.reference_id.as_deref() else {
            log::error!("Pix webhook without reference_id, cannot credit");
            return Ok(());
        };

        // The canonical reference is the raw user id. Composite strings
        // from older backend revisions are rejected, not parsed.
        let Ok(user_id) = Uuid::parse_str(reference) else {
            log::error!("Pix webhook reference_id is not a user id: {reference}");
            return Ok(());
        };
        let user_id = user_id.to_string();

        let Some(charge_id) = payload.id.as_deref() else {
            log::error!("Pix webhook without charge id, cannot credit");
            return Ok(());
        };
        let Some(amount) = payload.amount.as_ref() else {
            log::error!("Pix webhook without amount, cannot credit");
            return Ok(());
        };
        if amount.value <= 0 {
            log::error!(
                "Pix webhook with non-positive amount {} for charge {charge_id}, ignoring",
                amount.value
            );
            return Ok(());
        }

        if self.profile_service.find(&user_id).await?.is_none() {
            log::error!("Pix webhook for unknown user: {user_id}");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        // The settlement id is persisted before the credit; a second
        // delivery of the same charge conflicts and becomes a no-op.
        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (user_id, type, amount, payment_method, status,
                                      gateway_charge_id, created_at)
            VALUES (?, ?, ?, 'pix', ?, ?, ?)
            ON CONFLICT (gateway_charge_id) DO NOTHING
            "#,
        )
        .bind(&user_id)
        .bind(TransactionType::Deposit)
        .bind(amount.value)
        .bind(TransactionStatus::Completed)
        .bind(charge_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            log::warn!("Duplicate Pix webhook for charge {charge_id}, skipping credit");
            return Ok(());
        }

        self.profile_service
            .apply_balance_delta(&mut *tx, &user_id, BetMode::Real, amount.value)
            .await?;

        tx.commit().await?;

        log::info!(
            "Credited R${:.2} to user {user_id} for charge {charge_id} ({status})",
            to_brl(amount.value)
        );

        Ok(())
    }

    /// Real-money balance in decimal BRL. The browser polls this after
    /// initiating a deposit until it sees an increase.
    pub async fn balance(&self, user_id: &str) -> AppResult<BalanceResponse> {
        let profile = self.profile_service.get(user_id).await?;

        Ok(BalanceResponse {
            balance: to_brl(profile.balance),
        })
    }

    /// Debits the full amount up front and queues a pending withdrawal for
    /// the operator. There is no reversal path: the debit is permanent at
    /// submission time.
    pub async fn request_withdrawal(&self, request: WithdrawRequest) -> AppResult<WithdrawResponse> {
        if request.user_id.is_empty() || request.valor <= 0.0 {
            return Err(AppError::ValidationError(
                "Invalid withdrawal data".to_string(),
            ));
        }
        if request.valor < self.config.min_withdrawal {
            return Err(AppError::ValidationError(format!(
                "Minimum withdrawal is R$ {:.2}",
                self.config.min_withdrawal
            )));
        }
        self.validate_method(&request)?;

        // 404 for unknown users, before any debit.
        self.profile_service.get(&request.user_id).await?;

        let valor_centavos = to_centavos(request.valor);

        let mut tx = self.pool.begin().await?;

        self.profile_service
            .apply_balance_delta(&mut *tx, &request.user_id, BetMode::Real, -valor_centavos)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (user_id, type, amount, payment_method, status,
                                      gateway_charge_id, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(&request.user_id)
        .bind(TransactionType::Withdrawal)
        .bind(valor_centavos)
        .bind(&request.metodo)
        .bind(TransactionStatus::Pending)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        // The operator is notified by mail. The debit stands even if the
        // notice cannot be sent; the failure is only logged.
        if let Err(e) = self.mailer.send_withdrawal_notice(&request).await {
            log::error!(
                "Failed to send withdrawal notice for user {}: {e}",
                request.user_id
            );
        }

        Ok(WithdrawResponse {
            success: true,
            message: "Withdrawal requested and balance debited".to_string(),
        })
    }

    fn validate_method(&self, request: &WithdrawRequest) -> AppResult<()> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        match request.metodo.as_str() {
            "pix" => {
                if !present(&request.pix_key_type) || !present(&request.pix_key) {
                    return Err(AppError::ValidationError(
                        "Pix withdrawals require a key type and key".to_string(),
                    ));
                }
            }
            "bank-transfer" => {
                if !present(&request.bank_name)
                    || !present(&request.account_number)
                    || !present(&request.branch_number)
                {
                    return Err(AppError::ValidationError(
                        "Bank transfers require bank, account and branch".to_string(),
                    ));
                }
            }
            other => {
                return Err(AppError::ValidationError(format!(
                    "Unknown withdrawal method: {other}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MailConfig, PagSeguroConfig};
    use crate::models::{PixWebhookAmount, TransactionRecord};
    use sqlx::sqlite::SqlitePoolOptions;

    const USER: &str = "9f3c6a1e-0000-4000-8000-000000000003";

    async fn setup() -> (PaymentService, ProfileService, DbPool) {
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

        let pagseguro = PagSeguroService::new(PagSeguroConfig {
            token: "test-token".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        });
        let mailer = MailerService::new(MailConfig {
            smtp_host: "127.0.0.1".to_string(),
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            from_address: "backend@example.com".to_string(),
            operator_address: "operator@example.com".to_string(),
        })
        .unwrap();

        let service = PaymentService::new(
            pool.clone(),
            profiles.clone(),
            pagseguro,
            mailer,
            PaymentConfig {
                min_deposit: 10.0,
                min_withdrawal: 20.0,
            },
        );

        (service, profiles, pool)
    }

    fn paid_webhook(charge_id: &str, value: i64) -> PixWebhookPayload {
        PixWebhookPayload {
            id: Some(charge_id.to_string()),
            reference_id: Some(USER.to_string()),
            status: Some("PAID".to_string()),
            amount: Some(PixWebhookAmount {
                value,
                currency: Some("BRL".to_string()),
            }),
        }
    }

    async fn transactions(pool: &DbPool) -> Vec<TransactionRecord> {
        sqlx::query_as::<_, TransactionRecord>("SELECT * FROM transactions ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deposit_below_minimum_rejected_before_gateway_call() {
        let (service, _profiles, pool) = setup().await;

        let err = service
            .create_deposit(CreatePixChargeRequest {
                amount: 5.0,
                email: "player@example.com".to_string(),
                user_id: USER.to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(transactions(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_credits_paid_charge_once() {
        let (service, profiles, pool) = setup().await;

        service.handle_pix_webhook(paid_webhook("CHAR_1", 5000)).await.unwrap();
        assert_eq!(profiles.get(USER).await.unwrap().balance, 5000);

        // Replay of the same settlement id must not double-credit.
        service.handle_pix_webhook(paid_webhook("CHAR_1", 5000)).await.unwrap();
        assert_eq!(profiles.get(USER).await.unwrap().balance, 5000);

        let rows = transactions(&pool).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::Deposit);
        assert_eq!(rows[0].status, TransactionStatus::Completed);
        assert_eq!(rows[0].amount, 5000);
        assert_eq!(rows[0].gateway_charge_id.as_deref(), Some("CHAR_1"));
    }

    #[tokio::test]
    async fn test_webhook_ignores_unpaid_status() {
        let (service, profiles, pool) = setup().await;

        let mut payload = paid_webhook("CHAR_2", 5000);
        payload.status = Some("WAITING".to_string());
        service.handle_pix_webhook(payload).await.unwrap();

        assert_eq!(profiles.get(USER).await.unwrap().balance, 0);
        assert!(transactions(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_ignores_non_positive_amount() {
        let (service, profiles, pool) = setup().await;

        for value in [0, -500] {
            service
                .handle_pix_webhook(paid_webhook("CHAR_NEG", value))
                .await
                .unwrap();
        }

        assert_eq!(profiles.get(USER).await.unwrap().balance, 0);
        assert!(transactions(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_rejects_composite_reference() {
        let (service, profiles, _pool) = setup().await;

        let mut payload = paid_webhook("CHAR_3", 5000);
        payload.reference_id = Some(format!("deposit_{USER}_1693200000"));
        service.handle_pix_webhook(payload).await.unwrap();

        assert_eq!(profiles.get(USER).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_webhook_for_unknown_user_is_a_logged_noop() {
        let (service, _profiles, pool) = setup().await;

        let mut payload = paid_webhook("CHAR_4", 5000);
        payload.reference_id = Some("9f3c6a1e-0000-4000-8000-00000000ffff".to_string());
        service.handle_pix_webhook(payload).await.unwrap();

        assert!(transactions(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_withdrawal_below_minimum_rejected_without_side_effects() {
        let (service, profiles, pool) = setup().await;
        service.handle_pix_webhook(paid_webhook("CHAR_5", 10000)).await.unwrap();

        let err = service
            .request_withdrawal(WithdrawRequest {
                valor: 15.0,
                metodo: "pix".to_string(),
                pix_key_type: Some("email".to_string()),
                pix_key: Some("player@example.com".to_string()),
                bank_name: None,
                account_number: None,
                branch_number: None,
                usuario: Some("Jogador".to_string()),
                user_id: USER.to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(profiles.get(USER).await.unwrap().balance, 10000);
        assert_eq!(transactions(&pool).await.len(), 1); // only the deposit
    }

    #[tokio::test]
    async fn test_withdrawal_debits_and_queues_pending_transaction() {
        let (service, profiles, pool) = setup().await;
        service.handle_pix_webhook(paid_webhook("CHAR_6", 10000)).await.unwrap();

        let response = service
            .request_withdrawal(WithdrawRequest {
                valor: 60.0,
                metodo: "pix".to_string(),
                pix_key_type: Some("cpf".to_string()),
                pix_key: Some("123.456.789-00".to_string()),
                bank_name: None,
                account_number: None,
                branch_number: None,
                usuario: Some("Jogador".to_string()),
                user_id: USER.to_string(),
            })
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(profiles.get(USER).await.unwrap().balance, 4000);

        let rows = transactions(&pool).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].kind, TransactionType::Withdrawal);
        assert_eq!(rows[1].status, TransactionStatus::Pending);
        assert_eq!(rows[1].amount, 6000);
        assert!(rows[1].gateway_charge_id.is_none());
    }

    #[tokio::test]
    async fn test_withdrawal_rejected_when_balance_is_short() {
        let (service, profiles, pool) = setup().await;
        service.handle_pix_webhook(paid_webhook("CHAR_7", 3000)).await.unwrap();

        let err = service
            .request_withdrawal(WithdrawRequest {
                valor: 50.0,
                metodo: "pix".to_string(),
                pix_key_type: Some("email".to_string()),
                pix_key: Some("player@example.com".to_string()),
                bank_name: None,
                account_number: None,
                branch_number: None,
                usuario: None,
                user_id: USER.to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds));
        assert_eq!(profiles.get(USER).await.unwrap().balance, 3000);
        assert_eq!(transactions(&pool).await.len(), 1);
    }

    #[tokio::test]
    async fn test_withdrawal_requires_method_fields() {
        let (service, _profiles, _pool) = setup().await;

        let err = service
            .request_withdrawal(WithdrawRequest {
                valor: 50.0,
                metodo: "bank-transfer".to_string(),
                pix_key_type: None,
                pix_key: None,
                bank_name: Some("Banco".to_string()),
                account_number: None,
                branch_number: None,
                usuario: None,
                user_id: USER.to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
