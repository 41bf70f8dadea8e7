use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /pagamento`. Amount is decimal BRL.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePixChargeRequest {
    pub amount: f64,
    pub email: String,
    pub user_id: String,
}

/// QR code pair returned to the browser for rendering.
#[derive(Debug, Serialize, ToSchema)]
pub struct PixChargeResponse {
    pub id: String,
    pub status: String,
    /// Base64-encoded PNG.
    pub qr_code: String,
    /// Pix "copia e cola" payment string.
    pub qr_code_text: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: f64,
}

/// Body of `POST /api/solicitar-saque`. Field names follow the legacy
/// browser contract.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    pub valor: f64,
    pub metodo: String,
    #[serde(rename = "pixKeyType")]
    pub pix_key_type: Option<String>,
    #[serde(rename = "pixKey")]
    pub pix_key: Option<String>,
    #[serde(rename = "bankName")]
    pub bank_name: Option<String>,
    #[serde(rename = "accountNumber")]
    pub account_number: Option<String>,
    #[serde(rename = "branchNumber")]
    pub branch_number: Option<String>,
    pub usuario: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    pub success: bool,
    pub message: String,
}

/// Charge payload delivered by the PagSeguro webhook. Everything is
/// optional; missing pieces degrade to a logged no-op.
#[derive(Debug, Deserialize)]
pub struct PixWebhookPayload {
    pub id: Option<String>,
    pub reference_id: Option<String>,
    pub status: Option<String>,
    pub amount: Option<PixWebhookAmount>,
}

#[derive(Debug, Deserialize)]
pub struct PixWebhookAmount {
    /// Centavos.
    pub value: i64,
    pub currency: Option<String>,
}
