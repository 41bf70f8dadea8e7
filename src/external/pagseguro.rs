use crate::config::PagSeguroConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct PixPaymentRequest {
    reference_id: String,
    description: String,
    amount: PixAmount,
    payment_method: PixPaymentMethod,
    payer: PixPayer,
}

#[derive(Debug, Serialize)]
struct PixAmount {
    /// Centavos.
    value: i64,
    currency: String,
}

#[derive(Debug, Serialize)]
struct PixPaymentMethod {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PixPayer {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct PixCharge {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub qr_codes: Vec<PixQrCode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PixQrCode {
    pub base64: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone)]
pub struct PagSeguroService {
    client: Client,
    config: PagSeguroConfig,
}

impl PagSeguroService {
    pub fn new(config: PagSeguroConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a Pix charge and returns the gateway's QR code data.
    /// `reference_id` must be the raw user id; the webhook resolves the
    /// depositor from it.
    pub async fn create_pix_charge(
        &self,
        reference_id: &str,
        value_centavos: i64,
        payer_email: &str,
    ) -> AppResult<PixCharge> {
        let url = format!("{}/pix/payments", self.config.base_url);

        let payload = PixPaymentRequest {
            reference_id: reference_id.to_string(),
            description: "Depósito via Pix".to_string(),
            amount: PixAmount {
                value: value_centavos,
                currency: "BRL".to_string(),
            },
            payment_method: PixPaymentMethod {
                kind: "PIX".to_string(),
            },
            payer: PixPayer {
                email: payer_email.to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("PagSeguro charge creation failed: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "Pix charge creation failed: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_response_parsing() {
        let raw = r#"{
            "id": "CHAR_1234",
            "status": "WAITING",
            "qr_codes": [{"base64": "aGVsbG8=", "text": "00020126pix"}]
        }"#;

        let charge: PixCharge = serde_json::from_str(raw).unwrap();
        assert_eq!(charge.id, "CHAR_1234");
        assert_eq!(charge.qr_codes.len(), 1);
        assert_eq!(charge.qr_codes[0].text.as_deref(), Some("00020126pix"));
    }

    #[test]
    fn test_charge_response_without_qr_codes() {
        let raw = r#"{"id": "CHAR_5678", "status": "DECLINED"}"#;

        let charge: PixCharge = serde_json::from_str(raw).unwrap();
        assert!(charge.qr_codes.is_empty());
    }
}
