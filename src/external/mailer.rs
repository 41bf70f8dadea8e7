use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use crate::models::WithdrawRequest;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Clone)]
pub struct MailerService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: MailConfig,
}

impl MailerService {
    pub fn new(config: MailConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self { transport, config })
    }

    /// Notifies the operator mailbox of a withdrawal request. The actual
    /// fund transfer is manual; this mail is the only trigger.
    pub async fn send_withdrawal_notice(&self, request: &WithdrawRequest) -> AppResult<()> {
        let message = Message::builder()
            .from(self.parse_address(&self.config.from_address)?)
            .to(self.parse_address(&self.config.operator_address)?)
            .subject("Nova solicitação de saque")
            .header(ContentType::TEXT_HTML)
            .body(withdrawal_notice_body(request))?;

        self.transport.send(message).await?;
        log::info!(
            "Withdrawal notice sent to operator for user {}",
            request.user_id
        );
        Ok(())
    }

    fn parse_address(&self, raw: &str) -> AppResult<lettre::message::Mailbox> {
        raw.parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid mail address {raw}: {e}")))
    }
}

fn withdrawal_notice_body(request: &WithdrawRequest) -> String {
    let mut body = String::from("<b>Solicitação de saque recebida:</b><br>");
    body.push_str(&format!(
        "<b>Usuário:</b> {}<br>",
        request.usuario.as_deref().unwrap_or("Desconhecido")
    ));
    body.push_str(&format!("<b>Valor:</b> R$ {:.2}<br>", request.valor));
    body.push_str(&format!("<b>Método:</b> {}<br>", request.metodo));

    if request.metodo == "pix" {
        body.push_str(&format!(
            "<b>Tipo de chave PIX:</b> {}<br>",
            request.pix_key_type.as_deref().unwrap_or("")
        ));
        body.push_str(&format!(
            "<b>Chave PIX:</b> {}<br>",
            request.pix_key.as_deref().unwrap_or("")
        ));
    }
    if request.metodo == "bank-transfer" {
        body.push_str(&format!(
            "<b>Banco:</b> {}<br>",
            request.bank_name.as_deref().unwrap_or("")
        ));
        body.push_str(&format!(
            "<b>Conta:</b> {}<br>",
            request.account_number.as_deref().unwrap_or("")
        ));
        body.push_str(&format!(
            "<b>Agência:</b> {}<br>",
            request.branch_number.as_deref().unwrap_or("")
        ));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pix_request() -> WithdrawRequest {
        WithdrawRequest {
            valor: 50.0,
            metodo: "pix".to_string(),
            pix_key_type: Some("email".to_string()),
            pix_key: Some("player@example.com".to_string()),
            bank_name: None,
            account_number: None,
            branch_number: None,
            usuario: Some("Jogador".to_string()),
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn test_withdrawal_notice_body_pix() {
        let body = withdrawal_notice_body(&pix_request());
        assert!(body.contains("R$ 50.00"));
        assert!(body.contains("Chave PIX:</b> player@example.com"));
        assert!(!body.contains("Banco"));
    }

    #[test]
    fn test_withdrawal_notice_body_bank_transfer() {
        let mut request = pix_request();
        request.metodo = "bank-transfer".to_string();
        request.bank_name = Some("Banco do Brasil".to_string());
        request.account_number = Some("12345-6".to_string());
        request.branch_number = Some("0001".to_string());

        let body = withdrawal_notice_body(&request);
        assert!(body.contains("Banco do Brasil"));
        assert!(!body.contains("Chave PIX"));
    }
}
