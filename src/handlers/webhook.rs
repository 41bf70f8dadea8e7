use crate::models::PixWebhookPayload;
use crate::services::PaymentService;
use actix_web::{HttpResponse, Result, web};

/// PagSeguro delivers payment notifications here. The gateway treats any
/// non-200 as undeliverable, so this endpoint acknowledges everything and
/// leaves problems to the log.
#[utoipa::path(
    post,
    path = "/webhook-pagseguro",
    tag = "webhook",
    responses(
        (status = 200, description = "Notification acknowledged")
    )
)]
pub async fn pagseguro_webhook(
    payment_service: web::Data<PaymentService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let payload: PixWebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            log::error!("Undecodable PagSeguro webhook body: {e}");
            return Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })));
        }
    };

    if let Err(e) = payment_service.handle_pix_webhook(payload).await {
        log::error!("Failed to process PagSeguro webhook: {e}");
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })))
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhook-pagseguro", web::post().to(pagseguro_webhook));
}
