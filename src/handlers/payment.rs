use crate::models::{
    BalanceQuery, BalanceResponse, CreatePixChargeRequest, PixChargeResponse, WithdrawRequest,
    WithdrawResponse,
};
use crate::services::PaymentService;
use actix_web::{HttpResponse, ResponseError, Result, web};

// The three routes below keep the response shapes the deployed frontend
// already consumes. They are intentionally not wrapped in the
// success/data envelope the /api/v1 surface uses.

#[utoipa::path(
    post,
    path = "/pagamento",
    tag = "payment",
    request_body = CreatePixChargeRequest,
    responses(
        (status = 200, description = "Pix charge with QR code", body = PixChargeResponse),
        (status = 400, description = "Amount below minimum or missing fields"),
        (status = 502, description = "Gateway error")
    )
)]
pub async fn create_payment(
    payment_service: web::Data<PaymentService>,
    request: web::Json<CreatePixChargeRequest>,
) -> Result<HttpResponse> {
    match payment_service.create_deposit(request.into_inner()).await {
        Ok(charge) => Ok(HttpResponse::Ok().json(charge)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/saldo",
    tag = "payment",
    params(
        ("user_id" = String, Query, description = "Profile id")
    ),
    responses(
        (status = 200, description = "Real-money balance in BRL", body = BalanceResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_balance(
    payment_service: web::Data<PaymentService>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse> {
    match payment_service.balance(&query.user_id).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(balance)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/solicitar-saque",
    tag = "payment",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal queued, balance debited", body = WithdrawResponse),
        (status = 400, description = "Invalid amount, missing method fields or insufficient balance"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn request_withdrawal(
    payment_service: web::Data<PaymentService>,
    request: web::Json<WithdrawRequest>,
) -> Result<HttpResponse> {
    match payment_service.request_withdrawal(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pagamento", web::post().to(create_payment))
        .route("/api/saldo", web::get().to(get_balance))
        .route("/api/solicitar-saque", web::post().to(request_withdrawal));
}
