use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::{PlaceBetRequest, SelectRangeRequest};
use crate::services::WagerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/game/ranges",
    tag = "game",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Available range options"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_ranges(wager_service: web::Data<WagerService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": wager_service.range_options()
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/game/select-range",
    tag = "game",
    request_body = SelectRangeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Range selected, any active wager discarded"),
        (status = 400, description = "Unknown range"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn select_range(
    wager_service: web::Data<WagerService>,
    req: HttpRequest,
    request: web::Json<SelectRangeRequest>,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match wager_service.select_range(&user.id, request.range).await {
        Ok(option) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": option
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/game/bet",
    tag = "game",
    request_body = PlaceBetRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Guess evaluated: hint, win or loss"),
        (status = 400, description = "Invalid range, guess or amount, or insufficient balance"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn place_bet(
    wager_service: web::Data<WagerService>,
    req: HttpRequest,
    request: web::Json<PlaceBetRequest>,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match wager_service.place_bet(&user.id, request.into_inner()).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": outcome
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn game_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/game")
            .route("/ranges", web::get().to(get_ranges))
            .route("/select-range", web::post().to(select_range))
            .route("/bet", web::post().to(place_bet)),
    );
}
