use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::{ProfileResponse, RecentBetsQuery};
use crate::services::{BetService, ProfileService};
use crate::utils::PaginationParams;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile with balances and statistics", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match profile_service.load_or_create(&user.id, &user.email).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ProfileResponse::from(profile)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/bets/recent",
    tag = "profile",
    params(
        ("limit" = Option<u32>, Query, description = "How many bets, default 5, max 50")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Latest settled bets, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_recent_bets(
    bet_service: web::Data<BetService>,
    req: HttpRequest,
    query: web::Query<RecentBetsQuery>,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match bet_service.recent_bets(&user.id, query.limit).await {
        Ok(bets) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": bets
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/bets",
    tag = "profile",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size, max 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated bet history"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_bet_history(
    bet_service: web::Data<BetService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match bet_service.bet_history(&user.id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "profile",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size, max 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated deposit and withdrawal history"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_transaction_history(
    bet_service: web::Data<BetService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let Some(user) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match bet_service.transaction_history(&user.id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn profile_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/profile", web::get().to(get_profile))
        .route("/bets/recent", web::get().to(get_recent_bets))
        .route("/bets", web::get().to(get_bet_history))
        .route("/transactions", web::get().to(get_transaction_history));
}
