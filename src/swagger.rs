use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::game::get_ranges,
        handlers::game::select_range,
        handlers::game::place_bet,
        handlers::profile::get_profile,
        handlers::profile::get_recent_bets,
        handlers::profile::get_bet_history,
        handlers::profile::get_transaction_history,
        handlers::payment::create_payment,
        handlers::payment::get_balance,
        handlers::payment::request_withdrawal,
        handlers::webhook::pagseguro_webhook,
    ),
    components(
        schemas(
            Profile,
            ProfileResponse,
            BetMode,
            BetRecord,
            BetResponse,
            RangeOption,
            SelectRangeRequest,
            PlaceBetRequest,
            HintDirection,
            BetOutcome,
            TransactionType,
            TransactionStatus,
            TransactionRecord,
            TransactionResponse,
            CreatePixChargeRequest,
            PixChargeResponse,
            BalanceResponse,
            WithdrawRequest,
            WithdrawResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "game", description = "Number-guessing wager API"),
        (name = "profile", description = "Profile, bet and transaction history API"),
        (name = "payment", description = "Pix deposit and withdrawal API"),
        (name = "webhook", description = "Payment gateway callbacks"),
    ),
    info(
        title = "Palpite Backend API",
        version = "1.0.0",
        description = "Number-guessing game backend REST API documentation",
    ),
    servers(
        (url = "/", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
