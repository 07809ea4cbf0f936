use axum::Router;
use axum::http::Request;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::AppState;
use super::handlers::{
    account_summary, get_account, get_account_by_username, health_check, list_accounts,
    list_movements, loan, transfer,
};

pub fn create_router(state: AppState) -> Router {
    let accounts_routes = Router::new()
        .route("/", get(list_accounts))
        .route("/{account_id}", get(get_account))
        .route("/{account_id}/summary", get(account_summary))
        .route("/by-username/{username}", get(get_account_by_username));

    Router::new()
        .route("/health", get(health_check))
        .nest("/accounts", accounts_routes)
        .route("/movements/{account_id}", get(list_movements))
        .route("/transfer", post(transfer))
        .route("/loan", post(loan))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}
