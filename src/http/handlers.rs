use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;

use crate::application::{LoanReceipt, TransferReceipt};
use crate::domain::{Account, AccountId, AccountSummary, Movement};

use super::models::{LoanRequest, OperationResponse, TransferRequest, parse_amount};
use super::{ApiError, AppState};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.service.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(err) => {
            error!(error = ?err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": "Storage is unreachable"
                })),
            )
        }
    }
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.service.list_accounts().await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    id: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<Account>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.service.get_account(id).await?))
}

pub async fn get_account_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.service.get_account_by_username(&username).await?))
}

pub async fn account_summary(
    State(state): State<AppState>,
    id: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<AccountSummary>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.service.summary(id).await?))
}

pub async fn list_movements(
    State(state): State<AppState>,
    id: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<Vec<Movement>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.service.movements_of(id).await?))
}

pub async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<OperationResponse<TransferReceipt>>, ApiError> {
    let Json(request) = payload?;
    let amount_cents = parse_amount(&request.amount)?;

    let receipt = state
        .service
        .transfer(request.sender_id, request.receiver_id, amount_cents)
        .await?;

    Ok(Json(OperationResponse {
        message: "Transfer successful",
        receipt,
    }))
}

pub async fn loan(
    State(state): State<AppState>,
    payload: Result<Json<LoanRequest>, JsonRejection>,
) -> Result<Json<OperationResponse<LoanReceipt>>, ApiError> {
    let Json(request) = payload?;
    let amount_cents = parse_amount(&request.amount)?;

    let receipt = state
        .service
        .request_loan(request.account_id, amount_cents)
        .await?;

    Ok(Json(OperationResponse {
        message: "Loan request successful",
        receipt,
    }))
}
