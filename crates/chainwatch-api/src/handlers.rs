//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use chainwatch_core::types::format_quantity;
use chainwatch_core::{Parser, WatchError};

use crate::error::{ApiError, ApiResult};
use crate::response::{
    CurrentBlockResponse, SubscribeRequest, TransactionsQuery, TransactionsResponse,
};

pub type AppState = Arc<Parser>;

/// Handler for GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// Handler for GET /block/number
pub async fn current_block(State(parser): State<AppState>) -> ApiResult<Json<CurrentBlockResponse>> {
    match parser.current_block().await {
        Ok(number) => Ok(Json(CurrentBlockResponse {
            block: format_quantity(number),
        })),
        Err(e) => {
            if !e.is_absence() {
                tracing::warn!(error = %e, "Failed to read current block");
            }
            Err(ApiError::Unprocessable("fail get block".into()))
        }
    }
}

/// Handler for POST /address/subscribe
pub async fn subscribe(
    State(parser): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload
        .map_err(|e| ApiError::BadRequest(format!("fail decode request: {}", e.body_text())))?;

    match parser.subscribe(&req.address).await {
        Ok(()) => {
            tracing::info!(address = %req.address, "Address subscribed");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(WatchError::InvalidAddress(_)) => Err(ApiError::BadRequest("address is required".into())),
        Err(e) => {
            tracing::warn!(address = %req.address, error = %e, "Subscribe failed");
            Err(ApiError::Unprocessable("fail subscribe".into()))
        }
    }
}

/// Handler for GET /address/transaction?address=
pub async fn transactions(
    State(parser): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<Json<TransactionsResponse>> {
    let address = query.address.unwrap_or_default();

    match parser.transactions(&address).await {
        Ok(transactions) => Ok(Json(TransactionsResponse { transactions })),
        Err(WatchError::InvalidAddress(_)) => Err(ApiError::BadRequest("address is required".into())),
        Err(e) => {
            tracing::warn!(%address, error = %e, "Transaction lookup failed");
            Err(ApiError::Unprocessable("fail get transactions".into()))
        }
    }
}
