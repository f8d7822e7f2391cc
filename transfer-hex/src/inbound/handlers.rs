//! HTTP request handlers and the error-to-status mapping.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;

use transfer_types::{
    CreateTransferRequest, ErrorCode, ErrorResponse, InitiationError, Money, TransactionResponse,
    TransactionStatus, UserId, WalletError,
};

use crate::TransferInitiationService;

/// Application state shared across handlers.
pub struct AppState {
    pub initiation: Arc<TransferInitiationService>,
}

/// Wrapper to implement IntoResponse for InitiationError (orphan rule
/// workaround).
pub struct ApiError(pub InitiationError);

impl From<InitiationError> for ApiError {
    fn from(err: InitiationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            InitiationError::AccountNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::InvalidUser, self.0.to_string()),
            ),
            InitiationError::ResourceLocked(_) => (
                StatusCode::LOCKED,
                ErrorResponse::new(
                    ErrorCode::ResourceLocked,
                    "user resource is locked by another process",
                ),
            ),
            InitiationError::Business { code, ref message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(code, message.clone()),
            ),
            InitiationError::Wallet(ref err) => wallet_error_response(err),
            InitiationError::Repo(ref err) => {
                tracing::error!(error = %err, "request processing interrupted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(ErrorCode::ServerError, "process was interrupted"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Maps wallet failures onto the status the caller is owed: their own
/// mistakes come back 4xx, wallet unavailability 502/504, everything the
/// wallet answered nonsensically 500.
fn wallet_error_response(err: &WalletError) -> (StatusCode, ErrorResponse) {
    match err {
        WalletError::InvalidRequest => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(ErrorCode::InvalidRequest, err.to_string()),
        ),
        WalletError::UserNotFound => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(ErrorCode::InvalidUser, err.to_string()),
        ),
        WalletError::Client { status } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
            ErrorResponse::new(ErrorCode::ClientError, err.to_string()),
        ),
        WalletError::Upstream { .. } => (
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new(ErrorCode::BadGateway, err.to_string()),
        ),
        WalletError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            ErrorResponse::new(ErrorCode::GatewayTimeout, err.to_string()),
        ),
        WalletError::Transport(_) | WalletError::InvalidBody(_) => {
            tracing::error!(error = %err, "request processing interrupted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(ErrorCode::ServerError, "process was interrupted"),
            )
        }
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Starts a wallet-to-bank transfer.
#[tracing::instrument(skip(state), fields(user_id = req.user_id, amount = %req.amount))]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let amount = Money::new(req.amount, state.initiation.currency());
    let transfer = state
        .initiation
        .initiate(UserId::new(req.user_id), amount)
        .await?;

    let body =
        TransactionResponse::from_withdrawal(TransactionStatus::Processing, transfer.withdrawal());
    Ok((StatusCode::CREATED, Json(body)))
}

fn validate(req: &CreateTransferRequest) -> Result<(), ApiError> {
    let mut problems = Vec::new();
    if req.user_id < 1 {
        problems.push("user id should not be less than 1");
    }
    if req.amount < Decimal::ONE {
        problems.push("amount should not be less than 1");
    }
    if problems.is_empty() {
        return Ok(());
    }
    Err(ApiError(InitiationError::Business {
        code: ErrorCode::InvalidRequest,
        message: problems.join("; "),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use transfer_types::RepoError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_account_not_found_maps_to_404_invalid_user() {
        let response = ApiError(InitiationError::AccountNotFound(UserId::new(7))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "INVALID_USER");
    }

    #[tokio::test]
    async fn test_resource_locked_maps_to_423() {
        let response =
            ApiError(InitiationError::ResourceLocked("userId=7".into())).into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "RESOURCE_LOCKED");
        assert_eq!(body["message"], "user resource is locked by another process");
    }

    #[tokio::test]
    async fn test_insufficient_funds_maps_to_400() {
        let response = ApiError(InitiationError::insufficient_funds(
            "user balance not sufficient to process transfer",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INSUFFICIENT_FUNDS");
    }

    #[tokio::test]
    async fn test_wallet_timeout_maps_to_504() {
        let response = ApiError(InitiationError::Wallet(WalletError::Timeout)).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["code"], "GATEWAY_TIMEOUT");
    }

    #[tokio::test]
    async fn test_wallet_upstream_maps_to_502() {
        let response =
            ApiError(InitiationError::Wallet(WalletError::Upstream { status: 503 })).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], "BAD_GATEWAY");
    }

    #[tokio::test]
    async fn test_repo_failure_hides_detail_behind_500() {
        let response =
            ApiError(InitiationError::Repo(RepoError::Database("disk full".into()))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "SERVER_ERROR");
        assert_eq!(body["message"], "process was interrupted");
    }

    #[tokio::test]
    async fn test_validation_rejects_zero_user_and_amount() {
        let request = CreateTransferRequest {
            user_id: 0,
            amount: dec!(0),
        };
        let response = validate(&request).unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert_eq!(
            body["message"],
            "user id should not be less than 1; amount should not be less than 1"
        );
    }

    #[test]
    fn test_validation_accepts_minimal_request() {
        let request = CreateTransferRequest {
            user_id: 1,
            amount: dec!(1),
        };
        assert!(validate(&request).is_ok());
    }
}
