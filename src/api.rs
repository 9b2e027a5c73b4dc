use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bankledger_core::StoreError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::{
    dto::{AccountCreateDto, AccountDto, AmountDto, TransferDto},
    service::{AccountService, ServiceError},
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
    /// `None` when no Prometheus recorder is installed (tests, embedding).
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

fn status_of(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Store(StoreError::Validation { .. })
        | ServiceError::InvalidAmount(_)
        | ServiceError::SameAccount(_)
        | ServiceError::AmountOverflow { .. } => StatusCode::BAD_REQUEST,
        ServiceError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ServiceError::Store(StoreError::Unsupported(_)) => StatusCode::METHOD_NOT_ALLOWED,
        ServiceError::InsufficientFunds { .. } | ServiceError::CurrencyMismatch { .. } => {
            StatusCode::CONFLICT
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        metrics::increment_counter!(
            "bankledger_rejected_requests_total",
            "status" => status.as_u16().to_string()
        );
        (
            status,
            Json(ErrorBody {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/deposit", post(deposit))
        .route("/accounts/:id/withdraw", post(withdraw))
        .route("/transfers", post(transfer))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

pub async fn list_accounts(State(state): State<AppState>) -> Json<Vec<AccountDto>> {
    Json(state.service.get_all())
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountDto>, ServiceError> {
    state.service.get_by_id(&id).map(Json)
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<AccountCreateDto>,
) -> Result<Json<AccountDto>, ServiceError> {
    state.service.create_account(body).map(Json)
}

pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AmountDto>,
) -> Result<Json<AccountDto>, ServiceError> {
    state.service.deposit(&id, body).map(Json)
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AmountDto>,
) -> Result<Json<AccountDto>, ServiceError> {
    state.service.withdraw(&id, body).map(Json)
}

pub async fn transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferDto>,
) -> Result<Json<AccountDto>, ServiceError> {
    state.service.transfer(body).map(Json)
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
