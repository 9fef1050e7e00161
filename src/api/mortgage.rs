use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracker_core::domain::mortgage::{
    Mortgage, MortgageDto, Payment, PaymentDto, PayoffComparison, RefinanceScenario,
};
use tracker_core::Entity;
use uuid::Uuid;

use super::{resource, Tenant};
use crate::app::mortgage_use_case::PaymentRequest;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct PayoffQuery {
    #[serde(default)]
    extra: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    mortgage: MortgageDto,
    payment: PaymentDto,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/mortgages/:id/payments", post(record_payment))
        .route("/api/mortgages/:id/payoff", get(payoff))
        .merge(resource::routes::<Mortgage>())
        .merge(resource::routes::<Payment>())
        .merge(resource::routes::<RefinanceScenario>())
}

async fn record_payment(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let Path(mortgage_id) = path?;
    let Json(request) = payload?;
    let outcome = state
        .service
        .record_payment(tenant, mortgage_id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            mortgage: outcome.mortgage.to_dto(),
            payment: outcome.payment.to_dto(),
        }),
    ))
}

async fn payoff(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<PayoffQuery>, QueryRejection>,
) -> Result<Json<PayoffComparison>, ApiError> {
    let Path(mortgage_id) = path?;
    let Query(query) = query?;
    let comparison = state
        .service
        .payoff_projection(
            tenant,
            mortgage_id,
            query.extra.unwrap_or(0.0),
            Utc::now().date_naive(),
        )
        .await?;
    Ok(Json(comparison))
}
