use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracker_core::domain::vehicle_maintenance::{
    MaintenanceSchedule, MaintenanceScheduleDto, ServiceRecord, ServiceRecordDraft,
    ServiceRecordDto, ServiceType, Vehicle, VehicleDto,
};
use tracker_core::Entity;
use uuid::Uuid;

use super::health_screening::OnDate;
use super::{resource, Tenant};
use crate::error::ApiError;
use crate::server::AppState;

/// Body of `POST /api/vehicles/:id/services`; the vehicle comes from the path.
#[derive(Debug, Deserialize)]
struct ServiceRequest {
    service_type: ServiceType,
    #[serde(default)]
    description: Option<String>,
    service_date: NaiveDate,
    mileage_at_service: f64,
    #[serde(default)]
    cost: f64,
    #[serde(default)]
    service_provider: Option<String>,
    #[serde(default)]
    invoice_number: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct ServiceResponse {
    record: ServiceRecordDto,
    vehicle: VehicleDto,
    schedules_reset: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/vehicles/:id/services", post(log_service))
        .route("/api/vehicles/:id/maintenance-due", get(maintenance_due))
        .merge(resource::routes::<Vehicle>())
        .merge(resource::routes::<ServiceRecord>())
        .merge(resource::routes::<MaintenanceSchedule>())
}

async fn log_service(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    let Path(vehicle_id) = path?;
    let Json(request) = payload?;
    let draft = ServiceRecordDraft {
        vehicle_id,
        service_type: request.service_type,
        description: request.description,
        service_date: request.service_date,
        mileage_at_service: request.mileage_at_service,
        cost: request.cost,
        service_provider: request.service_provider,
        invoice_number: request.invoice_number,
        notes: request.notes,
    };
    let outcome = state.service.log_service(tenant, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ServiceResponse {
            record: outcome.record.to_dto(),
            vehicle: outcome.vehicle.to_dto(),
            schedules_reset: outcome.schedules_reset,
        }),
    ))
}

async fn maintenance_due(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnDate>, QueryRejection>,
) -> Result<Json<Vec<MaintenanceScheduleDto>>, ApiError> {
    let Path(vehicle_id) = path?;
    let Query(query) = query?;
    let due = state
        .service
        .maintenance_due(tenant, vehicle_id, query.or_today())
        .await?;
    Ok(Json(due.into_iter().map(Entity::to_dto).collect()))
}
