use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::domain::health_screening::{
    Appointment, Reminder, ReminderDto, Screening, ScreeningDto,
};
use tracker_core::Entity;
use uuid::Uuid;

use super::{resource, Tenant};
use crate::error::ApiError;
use crate::server::AppState;

/// `?on=YYYY-MM-DD`, today when absent.
#[derive(Debug, Deserialize)]
pub struct OnDate {
    pub on: Option<NaiveDate>,
}

impl OnDate {
    pub fn or_today(&self) -> NaiveDate {
        self.on.unwrap_or_else(|| Utc::now().date_naive())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/screenings/due", get(due_screenings))
        .route("/api/screenings/:id/complete", post(complete_screening))
        .route("/api/reminders/pending", get(pending_reminders))
        .route("/api/reminders/:id/send", post(send_reminder))
        .merge(resource::routes::<Screening>())
        .merge(resource::routes::<Appointment>())
        .merge(resource::routes::<Reminder>())
}

async fn due_screenings(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    query: Result<Query<OnDate>, QueryRejection>,
) -> Result<Json<Vec<ScreeningDto>>, ApiError> {
    let Query(query) = query?;
    let due = state.service.due_screenings(tenant, query.or_today()).await?;
    Ok(Json(due.into_iter().map(Entity::to_dto).collect()))
}

async fn complete_screening(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnDate>, QueryRejection>,
) -> Result<Json<ScreeningDto>, ApiError> {
    let Path(id) = path?;
    let Query(query) = query?;
    let screening = state
        .service
        .complete_screening(tenant, id, query.or_today())
        .await?;
    Ok(Json(screening.to_dto()))
}

async fn pending_reminders(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
) -> Result<Json<Vec<ReminderDto>>, ApiError> {
    let pending = state.service.pending_reminders(tenant, Utc::now()).await?;
    Ok(Json(pending.into_iter().map(Entity::to_dto).collect()))
}

async fn send_reminder(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReminderDto>, ApiError> {
    let Path(id) = path?;
    let reminder = state.service.send_reminder(tenant, id).await?;
    Ok(Json(reminder.to_dto()))
}
