use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::domain::time_audit::{
    AuditReport, AuditReportDto, TimeBlock, TimeBlockDto, TimeGoal, TimeGoalDto,
};
use tracker_core::Entity;
use uuid::Uuid;

use super::health_screening::OnDate;
use super::{resource, Tenant};
use crate::app::time_audit_use_case::{GenerateReportRequest, GoalProgress};
use crate::error::ApiError;
use crate::server::AppState;

/// Optional body of `POST /api/time-blocks/:id/end`; now when absent.
#[derive(Debug, Default, Deserialize)]
struct EndRequest {
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WeekQuery {
    #[serde(default)]
    week_start: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/time-blocks/:id/end", post(end_time_block))
        .route("/api/audit-reports/generate", post(generate_report))
        .route("/api/time-goals/:id/deactivate", post(deactivate_goal))
        .route("/api/time-goals/:id/progress", get(goal_progress))
        .merge(resource::routes::<TimeBlock>())
        .merge(resource::routes::<TimeGoal>())
        .merge(resource::routes::<AuditReport>())
}

async fn end_time_block(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EndRequest>, JsonRejection>,
) -> Result<Json<TimeBlockDto>, ApiError> {
    let Path(id) = path?;
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => EndRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let block = state
        .service
        .end_time_block(tenant, id, request.end_time.unwrap_or_else(Utc::now))
        .await?;
    Ok(Json(block.to_dto()))
}

async fn generate_report(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuditReportDto>), ApiError> {
    let Json(request) = payload?;
    let report = state.service.generate_audit_report(tenant, request).await?;
    Ok((StatusCode::CREATED, Json(report.to_dto())))
}

async fn deactivate_goal(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnDate>, QueryRejection>,
) -> Result<Json<TimeGoalDto>, ApiError> {
    let Path(id) = path?;
    let Query(query) = query?;
    let goal = state
        .service
        .deactivate_time_goal(tenant, id, query.or_today())
        .await?;
    Ok(Json(goal.to_dto()))
}

/// Defaults to the Monday of the current week.
async fn goal_progress(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Result<Json<GoalProgress>, ApiError> {
    let Path(id) = path?;
    let Query(query) = query?;
    let week_start = query.week_start.unwrap_or_else(|| {
        let today = Utc::now().date_naive();
        today - Duration::days(today.weekday().num_days_from_monday() as i64)
    });
    let progress = state
        .service
        .time_goal_progress(tenant, id, week_start)
        .await?;
    Ok(Json(progress))
}
