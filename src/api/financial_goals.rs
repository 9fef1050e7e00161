use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracker_core::domain::financial_goals::{
    Contribution, ContributionDto, Goal, GoalDto, Milestone, MilestoneDto,
};
use tracker_core::Entity;
use uuid::Uuid;

use super::health_screening::OnDate;
use super::{resource, Tenant};
use crate::app::financial_goals_use_case::ContributionRequest;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
struct ContributionResponse {
    goal: GoalDto,
    contribution: ContributionDto,
    milestones_reached: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/goals/:id/contributions", post(record_contribution))
        .route("/api/milestones/:id/complete", post(complete_milestone))
        .merge(resource::routes::<Goal>())
        .merge(resource::routes::<Milestone>())
        .merge(resource::routes::<Contribution>())
}

async fn record_contribution(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ContributionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContributionResponse>), ApiError> {
    let Path(goal_id) = path?;
    let Json(request) = payload?;
    let outcome = state
        .service
        .record_contribution(tenant, goal_id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ContributionResponse {
            goal: outcome.goal.to_dto(),
            contribution: outcome.contribution.to_dto(),
            milestones_reached: outcome.milestones_reached,
        }),
    ))
}

async fn complete_milestone(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnDate>, QueryRejection>,
) -> Result<Json<MilestoneDto>, ApiError> {
    let Path(id) = path?;
    let Query(query) = query?;
    let milestone = state
        .service
        .complete_milestone(tenant, id, query.or_today())
        .await?;
    Ok(Json(milestone.to_dto()))
}
