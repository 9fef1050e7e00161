//! Generic CRUD routes under `/api/<collection>` for any [`Entity`].

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracker_core::{Entity, ListQuery, TrackerError};
use uuid::Uuid;

use super::Tenant;
use crate::error::ApiError;
use crate::server::AppState;

pub fn routes<E: Entity>() -> Router<AppState> {
    let collection = format!("/api/{}", E::COLLECTION);
    let item = format!("{collection}/:id");
    Router::new()
        .route(&collection, get(list::<E>).post(create::<E>))
        .route(&item, get(fetch::<E>).put(update::<E>).delete(remove::<E>))
}

/// Builds a [`ListQuery`] from `limit`, `offset` and, for child entities,
/// the parent id field (e.g. `?screening_id=...`). Other keys are ignored.
pub fn list_query<E: Entity>(params: &HashMap<String, String>) -> Result<ListQuery, ApiError> {
    let number = |key: &str| -> Result<Option<usize>, ApiError> {
        params
            .get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ApiError::bad_request(format!("{key} must be a non-negative integer")))
            })
            .transpose()
    };
    let parent_id = match E::PARENT {
        Some(parent) => params
            .get(parent.field)
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|_| ApiError::bad_request(format!("{} must be a UUID", parent.field)))
            })
            .transpose()?,
        None => None,
    };
    Ok(ListQuery {
        parent_id,
        limit: number("limit")?,
        offset: number("offset")?,
    })
}

async fn list<E: Entity>(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<E::Dto>>, ApiError> {
    let Query(params) = params?;
    let query = list_query::<E>(&params)?;
    let rows = state.service.list::<E>(tenant, &query).await?;
    Ok(Json(rows.into_iter().map(Entity::to_dto).collect()))
}

async fn create<E: Entity>(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: Result<Json<E::Draft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = payload?;
    let entity = state.service.create::<E>(tenant, draft).await?;
    Ok((StatusCode::CREATED, Json(entity.to_dto())))
}

async fn fetch<E: Entity>(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<E::Dto>, ApiError> {
    let Path(id) = path?;
    let entity = state
        .service
        .get::<E>(tenant, id)
        .await?
        .ok_or_else(|| TrackerError::not_found(E::KIND, id))?;
    Ok(Json(entity.to_dto()))
}

async fn update<E: Entity>(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<E::Draft>, JsonRejection>,
) -> Result<Json<E::Dto>, ApiError> {
    let Path(id) = path?;
    let Json(draft) = payload?;
    let entity = state
        .service
        .update::<E>(tenant, id, draft)
        .await?
        .ok_or_else(|| TrackerError::not_found(E::KIND, id))?;
    Ok(Json(entity.to_dto()))
}

async fn remove<E: Entity>(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    if state.service.delete::<E>(tenant, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(TrackerError::not_found(E::KIND, id).into())
    }
}
