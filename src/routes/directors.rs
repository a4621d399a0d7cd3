use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::WithRejection;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;

use crate::{
    AppState,
    entities::{director, movie},
    error::{AppError, AppResult},
    models::NamePayload,
    store,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/directors", get(list).post(create))
        .route("/directors/", get(list).post(create))
        .route("/directors/{id}", get(fetch).put(replace).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<director::Model>>> {
    let directors = store::list::<director::Entity, _>(&state.db, Condition::all()).await?;
    Ok(Json(directors))
}

async fn create(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> AppResult<Response> {
    let key = state.config.key_policy.create_key(payload.id)?;
    let id = store::insert(&state.db, payload.into_director(key)).await?;

    info!(director_id = id, "director created");
    Ok((StatusCode::CREATED, [(header::LOCATION, format!("/directors/{id}"))]).into_response())
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<director::Model>> {
    let director = store::find::<director::Entity, _>(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("director", id))?;
    Ok(Json(director))
}

async fn replace(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> AppResult<StatusCode> {
    let new_id = state.config.key_policy.replace_key(id, payload.id)?;

    let txn = state.db.begin().await?;
    if !store::exists::<director::Entity, _>(&txn, id).await? {
        return Err(AppError::not_found("director", id));
    }
    if state.config.enforce_references && new_id != id && is_referenced(&txn, id).await? {
        return Err(AppError::ConstraintViolation(format!(
            "director {id} is referenced by movies and cannot change its id"
        )));
    }
    store::replace(&txn, id, payload.into_director(Some(new_id))).await?;
    txn.commit().await?;

    info!(director_id = id, new_id, "director replaced");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    let txn = state.db.begin().await?;
    if !store::exists::<director::Entity, _>(&txn, id).await? {
        return Err(AppError::not_found("director", id));
    }
    if state.config.enforce_references && is_referenced(&txn, id).await? {
        return Err(AppError::ConstraintViolation(format!(
            "director {id} is referenced by movies"
        )));
    }
    store::delete::<director::Entity, _>(&txn, id).await?;
    txn.commit().await?;

    info!(director_id = id, "director deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn is_referenced<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<bool> {
    let movies = movie::Entity::find().filter(movie::Column::DirectorId.eq(id)).count(db).await?;
    Ok(movies > 0)
}
