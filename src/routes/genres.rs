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
    entities::{genre, movie},
    error::{AppError, AppResult},
    models::NamePayload,
    store,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(list).post(create))
        .route("/genres/", get(list).post(create))
        .route("/genres/{id}", get(fetch).put(replace).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<genre::Model>>> {
    let genres = store::list::<genre::Entity, _>(&state.db, Condition::all()).await?;
    Ok(Json(genres))
}

async fn create(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> AppResult<Response> {
    let key = state.config.key_policy.create_key(payload.id)?;
    let id = store::insert(&state.db, payload.into_genre(key)).await?;

    info!(genre_id = id, "genre created");
    Ok((StatusCode::CREATED, [(header::LOCATION, format!("/genres/{id}"))]).into_response())
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<genre::Model>> {
    let genre = store::find::<genre::Entity, _>(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("genre", id))?;
    Ok(Json(genre))
}

async fn replace(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> AppResult<StatusCode> {
    let new_id = state.config.key_policy.replace_key(id, payload.id)?;

    let txn = state.db.begin().await?;
    if !store::exists::<genre::Entity, _>(&txn, id).await? {
        return Err(AppError::not_found("genre", id));
    }
    if state.config.enforce_references && new_id != id && is_referenced(&txn, id).await? {
        return Err(AppError::ConstraintViolation(format!(
            "genre {id} is referenced by movies and cannot change its id"
        )));
    }
    store::replace(&txn, id, payload.into_genre(Some(new_id))).await?;
    txn.commit().await?;

    info!(genre_id = id, new_id, "genre replaced");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    let txn = state.db.begin().await?;
    if !store::exists::<genre::Entity, _>(&txn, id).await? {
        return Err(AppError::not_found("genre", id));
    }
    if state.config.enforce_references && is_referenced(&txn, id).await? {
        return Err(AppError::ConstraintViolation(format!("genre {id} is referenced by movies")));
    }
    store::delete::<genre::Entity, _>(&txn, id).await?;
    txn.commit().await?;

    info!(genre_id = id, "genre deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn is_referenced<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<bool> {
    let movies = movie::Entity::find().filter(movie::Column::GenreId.eq(id)).count(db).await?;
    Ok(movies > 0)
}
