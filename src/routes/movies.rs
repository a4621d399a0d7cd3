use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::WithRejection;
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{debug, info};

use crate::{
    AppState,
    entities::{director, genre, movie},
    error::{AppError, AppResult},
    models::{MovieFilter, MoviePayload},
    store,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list).post(create))
        .route("/movies/", get(list).post(create))
        .route("/movies/{id}", get(fetch).put(replace).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(filter), _): WithRejection<Query<MovieFilter>, AppError>,
) -> AppResult<Json<Vec<movie::Model>>> {
    let movies = store::list::<movie::Entity, _>(&state.db, filter.condition()).await?;
    debug!(
        director_id = ?filter.director_id,
        genre_id = ?filter.genre_id,
        count = movies.len(),
        "listed movies"
    );
    Ok(Json(movies))
}

async fn create(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<MoviePayload>, AppError>,
) -> AppResult<Response> {
    let key = state.config.key_policy.create_key(payload.id)?;

    let txn = state.db.begin().await?;
    if state.config.enforce_references {
        check_references(&txn, &payload).await?;
    }
    let id = store::insert(&txn, payload.into_active_model(key)).await?;
    txn.commit().await?;

    info!(movie_id = id, "movie created");
    Ok((StatusCode::CREATED, [(header::LOCATION, format!("/movies/{id}"))]).into_response())
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<movie::Model>> {
    let movie = store::find::<movie::Entity, _>(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("movie", id))?;
    Ok(Json(movie))
}

async fn replace(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<MoviePayload>, AppError>,
) -> AppResult<StatusCode> {
    let new_id = state.config.key_policy.replace_key(id, payload.id)?;

    let txn = state.db.begin().await?;
    if !store::exists::<movie::Entity, _>(&txn, id).await? {
        return Err(AppError::not_found("movie", id));
    }
    if state.config.enforce_references {
        check_references(&txn, &payload).await?;
    }
    store::replace(&txn, id, payload.into_active_model(Some(new_id))).await?;
    txn.commit().await?;

    info!(movie_id = id, new_id, "movie replaced");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    if store::delete::<movie::Entity, _>(&state.db, id).await? == 0 {
        return Err(AppError::not_found("movie", id));
    }

    info!(movie_id = id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn check_references<C: ConnectionTrait>(db: &C, payload: &MoviePayload) -> AppResult<()> {
    if !store::exists::<genre::Entity, _>(db, payload.genre_id).await? {
        return Err(AppError::ConstraintViolation(format!(
            "genre {} does not exist",
            payload.genre_id
        )));
    }
    if !store::exists::<director::Entity, _>(db, payload.director_id).await? {
        return Err(AppError::ConstraintViolation(format!(
            "director {} does not exist",
            payload.director_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode};
    use serde_json::{Value, json};

    use crate::{
        config::KeyPolicy,
        routes::testing::{app, app_with, delete, get, post, put},
    };

    fn movie(id: i32, title: &str, genre_id: i32, director_id: i32) -> Value {
        json!({
            "id": id,
            "title": title,
            "description": "d",
            "trailer": "t",
            "year": 2000,
            "rating": 7.5,
            "genre_id": genre_id,
            "director_id": director_id,
        })
    }

    async fn seeded() -> Router {
        let app = app().await;
        for (id, name) in [(1, "Action"), (2, "Drama")] {
            let resp = post(&app, "/genres/", json!({"id": id, "name": name})).await;
            assert_eq!(resp.status, StatusCode::CREATED);
        }
        for (id, name) in [(1, "Smith"), (2, "Jones")] {
            let resp = post(&app, "/directors/", json!({"id": id, "name": name})).await;
            assert_eq!(resp.status, StatusCode::CREATED);
        }
        app
    }

    fn titles(body: &Value) -> Vec<&str> {
        body.as_array().unwrap().iter().map(|m| m["title"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn created_movie_reads_back_exactly() {
        let app = seeded().await;

        let created = post(&app, "/movies/", movie(1, "Test", 1, 1)).await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert!(created.body.is_empty());
        assert_eq!(created.headers["location"], "/movies/1");

        let fetched = get(&app, "/movies/1").await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.json(), movie(1, "Test", 1, 1));
    }

    #[tokio::test]
    async fn list_without_filters_returns_every_movie() {
        let app = seeded().await;
        for (id, title) in [(3, "C"), (1, "A"), (2, "B")] {
            post(&app, "/movies", movie(id, title, 1, 1)).await;
        }

        let listed = get(&app, "/movies").await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(titles(&listed.json()), vec!["A", "B", "C"]);

        let ignored = get(&app, "/movies/?unrelated=1").await;
        assert_eq!(titles(&ignored.json()).len(), 3);
    }

    #[tokio::test]
    async fn filters_select_matching_movies() {
        let app = seeded().await;
        post(&app, "/movies/", movie(1, "Smith action", 1, 1)).await;
        post(&app, "/movies/", movie(2, "Smith drama", 2, 1)).await;
        post(&app, "/movies/", movie(3, "Jones action", 1, 2)).await;

        let by_director = get(&app, "/movies/?director_id=1").await.json();
        assert_eq!(titles(&by_director), vec!["Smith action", "Smith drama"]);

        let by_genre = get(&app, "/movies/?genre_id=1").await.json();
        assert_eq!(titles(&by_genre), vec!["Smith action", "Jones action"]);

        let both = get(&app, "/movies/?director_id=1&genre_id=1").await.json();
        assert_eq!(titles(&both), vec!["Smith action"]);

        let none = get(&app, "/movies/?director_id=2&genre_id=2").await.json();
        assert!(titles(&none).is_empty());
    }

    #[tokio::test]
    async fn non_numeric_filter_is_a_validation_error() {
        let app = seeded().await;
        let resp = get(&app, "/movies/?director_id=abc").await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn missing_movie_is_not_found() {
        let app = seeded().await;
        let resp = get(&app, "/movies/42").await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.json()["error"]["message"], "movie 42 not found");

        assert_eq!(put(&app, "/movies/42", movie(42, "X", 1, 1)).await.status, StatusCode::NOT_FOUND);
        assert_eq!(delete(&app, "/movies/42").await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replace_overwrites_every_field() {
        let app = seeded().await;
        post(&app, "/movies/", movie(1, "Old", 1, 1)).await;

        let replacement = json!({
            "id": 1,
            "title": "New",
            "description": "longer",
            "trailer": "https://example.com/t",
            "year": 2021,
            "rating": 9.1,
            "genre_id": 2,
            "director_id": 2,
        });
        let resp = put(&app, "/movies/1", replacement.clone()).await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert!(resp.body.is_empty());

        assert_eq!(get(&app, "/movies/1").await.json(), replacement);
    }

    #[tokio::test]
    async fn replace_with_new_id_moves_the_record() {
        let app = seeded().await;
        post(&app, "/movies/", movie(1, "Moving", 1, 1)).await;

        assert_eq!(put(&app, "/movies/1", movie(5, "Moving", 1, 1)).await.status, StatusCode::NO_CONTENT);

        assert_eq!(get(&app, "/movies/1").await.status, StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/movies/5").await.json(), movie(5, "Moving", 1, 1));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = seeded().await;
        post(&app, "/movies/", movie(1, "Gone", 1, 1)).await;

        let resp = delete(&app, "/movies/1").await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert_eq!(get(&app, "/movies/1").await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_constraint_violation() {
        let app = seeded().await;
        post(&app, "/movies/", movie(1, "First", 1, 1)).await;

        let resp = post(&app, "/movies/", movie(1, "Second", 1, 1)).await;
        assert_eq!(resp.status, StatusCode::CONFLICT);
        assert_eq!(resp.json()["error"]["code"], "constraint_violation");
        assert_eq!(get(&app, "/movies/1").await.json()["title"], "First");
    }

    #[tokio::test]
    async fn dangling_references_are_rejected() {
        let app = seeded().await;

        let resp = post(&app, "/movies/", movie(1, "Orphan", 9, 1)).await;
        assert_eq!(resp.status, StatusCode::CONFLICT);
        assert_eq!(resp.json()["error"]["message"], "genre 9 does not exist");

        let resp = post(&app, "/movies/", movie(1, "Orphan", 1, 9)).await;
        assert_eq!(resp.status, StatusCode::CONFLICT);
        assert_eq!(resp.json()["error"]["message"], "director 9 does not exist");

        post(&app, "/movies/", movie(1, "Fine", 1, 1)).await;
        assert_eq!(put(&app, "/movies/1", movie(1, "Fine", 1, 9)).await.status, StatusCode::CONFLICT);
        assert_eq!(get(&app, "/movies/1").await.json()["director_id"], 1);
    }

    #[tokio::test]
    async fn references_are_unchecked_when_enforcement_is_off() {
        let app = app_with(KeyPolicy::Client, false).await;
        assert_eq!(post(&app, "/movies/", movie(1, "Loose", 9, 9)).await.status, StatusCode::CREATED);
        assert_eq!(get(&app, "/movies/1").await.json()["genre_id"], 9);
    }

    #[tokio::test]
    async fn malformed_bodies_are_validation_errors() {
        let app = seeded().await;

        let mut missing_title = movie(1, "x", 1, 1);
        missing_title.as_object_mut().unwrap().remove("title");
        let resp = post(&app, "/movies/", missing_title).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["error"]["code"], "validation_error");

        let mut missing_id = movie(1, "x", 1, 1);
        missing_id.as_object_mut().unwrap().remove("id");
        assert_eq!(post(&app, "/movies/", missing_id).await.status, StatusCode::BAD_REQUEST);

        let wrong_type = json!({"id": "one"});
        assert_eq!(post(&app, "/movies/", wrong_type).await.status, StatusCode::BAD_REQUEST);

        assert_eq!(get(&app, "/movies/abc").await.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn server_assigned_keys() {
        let app = app_with(KeyPolicy::Server, true).await;
        post(&app, "/genres/", json!({"name": "Action"})).await;
        post(&app, "/directors/", json!({"name": "Smith"})).await;

        let mut body = movie(0, "Auto", 1, 1);
        body.as_object_mut().unwrap().remove("id");
        let created = post(&app, "/movies/", body.clone()).await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.headers["location"], "/movies/1");

        assert_eq!(post(&app, "/movies/", movie(7, "Chosen", 1, 1)).await.status, StatusCode::BAD_REQUEST);

        assert_eq!(put(&app, "/movies/1", body).await.status, StatusCode::NO_CONTENT);
        assert_eq!(put(&app, "/movies/1", movie(1, "Same", 1, 1)).await.status, StatusCode::NO_CONTENT);
        assert_eq!(put(&app, "/movies/1", movie(2, "Rekey", 1, 1)).await.status, StatusCode::BAD_REQUEST);
        assert_eq!(get(&app, "/movies/1").await.json()["title"], "Same");
    }
}
