use sea_orm::{ActiveValue, ColumnTrait, Condition};
use serde::Deserialize;

use crate::{
    config::KeyPolicy,
    entities::{director, genre, movie},
    error::{AppError, AppResult},
};

#[derive(Clone, Debug, Deserialize)]
pub struct MoviePayload {
    pub id: Option<i32>,
    pub title: String,
    pub description: String,
    pub trailer: String,
    pub year: i32,
    pub rating: f64,
    pub genre_id: i32,
    pub director_id: i32,
}

impl MoviePayload {
    pub fn into_active_model(self, id: Option<i32>) -> movie::ActiveModel {
        movie::ActiveModel {
            id: key_value(id),
            title: ActiveValue::Set(self.title),
            description: ActiveValue::Set(self.description),
            trailer: ActiveValue::Set(self.trailer),
            year: ActiveValue::Set(self.year),
            rating: ActiveValue::Set(self.rating),
            genre_id: ActiveValue::Set(self.genre_id),
            director_id: ActiveValue::Set(self.director_id),
        }
    }
}

/// Body shared by directors and genres.
#[derive(Clone, Debug, Deserialize)]
pub struct NamePayload {
    pub id: Option<i32>,
    pub name: String,
}

impl NamePayload {
    pub fn into_director(self, id: Option<i32>) -> director::ActiveModel {
        director::ActiveModel { id: key_value(id), name: ActiveValue::Set(self.name) }
    }

    pub fn into_genre(self, id: Option<i32>) -> genre::ActiveModel {
        genre::ActiveModel { id: key_value(id), name: ActiveValue::Set(self.name) }
    }
}

fn key_value(id: Option<i32>) -> ActiveValue<i32> {
    match id {
        Some(id) => ActiveValue::Set(id),
        None => ActiveValue::NotSet,
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct MovieFilter {
    pub director_id: Option<i32>,
    pub genre_id: Option<i32>,
}

impl MovieFilter {
    /// Both parameters given means both must match.
    pub fn condition(&self) -> Condition {
        Condition::all()
            .add_option(self.director_id.map(|id| movie::Column::DirectorId.eq(id)))
            .add_option(self.genre_id.map(|id| movie::Column::GenreId.eq(id)))
    }
}

impl KeyPolicy {
    /// Id a new record is stored under; `None` leaves it to the database.
    pub fn create_key(self, body_id: Option<i32>) -> AppResult<Option<i32>> {
        match (self, body_id) {
            (KeyPolicy::Client, Some(id)) => Ok(Some(id)),
            (KeyPolicy::Client, None) => Err(AppError::Validation("missing field `id`".to_string())),
            (KeyPolicy::Server, None) => Ok(None),
            (KeyPolicy::Server, Some(_)) => Err(AppError::Validation(
                "`id` is assigned by the server and must be omitted".to_string(),
            )),
        }
    }

    /// Id a replaced record ends up under.
    pub fn replace_key(self, path_id: i32, body_id: Option<i32>) -> AppResult<i32> {
        match (self, body_id) {
            (KeyPolicy::Client, Some(id)) => Ok(id),
            (KeyPolicy::Client, None) => Err(AppError::Validation("missing field `id`".to_string())),
            (KeyPolicy::Server, None) => Ok(path_id),
            (KeyPolicy::Server, Some(id)) if id == path_id => Ok(id),
            (KeyPolicy::Server, Some(id)) => Err(AppError::Validation(format!(
                "`id` {id} does not match the path id {path_id}"
            ))),
        }
    }
}
