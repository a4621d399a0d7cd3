//! Entity-agnostic persistence helpers.
//!
//! Every function takes the connection it runs on, so handlers decide whether
//! work happens on the pool or inside their own transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, Iterable,
    PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, QueryOrder,
};

use crate::error::AppResult;

pub type KeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

fn by_id<E: EntityTrait>(id: i32) -> Condition {
    <E::PrimaryKey as Iterable>::iter()
        .fold(Condition::all(), |cond, key| cond.add(key.into_column().eq(id)))
}

pub async fn list<E, C>(db: &C, filter: Condition) -> AppResult<Vec<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(filter);
    for key in <E::PrimaryKey as Iterable>::iter() {
        query = query.order_by_asc(key.into_column());
    }
    Ok(query.all(db).await?)
}

pub async fn find<E, C>(db: &C, id: i32) -> AppResult<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(E::find().filter(by_id::<E>(id)).one(db).await?)
}

pub async fn exists<E, C>(db: &C, id: i32) -> AppResult<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(find::<E, C>(db, id).await?.is_some())
}

pub async fn insert<A, C>(db: &C, model: A) -> AppResult<KeyOf<A::Entity>>
where
    A: ActiveModelTrait + 'static,
    C: ConnectionTrait,
{
    let res = <A::Entity as EntityTrait>::insert(model).exec(db).await?;
    Ok(res.last_insert_id)
}

/// Overwrites every set column of the row stored under `id`, including the key
/// itself. Returns the number of rows touched.
pub async fn replace<A, C>(db: &C, id: i32, model: A) -> AppResult<u64>
where
    A: ActiveModelTrait,
    C: ConnectionTrait,
{
    let res = <A::Entity as EntityTrait>::update_many()
        .set(model)
        .filter(by_id::<A::Entity>(id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete<E, C>(db: &C, id: i32) -> AppResult<u64>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let res = E::delete_many().filter(by_id::<E>(id)).exec(db).await?;
    Ok(res.rows_affected)
}
