//! Document persistence over sea-orm.
//!
//! One collection (table) per entity kind, keyed by a string UUID. Every call
//! issues exactly one statement, so writes are atomic per document and there
//! are no multi-document transactions. The two concurrency primitives are
//! [`Store::increment`] (arithmetic delta applied by the database) and
//! [`Store::conditional_update`] (compare-and-swap on the filter).

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, sea_query::Expr,
};
use uuid::Uuid;

use crate::ResultEngine;

#[derive(Clone, Debug)]
pub struct Store {
    database: DatabaseConnection,
}

impl Store {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.database
    }

    pub async fn find<E: EntityTrait>(&self, filter: Condition) -> ResultEngine<Vec<E::Model>> {
        Ok(E::find().filter(filter).all(&self.database).await?)
    }

    pub async fn find_sorted<E, C>(
        &self,
        filter: Condition,
        column: C,
        order: Order,
    ) -> ResultEngine<Vec<E::Model>>
    where
        E: EntityTrait,
        C: ColumnTrait,
    {
        Ok(E::find()
            .filter(filter)
            .order_by(column, order)
            .all(&self.database)
            .await?)
    }

    pub async fn find_one<E: EntityTrait>(&self, filter: Condition) -> ResultEngine<Option<E::Model>> {
        Ok(E::find().filter(filter).one(&self.database).await?)
    }

    pub async fn find_by_id<E>(&self, id: Uuid) -> ResultEngine<Option<E::Model>>
    where
        E: EntityTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
    {
        Ok(E::find_by_id(id.to_string()).one(&self.database).await?)
    }

    pub async fn insert<A>(&self, model: A) -> ResultEngine<<A::Entity as EntityTrait>::Model>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        Ok(model.insert(&self.database).await?)
    }

    /// Update by primary key. Only `Set` fields are written.
    pub async fn update<A>(&self, model: A) -> ResultEngine<<A::Entity as EntityTrait>::Model>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        Ok(model.update(&self.database).await?)
    }

    /// Returns the number of deleted documents (0 or 1).
    pub async fn delete_by_id<E>(&self, id: Uuid) -> ResultEngine<u64>
    where
        E: EntityTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
    {
        Ok(E::delete_by_id(id.to_string())
            .exec(&self.database)
            .await?
            .rows_affected)
    }

    /// `UPDATE … SET column = column + delta WHERE filter`.
    ///
    /// Returns the number of matched documents; 0 means the target is gone.
    pub async fn increment<E, C>(&self, filter: Condition, column: C, delta: i64) -> ResultEngine<u64>
    where
        E: EntityTrait,
        C: ColumnTrait,
    {
        Ok(E::update_many()
            .col_expr(column, Expr::col(column).add(delta))
            .filter(filter)
            .exec(&self.database)
            .await?
            .rows_affected)
    }

    /// Compare-and-swap: writes the `Set` fields of `values` only where
    /// `filter` (which carries the expected prior state) still matches.
    ///
    /// Returns the number of matched documents; 0 means the race was lost.
    pub async fn conditional_update<E, A>(&self, filter: Condition, values: A) -> ResultEngine<u64>
    where
        E: EntityTrait,
        A: ActiveModelTrait<Entity = E>,
    {
        Ok(E::update_many()
            .set(values)
            .filter(filter)
            .exec(&self.database)
            .await?
            .rows_affected)
    }

    /// Number of documents matching `filter`.
    pub async fn count<E: EntityTrait>(&self, filter: Condition) -> ResultEngine<u64>
    where
        E::Model: Sync,
    {
        Ok(E::find().filter(filter).count(&self.database).await?)
    }
}
