use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::filtering::FilterPolicy;
use crate::query::FromQueryParams;
use crate::validation::Validatable;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Merge this update model into an existing active model
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if the merge operation fails due to data conversion issues.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

/// A resource served by the generic handlers in [`crate::routes`].
///
/// `Self` is the API representation; the associated types tie it to its
/// Sea-ORM entity, its request payloads and its include flags.
#[async_trait]
pub trait CRUDResource: Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model = Self::ModelType, Column = Self::ColumnType> + Sync;
    type ModelType: FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Into<Self>
        + Clone
        + Send
        + Sync
        + 'static;
    type ColumnType: ColumnTrait + Copy + Send + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;
    /// Full payload: POST and PUT.
    type CreateModel: Into<Self::UpdateModel> + Clone + DeserializeOwned + Send + Sync;
    /// Partial payload: PATCH. A create payload converts into one with every field set.
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModelType>
        + Validatable
        + DeserializeOwned
        + Send
        + Sync;
    /// Relation flags read from the query string.
    type Includes: FromQueryParams + Send + Sync;

    const ID_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;

    /// Fields clients may filter on, and with which operators.
    fn filter_policy() -> FilterPolicy;

    /// Column lookup for every field named in [`Self::filter_policy`].
    fn filterable_columns() -> Vec<(&'static str, Self::ColumnType)>;

    #[must_use]
    fn default_index_column() -> Self::ColumnType {
        Self::ID_COLUMN
    }

    fn id(&self) -> Uuid;

    async fn get_all<C>(
        db: &C,
        condition: &Condition,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        let models = Self::EntityType::find()
            .filter(condition.clone())
            .order_by(Self::default_index_column(), Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn total_count<C>(db: &C, condition: &Condition) -> Result<u64, DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        Self::EntityType::find()
            .filter(condition.clone())
            .count(db)
            .await
    }

    async fn get_one<C>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        let model = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn create<C>(db: &C, create_model: Self::CreateModel) -> Result<Self, DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        let update: Self::UpdateModel = create_model.into();
        let active_model = update.merge_into_activemodel(Self::ActiveModelType::new())?;
        let model = active_model.insert(db).await?;
        Ok(model.into())
    }

    async fn update<C>(db: &C, id: Uuid, update_model: Self::UpdateModel) -> Result<Self, DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        let model = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound(format!(
                "{} not found",
                Self::RESOURCE_NAME_SINGULAR
            )))?;
        let existing: Self::ActiveModelType = model.into_active_model();
        let updated_model = update_model.merge_into_activemodel(existing)?;
        let updated = updated_model.update(db).await?;
        Ok(updated.into())
    }

    /// Check a payload before it is written. `id` is the row being updated, if any.
    ///
    /// The default runs only the payload's own rules; resources with unique or
    /// foreign-key columns add their database checks on top.
    async fn validate_changes<C>(
        db: &C,
        id: Option<Uuid>,
        changes: &Self::UpdateModel,
    ) -> Result<(), ApiError>
    where
        C: ConnectionTrait + Sync,
    {
        let _ = (db, id);
        changes.validate()?;
        Ok(())
    }

    /// Attach whichever relations `includes` asks for, batch-loading across `items`.
    async fn load_relations<C>(
        db: &C,
        items: &mut [Self],
        includes: &Self::Includes,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait + Sync;
}
