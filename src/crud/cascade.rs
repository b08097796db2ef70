//! Guarded deletion.
//!
//! A resource with children refuses to be deleted while those children exist,
//! unless the caller forces it. Forcing removes the children first, deepest
//! level first. Counting, deciding and deleting all happen in one transaction.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

use super::traits::CRUDResource;
use crate::errors::ApiError;

/// How many children hang off a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dependents {
    pub classrooms: u64,
    pub students: u64,
}

impl Dependents {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.classrooms == 0 && self.students == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    Proceed,
    Blocked,
}

/// Delete when nothing depends on the target, or when forced.
#[must_use]
pub const fn decide(dependents: &Dependents, force: bool) -> DeleteDecision {
    if force || dependents.is_empty() {
        DeleteDecision::Proceed
    } else {
        DeleteDecision::Blocked
    }
}

#[derive(Debug)]
pub enum DeleteOutcome<T> {
    Deleted,
    /// Nothing was changed. `entity` carries its dependents for the response.
    Rejected { reason: &'static str, entity: T },
}

/// Per-resource hooks for [`guarded_delete`].
///
/// The defaults describe a leaf resource: no dependents, nothing to remove.
#[async_trait]
pub trait CascadeDelete: CRUDResource {
    const BLOCKED_REASON: &'static str = "Cannot delete this resource because it has dependents attached";

    async fn count_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<Dependents, DbErr> {
        let _ = (txn, id);
        Ok(Dependents::default())
    }

    /// Remove every dependent, leaves first.
    async fn delete_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<(), DbErr> {
        let _ = (txn, id);
        Ok(())
    }

    /// Relations to show alongside a rejection.
    fn dependents_view() -> Self::Includes;
}

/// Delete `id` if nothing depends on it or `force` is set.
///
/// # Errors
///
/// `ApiError::NotFound` when the target does not exist; database failures
/// otherwise. Any failure rolls back the whole transaction.
pub async fn guarded_delete<T: CascadeDelete>(
    db: &DatabaseConnection,
    id: Uuid,
    force: bool,
) -> Result<DeleteOutcome<T>, ApiError> {
    let txn = db.begin().await?;

    match run_guarded::<T>(&txn, id, force).await {
        Ok(DeleteOutcome::Deleted) => {
            txn.commit().await?;
            Ok(DeleteOutcome::Deleted)
        }
        Ok(outcome @ DeleteOutcome::Rejected { .. }) => {
            txn.rollback().await?;
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = ?rollback_err, "Rollback after failed delete also failed");
            }
            Err(err)
        }
    }
}

async fn run_guarded<T: CascadeDelete>(
    txn: &DatabaseTransaction,
    id: Uuid,
    force: bool,
) -> Result<DeleteOutcome<T>, ApiError> {
    let Some(mut entity) = T::get_one(txn, id).await? else {
        return Err(ApiError::not_found(
            T::RESOURCE_NAME_SINGULAR,
            Some(id.to_string()),
        ));
    };

    let dependents = T::count_dependents(txn, id).await?;

    match decide(&dependents, force) {
        DeleteDecision::Blocked => {
            tracing::info!(
                resource = T::RESOURCE_NAME_SINGULAR,
                %id,
                classrooms = dependents.classrooms,
                students = dependents.students,
                "Delete blocked by dependents"
            );
            T::load_relations(txn, std::slice::from_mut(&mut entity), &T::dependents_view()).await?;
            Ok(DeleteOutcome::Rejected {
                reason: T::BLOCKED_REASON,
                entity,
            })
        }
        DeleteDecision::Proceed => {
            if !dependents.is_empty() {
                T::delete_dependents(txn, id).await?;
            }

            let result = T::EntityType::delete_many()
                .filter(T::ID_COLUMN.eq(id))
                .exec(txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(ApiError::not_found(
                    T::RESOURCE_NAME_SINGULAR,
                    Some(id.to_string()),
                ));
            }

            tracing::info!(
                resource = T::RESOURCE_NAME_SINGULAR,
                %id,
                cascaded_classrooms = dependents.classrooms,
                cascaded_students = dependents.students,
                "Deleted"
            );
            Ok(DeleteOutcome::Deleted)
        }
    }
}
