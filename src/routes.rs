//! Generic handlers over [`CRUDResource`] and the `/api/v1` router.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::crud::{CRUDResource, CascadeDelete, DeleteOutcome, guarded_delete};
use crate::errors::ApiError;
use crate::filtering::{build_condition, transform};
use crate::models::{Classroom, Degree, Student};
use crate::pagination::{Pagination, calculate_content_range};
use crate::query::QueryParams;
use crate::validation::ValidJson;

/// Body of a blocked delete.
#[derive(Debug, Serialize)]
pub struct Rejection<T> {
    pub msg: &'static str,
    pub data: T,
}

/// Shared router state.
pub type Db = Arc<DatabaseConnection>;

/// An id that is not a UUID cannot name a row, so it is reported as not found.
fn parse_id<T: CRUDResource>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::not_found(T::RESOURCE_NAME_SINGULAR, Some(raw.to_string())))
}

async fn find_or_404<T: CRUDResource>(db: &DatabaseConnection, id: Uuid) -> Result<T, ApiError> {
    T::get_one(db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(T::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}

/// `GET /{resource}`: filtered, paginated, optionally with relations.
pub async fn index<T>(
    State(db): State<Db>,
    params: QueryParams,
) -> Result<(HeaderMap, Json<Vec<T>>), ApiError>
where
    T: CRUDResource + Serialize,
{
    let db: &DatabaseConnection = &db;
    let predicates = transform(params.filters(), &T::filter_policy());
    let condition = build_condition(&predicates, &T::filterable_columns());
    let pagination: Pagination = params.extract();
    let includes: T::Includes = params.extract();

    let total = T::total_count(db, &condition).await?;
    let mut items = T::get_all(db, &condition, pagination.offset(), pagination.limit()).await?;
    T::load_relations(db, &mut items, &includes).await?;

    let returned = u64::try_from(items.len()).unwrap_or(u64::MAX);
    let headers = calculate_content_range(
        pagination.offset(),
        returned,
        total,
        T::RESOURCE_NAME_PLURAL,
    );
    Ok((headers, Json(items)))
}

/// `GET /{resource}/{id}`
pub async fn show<T>(
    State(db): State<Db>,
    Path(id): Path<String>,
    params: QueryParams,
) -> Result<Json<T>, ApiError>
where
    T: CRUDResource + Serialize,
{
    let db: &DatabaseConnection = &db;
    let mut item: T = find_or_404(db, parse_id::<T>(&id)?).await?;
    let includes: T::Includes = params.extract();
    T::load_relations(db, std::slice::from_mut(&mut item), &includes).await?;
    Ok(Json(item))
}

/// `POST /{resource}`
pub async fn store<T>(
    State(db): State<Db>,
    ValidJson(payload): ValidJson<T::CreateModel>,
) -> Result<(StatusCode, Json<T>), ApiError>
where
    T: CRUDResource + Serialize,
{
    let db: &DatabaseConnection = &db;
    let changes: T::UpdateModel = payload.clone().into();
    T::validate_changes(db, None, &changes).await?;

    let created = T::create(db, payload).await?;
    tracing::info!(resource = T::RESOURCE_NAME_SINGULAR, id = %created.id(), "Created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /{resource}/{id}`: every field required.
pub async fn replace<T>(
    State(db): State<Db>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<T::CreateModel>,
) -> Result<Json<T>, ApiError>
where
    T: CRUDResource + Serialize,
{
    apply_update::<T>(&db, parse_id::<T>(&id)?, payload.into()).await.map(Json)
}

/// `PATCH /{resource}/{id}`: only the fields sent are changed.
pub async fn modify<T>(
    State(db): State<Db>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<T::UpdateModel>,
) -> Result<Json<T>, ApiError>
where
    T: CRUDResource + Serialize,
{
    apply_update::<T>(&db, parse_id::<T>(&id)?, changes).await.map(Json)
}

async fn apply_update<T: CRUDResource>(
    db: &DatabaseConnection,
    id: Uuid,
    changes: T::UpdateModel,
) -> Result<T, ApiError> {
    find_or_404::<T>(db, id).await?;
    T::validate_changes(db, Some(id), &changes).await?;

    let updated = T::update(db, id, changes).await?;
    tracing::info!(resource = T::RESOURCE_NAME_SINGULAR, %id, "Updated");
    Ok(updated)
}

/// `DELETE /{resource}/{id}`: blocked by dependents unless `forceDelete` is set.
pub async fn destroy<T>(
    State(db): State<Db>,
    Path(id): Path<String>,
    params: QueryParams,
) -> Result<Response, ApiError>
where
    T: CascadeDelete + Serialize,
{
    let id = parse_id::<T>(&id)?;
    let force = params.flag("forceDelete");

    match guarded_delete::<T>(&db, id, force).await? {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT.into_response()),
        DeleteOutcome::Rejected { reason, entity } => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(Rejection {
                msg: reason,
                data: entity,
            }),
        )
            .into_response()),
    }
}

fn resource_routes<T>() -> Router<Db>
where
    T: CascadeDelete + Serialize,
{
    let collection = format!("/api/v1/{}", T::RESOURCE_NAME_PLURAL);
    let member = format!("{collection}/{{id}}");

    Router::new()
        .route(&collection, get(index::<T>).post(store::<T>))
        .route(
            &member,
            get(show::<T>)
                .put(replace::<T>)
                .patch(modify::<T>)
                .delete(destroy::<T>),
        )
}

/// Every resource under `/api/v1`, traced, with `db` as shared state.
pub fn api_router(db: impl Into<Db>) -> Router {
    Router::new()
        .merge(resource_routes::<Degree>())
        .merge(resource_routes::<Classroom>())
        .merge(resource_routes::<Student>())
        .layer(TraceLayer::new_for_http())
        .with_state(db.into())
}
