//! Request validation.
//!
//! Update models implement [`Validatable`] for the rules that need no database.
//! Uniqueness and foreign-key existence are checked separately through
//! [`value_taken`] and [`exists`], from `CRUDResource::validate_changes`.
//! Bodies that do not even deserialize are reported through [`ValidJson`].

use std::fmt;

use axum::Json;
use axum::extract::{FromRequest, Request};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::ApiError;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors, serialized as a plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationError::new(field, message)],
        }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a validator, if any.
    pub fn check(&mut self, outcome: Result<(), ValidationError>) {
        if let Err(error) = outcome {
            self.add(error);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Rules a payload can check on its own.
pub trait Validatable {
    /// # Errors
    ///
    /// Returns every rule the payload breaks.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Field-level checks with Laravel-style messages.
pub mod validators {
    use chrono::NaiveDate;
    use std::fmt;

    use super::ValidationError;

    fn label(field: &str) -> String {
        field.replace('_', " ")
    }

    /// Validate value is not blank
    pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(
                field,
                format!("The {} field is required.", label(field)),
            ));
        }
        Ok(())
    }

    /// Reject a field that was sent as `null`.
    pub fn validate_not_null<T>(
        field: &str,
        value: &Option<Option<T>>,
    ) -> Result<(), ValidationError> {
        if matches!(value, Some(None)) {
            return Err(ValidationError::new(
                field,
                format!("The {} field is required.", label(field)),
            ));
        }
        Ok(())
    }

    /// Validate number is strictly greater than `bound`
    pub fn validate_greater_than<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        bound: T,
    ) -> Result<(), ValidationError> {
        if value <= bound {
            return Err(ValidationError::new(
                field,
                format!("The {} must be greater than {bound}.", label(field)),
            ));
        }
        Ok(())
    }

    /// Basic email validation
    pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
        let well_formed = value
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed || value.len() > 255 {
            return Err(ValidationError::new(
                field,
                format!("The {} must be a valid email address.", label(field)),
            ));
        }
        Ok(())
    }

    /// Validate date is strictly before `cutoff`
    pub fn validate_date_before(
        field: &str,
        value: NaiveDate,
        cutoff: NaiveDate,
    ) -> Result<(), ValidationError> {
        if value >= cutoff {
            return Err(ValidationError::new(
                field,
                format!("The {} must be a date before {cutoff}.", label(field)),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn taken(field: &str) -> ValidationError {
        ValidationError::new(field, format!("The {} has already been taken.", label(field)))
    }

    #[must_use]
    pub fn invalid_reference(field: &str) -> ValidationError {
        ValidationError::new(field, format!("The selected {} is invalid.", label(field)))
    }
}

/// Whether another row of `E` already holds `value` in `column`.
///
/// `except` excludes the row being updated.
///
/// # Errors
///
/// Propagates database errors.
pub async fn value_taken<E, C>(
    db: &C,
    column: E::Column,
    value: impl Into<Value>,
    id_column: E::Column,
    except: Option<Uuid>,
) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(column.eq(value));
    if let Some(id) = except {
        query = query.filter(id_column.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Whether a row of `E` with this id exists.
///
/// # Errors
///
/// Propagates database errors.
pub async fn exists<E, C>(db: &C, id_column: E::Column, id: Uuid) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    Ok(E::find().filter(id_column.eq(id)).count(db).await? > 0)
}

/// JSON body extractor whose rejection is a 422 on the `body` field.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ValidationErrors::single("body", rejection.body_text()).into()),
        }
    }
}
