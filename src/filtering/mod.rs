//! Whitelist-driven filtering.
//!
//! A [`FilterPolicy`] lists which fields accept which [`FilterOperator`]s.
//! [`transform`] intersects the request's `filter[field][op]` parameters with a
//! policy, and [`build_condition`] turns the surviving predicates into a
//! Sea-ORM [`sea_orm::Condition`].

pub mod conditions;
pub mod policy;
pub mod transform;

pub use conditions::build_condition;
pub use policy::{COMPARISONS, EQUALITY, FieldRule, FilterOperator, FilterPolicy};
pub use transform::{FilterParams, Predicate, transform};
