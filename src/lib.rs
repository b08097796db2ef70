//! Academic records API: degrees, classrooms and students over Axum and Sea-ORM.
//!
//! The interesting part lives in [`filtering`] (whitelisted query predicates),
//! [`relations`] (flag-driven batch loading) and [`crud::cascade`] (guarded deletes).
//! [`routes`] wires those together behind generic handlers over [`CRUDResource`].

pub mod config;
pub mod crud;
pub mod database;
pub mod errors;
pub mod filtering;
pub mod join_fields;
pub mod models;
pub mod pagination;
pub mod query;
pub mod relations;
pub mod routes;
pub mod validation;

pub use crud::{CRUDResource, MergeIntoActiveModel};
pub use errors::ApiError;
pub use join_fields::JoinField;
pub use serde_with;
