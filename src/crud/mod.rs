pub mod cascade;
pub mod traits;

pub use cascade::{CascadeDelete, DeleteDecision, DeleteOutcome, Dependents, decide, guarded_delete};
pub use traits::{CRUDResource, MergeIntoActiveModel};
