use std::collections::BTreeMap;

use super::policy::{FilterOperator, FilterPolicy};

/// `filter[field][op]=value` parameters grouped by field, then operator.
pub type FilterParams = BTreeMap<String, BTreeMap<String, String>>;

/// A single whitelisted comparison. Values stay raw strings here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: &'static str,
    pub operator: FilterOperator,
    pub value: String,
}

impl Predicate {
    #[must_use]
    pub fn new(field: &'static str, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }
}

/// Intersect the requested filters with `policy`.
///
/// Output follows the policy's field order, then [`FilterOperator`] order, so the
/// same request always yields the same predicates. Fields or operators the policy
/// does not list are dropped silently.
#[must_use]
pub fn transform(filters: &FilterParams, policy: &FilterPolicy) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    for rule in policy.rules() {
        let Some(requested) = filters.get(rule.field) else {
            continue;
        };

        for operator in FilterOperator::ALL {
            if !rule.operators.contains(&operator) {
                continue;
            }
            if let Some(value) = requested.get(operator.as_param()) {
                predicates.push(Predicate::new(rule.field, operator, value.clone()));
            }
        }
    }

    predicates
}
