//! Per-resource whitelist of filterable fields and their legal operators.

use std::fmt;

/// Comparison operators accepted in `filter[field][op]` parameters.
///
/// Variant order is the order predicates are emitted in for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    pub const ALL: [Self; 5] = [Self::Eq, Self::Gt, Self::Gte, Self::Lt, Self::Lte];

    /// Parse the operator segment of a bracketed filter key.
    #[must_use]
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Equality only, for free-text style fields.
pub const EQUALITY: &[FilterOperator] = &[FilterOperator::Eq];

/// Every operator, for ordered fields such as numbers and dates.
pub const COMPARISONS: &[FilterOperator] = &FilterOperator::ALL;

/// One whitelisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub operators: &'static [FilterOperator],
}

/// Ordered set of [`FieldRule`]s. Anything not listed is ignored by the transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPolicy {
    rules: Vec<FieldRule>,
}

impl FilterPolicy {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Whitelist `field` for `operators`. Declaring the same field twice replaces
    /// the earlier rule but keeps its position.
    #[must_use]
    pub fn allow(mut self, field: &'static str, operators: &'static [FilterOperator]) -> Self {
        if let Some(rule) = self.rules.iter_mut().find(|rule| rule.field == field) {
            rule.operators = operators;
        } else {
            self.rules.push(FieldRule { field, operators });
        }
        self
    }

    #[must_use]
    pub fn allowed_operators(&self, field: &str) -> Option<&'static [FilterOperator]> {
        self.rules
            .iter()
            .find(|rule| rule.field == field)
            .map(|rule| rule.operators)
    }

    #[must_use]
    pub fn permits(&self, field: &str, operator: FilterOperator) -> bool {
        self.allowed_operators(field)
            .is_some_and(|operators| operators.contains(&operator))
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}
