use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ColumnType, Condition, Value, sea_query::SimpleExpr};

use super::policy::FilterOperator;
use super::transform::Predicate;

/// Shape a raw value has to take before it can be compared against a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Integer,
    Date,
    Text,
}

fn value_kind<C: ColumnTrait>(column: &C) -> ValueKind {
    match column.def().get_column_type() {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned => ValueKind::Integer,
        ColumnType::Date => ValueKind::Date,
        _ => ValueKind::Text,
    }
}

/// Numbers and dates tolerate surrounding whitespace; text is compared as sent.
fn coerce(kind: ValueKind, raw: &str) -> Option<Value> {
    match kind {
        ValueKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        ValueKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .map(Value::from),
        ValueKind::Text => Some(Value::from(raw.to_string())),
    }
}

fn compare<C: ColumnTrait>(column: C, operator: FilterOperator, value: Value) -> SimpleExpr {
    match operator {
        FilterOperator::Eq => column.eq(value),
        FilterOperator::Gt => column.gt(value),
        FilterOperator::Gte => column.gte(value),
        FilterOperator::Lt => column.lt(value),
        FilterOperator::Lte => column.lte(value),
    }
}

/// Conjoin `predicates` into one condition over `columns`.
///
/// Each predicate value is coerced to the column's type first. A predicate whose
/// field has no column, or whose value does not parse, is skipped.
pub fn build_condition<C>(predicates: &[Predicate], columns: &[(&str, C)]) -> Condition
where
    C: ColumnTrait + Copy,
{
    let mut condition = Condition::all();

    for predicate in predicates {
        let Some((_, column)) = columns.iter().find(|(name, _)| *name == predicate.field) else {
            tracing::debug!(field = predicate.field, "No column for filter field, skipping");
            continue;
        };

        match coerce(value_kind(column), &predicate.value) {
            Some(value) => {
                condition = condition.add(compare(*column, predicate.operator, value));
            }
            None => {
                tracing::debug!(
                    field = predicate.field,
                    operator = %predicate.operator,
                    value = %predicate.value,
                    "Filter value does not match column type, skipping"
                );
            }
        }
    }

    condition
}
