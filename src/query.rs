//! Raw query string handling.
//!
//! Splits `filter[field][op]=value` pairs out into [`FilterParams`] and keeps
//! everything else (include flags, `forceDelete`, pagination) as plain values.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::filtering::FilterParams;

/// Parsed request query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    filters: FilterParams,
    values: BTreeMap<String, String>,
}

/// Types read straight off the query string, such as include flags and paging.
pub trait FromQueryParams: Sized {
    fn from_query(params: &QueryParams) -> Self;
}

impl QueryParams {
    /// Parse a raw (still percent-encoded) query string. Later duplicates win.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return parsed;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if let Some((field, operator)) = parse_filter_key(&key) {
                parsed
                    .filters
                    .entry(field.to_string())
                    .or_default()
                    .insert(operator.to_string(), value.into_owned());
            } else {
                parsed.values.insert(key.into_owned(), value.into_owned());
            }
        }

        parsed
    }

    #[must_use]
    pub fn filters(&self) -> &FilterParams {
        &self.filters
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether `name` is present and truthy. Absent means false.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }

    #[must_use]
    pub fn extract<T: FromQueryParams>(&self) -> T {
        T::from_query(self)
    }
}

/// `1`, `true`, `on` and `yes`, in any case.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// `filter[field][op]` -> `(field, op)`.
fn parse_filter_key(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_prefix("filter[")?.strip_suffix(']')?;
    let (field, operator) = inner.split_once("][")?;
    let well_formed = |part: &str| !part.is_empty() && !part.contains(['[', ']']);
    if well_formed(field) && well_formed(operator) {
        Some((field, operator))
    } else {
        None
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::parse(parts.uri.query()))
    }
}
