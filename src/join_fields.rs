//! Optional relation slots on API models.
//!
//! A relation is only ever filled in by the relation loader. Until then it
//! serializes as `null`, so the wire shape is the same whether or not it was
//! requested.

use serde::Serialize;

/// A relation that may or may not have been loaded.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(untagged)]
pub enum JoinField<T> {
    Loaded(T),
    #[default]
    NotLoaded,
}

impl<T> PartialEq for JoinField<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JoinField::Loaded(a), JoinField::Loaded(b)) => a == b,
            (JoinField::NotLoaded, JoinField::NotLoaded) => true,
            _ => false,
        }
    }
}

impl<T> JoinField<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, JoinField::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            JoinField::Loaded(data) => Some(data),
            JoinField::NotLoaded => None,
        }
    }
}

impl<T> FromIterator<T> for JoinField<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        JoinField::Loaded(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_loaded_serializes_as_null() {
        let field: JoinField<Vec<u32>> = JoinField::NotLoaded;
        assert_eq!(serde_json::to_value(&field).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_loaded_serializes_transparently() {
        let field: JoinField<Vec<u32>> = vec![1, 2].into_iter().collect();
        assert_eq!(serde_json::to_value(&field).unwrap(), serde_json::json!([1, 2]));
    }

    #[test]
    fn test_loaded_empty_differs_from_not_loaded() {
        let empty: JoinField<Vec<u32>> = JoinField::Loaded(Vec::new());
        assert!(empty.is_loaded());
        assert_ne!(empty, JoinField::NotLoaded);
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!([]));
    }
}
