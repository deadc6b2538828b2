//! Result rows handed to downstream consumers

use super::{AnalyticsError, AnalyticsResult};
use crate::graph::PropertyValue;
use indexmap::IndexMap;
use serde::Serialize;

/// One result row: ordered field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    fields: IndexMap<String, PropertyValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<PropertyValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        self.fields.get(field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten a serializable struct into a row, keeping field order
    pub fn from_serialize<T: Serialize>(item: &T) -> AnalyticsResult<Self> {
        match serde_json::to_value(item)? {
            serde_json::Value::Object(map) => Ok(Row {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, PropertyValue::from_json(v)))
                    .collect(),
            }),
            other => Err(AnalyticsError::NotARecord(other.to_string())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// An ordered table of rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_items<T: Serialize>(items: &[T]) -> AnalyticsResult<Self> {
        let rows = items
            .iter()
            .map(Row::from_serialize)
            .collect::<AnalyticsResult<Vec<_>>>()?;
        let columns = rows
            .first()
            .map(|r| r.columns().map(str::to_string).collect())
            .unwrap_or_default();
        Ok(ResultSet { columns, rows })
    }

    pub fn push(&mut self, row: Row) {
        if self.columns.is_empty() {
            self.columns = row.columns().map(str::to_string).collect();
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Values of one column, row by row
    pub fn column(&self, name: &str) -> Vec<Option<&PropertyValue>> {
        self.rows.iter().map(|r| r.get(name)).collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Row::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Pair {
        disease: String,
        strength: f64,
        ci_lower: Option<f64>,
        systems: Vec<String>,
    }

    #[test]
    fn test_row_from_struct_keeps_order() {
        let row = Row::from_serialize(&Pair {
            disease: "COPD".to_string(),
            strength: 0.55,
            ci_lower: None,
            systems: vec!["Diseases of the Respiratory System".to_string()],
        })
        .unwrap();

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["disease", "strength", "ci_lower", "systems"]);
        assert_eq!(row.get("strength"), Some(&PropertyValue::Float(0.55)));
        assert_eq!(row.get("ci_lower"), Some(&PropertyValue::Null));
    }

    #[test]
    fn test_non_struct_rejected() {
        assert!(matches!(Row::from_serialize(&3), Err(AnalyticsError::NotARecord(_))));
    }

    #[test]
    fn test_result_set_json() {
        let mut set = ResultSet::default();
        set.push(Row::new().with("system", "Cancers").with("count", 2i64));
        assert_eq!(set.columns, vec!["system", "count"]);
        assert_eq!(
            set.to_json(),
            serde_json::json!([{ "system": "Cancers", "count": 2 }])
        );
    }

    #[test]
    fn test_empty_items() {
        let set = ResultSet::from_items::<Pair>(&[]).unwrap();
        assert!(set.is_empty());
        assert!(set.columns.is_empty());
    }
}
