use crate::{key::IndexKey, value::Value};
use std::collections::BTreeMap;

///
/// Document
///
/// One record as returned by the backing store: an ordered map of top-level
/// field names to scalar values. Fields that were never written are simply
/// missing and surface as the absent marker in index keys.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Extract this document's position in an index ordered by `index_fields`.
    #[must_use]
    pub fn index_key(&self, index_fields: &[String]) -> IndexKey {
        index_fields
            .iter()
            .map(|field| self.fields.get(field).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::{key::IndexKey, value::Value};

    #[test]
    fn index_key_marks_missing_fields_absent() {
        let doc = Document::new().with("a", 5).with("_id", "m1");
        let fields = ["a", "b", "_id"].map(str::to_string);

        assert_eq!(
            doc.index_key(&fields),
            IndexKey::new(vec![Some(Value::Int(5)), None, Some(Value::text("m1"))])
        );
    }
}
