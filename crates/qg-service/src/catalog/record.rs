use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A row as returned by the data source, keyed by column name.
pub type RawRecord = serde_json::Map<String, Value>;

/// A row shaped to a resource descriptor.
///
/// Serializes as a JSON object whose keys follow the descriptor's field
/// order. Every non-null value is rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<(String, Option<String>)>,
}

impl Record {
    pub(crate) fn shape(fields: &[String], raw: &RawRecord) -> Self {
        let values = fields
            .iter()
            .map(|field| (field.clone(), raw.get(field).and_then(render)))
            .collect();
        Self { values }
    }

    /// The value of `field`, `None` if absent or null.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
