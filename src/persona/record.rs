use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::PersonaValue;

/// Open, order-preserving persona document as served by the backend.
///
/// Deserialize from the raw response text to keep the server's field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaRecord {
    fields: IndexMap<String, PersonaValue>,
}

impl PersonaRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PersonaValue> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PersonaValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PersonaValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Equality that also requires the same field order
    pub fn is_identical(&self, other: &PersonaRecord) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl<K: Into<String>, V: Into<PersonaValue>> FromIterator<(K, V)> for PersonaRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
