use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::EditError;

/// One field of the persona document.
///
/// The backend decides the schema, so values are typed at runtime. Shapes
/// outside the string/number/bool/string-list/string-map set are kept
/// verbatim in `Json` so they round-trip to the server unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersonaValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
    Json(Value),
}

/// Runtime type of a field, which decides how edited text is parsed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Absent,
    Text,
    Number,
    Bool,
    List,
    Map,
}

/// Input widget a field is edited with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    TextArea,
    BoolSelect,
    NumberInput,
    TextInput,
}

impl PersonaValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            PersonaValue::Null => FieldKind::Absent,
            PersonaValue::Bool(_) => FieldKind::Bool,
            PersonaValue::Number(_) => FieldKind::Number,
            PersonaValue::Text(_) => FieldKind::Text,
            PersonaValue::List(_) => FieldKind::List,
            PersonaValue::Map(_) => FieldKind::Map,
            PersonaValue::Json(Value::Array(_)) => FieldKind::List,
            PersonaValue::Json(Value::Object(_)) => FieldKind::Map,
            PersonaValue::Json(Value::Null) => FieldKind::Absent,
            PersonaValue::Json(Value::Bool(_)) => FieldKind::Bool,
            PersonaValue::Json(Value::Number(_)) => FieldKind::Number,
            PersonaValue::Json(Value::String(_)) => FieldKind::Text,
        }
    }
}

impl From<&str> for PersonaValue {
    fn from(s: &str) -> Self {
        PersonaValue::Text(s.to_string())
    }
}

impl From<String> for PersonaValue {
    fn from(s: String) -> Self {
        PersonaValue::Text(s)
    }
}

impl From<bool> for PersonaValue {
    fn from(b: bool) -> Self {
        PersonaValue::Bool(b)
    }
}

impl From<i64> for PersonaValue {
    fn from(n: i64) -> Self {
        PersonaValue::Number(n.into())
    }
}

impl From<Vec<&str>> for PersonaValue {
    fn from(items: Vec<&str>) -> Self {
        PersonaValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl FieldKind {
    /// Help text shown under the field editor
    pub fn edit_hint(&self) -> &'static str {
        match self {
            FieldKind::List => "Comma-separated list",
            FieldKind::Map => "Format as key: value, key2: value2",
            _ => "",
        }
    }

    pub fn editor(&self) -> EditorKind {
        match self {
            FieldKind::List | FieldKind::Map => EditorKind::TextArea,
            FieldKind::Bool => EditorKind::BoolSelect,
            FieldKind::Number => EditorKind::NumberInput,
            FieldKind::Text | FieldKind::Absent => EditorKind::TextInput,
        }
    }
}

/// Render a field for display and as the initial editor text.
///
/// Absent, null and empty collections render as a single blank; lists
/// join with `", "`; maps render as `key: value` pairs joined the same way.
pub fn format_value(value: Option<&PersonaValue>) -> String {
    let Some(value) = value else {
        return " ".to_string();
    };

    match value {
        PersonaValue::Null => " ".to_string(),
        PersonaValue::Bool(b) => b.to_string(),
        PersonaValue::Number(n) => n.to_string(),
        PersonaValue::Text(s) => s.clone(),
        PersonaValue::List(items) if items.is_empty() => " ".to_string(),
        PersonaValue::List(items) => items.join(", "),
        PersonaValue::Map(entries) if entries.is_empty() => " ".to_string(),
        PersonaValue::Map(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", "),
        PersonaValue::Json(json) => format_json(json),
    }
}

fn format_json(json: &Value) -> String {
    match json {
        Value::Null => " ".to_string(),
        Value::Array(items) if items.is_empty() => " ".to_string(),
        Value::Array(items) => items.iter().map(plain_text).collect::<Vec<_>>().join(", "),
        Value::Object(entries) if entries.is_empty() => " ".to_string(),
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k, plain_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => plain_text(other),
    }
}

/// Strings without quotes, everything else as JSON text
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Derive a typed value from edited text, using the kind of the field
/// before editing began.
pub fn parse_field(key: &str, kind: FieldKind, raw: &str) -> Result<PersonaValue, EditError> {
    match kind {
        FieldKind::List => Ok(PersonaValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        FieldKind::Map => Ok(PersonaValue::Map(
            raw.split(',')
                .filter_map(|pair| {
                    let (k, v) = pair.split_once(':')?;
                    let (k, v) = (k.trim(), v.trim());
                    (!k.is_empty() && !v.is_empty()).then(|| (k.to_string(), v.to_string()))
                })
                .collect(),
        )),
        FieldKind::Number => parse_number(raw)
            .map(PersonaValue::Number)
            .ok_or_else(|| EditError::InvalidNumber {
                key: key.to_string(),
                raw: raw.to_string(),
            }),
        FieldKind::Bool => match raw.trim() {
            "true" => Ok(PersonaValue::Bool(true)),
            "false" => Ok(PersonaValue::Bool(false)),
            _ => Err(EditError::InvalidBool {
                key: key.to_string(),
                raw: raw.to_string(),
            }),
        },
        FieldKind::Text | FieldKind::Absent => Ok(PersonaValue::Text(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n.into());
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Display label for a field key: `favoriteColor` becomes `Favorite Color`
pub fn field_label(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }

    spaced
        .trim()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
