//! Channel definitions: literal constants or typed field references.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Measurement type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Discrete, ordered categories.
    Ordinal,
    /// Continuous numeric values.
    Quantitative,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Ordinal => f.write_str("ordinal"),
            FieldType::Quantitative => f.write_str("quantitative"),
        }
    }
}

/// A reference to a table field, optionally typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    /// Field name.
    pub field: String,
    /// Measurement type; inferred from the working table when omitted.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

/// The binding of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    /// Field reference.
    Field(FieldDef),
    /// Constant visual value applied to every instance.
    Literal(Value),
}

impl Definition {
    /// Reference a field, leaving the type to inference.
    #[must_use]
    pub fn field(name: &str) -> Self {
        Definition::Field(FieldDef {
            field: name.to_string(),
            field_type: None,
        })
    }

    /// Reference an ordinal field.
    #[must_use]
    pub fn ordinal(name: &str) -> Self {
        Self::typed(name, FieldType::Ordinal)
    }

    /// Reference a quantitative field.
    #[must_use]
    pub fn quantitative(name: &str) -> Self {
        Self::typed(name, FieldType::Quantitative)
    }

    /// Reference a field with an explicit type.
    #[must_use]
    pub fn typed(name: &str, field_type: FieldType) -> Self {
        Definition::Field(FieldDef {
            field: name.to_string(),
            field_type: Some(field_type),
        })
    }

    /// A constant value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Definition::Literal(value.into())
    }

    /// The referenced field name, if this is a field reference.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Definition::Field(def) => Some(def.field.as_str()),
            Definition::Literal(_) => None,
        }
    }
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        Definition::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_parse_field() {
        let def: Definition = serde_json::from_str(r#"{"field": "foo", "type": "ordinal"}"#).unwrap();
        assert_eq!(def, Definition::ordinal("foo"));
        assert_eq!(def.field_name(), Some("foo"));
    }

    #[test]
    fn test_definition_parse_untyped_field() {
        let def: Definition = serde_json::from_str(r#"{"field": "foo"}"#).unwrap();
        assert_eq!(def, Definition::field("foo"));
    }

    #[test]
    fn test_definition_parse_literals() {
        let color: Definition = serde_json::from_str(r#""steelblue""#).unwrap();
        assert_eq!(color, Definition::literal("steelblue"));
        let size: Definition = serde_json::from_str("30").unwrap();
        assert_eq!(size, Definition::literal(30));
        assert_eq!(size.field_name(), None);
    }

    #[test]
    fn test_definition_rejects_unknown_type() {
        let result: Result<Definition, _> = serde_json::from_str(r#"{"field": "foo", "type": "nominal"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_definition_rejects_unknown_key() {
        let result: Result<Definition, _> = serde_json::from_str(r#"{"field": "foo", "scale": 2}"#);
        assert!(result.is_err());
    }
}
