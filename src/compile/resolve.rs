//! Encoding resolver.
//!
//! Merges inherited channels with a node's own encoding and binds every
//! field reference to a concrete type against the node's working table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::grammar::{Channel, Channels, Coordinates, Definition, Encoding, FieldDef, FieldType, Layout, Table, Value};

/// A channel binding after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedDefinition {
    /// Constant applied to every instance.
    Constant {
        /// The constant.
        value: Value,
    },
    /// A field with a known type.
    Field {
        /// Field name.
        field: String,
        /// Declared or inferred type.
        #[serde(rename = "type")]
        field_type: FieldType,
    },
}

impl From<&ResolvedDefinition> for Definition {
    fn from(def: &ResolvedDefinition) -> Self {
        match def {
            ResolvedDefinition::Constant { value } => Definition::Literal(value.clone()),
            ResolvedDefinition::Field { field, field_type } => Definition::typed(field, *field_type),
        }
    }
}

/// A node's encoding with every channel resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEncoding {
    /// Resolved channels, `detail` included.
    pub channels: BTreeMap<Channel, ResolvedDefinition>,
    /// This node's coordinate system.
    pub coordinates: Coordinates,
    /// This node's layout directive as written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl ResolvedEncoding {
    /// Binding of a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&ResolvedDefinition> {
        self.channels.get(&channel)
    }

    /// The field bound to `detail`, if it is a field.
    #[must_use]
    pub fn detail_field(&self) -> Option<&str> {
        match self.get(Channel::Detail) {
            Some(ResolvedDefinition::Field { field, .. }) => Some(field),
            _ => None,
        }
    }

    /// Back to an unresolved encoding with explicit types.
    #[must_use]
    pub fn to_encoding(&self) -> Encoding {
        let mut enc = self
            .channels
            .iter()
            .fold(Encoding::new(), |enc, (c, d)| enc.channel(*c, d.into()));
        enc.coordinates = Some(self.coordinates);
        enc.layout = self.layout;
        enc
    }
}

/// Merge inherited channels with a node's own encoding. Child wins per channel.
#[must_use]
pub fn merge(parent: &Channels, child: &Encoding) -> Channels {
    parent.merged_with(&child.channels())
}

/// Resolves encodings against one working table, caching inferred types.
#[derive(Debug)]
pub struct EncodingResolver<'t> {
    table: &'t Table,
    inferred: HashMap<String, FieldType>,
}

impl<'t> EncodingResolver<'t> {
    /// Create a resolver for `table`.
    #[must_use]
    pub fn new(table: &'t Table) -> Self {
        Self {
            table,
            inferred: HashMap::new(),
        }
    }

    /// Merge `parent` with `child` and resolve every channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] when a channel references a field the
    /// table does not have.
    pub fn resolve(&mut self, parent: &Channels, child: &Encoding) -> Result<ResolvedEncoding> {
        let merged = merge(parent, child);
        let mut channels = BTreeMap::new();
        for (channel, def) in merged.iter() {
            channels.insert(channel, self.resolve_definition(def)?);
        }
        Ok(ResolvedEncoding {
            channels,
            coordinates: child.coordinates.unwrap_or_default(),
            layout: child.layout,
        })
    }

    /// Resolve a single definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for an absent field.
    pub fn resolve_definition(&mut self, def: &Definition) -> Result<ResolvedDefinition> {
        match def {
            Definition::Literal(value) => Ok(ResolvedDefinition::Constant { value: value.clone() }),
            Definition::Field(FieldDef { field, field_type }) => {
                if !self.table.has_field(field) {
                    return Err(Error::unknown_field(field));
                }
                let field_type = match field_type {
                    Some(t) => *t,
                    None => self.infer(field),
                };
                Ok(ResolvedDefinition::Field {
                    field: field.clone(),
                    field_type,
                })
            }
        }
    }

    fn infer(&mut self, field: &str) -> FieldType {
        if let Some(t) = self.inferred.get(field) {
            return *t;
        }
        let t = infer_type(self.table, field);
        tracing::trace!(field, field_type = %t, "inferred field type");
        self.inferred.insert(field.to_string(), t);
        t
    }

    /// Number of cached type inferences.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.inferred.len()
    }
}

/// Numeric domain means quantitative: at least one number and only numbers or nulls.
#[must_use]
pub fn infer_type(table: &Table, field: &str) -> FieldType {
    let Some(column) = table.column(field) else {
        return FieldType::Ordinal;
    };
    let mut saw_number = false;
    for value in column {
        match value {
            Value::Number(_) => saw_number = true,
            Value::Null => {}
            _ => return FieldType::Ordinal,
        }
    }
    if saw_number {
        FieldType::Quantitative
    } else {
        FieldType::Ordinal
    }
}

/// Merge and resolve in one call.
///
/// # Errors
///
/// See [`EncodingResolver::resolve`].
pub fn resolve(parent: &Channels, child: &Encoding, table: &Table) -> Result<ResolvedEncoding> {
    EncodingResolver::new(table).resolve(parent, child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::grammar::LayoutKind;

    fn table() -> Table {
        Table::from_columns(vec![
            ("foo", vec![1.into(), 2.into(), Value::Null]),
            ("bar", vec![3.into(), 4.into(), 5.into()]),
            ("baz", vec!["A".into(), "B".into(), "A".into()]),
            ("mixed", vec![1.into(), "x".into(), 2.into()]),
            ("empty", vec![Value::Null, Value::Null, Value::Null]),
        ])
    }

    #[test]
    fn test_infer_type() {
        let t = table();
        assert_eq!(infer_type(&t, "foo"), FieldType::Quantitative);
        assert_eq!(infer_type(&t, "baz"), FieldType::Ordinal);
        assert_eq!(infer_type(&t, "mixed"), FieldType::Ordinal);
        assert_eq!(infer_type(&t, "empty"), FieldType::Ordinal);
    }

    #[test]
    fn test_resolve_infers_missing_types() {
        let t = table();
        let enc = Encoding::new()
            .x(Definition::field("baz"))
            .y(Definition::field("bar"))
            .color(Definition::literal("steelblue"));
        let resolved = resolve(&Channels::new(), &enc, &t).unwrap();
        assert_eq!(
            resolved.get(Channel::X),
            Some(&ResolvedDefinition::Field {
                field: "baz".into(),
                field_type: FieldType::Ordinal
            })
        );
        assert_eq!(
            resolved.get(Channel::Y),
            Some(&ResolvedDefinition::Field {
                field: "bar".into(),
                field_type: FieldType::Quantitative
            })
        );
        assert_eq!(
            resolved.get(Channel::Color),
            Some(&ResolvedDefinition::Constant {
                value: "steelblue".into()
            })
        );
    }

    #[test]
    fn test_explicit_type_wins_over_inference() {
        let enc = Encoding::new().x(Definition::ordinal("bar"));
        let resolved = resolve(&Channels::new(), &enc, &table()).unwrap();
        assert!(matches!(
            resolved.get(Channel::X),
            Some(ResolvedDefinition::Field {
                field_type: FieldType::Ordinal,
                ..
            })
        ));
    }

    #[test]
    fn test_child_overrides_and_inherits() {
        let parent = Encoding::new()
            .x(Definition::field("foo"))
            .size(Definition::literal(30))
            .channels();
        let child = Encoding::new().x(Definition::field("baz"));
        let resolved = resolve(&parent, &child, &table()).unwrap();
        assert!(matches!(resolved.get(Channel::X), Some(ResolvedDefinition::Field { field, .. }) if field == "baz"));
        assert_eq!(
            resolved.get(Channel::Size),
            Some(&ResolvedDefinition::Constant { value: 30.into() })
        );
        assert!(resolved.get(Channel::Y).is_none());
    }

    #[test]
    fn test_controls_are_not_inherited() {
        let parent = Encoding::new()
            .x(Definition::field("foo"))
            .coordinates(Coordinates::Radial)
            .layout(Layout::vertical());
        let resolved = resolve(&parent.channels(), &Encoding::new(), &table()).unwrap();
        assert_eq!(resolved.coordinates, Coordinates::Cartesian);
        assert_eq!(resolved.layout, None);

        let own = Encoding::new().layout(Layout::horizontal());
        let resolved = resolve(&parent.channels(), &own, &table()).unwrap();
        assert_eq!(resolved.layout.map(|l| l.kind), Some(LayoutKind::Horizontal));
    }

    #[test]
    fn test_empty_child_yields_parent_channels() {
        let parent = Encoding::new()
            .x(Definition::field("foo"))
            .detail(Definition::field("baz"))
            .channels();
        assert_eq!(merge(&parent, &Encoding::new()), parent);
    }

    #[test]
    fn test_unknown_field() {
        let enc = Encoding::new().y(Definition::field("qux"));
        let err = resolve(&Channels::new(), &enc, &table()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        assert!(err.to_string().contains("qux"));
    }

    #[test]
    fn test_inference_is_cached_per_field() {
        let t = table();
        let mut resolver = EncodingResolver::new(&t);
        let enc = Encoding::new()
            .x(Definition::field("foo"))
            .y(Definition::field("foo"))
            .color(Definition::field("baz"));
        resolver.resolve(&Channels::new(), &enc).unwrap();
        assert_eq!(resolver.cached(), 2);
    }

    #[test]
    fn test_resolved_literal_encoding_is_fixed_point() {
        let t = table();
        let enc = Encoding::new()
            .color(Definition::literal("firebrick"))
            .size(Definition::literal(4))
            .channel(Channel::Opacity, Definition::literal(0.5));
        let once = resolve(&Channels::new(), &enc, &t).unwrap();
        let twice = resolve(&Channels::new(), &once.to_encoding(), &t).unwrap();
        assert_eq!(once, twice);
    }
}
