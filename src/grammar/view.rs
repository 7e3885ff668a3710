//! View trees: the root of a visualization spec.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compile::AggregateOp;
use crate::error::{Error, NodePath, Result};

use super::definition::{Definition, FieldDef};
use super::encoding::{Channel, Encoding};
use super::transform::Transform;
use super::value::Value;

/// Primitive mark type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    /// Point/symbol.
    Point,
    /// Bar.
    Bar,
    /// Connected line.
    Line,
    /// Filled area.
    Area,
    /// Rectangle.
    Rect,
    /// Rule (reference line).
    Rule,
    /// Tick.
    Tick,
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkType::Point => "point",
            MarkType::Bar => "bar",
            MarkType::Line => "line",
            MarkType::Area => "area",
            MarkType::Rect => "rect",
            MarkType::Rule => "rule",
            MarkType::Tick => "tick",
        };
        f.write_str(name)
    }
}

/// What a view node instantiates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewKind {
    /// Terminal primitive mark.
    Mark(MarkType),
    /// A single nested group.
    Single(Box<View>),
    /// An ordered list of nested groups.
    Many(Vec<View>),
}

/// A class of primitive or group marks to instantiate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct View {
    /// Ordered list of data transformations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    /// Mark or group template.
    pub view: ViewKind,
    /// Properties applied to instances.
    pub encoding: Encoding,
}

impl View {
    /// A terminal view drawing `mark`.
    #[must_use]
    pub fn mark(mark: MarkType) -> Self {
        Self::from_kind(ViewKind::Mark(mark))
    }

    /// A group around one nested view.
    #[must_use]
    pub fn nested(child: View) -> Self {
        Self::from_kind(ViewKind::Single(Box::new(child)))
    }

    /// A group around an ordered list of views.
    #[must_use]
    pub fn concat(children: Vec<View>) -> Self {
        Self::from_kind(ViewKind::Many(children))
    }

    fn from_kind(view: ViewKind) -> Self {
        Self {
            transform: Vec::new(),
            view,
            encoding: Encoding::new(),
        }
    }

    /// Set the encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Append a transform step.
    #[must_use]
    pub fn transform(mut self, step: Transform) -> Self {
        self.transform.push(step);
        self
    }

    /// Parse and validate a JSON spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`] for malformed JSON, unknown keys or
    /// values, and any violation reported by [`View::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let view: View = serde_json::from_str(json).map_err(|e| Error::invalid_spec(e.to_string()))?;
        view.validate()?;
        Ok(view)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if the JSON writer rejects the view.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Check structural rules that the type system does not encode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`] located at the first offending node.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(&NodePath::root())
    }

    fn validate_at(&self, path: &NodePath) -> Result<()> {
        self.validate_node().map_err(|e| e.at(path))?;
        match &self.view {
            ViewKind::Mark(_) => Ok(()),
            ViewKind::Single(child) => child.validate_at(&path.child(0)),
            ViewKind::Many(children) => {
                if children.is_empty() {
                    return Err(Error::invalid_spec("view array must not be empty").at(path));
                }
                children
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, child)| child.validate_at(&path.child(i)))
            }
        }
    }

    fn validate_node(&self) -> Result<()> {
        for step in &self.transform {
            validate_transform(step)?;
        }
        for channel in Channel::ALL {
            match self.encoding.get(channel) {
                Some(Definition::Literal(Value::Null)) => {
                    return Err(Error::invalid_spec(format!(
                        "channel '{channel}' binds a null literal"
                    )));
                }
                Some(Definition::Field(FieldDef { field, .. })) if field.is_empty() => {
                    return Err(Error::invalid_spec(format!(
                        "channel '{channel}' references an empty field name"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + match &self.view {
            ViewKind::Mark(_) => 0,
            ViewKind::Single(child) => child.node_count(),
            ViewKind::Many(children) => children.iter().map(View::node_count).sum(),
        }
    }
}

fn validate_transform(step: &Transform) -> Result<()> {
    if step.output_field().is_empty() {
        return Err(Error::invalid_spec("transform 'as' must not be empty"));
    }
    match step {
        Transform::Bin(bin) => {
            if bin.bin.is_empty() {
                return Err(Error::invalid_spec("bin field must not be empty"));
            }
            if let Some(step) = bin.step {
                if !step.is_finite() || step <= 0.0 {
                    return Err(Error::invalid_spec(format!(
                        "bin step must be a positive number, got {step}"
                    )));
                }
            }
            if bin.maxbins == Some(0) {
                return Err(Error::invalid_spec("bin maxbins must be at least 1"));
            }
        }
        Transform::Aggregate(agg) => {
            if agg.field.as_deref() == Some("") {
                return Err(Error::invalid_spec("aggregate field must not be empty"));
            }
            // Unknown ops are left to evaluation, which reports them as UnknownAggregate.
            if let Ok(op) = agg.aggregate.parse::<AggregateOp>() {
                if op.requires_field() && agg.field.is_none() {
                    return Err(Error::invalid_spec(format!(
                        "aggregate '{}' requires a field",
                        agg.aggregate
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_view_parse_mark() {
        let view = View::from_json(
            r#"{"view": "bar", "encoding": {"x": {"field": "foo", "type": "ordinal"}, "color": "steelblue"}}"#,
        )
        .unwrap();
        assert_eq!(view.view, ViewKind::Mark(MarkType::Bar));
        assert_eq!(view.node_count(), 1);
    }

    #[test]
    fn test_view_parse_nested_and_array() {
        let view = View::from_json(
            r#"{"view": {"view": [{"view": "point", "encoding": {}}, {"view": "rule", "encoding": {}}], "encoding": {}}, "encoding": {}}"#,
        )
        .unwrap();
        assert_eq!(view.node_count(), 4);
        match &view.view {
            ViewKind::Single(child) => assert!(matches!(child.view, ViewKind::Many(ref c) if c.len() == 2)),
            other => panic!("expected single nested view, got {other:?}"),
        }
    }

    #[test]
    fn test_view_rejects_unknown_key() {
        let err = View::from_json(r#"{"view": "bar", "encoding": {}, "title": "x"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_rejects_unknown_mark() {
        let err = View::from_json(r#"{"view": "pie", "encoding": {}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_requires_encoding() {
        let err = View::from_json(r#"{"view": "bar"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_rejects_empty_array_with_path() {
        let view = View::concat(vec![View::mark(MarkType::Point), View::concat(vec![])]);
        let err = view.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSpec);
        assert_eq!(err.path(), Some(&NodePath::from(vec![1])));
    }

    #[test]
    fn test_view_rejects_null_literal() {
        let view = View::mark(MarkType::Point)
            .encoding(Encoding::new().color(Definition::Literal(Value::Null)));
        assert_eq!(view.validate().unwrap_err().kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_rejects_bad_bin_step() {
        let view = View::mark(MarkType::Bar).transform(Transform::bin_step("foo", "b", 0.0));
        assert_eq!(view.validate().unwrap_err().kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_rejects_sum_without_field() {
        let view = View::mark(MarkType::Bar).transform(Transform::Aggregate(
            crate::grammar::AggregateTransform {
                aggregate: "sum".into(),
                field: None,
                as_field: "total".into(),
            },
        ));
        assert_eq!(view.validate().unwrap_err().kind(), ErrorKind::InvalidSpec);
    }

    #[test]
    fn test_view_leaves_unknown_aggregate_to_evaluation() {
        let view = View::mark(MarkType::Bar).transform(Transform::aggregate("mode", "foo", "m"));
        assert!(view.validate().is_ok());
    }

    #[test]
    fn test_view_json_round_trip() {
        let view = View::nested(View::mark(MarkType::Point))
            .encoding(Encoding::new().detail(Definition::field("baz")));
        let parsed = View::from_json(&view.to_json().unwrap()).unwrap();
        assert_eq!(parsed, view);
    }
}
