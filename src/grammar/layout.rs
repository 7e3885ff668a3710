//! Layout directives for arranging children and facets.
//!
//! Accepts the short string form (`"layer"`, `"horizontal"`, `"vertical"`)
//! and the object form `{type, columns?}`. `columns` is kept as written so
//! that non-integer values can be reported as invalid layouts rather than
//! parse failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Composition strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Shared frame, later children on top.
    Layer,
    /// Left-to-right panels.
    Horizontal,
    /// Top-to-bottom panels.
    Vertical,
    /// Row-major grid.
    Wrap,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutKind::Layer => "layer",
            LayoutKind::Horizontal => "horizontal",
            LayoutKind::Vertical => "vertical",
            LayoutKind::Wrap => "wrap",
        };
        f.write_str(name)
    }
}

/// A layout directive as written in a spec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LayoutRepr", into = "LayoutRepr")]
pub struct Layout {
    /// Composition strategy.
    pub kind: LayoutKind,
    /// Grid column count, as written.
    pub columns: Option<f64>,
}

impl Layout {
    /// Layered layout.
    #[must_use]
    pub fn layer() -> Self {
        Self::of(LayoutKind::Layer)
    }

    /// Horizontal concatenation.
    #[must_use]
    pub fn horizontal() -> Self {
        Self::of(LayoutKind::Horizontal)
    }

    /// Vertical concatenation.
    #[must_use]
    pub fn vertical() -> Self {
        Self::of(LayoutKind::Vertical)
    }

    /// Wrapped grid with an explicit column count.
    #[must_use]
    pub fn wrap(columns: usize) -> Self {
        Self {
            kind: LayoutKind::Wrap,
            columns: Some(columns as f64),
        }
    }

    /// Wrapped grid relying on the configured column count.
    #[must_use]
    pub fn wrap_default() -> Self {
        Self::of(LayoutKind::Wrap)
    }

    fn of(kind: LayoutKind) -> Self {
        Self { kind, columns: None }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LayoutRepr {
    Name(LayoutKind),
    Object(LayoutObject),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutObject {
    #[serde(rename = "type")]
    kind: LayoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<f64>,
}

impl From<LayoutRepr> for Layout {
    fn from(repr: LayoutRepr) -> Self {
        match repr {
            LayoutRepr::Name(kind) => Layout { kind, columns: None },
            LayoutRepr::Object(LayoutObject { kind, columns }) => Layout { kind, columns },
        }
    }
}

impl From<Layout> for LayoutRepr {
    fn from(layout: Layout) -> Self {
        match (layout.kind, layout.columns) {
            (LayoutKind::Wrap, columns) | (_, columns @ Some(_)) => LayoutRepr::Object(LayoutObject {
                kind: layout.kind,
                columns,
            }),
            (kind, None) => LayoutRepr::Name(kind),
        }
    }
}
