//! Data transformation steps.

use serde::{Deserialize, Serialize};

/// Discretize a numeric field into fixed-width buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinTransform {
    /// Field to bin.
    pub bin: String,
    /// Output field receiving the bucket label.
    #[serde(rename = "as")]
    pub as_field: String,
    /// Explicit bucket width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Maximum number of buckets when no step is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxbins: Option<usize>,
}

/// Reduce each group of rows to one value.
///
/// The grouping is not declared; it is inferred from the fields in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateTransform {
    /// Aggregate function name (e.g. `count`, `sum`, `mean`).
    pub aggregate: String,
    /// Input field; `count` works without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Output field.
    #[serde(rename = "as")]
    pub as_field: String,
}

/// One step of a node's ordered transform list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transform {
    /// Binning.
    Bin(BinTransform),
    /// Aggregation.
    Aggregate(AggregateTransform),
}

impl Transform {
    /// Bin `field` into `as_field` with automatic bucket width.
    #[must_use]
    pub fn bin(field: &str, as_field: &str) -> Self {
        Transform::Bin(BinTransform {
            bin: field.to_string(),
            as_field: as_field.to_string(),
            step: None,
            maxbins: None,
        })
    }

    /// Bin `field` into `as_field` with a fixed bucket width.
    #[must_use]
    pub fn bin_step(field: &str, as_field: &str, step: f64) -> Self {
        Transform::Bin(BinTransform {
            bin: field.to_string(),
            as_field: as_field.to_string(),
            step: Some(step),
            maxbins: None,
        })
    }

    /// Count rows per group into `as_field`.
    #[must_use]
    pub fn count(as_field: &str) -> Self {
        Transform::Aggregate(AggregateTransform {
            aggregate: "count".to_string(),
            field: None,
            as_field: as_field.to_string(),
        })
    }

    /// Apply the aggregate `op` over `field` into `as_field`.
    #[must_use]
    pub fn aggregate(op: &str, field: &str, as_field: &str) -> Self {
        Transform::Aggregate(AggregateTransform {
            aggregate: op.to_string(),
            field: Some(field.to_string()),
            as_field: as_field.to_string(),
        })
    }

    /// The field this step writes.
    #[must_use]
    pub fn output_field(&self) -> &str {
        match self {
            Transform::Bin(b) => &b.as_field,
            Transform::Aggregate(a) => &a.as_field,
        }
    }
}
