//! Aggregate functions.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::grammar::Value;

/// Aggregate function applied by an `aggregate` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Number of rows.
    Count,
    /// Number of non-null values.
    Valid,
    /// Number of null values.
    Missing,
    /// Number of distinct values, null included.
    Distinct,
    /// Sum of numbers.
    Sum,
    /// Arithmetic mean of numbers.
    Mean,
    /// Median of numbers.
    Median,
    /// Smallest number.
    Min,
    /// Largest number.
    Max,
    /// Sample variance of numbers.
    Variance,
    /// Sample standard deviation of numbers.
    Stdev,
}

impl AggregateOp {
    /// Whether this op needs an input field.
    #[must_use]
    pub fn requires_field(self) -> bool {
        self != AggregateOp::Count
    }

    /// Reduce one group. `values` holds the group's input field values, or is
    /// empty for `count` without a field; `rows` is the group size.
    #[must_use]
    pub fn apply(self, rows: usize, values: &[&Value]) -> Value {
        match self {
            AggregateOp::Count => Value::Number(rows as f64),
            AggregateOp::Valid => Value::Number(values.iter().filter(|v| !v.is_null()).count() as f64),
            AggregateOp::Missing => Value::Number(values.iter().filter(|v| v.is_null()).count() as f64),
            AggregateOp::Distinct => {
                let distinct: HashSet<&Value> = values.iter().copied().collect();
                Value::Number(distinct.len() as f64)
            }
            AggregateOp::Sum => Value::Number(numbers(values).iter().sum()),
            AggregateOp::Mean => {
                let nums = numbers(values);
                if nums.is_empty() {
                    return Value::Null;
                }
                Value::Number(nums.iter().sum::<f64>() / nums.len() as f64)
            }
            AggregateOp::Median => {
                let mut nums = numbers(values);
                if nums.is_empty() {
                    return Value::Null;
                }
                nums.sort_by(f64::total_cmp);
                let mid = nums.len() / 2;
                if nums.len() % 2 == 0 {
                    Value::Number((nums[mid - 1] + nums[mid]) / 2.0)
                } else {
                    Value::Number(nums[mid])
                }
            }
            AggregateOp::Min => numbers(values).into_iter().reduce(f64::min).map_or(Value::Null, Value::Number),
            AggregateOp::Max => numbers(values).into_iter().reduce(f64::max).map_or(Value::Null, Value::Number),
            AggregateOp::Variance => variance(values).map_or(Value::Null, Value::Number),
            AggregateOp::Stdev => variance(values).map_or(Value::Null, |v| Value::Number(v.sqrt())),
        }
    }
}

fn numbers(values: &[&Value]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_f64()).filter(|n| n.is_finite()).collect()
}

fn variance(values: &[&Value]) -> Option<f64> {
    let nums = numbers(values);
    if nums.len() < 2 {
        return None;
    }
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    let ss: f64 = nums.iter().map(|n| (n - mean) * (n - mean)).sum();
    Some(ss / (nums.len() - 1) as f64)
}

impl FromStr for AggregateOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "count" => AggregateOp::Count,
            "valid" => AggregateOp::Valid,
            "missing" => AggregateOp::Missing,
            "distinct" => AggregateOp::Distinct,
            "sum" => AggregateOp::Sum,
            "mean" | "average" => AggregateOp::Mean,
            "median" => AggregateOp::Median,
            "min" => AggregateOp::Min,
            "max" => AggregateOp::Max,
            "variance" => AggregateOp::Variance,
            "stdev" => AggregateOp::Stdev,
            _ => {
                return Err(Error::UnknownAggregate {
                    path: crate::error::NodePath::root(),
                    op: s.to_string(),
                })
            }
        };
        Ok(op)
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateOp::Count => "count",
            AggregateOp::Valid => "valid",
            AggregateOp::Missing => "missing",
            AggregateOp::Distinct => "distinct",
            AggregateOp::Sum => "sum",
            AggregateOp::Mean => "mean",
            AggregateOp::Median => "median",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Variance => "variance",
            AggregateOp::Stdev => "stdev",
        };
        f.write_str(name)
    }
}
