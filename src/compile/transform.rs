//! Transform executor.
//!
//! Runs a node's ordered `bin`/`aggregate` steps over its ambient table.
//! Aggregates declare no group-by; it is inferred from bin outputs and the
//! dimension fields the node's encoding references.

use std::collections::{BTreeSet, HashMap};

use crate::config::BinConfig;
use crate::error::{Error, Result};
use crate::grammar::{AggregateTransform, BinTransform, Table, Transform, Value};

use super::aggregate::AggregateOp;
use super::bin::Binning;

/// Result of running a transform list.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// Derived working table.
    pub table: Table,
    /// Grouping key: the last aggregate's group-by, or the bin outputs when
    /// nothing was aggregated.
    pub group_by: Vec<String>,
    /// Fields written by aggregate steps.
    pub aggregated: BTreeSet<String>,
}

/// Executes transform lists.
#[derive(Debug, Clone, Default)]
pub struct TransformExecutor {
    bin: BinConfig,
}

impl TransformExecutor {
    /// Create an executor with the given binning defaults.
    #[must_use]
    pub fn new(bin: BinConfig) -> Self {
        Self { bin }
    }

    /// Run `transforms` in order over `table`.
    ///
    /// `dimensions` are the field names referenced by the enclosing node's
    /// encoding; those present and not being aggregated join the inferred
    /// group-by of each aggregate step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for references to absent fields and
    /// [`Error::UnknownAggregate`] for unrecognized aggregate names.
    pub fn run(&self, table: &Table, transforms: &[Transform], dimensions: &[String]) -> Result<TransformOutput> {
        let mut state = TransformOutput {
            table: table.clone(),
            group_by: Vec::new(),
            aggregated: BTreeSet::new(),
        };
        let mut binned: Vec<String> = Vec::new();
        let mut aggregated_any = false;

        for step in transforms {
            match step {
                Transform::Bin(bin) => {
                    state.table = self.bin(&state.table, bin)?;
                    if !binned.contains(&bin.as_field) {
                        binned.push(bin.as_field.clone());
                    }
                    state.aggregated.remove(&bin.as_field);
                }
                Transform::Aggregate(agg) => {
                    let group_by = infer_group_by(&state.table, agg, &binned, dimensions, &state.aggregated);
                    state.table = aggregate(&state.table, agg, &group_by)?;
                    binned.retain(|f| state.table.has_field(f));
                    state.aggregated.retain(|f| state.table.has_field(f));
                    state.aggregated.insert(agg.as_field.clone());
                    state.group_by = group_by;
                    aggregated_any = true;
                }
            }
        }

        if !aggregated_any {
            state.group_by = binned;
        }
        Ok(state)
    }

    fn bin(&self, table: &Table, bin: &BinTransform) -> Result<Table> {
        let column = table.column(&bin.bin).ok_or_else(|| Error::unknown_field(&bin.bin))?;
        let maxbins = bin.maxbins.unwrap_or(self.bin.maxbins);
        let labels: Vec<Value> = match Binning::fit(column, bin.step, maxbins) {
            Some(binning) => {
                tracing::debug!(field = %bin.bin, step = binning.step, start = binning.start, "bin");
                table
                    .column(&bin.bin)
                    .into_iter()
                    .flatten()
                    .map(|v| binning.label(v))
                    .collect()
            }
            None => vec![Value::Null; table.nrow()],
        };
        Ok(table.with_column(&bin.as_field, labels))
    }
}

fn infer_group_by(
    table: &Table,
    agg: &AggregateTransform,
    binned: &[String],
    dimensions: &[String],
    aggregated: &BTreeSet<String>,
) -> Vec<String> {
    let mut group_by: Vec<String> = Vec::new();
    let candidates = binned.iter().chain(dimensions.iter().filter(|d| !aggregated.contains(*d)));
    for field in candidates {
        let excluded = *field == agg.as_field || agg.field.as_deref() == Some(field.as_str());
        if !excluded && table.has_field(field) && !group_by.contains(field) {
            group_by.push(field.clone());
        }
    }
    group_by
}

fn aggregate(table: &Table, agg: &AggregateTransform, group_by: &[String]) -> Result<Table> {
    let op: AggregateOp = agg.aggregate.parse()?;
    let input = match agg.field.as_deref() {
        Some(field) => Some(table.field_index(field).ok_or_else(|| Error::unknown_field(field))?),
        None => None,
    };
    let key_indices: Vec<usize> = group_by.iter().filter_map(|f| table.field_index(f)).collect();

    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut groups: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
    for (r, row) in table.rows().iter().enumerate() {
        let key: Vec<Value> = key_indices.iter().map(|&i| row[i].clone()).collect();
        groups
            .entry(key)
            .or_insert_with_key(|k| {
                order.push(k.clone());
                Vec::new()
            })
            .push(r);
    }
    if group_by.is_empty() && order.is_empty() {
        order.push(Vec::new());
        groups.insert(Vec::new(), Vec::new());
    }

    let rows: Vec<Vec<Value>> = order
        .into_iter()
        .map(|key| {
            let members = groups.get(&key).map_or(&[][..], Vec::as_slice);
            let values: Vec<&Value> = match input {
                Some(i) => members.iter().map(|&r| &table.rows()[r][i]).collect(),
                None => Vec::new(),
            };
            let mut row = key;
            row.push(op.apply(members.len(), &values));
            row
        })
        .collect();

    tracing::debug!(op = %op, group_by = ?group_by, groups = rows.len(), "aggregate");

    let mut fields = group_by.to_vec();
    fields.push(agg.as_field.clone());
    Ok(Table::from_parts(fields, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn foo_table() -> Table {
        Table::from_columns(vec![
            ("foo", [1, 1, 2, 5, 5, 5].into_iter().map(Value::from).collect()),
            ("baz", ["A", "B", "A", "A", "B", "B"].into_iter().map(Value::from).collect()),
        ])
    }

    fn run(transforms: &[Transform], dims: &[&str]) -> Result<TransformOutput> {
        let dims: Vec<String> = dims.iter().map(ToString::to_string).collect();
        TransformExecutor::default().run(&foo_table(), transforms, &dims)
    }

    #[test]
    fn test_no_transforms_is_identity() {
        let out = run(&[], &["foo"]).unwrap();
        assert_eq!(out.table, foo_table());
        assert!(out.group_by.is_empty());
        assert!(out.aggregated.is_empty());
    }

    #[test]
    fn test_bin_keeps_row_count() {
        let out = run(&[Transform::bin_step("foo", "binned", 2.0)], &[]).unwrap();
        assert_eq!(out.table.nrow(), 6);
        assert_eq!(out.table.value(3, "binned"), Some(&Value::from("[4-6]")));
        assert_eq!(out.group_by, vec!["binned".to_string()]);
    }

    #[test]
    fn test_histogram_counts() {
        let out = run(
            &[Transform::bin_step("foo", "binned_foo", 2.0), Transform::count("count")],
            &["binned_foo", "count"],
        )
        .unwrap();
        assert_eq!(out.table.fields(), &["binned_foo", "count"]);
        assert_eq!(out.table.nrow(), 3);
        let counts: Vec<&Value> = out.table.column("count").unwrap().collect();
        assert_eq!(counts, vec![&Value::from(2), &Value::from(1), &Value::from(3)]);
        assert_eq!(out.group_by, vec!["binned_foo".to_string()]);
        assert!(out.aggregated.contains("count"));
    }

    #[test]
    fn test_aggregate_without_grouping_is_one_row() {
        let out = run(&[Transform::count("count")], &["count"]).unwrap();
        assert_eq!(out.table.nrow(), 1);
        assert_eq!(out.table.value(0, "count"), Some(&Value::from(6)));
        assert!(out.group_by.is_empty());
    }

    #[test]
    fn test_aggregate_on_empty_table_is_one_row() {
        let empty = Table::new(["foo"]);
        let out = TransformExecutor::default()
            .run(&empty, &[Transform::count("n")], &[])
            .unwrap();
        assert_eq!(out.table.nrow(), 1);
        assert_eq!(out.table.value(0, "n"), Some(&Value::from(0)));
    }

    #[test]
    fn test_aggregate_groups_by_encoding_dimensions() {
        let out = run(&[Transform::count("count")], &["baz", "count"]).unwrap();
        assert_eq!(out.group_by, vec!["baz".to_string()]);
        assert_eq!(out.table.nrow(), 2);
        assert_eq!(out.table.value(0, "baz"), Some(&Value::from("A")));
        assert_eq!(out.table.value(0, "count"), Some(&Value::from(3)));
    }

    #[test]
    fn test_aggregate_excludes_its_input_field() {
        let out = run(&[Transform::aggregate("sum", "foo", "total")], &["foo", "total"]).unwrap();
        assert!(out.group_by.is_empty());
        assert_eq!(out.table.value(0, "total"), Some(&Value::from(19)));
    }

    #[test]
    fn test_dimensions_missing_from_table_are_ignored() {
        let out = run(&[Transform::count("count")], &["not_here"]).unwrap();
        assert_eq!(out.table.nrow(), 1);
    }

    #[test]
    fn test_second_aggregate_does_not_group_by_first_output() {
        let out = run(
            &[Transform::count("count"), Transform::aggregate("max", "count", "most")],
            &["baz", "count", "most"],
        )
        .unwrap();
        assert_eq!(out.group_by, vec!["baz".to_string()]);
        assert_eq!(out.table.fields(), &["baz", "most"]);
        assert!(out.aggregated.contains("most"));
        assert!(!out.aggregated.contains("count"));
    }

    #[test]
    fn test_unknown_bin_field() {
        let err = run(&[Transform::bin("nope", "b")], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_unknown_aggregate_field() {
        let err = run(&[Transform::aggregate("sum", "nope", "s")], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_unknown_aggregate_op() {
        let err = run(&[Transform::aggregate("mode", "foo", "m")], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAggregate);
    }

    #[test]
    fn test_later_steps_see_earlier_outputs() {
        let out = run(
            &[Transform::count("count"), Transform::bin_step("count", "count_bin", 5.0)],
            &[],
        )
        .unwrap();
        assert_eq!(out.table.value(0, "count_bin"), Some(&Value::from("[5-10]")));
    }
}
