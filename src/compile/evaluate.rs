//! View tree evaluator.
//!
//! Walks a view tree top-down. Each node runs its transforms over the ambient
//! table, resolves its encoding against the result, then either emits marks or
//! recurses into its children and arranges them.

use std::collections::HashMap;

use crate::config::CompilerConfig;
use crate::error::{Error, NodePath, Result};
use crate::grammar::{Channels, MarkType, Table, Value, View, ViewKind};

use super::layout::{plan, resolve_layout, ResolvedLayout};
use super::resolve::{merge, EncodingResolver, ResolvedDefinition, ResolvedEncoding};
use super::scene::{BoundValue, GroupNode, MarkGroup, MarkInstance, MarkLeaf, PlacedNode, SceneNode};
use super::transform::{TransformExecutor, TransformOutput};

/// Recursive evaluator for one compilation.
#[derive(Debug)]
pub(crate) struct Evaluator<'c> {
    config: &'c CompilerConfig,
    executor: TransformExecutor,
}

impl<'c> Evaluator<'c> {
    pub(crate) fn new(config: &'c CompilerConfig) -> Self {
        Self {
            config,
            executor: TransformExecutor::new(config.bin.clone()),
        }
    }

    /// Evaluate `view` at `path` against the ambient table and inherited channels.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path, kind = kind_name(&view.view)))]
    pub(crate) fn evaluate(&self, view: &View, table: &Table, ambient: &Channels, path: &NodePath) -> Result<SceneNode> {
        let merged = merge(ambient, &view.encoding);
        let output = self
            .executor
            .run(table, &view.transform, &merged.field_names())
            .map_err(|e| e.at(path))?;
        let encoding = EncodingResolver::new(&output.table)
            .resolve(ambient, &view.encoding)
            .map_err(|e| e.at(path))?;

        match &view.view {
            ViewKind::Mark(mark) => {
                resolve_layout(view.encoding.layout.as_ref(), false, &self.config.layout).map_err(|e| e.at(path))?;
                self.marks(*mark, path, encoding, output)
            }
            ViewKind::Single(child) => match view.encoding.detail_field() {
                Some(field) => self.facet(child, field, path, encoding, &output.table, &merged),
                None => {
                    let layout = resolve_layout(view.encoding.layout.as_ref(), false, &self.config.layout)
                        .map_err(|e| e.at(path))?;
                    let node = self.evaluate(child, &output.table, &merged, &path.child(0))?;
                    Ok(arrange(path, encoding, layout, vec![(None, node)]))
                }
            },
            ViewKind::Many(children) => {
                let layout = resolve_layout(view.encoding.layout.as_ref(), false, &self.config.layout)
                    .map_err(|e| e.at(path))?;
                check_budget("max_layout_children", self.config.limits.max_layout_children, children.len())
                    .map_err(|e| e.at(path))?;
                let nodes = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| {
                        self.evaluate(child, &output.table, &merged, &path.child(i))
                            .map(|node| (None, node))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(arrange(path, encoding, layout, nodes))
            }
        }
    }

    /// Fan a single nested view out into one panel per distinct `field` value.
    fn facet(
        &self,
        child: &View,
        field: &str,
        path: &NodePath,
        encoding: ResolvedEncoding,
        table: &Table,
        merged: &Channels,
    ) -> Result<SceneNode> {
        let layout = resolve_layout(encoding.layout.as_ref(), true, &self.config.layout).map_err(|e| e.at(path))?;
        let values = table
            .distinct(field)
            .ok_or_else(|| Error::unknown_field(field).at(path))?;
        let limits = &self.config.limits;
        check_budget("max_facets", limits.max_facets, values.len()).map_err(|e| e.at(path))?;
        check_budget("max_layout_children", limits.max_layout_children, values.len()).map_err(|e| e.at(path))?;
        tracing::debug!(field, panels = values.len(), layout = ?layout, "facet");

        let panels = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| -> Result<(Option<(String, Value)>, SceneNode)> {
                let rows = table.filter_eq(field, &value);
                // Every panel is the same child view; the panel index lives in its placement.
                let node = self
                    .evaluate(child, &rows, merged, &path.child(0))
                    .inspect_err(|e| tracing::debug!(field, panel = i, value = ?value, error = %e, "facet panel failed"))?;
                Ok((Some((field.to_string(), value)), node))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(arrange(path, encoding, layout, panels))
    }

    /// Emit one instance per working row, grouped by the grouping fields and `detail`.
    fn marks(&self, mark: MarkType, path: &NodePath, encoding: ResolvedEncoding, output: TransformOutput) -> Result<SceneNode> {
        let TransformOutput {
            table,
            group_by,
            aggregated,
        } = output;
        check_budget("max_mark_instances", self.config.limits.max_mark_instances, table.nrow())
            .map_err(|e| e.at(path))?;

        let mut keys = group_by;
        if let Some(detail) = encoding.detail_field() {
            if !keys.iter().any(|k| k == detail) {
                keys.push(detail.to_string());
            }
        }
        let keys: Vec<(String, usize)> = keys
            .into_iter()
            .filter_map(|k| table.field_index(&k).map(|i| (k, i)))
            .collect();

        let mut bindings = Vec::new();
        for (&channel, def) in encoding.channels.iter().filter(|(c, _)| c.is_visual()) {
            let index = match def {
                ResolvedDefinition::Constant { .. } => None,
                ResolvedDefinition::Field { field, .. } => Some(
                    table
                        .field_index(field)
                        .ok_or_else(|| Error::unknown_field(field.as_str()).at(path))?,
                ),
            };
            bindings.push((channel, def, index));
        }

        let mut groups: Vec<MarkGroup> = Vec::new();
        let mut lookup: HashMap<Vec<Value>, usize> = HashMap::new();
        for (r, row) in table.rows().iter().enumerate() {
            let key: Vec<Value> = keys.iter().map(|(_, i)| row[*i].clone()).collect();
            let slot = *lookup.entry(key).or_insert_with_key(|key| {
                groups.push(MarkGroup {
                    key: keys.iter().map(|(f, _)| f.clone()).zip(key.iter().cloned()).collect(),
                    rows: Vec::new(),
                    instances: Vec::new(),
                });
                groups.len() - 1
            });

            let channels = bindings
                .iter()
                .map(|(channel, def, index)| {
                    let bound = match def {
                        ResolvedDefinition::Constant { value } => BoundValue::Constant { value: value.clone() },
                        ResolvedDefinition::Field { field, field_type } => BoundValue::Field {
                            field: field.clone(),
                            field_type: *field_type,
                            value: index.map_or(Value::Null, |i| row[i].clone()),
                            aggregated: aggregated.contains(field),
                        },
                    };
                    (*channel, bound)
                })
                .collect();

            groups[slot].rows.push(r);
            groups[slot].instances.push(MarkInstance { row: r, channels });
        }
        if keys.is_empty() && groups.is_empty() {
            groups.push(MarkGroup {
                key: Vec::new(),
                rows: Vec::new(),
                instances: Vec::new(),
            });
        }

        tracing::debug!(%mark, instances = table.nrow(), groups = groups.len(), "marks");
        Ok(SceneNode::Marks(MarkLeaf {
            path: path.clone(),
            mark,
            encoding,
            table,
            groups,
        }))
    }
}

fn arrange(
    path: &NodePath,
    encoding: ResolvedEncoding,
    layout: ResolvedLayout,
    children: Vec<(Option<(String, Value)>, SceneNode)>,
) -> SceneNode {
    let (arrangement, placements) = plan(layout, children.len());
    tracing::debug!(layout = ?layout, rows = arrangement.rows, columns = arrangement.columns, "arrange");
    let children = placements
        .into_iter()
        .zip(children)
        .map(|(placement, (facet, node))| PlacedNode { placement, facet, node })
        .collect();
    SceneNode::Group(GroupNode {
        path: path.clone(),
        encoding,
        arrangement,
        children,
    })
}

fn check_budget(budget: &'static str, limit: Option<usize>, actual: usize) -> Result<()> {
    match limit {
        Some(limit) if actual > limit => Err(Error::EvaluationBudgetExceeded {
            path: NodePath::root(),
            budget,
            limit,
            actual,
        }),
        _ => Ok(()),
    }
}

fn kind_name(kind: &ViewKind) -> &'static str {
    match kind {
        ViewKind::Mark(_) => "mark",
        ViewKind::Single(_) => "single",
        ViewKind::Many(_) => "many",
    }
}
