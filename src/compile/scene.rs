//! Compiler output: the scene graph handed to a renderer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, NodePath, Result};
use crate::grammar::{Channel, FieldType, MarkType, Table, Value};

use super::layout::{Arrangement, Cell, Placement};
use super::resolve::ResolvedEncoding;

/// A channel value bound for one mark instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoundValue {
    /// A literal from the encoding.
    Constant {
        /// The literal.
        value: Value,
    },
    /// A value read from the instance's row.
    Field {
        /// Source field.
        field: String,
        /// Field type.
        #[serde(rename = "type")]
        field_type: FieldType,
        /// The row's value.
        value: Value,
        /// Whether the field was produced by an aggregate step.
        aggregated: bool,
    },
}

impl BoundValue {
    /// The bound value.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            BoundValue::Constant { value } | BoundValue::Field { value, .. } => value,
        }
    }
}

/// One drawable mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkInstance {
    /// Row of the leaf's table this instance was built from.
    pub row: usize,
    /// Visual channels; `detail` never appears here.
    pub channels: BTreeMap<Channel, BoundValue>,
}

impl MarkInstance {
    /// Value bound to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Value> {
        self.channels.get(&channel).map(BoundValue::value)
    }
}

/// Instances sharing one grouping key (one line, one bar, one series).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkGroup {
    /// Grouping field/value pairs; empty for an ungrouped leaf.
    pub key: Vec<(String, Value)>,
    /// Rows of the leaf's table in this group.
    pub rows: Vec<usize>,
    /// One instance per row.
    pub instances: Vec<MarkInstance>,
}

/// A terminal view after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkLeaf {
    /// Node that produced this leaf.
    pub path: NodePath,
    /// Mark type.
    pub mark: MarkType,
    /// Resolved encoding of the node.
    pub encoding: ResolvedEncoding,
    /// The node's working table.
    pub table: Table,
    /// Mark-instance groups.
    pub groups: Vec<MarkGroup>,
}

impl MarkLeaf {
    /// Number of mark instances across groups.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(|g| g.instances.len()).sum()
    }

    /// All instances in group order.
    pub fn instances(&self) -> impl Iterator<Item = &MarkInstance> + '_ {
        self.groups.iter().flat_map(|g| g.instances.iter())
    }
}

/// A child placed within a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    /// Placement in the parent's arrangement.
    pub placement: Placement,
    /// Facet field and value for facet panels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<(String, Value)>,
    /// The child subtree.
    pub node: SceneNode,
}

/// A non-terminal view after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    /// Node that produced this group.
    pub path: NodePath,
    /// Resolved encoding of the group itself.
    pub encoding: ResolvedEncoding,
    /// How children are arranged.
    pub arrangement: Arrangement,
    /// Children in order.
    pub children: Vec<PlacedNode>,
}

impl GroupNode {
    /// Rectangle of a child within this group.
    #[must_use]
    pub fn cell(&self, child: &PlacedNode) -> Cell {
        self.arrangement.cell(&child.placement)
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum SceneNode {
    /// Leaf list of mark instances.
    Marks(MarkLeaf),
    /// Placed children.
    Group(GroupNode),
}

impl SceneNode {
    /// Node path.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        match self {
            SceneNode::Marks(leaf) => &leaf.path,
            SceneNode::Group(group) => &group.path,
        }
    }

    /// Total mark instances in this subtree.
    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.leaves().map(MarkLeaf::instance_count).sum()
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = &MarkLeaf> + '_ {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out.into_iter()
    }

    /// The leaf, if this node is one.
    #[must_use]
    pub fn as_marks(&self) -> Option<&MarkLeaf> {
        match self {
            SceneNode::Marks(leaf) => Some(leaf),
            SceneNode::Group(_) => None,
        }
    }

    /// The group, if this node is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            SceneNode::Group(group) => Some(group),
            SceneNode::Marks(_) => None,
        }
    }
}

fn collect_leaves<'a>(node: &'a SceneNode, out: &mut Vec<&'a MarkLeaf>) {
    match node {
        SceneNode::Marks(leaf) => out.push(leaf),
        SceneNode::Group(group) => {
            for child in &group.children {
                collect_leaves(&child.node, out);
            }
        }
    }
}

/// A compiled visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Root of the scene graph.
    pub root: SceneNode,
}

impl Scene {
    /// Total mark instances.
    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.root.mark_count()
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = &MarkLeaf> + '_ {
        self.root.leaves()
    }

    /// Serialize for an external renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if the JSON writer rejects the scene.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialize(e.to_string()))
    }
}
