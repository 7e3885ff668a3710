//! Compiler from view trees to scene graphs.
//!
//! A [`Compiler`] validates a [`View`], then evaluates it top-down against a
//! [`Table`]:
//!
//! - transforms run per node over the ambient table ([`TransformExecutor`])
//! - encodings merge with what the parent bound and resolve against the
//!   node's working table ([`EncodingResolver`])
//! - nested views are arranged by layer, concatenation, wrap or facet
//!   ([`resolve_layout`], [`plan`])
//!
//! The result is a [`Scene`]. Compilation is pure and deterministic.

mod aggregate;
mod bin;
mod evaluate;
mod layout;
mod resolve;
mod scene;
mod transform;

pub use aggregate::AggregateOp;
pub use bin::{nice_step, Binning};
pub use layout::{plan, resolve_layout, Arrangement, Cell, Placement, ResolvedLayout};
pub use resolve::{infer_type, merge, resolve, EncodingResolver, ResolvedDefinition, ResolvedEncoding};
pub use scene::{BoundValue, GroupNode, MarkGroup, MarkInstance, MarkLeaf, PlacedNode, Scene, SceneNode};
pub use transform::{TransformExecutor, TransformOutput};

use crate::config::CompilerConfig;
use crate::error::{NodePath, Result};
use crate::grammar::{Channels, Table, View};

use evaluate::Evaluator;

/// Compiles views under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    /// Create a compiler.
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one view against `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`](crate::Error::InvalidSpec) before any
    /// table work if the view is structurally invalid, otherwise the first
    /// evaluation error, located at the node that raised it. No partial scene
    /// is returned.
    #[tracing::instrument(level = "debug", skip_all, fields(nodes = view.node_count(), rows = table.nrow()))]
    pub fn compile(&self, view: &View, table: &Table) -> Result<Scene> {
        view.validate()?;
        let root = Evaluator::new(&self.config).evaluate(view, table, &Channels::new(), &NodePath::root())?;
        tracing::debug!(marks = root.mark_count(), "compiled");
        Ok(Scene { root })
    }

    /// Compile independent views against one table, keeping input order.
    #[cfg(feature = "parallel")]
    pub fn compile_batch(&self, views: &[View], table: &Table) -> Vec<Result<Scene>> {
        use rayon::prelude::*;

        views.par_iter().map(|view| self.compile(view, table)).collect()
    }

    /// Compile independent views against one table, keeping input order.
    #[cfg(not(feature = "parallel"))]
    pub fn compile_batch(&self, views: &[View], table: &Table) -> Vec<Result<Scene>> {
        views.iter().map(|view| self.compile(view, table)).collect()
    }
}

/// Compile with the default configuration.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(view: &View, table: &Table) -> Result<Scene> {
    Compiler::default().compile(view, table)
}
