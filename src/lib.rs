//! # Trueno-Grammar
//!
//! Compiler core for a declarative, recursive grammar of graphics.
//!
//! A [`View`](grammar::View) describes what marks to draw, how data fields map
//! to visual channels, which transforms to run and how nested views are
//! arranged. The compiler turns a view tree plus an in-memory
//! [`Table`](grammar::Table) into a [`Scene`](compile::Scene): a tree of
//! placed groups whose leaves are fully bound mark instances, ready for an
//! external renderer.
//!
//! ## Features
//!
//! - **Implicit grouping**: `aggregate` steps group by bin outputs and the
//!   dimensions the encoding references
//! - **Encoding inheritance**: child channels override, parent channels flow down
//! - **Composition**: layer, horizontal, vertical, wrap, and facet-by-`detail`
//! - **Structured errors**: every failure names the offending node path
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_grammar::prelude::*;
//!
//! let table = Table::from_json(r#"[
//!     {"foo": 1, "baz": "A"},
//!     {"foo": 2, "baz": "B"},
//!     {"foo": 3, "baz": "A"}
//! ]"#)?;
//!
//! let view = View::from_json(r#"{
//!     "transform": [{"aggregate": "count", "as": "count"}],
//!     "view": "bar",
//!     "encoding": {"x": {"field": "baz", "type": "ordinal"}, "y": {"field": "count"}}
//! }"#)?;
//!
//! let scene = Compiler::default().compile(&view, &table)?;
//! assert_eq!(scene.mark_count(), 2);
//! # Ok::<(), trueno_grammar::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Compile batches of views with rayon

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Grammar
// ============================================================================

/// View trees, encodings, transforms and the input table.
pub mod grammar;

// ============================================================================
// Compiler
// ============================================================================

/// Transform execution, encoding resolution, layout and evaluation.
pub mod compile;

/// Compiler configuration (YAML).
pub mod config;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for compilation.
pub mod error;

pub use error::{Error, ErrorKind, NodePath, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for convenient imports.
///
/// ```rust
/// use trueno_grammar::prelude::*;
/// ```
pub mod prelude {
    pub use crate::compile::{compile, Compiler, MarkLeaf, Scene, SceneNode};
    pub use crate::config::CompilerConfig;
    pub use crate::error::{Error, ErrorKind, NodePath, Result};
    pub use crate::grammar::{
        Channel, Coordinates, Definition, Encoding, FieldType, Layout, MarkType, Table, Transform, Value, View,
    };
}
