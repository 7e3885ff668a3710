//! Error types for grammar compilation.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Location of a view node, as the sequence of child indices from the root.
///
/// A single nested view is child `0`; array elements and facet panels use
/// their position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices from the root.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth (0 for the root).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Failure taxonomy for compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural schema violation, caught before evaluation.
    InvalidSpec,
    /// A definition or transform references a column the working table lacks.
    UnknownField,
    /// Unrecognized aggregate function name.
    UnknownAggregate,
    /// Malformed or contradictory layout directive.
    InvalidLayout,
    /// A host-imposed limit was exceeded.
    EvaluationBudgetExceeded,
    /// Configuration, input table or output serialization problem, outside any view node.
    Setup,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidSpec => "InvalidSpec",
            ErrorKind::UnknownField => "UnknownField",
            ErrorKind::UnknownAggregate => "UnknownAggregate",
            ErrorKind::InvalidLayout => "InvalidLayout",
            ErrorKind::EvaluationBudgetExceeded => "EvaluationBudgetExceeded",
            ErrorKind::Setup => "Setup",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while loading, validating or compiling a view.
#[derive(Error, Debug)]
pub enum Error {
    /// Structural schema violation.
    #[error("invalid spec at {path}: {message}")]
    InvalidSpec {
        /// Offending node.
        path: NodePath,
        /// What is wrong with it.
        message: String,
    },

    /// Reference to a field the working table does not expose.
    #[error("unknown field '{field}' at {path}")]
    UnknownField {
        /// Offending node.
        path: NodePath,
        /// The missing field name.
        field: String,
    },

    /// Unrecognized aggregate function.
    #[error("unknown aggregate '{op}' at {path}")]
    UnknownAggregate {
        /// Offending node.
        path: NodePath,
        /// The unrecognized function name.
        op: String,
    },

    /// Malformed or contradictory layout.
    #[error("invalid layout at {path}: {message}")]
    InvalidLayout {
        /// Offending node.
        path: NodePath,
        /// What is wrong with it.
        message: String,
    },

    /// A configured evaluation limit was exceeded.
    #[error("evaluation budget exceeded at {path}: {budget} is {actual}, limit {limit}")]
    EvaluationBudgetExceeded {
        /// Offending node.
        path: NodePath,
        /// Name of the limit (e.g. `max_facets`).
        budget: &'static str,
        /// Configured limit.
        limit: usize,
        /// Requested amount.
        actual: usize,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed, 0 if unknown).
        line: usize,
        /// Parser message.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// A table row does not match the table's field list.
    #[error("row has {actual} values, table has {expected} fields")]
    RowLengthMismatch {
        /// Number of fields in the table.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// Input table JSON could not be read.
    #[error("invalid table data: {0}")]
    TableData(String),

    /// A view or scene could not be written as JSON.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl Error {
    /// Builds an [`Error::InvalidSpec`] at the root.
    pub(crate) fn invalid_spec(message: impl Into<String>) -> Self {
        Error::InvalidSpec {
            path: NodePath::root(),
            message: message.into(),
        }
    }

    /// Builds an [`Error::UnknownField`] at the root.
    pub(crate) fn unknown_field(field: impl Into<String>) -> Self {
        Error::UnknownField {
            path: NodePath::root(),
            field: field.into(),
        }
    }

    /// Builds an [`Error::InvalidLayout`] at the root.
    pub(crate) fn invalid_layout(message: impl Into<String>) -> Self {
        Error::InvalidLayout {
            path: NodePath::root(),
            message: message.into(),
        }
    }

    /// Relocates a node error to `path`. Errors without a node are unchanged.
    #[must_use]
    pub fn at(mut self, node: &NodePath) -> Self {
        match &mut self {
            Error::InvalidSpec { path, .. }
            | Error::UnknownField { path, .. }
            | Error::UnknownAggregate { path, .. }
            | Error::InvalidLayout { path, .. }
            | Error::EvaluationBudgetExceeded { path, .. } => *path = node.clone(),
            _ => {}
        }
        self
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSpec { .. } => ErrorKind::InvalidSpec,
            Error::UnknownField { .. } => ErrorKind::UnknownField,
            Error::UnknownAggregate { .. } => ErrorKind::UnknownAggregate,
            Error::InvalidLayout { .. } => ErrorKind::InvalidLayout,
            Error::EvaluationBudgetExceeded { .. } => ErrorKind::EvaluationBudgetExceeded,
            Error::ConfigParse { .. }
            | Error::ConfigNotFound(_)
            | Error::RowLengthMismatch { .. }
            | Error::TableData(_)
            | Error::Serialize(_) => ErrorKind::Setup,
        }
    }

    /// Node that triggered the error, if it came from a view node.
    #[must_use]
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            Error::InvalidSpec { path, .. }
            | Error::UnknownField { path, .. }
            | Error::UnknownAggregate { path, .. }
            | Error::InvalidLayout { path, .. }
            | Error::EvaluationBudgetExceeded { path, .. } => Some(path),
            _ => None,
        }
    }
}
