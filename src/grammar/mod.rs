//! Grammar of Graphics intermediate representation.
//!
//! A spec is a recursive [`View`]: each node optionally transforms its data,
//! binds visual channels through an [`Encoding`], and either draws a primitive
//! mark or groups nested views.
//!
//! # Components
//!
//! - **Definitions**: literal constants or typed field references
//! - **Encodings**: channel bindings plus `coordinates` and `layout`
//! - **Transforms**: `bin` and `aggregate`
//! - **Layouts**: layer, horizontal, vertical, wrap
//! - **Tables**: the in-memory data the compiler reads
//!
//! # Example
//!
//! ```rust
//! use trueno_grammar::grammar::*;
//!
//! let hist = View::mark(MarkType::Bar)
//!     .transform(Transform::bin("foo", "binned_foo"))
//!     .transform(Transform::count("count"))
//!     .encoding(
//!         Encoding::new()
//!             .x(Definition::field("binned_foo"))
//!             .y(Definition::field("count")),
//!     );
//! assert!(hist.validate().is_ok());
//! ```

mod definition;
mod encoding;
mod layout;
mod table;
mod transform;
mod value;
mod view;

pub use definition::{Definition, FieldDef, FieldType};
pub use encoding::{Channel, Channels, Coordinates, Encoding};
pub use layout::{Layout, LayoutKind};
pub use table::Table;
pub use transform::{AggregateTransform, BinTransform, Transform};
pub use value::Value;
pub use view::{MarkType, View, ViewKind};
