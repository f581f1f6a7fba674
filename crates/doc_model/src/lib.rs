//! Document Model - article document tree, schema, and validation
//!
//! This crate provides the document model for the article editor: a closed
//! set of node kinds serialized in the editor's JSON document format, the
//! content grammar engine and article schema that constrain how nodes nest,
//! the schema validator, and pure functions that derive presentation values
//! (plain text, read time, embedded resource IDs) from a document.

mod node;
mod attrs;
mod mark;
mod path;
mod selection;
mod inline;
mod document;
mod error;
pub mod content;
pub mod schema;
pub mod validate;
pub mod derived;

pub use node::*;
pub use attrs::*;
pub use mark::*;
pub use path::*;
pub use selection::*;
pub use inline::*;
pub use document::*;
pub use error::*;
pub use content::{ContentExpr, ContentMatch};
pub use schema::*;
pub use validate::*;
pub use derived::*;
