//! Edit Engine - Commands, undo/redo, and URL-to-node conversion
//!
//! This crate implements command-based editing over immutable document
//! snapshots, the editing engine that runs link suppression and advisory
//! validation after every change, and the schema-driven insertion search.

mod command;
mod config;
mod executor;
mod undo;
mod error;
mod insertion;
mod url_conversion;

pub use command::*;
pub use config::*;
pub use executor::*;
pub use undo::*;
pub use error::*;
pub use insertion::*;
pub use url_conversion::*;
