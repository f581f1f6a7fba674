//! Article Editor - editing sessions over the article document model
//!
//! A session ties an [`edit_engine::EditingEngine`] to the article store:
//! it loads articles (surfacing invalid content as a diagnostic rather than
//! failing), derives titles and read time, gates and runs saves, prefetches
//! embedded resources, and wires media uploads into image nodes.

mod config;
mod error;
mod session;

pub use config::*;
pub use error::*;
pub use session::*;
