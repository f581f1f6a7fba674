//! Store - Article persistence, saving, resource prefetch, and media uploads
//!
//! This crate holds the article model and the async APIs the editor talks
//! to (article store, resource catalog, media upload), in-memory
//! implementations of each, the save state machine, the resource prefetch
//! cache, and the upload tracker.

mod article;
mod memory_store;
mod save;
mod resources;
mod media;
mod error;

pub use article::*;
pub use memory_store::*;
pub use save::*;
pub use resources::*;
pub use media::*;
pub use error::*;
