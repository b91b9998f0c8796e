//! Ring Module
//!
//! Keeps this node's copy of the cluster placement rings current: fetches
//! the bundle the coordinating proxy advertises and replaces the local ring
//! files without ever exposing a partial write.

pub mod fetcher;
pub mod sync;

pub use fetcher::*;
pub use sync::*;
