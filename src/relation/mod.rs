//! Storage Relation Module
//!
//! Provides the relation exchange with the coordinating proxy role: parsing
//! what the proxy published, building this node's advertisement, and the
//! file-backed store adapter the hook framework reads back.

pub mod advertiser;
pub mod state;
pub mod store;

pub use advertiser::*;
pub use state::*;
pub use store::*;
