//! Hook Module
//!
//! Entry layer for lifecycle events: parses the hook name the framework
//! invoked, loads the invocation context, and dispatches to the matching
//! handler.

pub mod context;
pub mod dispatcher;

pub use context::*;
pub use dispatcher::*;
