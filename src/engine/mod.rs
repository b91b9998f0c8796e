//! Decision Engine Module
//!
//! Turns one hook invocation's inputs into an ordered action plan and
//! executes that plan against the injected collaborators. Planning is pure;
//! only execution can fail.

pub mod decision;
pub mod executor;

pub use decision::*;
pub use executor::*;
