//! Hardware Module
//!
//! Resolves the operator's device selection into the ordered device set this
//! node serves, backed by a sysfs block-device scanner.

pub mod allocator;
pub mod scanner;

pub use allocator::*;
pub use scanner::*;
