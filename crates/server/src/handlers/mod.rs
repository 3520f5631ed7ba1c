//! HTTP request handlers.

pub mod batch;
pub mod health;

pub use batch::*;
pub use health::*;
