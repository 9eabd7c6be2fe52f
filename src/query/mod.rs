//! # Query Rewriting
//!
//! Turns logical queries into on-disk ones for a mapped type:
//! discriminator constraints for hierarchies, then field aliasing.

mod rewriter;

pub use rewriter::{class_discriminator_values, QueryRewriter};
