//! Protocol witnesses for Rust traits.
//!
//! A witness is a struct holding a trait's requirements as plain function
//! values over an explicit subject type. Apply [`witness`] to a trait to get
//! its `<Trait>Witness`, a constructor, the transformer its variance allows,
//! and optionally fold helpers, registry accessors and a `conforming()`
//! constructor backed by the trait implementation.
//!
//! * [`registry`] - process-wide storage of witnesses keyed by subject type and label
//! * [`codegen`] - the generator behind the attribute, usable from build scripts

pub use witness_codegen as codegen;
pub use witness_macros::witness;
pub use witness_registry as registry;

#[cfg(test)]
use pretty_assertions as _;
#[cfg(test)]
use rstest as _;
