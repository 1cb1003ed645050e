//! Capability identifiers and the set algebra over them.
//!
//! A capability is an API kind identified by group, version and kind. Sets of
//! capabilities have a stable textual form, `<kind>.<version>.<group>` tokens
//! joined by commas, which callers store in annotations.

mod key;
mod set;

pub use key::CapabilityKey;
pub use set::CapabilitySet;
