//! Operator candidates and the collections the resolver builds over them.

mod entry;
mod multi_owner;
mod operator_set;
mod source_info;

pub use entry::{Entry, PackageDependency};
pub use multi_owner::MultiOwnerSet;
pub use operator_set::OperatorSet;
pub use source_info::{OperatorSourceInfo, SourceKey};
