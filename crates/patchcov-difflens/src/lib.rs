//! Diff parsing and change set construction.
//!
//! Turns unified diff text into per-file [`ChangeSet`](patchcov_core::ChangeSet)
//! records holding the added lines of every analysed source file.

pub mod changeset;
pub mod filter;
pub mod parser;
pub mod prefix;
