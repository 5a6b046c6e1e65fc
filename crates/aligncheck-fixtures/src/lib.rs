//! Test fixtures for aligncheck.
//!
//! Two stand-in alignment tools ship as binaries of this crate:
//! `aligncheck-fake-convert` copies its inputs into the output directory and
//! `aligncheck-fake-fail` exits nonzero. [`PhyluceTree`] lays out a
//! phyluce-shaped repository for them to run against.

pub mod helpers;
pub mod tree;

pub use helpers::{temp_dir, write_suite};
pub use tree::{PhyluceTree, CONVERT_BIN, FAIL_BIN};
