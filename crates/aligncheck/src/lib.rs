//! aligncheck: a golden-file regression harness for alignment CLI tools.
//!
//! Scenarios invoke an external executable with a literal argument vector,
//! collect whatever it writes into a scoped output directory, and compare
//! every produced file byte-for-byte against a stored fixture set.

#![forbid(unsafe_code)]
// Public API types have docs; internal helpers are documented where it helps.
#![allow(missing_docs)]

pub mod artifacts;
pub mod error;
pub mod fixtures;
pub mod golden;
pub mod invoker;
pub mod model;
pub mod runner;
pub mod scenario;
pub mod workspace;

pub use crate::error::{ErrorCode, HarnessError, HarnessResult};
pub use crate::model::*;

pub mod run {
    use super::invoker::SystemInvoker;
    use super::runner::{run_suite as run_suite_impl, RunnerOptions};
    use super::{HarnessResult, Suite, SuiteResult};

    /// Run every scenario of `suite` against real processes.
    pub fn run_suite(suite: &Suite) -> HarnessResult<SuiteResult> {
        run_suite_impl(suite, &SystemInvoker, &RunnerOptions::default())
    }

    pub fn run_suite_with_options(
        suite: &Suite,
        options: &RunnerOptions,
    ) -> HarnessResult<SuiteResult> {
        run_suite_impl(suite, &SystemInvoker, options)
    }
}
