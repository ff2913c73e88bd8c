//! etalon CLI - Ground-Truth Dataset Validation and Metrics
//!
//! Command-line interface for etalon operations.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

fn main() -> ExitCode {
    etalon::cli::run()
}
