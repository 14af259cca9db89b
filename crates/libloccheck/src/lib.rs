//! Core library facade for loccheck.
//! Scans `llvm-dwarfdump` style output for a formal parameter's location list
//! and checks that it covers its function from prologue end to epilogue begin.

pub mod errors;
pub mod scanner;
pub mod validator;

pub use errors::{LocCheckError, LocCheckResult};
pub use scanner::{ExtractedValues, Scan, Scanner, State};
pub use validator::{CoverageFailure, Verdict, validate};
