//! Workspace root package.
//!
//! Holds workspace-level tooling such as the rusty-hook pre-commit checks;
//! the planner lives in `crates/borderpath-lib` and `crates/borderpath-cli`.
