//! Integration tests for powerforge.

mod cli_tests;
mod engine_tests;
mod fixture;
mod layout_tests;
mod lint_tests;
mod scenario_tests;
