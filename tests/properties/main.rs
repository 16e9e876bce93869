//! Property tests for the constraint algebra and composition.

mod algebra_tests;
mod delegation_tests;
mod determinism_tests;
mod strategies;
