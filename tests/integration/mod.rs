//! Integration tests for command-graph.

pub mod dispatch_test;
pub mod registration_test;
pub mod shell_test;
