//! Cross-module tests for the generator, its persistence and node allocation

mod config_tests;
mod rollover_tests;
pub mod test_utils;
