//! Test module for flint-core
//!
//! This module contains tests for:
//! - Query evaluation (trigger mode, suggestions, global search, capping)
//! - Debounced text handling and the trigger auto-space
//! - Focus cycling, list navigation and Escape handling
//! - Result activation and one-shot invocation
//! - Plugin discovery, lazy activation, isolation and reload
//! - Configuration loading and defaults

// Test modules use exact float comparisons
#![allow(clippy::float_cmp)]

mod invoke_tests;
