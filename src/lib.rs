//! sendgate library.
//!
//! This module re-exports the core components for testing and extension.

pub mod client;
pub mod commands;
pub mod config;
pub mod filter;
pub mod logging;
pub mod protocol;
pub mod service;
pub mod throttle;
pub mod validation;

#[cfg(test)]
mod integration_tests;
