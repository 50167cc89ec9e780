//! Execution queue integration test modules

pub mod executors;
pub mod public_api;
