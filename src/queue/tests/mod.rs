//! Test modules for the execution queue
//!
//! Tests are organized by functional area. `support` holds the recording
//! executor shared by the suites.

mod support;
