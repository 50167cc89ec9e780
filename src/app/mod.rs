//! Demo application: argument parsing, configuration and the queue walkthrough

pub mod cli;
pub mod demo;
pub mod startup;
