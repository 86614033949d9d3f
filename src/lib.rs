//! `facade-risk` library crate.
//!
//! The binary (`fra`) is a thin wrapper around this library so that:
//!
//! - the cost estimator and risk scorer are testable without spawning processes
//! - analyzers can be swapped behind one trait
//! - job persistence stays separate from presentation

pub mod analyzers;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
