//! compile-timer - per-header compile time attribution
//!
//! Re-executes every command of a ninja build through an instrumented clang
//! that writes a time trace per translation unit, caches the wall-clock time
//! of each command, and attributes parse time to headers and folders by
//! reconstructing the inclusion tree from interval containment.

pub mod action;
pub mod attribution;
pub mod build_graph;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod profiler;
pub mod report;
pub mod runner;
pub mod trace;

pub use error::{ProfileError, Result};
