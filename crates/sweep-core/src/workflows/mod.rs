//! # Workflows Module
//!
//! The user-facing layer: complete procedures tying the `core` and `engine`
//! layers together. [`sweep::run`] executes a whole parameter sweep and
//! returns a structured per-row report.

pub mod sweep;
