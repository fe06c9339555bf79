//! # Vipersweep Core Library
//!
//! A batch-orchestration library that drives the Viper spectral-element flow solver
//! across a table of parameter combinations, isolating every attempt in its own run
//! workspace and recovering from timestep-related divergence by adaptive retries.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`ParameterRow`)
//!   and pure file I/O: the sweep-table loader and the token-substituting template
//!   renderer.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer owns the per-row lifecycle.
//!   It includes workspace derivation and staging, the solver subprocess seam
//!   (`SolverInvoker`), free-text crash classification into a closed category set,
//!   and the retry state machine (`SweepState`).
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute a complete sweep, returning
//!   a structured per-row report. It provides a simple and powerful entry point for
//!   end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
