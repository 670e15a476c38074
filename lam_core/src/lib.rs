//! # lam_core - Classical Laminate Theory Analysis Engine
//!
//! `lam_core` builds tabular physical representations of layered (laminate)
//! specimens and annotates them with per-point mechanical quantities from a
//! pluggable theory model. All inputs and outputs are JSON-serializable,
//! making it easy to drive from notebooks, services, or regression tooling.
//!
//! ## Design Philosophy
//!
//! - **Single-pass**: each analysis is an independent value graph - parse,
//!   stack, expand, handshake, done. Nothing is shared between invocations.
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//! - **Isolated models**: theory models are third-party code; a failing
//!   model rolls back to the geometric table instead of crashing the
//!   analysis
//!
//! ## Quick Start
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//! use lam_core::laminate::Laminate;
//!
//! // Standard 5-ply disk with laboratory defaults
//! let input = FeatureInput::builder()
//!     .with_geometry("400-[200]-800")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let laminate = Laminate::analyze(input).unwrap();
//! assert_eq!(laminate.stack.nplies(), 5);
//! assert_eq!(laminate.frame.rows().len(), 25);
//!
//! // Serialize for storage or transmission
//! let json = serde_json::to_string_pretty(&laminate.frame).unwrap();
//! ```
//!
//! ## Pipeline
//!
//! raw string -> [`Geometry`] -> [`Stack`](stack::Stack) ->
//! [`Snapshot`](stack::Snapshot) -> [`LFrame`](laminate::LFrame) ->
//! handshake with a named model -> [`LmFrame`](laminate::LmFrame)
//!
//! ## Modules
//!
//! - [`geometry`] - geometry string parsing and the canonical convention
//! - [`stack`] - layer ordering, naming, and material assignment
//! - [`laminate`] - per-point dimensional tables and the analysis pipeline
//! - [`theories`] - the model registry and the handshake isolation boundary
//! - [`models`] - built-in theory models
//! - [`config`] - the validated FeatureInput configuration bundle
//! - [`control`] - control/regression table rendering
//! - [`errors`] - structured error types

pub mod config;
pub mod control;
pub mod errors;
pub mod geometry;
pub mod laminate;
pub mod models;
pub mod stack;
pub mod theories;

// Re-export commonly used types at crate root for convenience
pub use config::{FeatureInput, Globals, LoadParameters, MatProps};
pub use errors::{LamError, LamResult, ModelError};
pub use geometry::Geometry;
pub use laminate::{LFrame, Laminate, LmFrame, ModelColumns, PointLabel, PointRow, Side};
pub use theories::{handshake, HandshakeOutcome, LaminateTheory};
