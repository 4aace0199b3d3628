//! compose-dot - Graphviz diagrams of Docker Compose files
//!
//! Decodes a compose manifest into a typed model and derives a directed graph
//! from it:
//!
//! - networks and services become nodes
//! - network attachments, `volumes_from` and `depends_on` become edges
//! - a fixed legend explains the colors
//!
//! The graph is rendered as Graphviz DOT (or JSON) and optionally wrapped in a
//! fenced markdown block.

pub mod compose;
pub mod error;
pub mod graph;
pub mod output;

pub use error::{ComposeDotError, Result};
