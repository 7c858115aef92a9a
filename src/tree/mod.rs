//! Concurrency-safe tree mirroring the nested scopes reported by producers.
//!
//! Structure (child creation) is only changed from the pipeline consumer; the
//! per-node locks mediate between that writer and the draw loop reading fields
//! for rendering.

mod node;

pub use node::Node;
