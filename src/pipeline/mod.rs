//! Single-consumer ordering pipeline between scope producers and a renderer.
//!
//! Producers on any number of threads hand events to one consumer thread
//! through a rendezvous channel. The consumer applies them to the renderer in
//! the order they were handed over, so tree structure is only ever mutated from
//! that one thread.

mod event;
mod handle;
mod sequence;

pub use event::{ProgressUpdate, Renderer, ScopeEvent};
pub use handle::{
    DEFAULT_PROGRESS_TOTAL, NO_PROGRESS, Pipeline, ScopeGuard, ScopeHandle,
};
pub use sequence::SequenceGenerator;
