//! Renderers consuming scope events.
//!
//! [`InteractiveRenderer`] keeps the scope tree and redraws it in place;
//! [`SimpleRenderer`] prints one plain line per event for logs and pipes.

mod interactive;
mod simple;

pub use interactive::InteractiveRenderer;
pub use simple::SimpleRenderer;
