//! Fixed-width textual progress gauge attached to a scope.

mod core;

pub use self::core::{BarStyle, DEFAULT_STYLE, ProgressBar, SIMPLE_STYLE};
