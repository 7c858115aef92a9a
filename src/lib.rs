//! Hierarchical progress display for concurrent jobs.
//!
//! Producers on any thread open nested scopes through a [`ScopeHandle`], log
//! into them and report progress. A single [`Pipeline`] consumer applies those
//! events to a renderer. The [`InteractiveRenderer`] keeps them as a tree of
//! [`Node`]s which a [`DrawLoop`] redraws in place, rewriting only the lines
//! that changed; the [`SimpleRenderer`] prints one line per event instead.

pub mod bar;
pub mod config;
pub mod cursor;
pub mod diff;
pub mod error;
pub mod frame;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod style;
pub mod terminal;
pub mod tree;
pub mod width;

pub use bar::{BarStyle, DEFAULT_STYLE, ProgressBar, SIMPLE_STYLE};
pub use config::RendererConfig;
pub use diff::{DiffEngine, DiffOutcome, incremental_update, incremental_update_bounded};
pub use error::{Result, ScopeError};
pub use frame::{Frame, render_frame};
pub use logging::{LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult};
pub use metrics::{MetricSnapshot, RenderMetrics};
pub use pipeline::{
    DEFAULT_PROGRESS_TOTAL, NO_PROGRESS, Pipeline, ProgressUpdate, Renderer, ScopeEvent,
    ScopeGuard, ScopeHandle, SequenceGenerator,
};
pub use render::{InteractiveRenderer, SimpleRenderer};
pub use runtime::{DrawLoop, DrawLoopHandle, RuntimeConfig};
pub use style::{AnsiColor, ColorScheme, colorize, format_duration};
pub use terminal::{CrosstermTerminal, FixedTerminal, TerminalAccess, TerminalSize};
pub use tree::Node;
pub use width::display_width;
