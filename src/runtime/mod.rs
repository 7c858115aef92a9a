use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::error::{Result, ScopeError};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv, json_str};
use crate::render::InteractiveRenderer;

const LOG_TARGET: &str = "scopetree::runtime";

/// Configuration knobs for the draw loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Pause between two frames.
    pub refresh_interval: Duration,
    /// Optional structured logger used by the loop.
    pub logger: Option<Logger>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let refresh_interval = if cfg!(windows) {
            Duration::from_millis(250)
        } else {
            Duration::from_millis(200)
        };
        Self {
            refresh_interval,
            logger: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "scopetree::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }
}

/// Redraws an [`InteractiveRenderer`] at a fixed pace until its root scope
/// completes, then draws one last frame.
pub struct DrawLoop {
    renderer: Arc<InteractiveRenderer>,
    config: RuntimeConfig,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl DrawLoop {
    pub fn new(renderer: Arc<InteractiveRenderer>) -> Self {
        Self::with_config(renderer, RuntimeConfig::default())
    }

    pub fn with_config(renderer: Arc<InteractiveRenderer>, config: RuntimeConfig) -> Self {
        Self {
            renderer,
            config,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn renderer(&self) -> &Arc<InteractiveRenderer> {
        &self.renderer
    }

    /// Draw until the root completes. Blocks the calling thread.
    ///
    /// Failed writes are logged and drawing carries on with the next frame.
    /// Only a failure to turn line wrapping back on at the end is returned,
    /// since the terminal is left in a changed state.
    pub fn run(&mut self) -> Result<()> {
        self.bootstrap();
        let root = Arc::clone(self.renderer.root());

        while !root.has_completed() {
            self.draw();
            self.maybe_emit_metrics();
            // wakes early when the root completes
            root.wait_completion_timeout(self.config.refresh_interval);
        }

        self.draw();
        let restored = self.renderer.restore();
        if let Err(err) = &restored {
            self.log_runtime_event(
                LogLevel::Error,
                "restore_failed",
                [json_str("error", err.to_string())],
            );
        }
        self.finalize();
        restored
    }

    /// Run the loop on a dedicated thread.
    pub fn spawn(self) -> Result<DrawLoopHandle> {
        let renderer = Arc::clone(&self.renderer);
        let mut draw_loop = self;
        let thread = thread::Builder::new()
            .name("scopetree-draw".to_string())
            .spawn(move || draw_loop.run())?;
        Ok(DrawLoopHandle { renderer, thread })
    }

    fn bootstrap(&mut self) {
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "draw_loop_started",
            [json_kv(
                "refresh_ms",
                json!(self.config.refresh_interval.as_millis() as u64),
            )],
        );

        match self.renderer.prime() {
            Ok(()) => {}
            Err(ScopeError::Terminal(reason)) => self.log_runtime_event(
                LogLevel::Warn,
                "terminal_prepare_failed",
                [json_str("reason", reason)],
            ),
            Err(err) => self.log_runtime_event(
                LogLevel::Error,
                "prime_failed",
                [json_str("error", err.to_string())],
            ),
        }
    }

    fn draw(&mut self) {
        let outcome = match self.renderer.draw_frame() {
            Ok(outcome) => outcome,
            Err(err) => {
                self.log_runtime_event(
                    LogLevel::Error,
                    "draw_failed",
                    [json_str("error", err.to_string())],
                );
                return;
            }
        };
        if outcome.bytes > 0 {
            self.log_runtime_event(
                LogLevel::Debug,
                "frame_drawn",
                [
                    json_kv("lines_written", json!(outcome.lines_written)),
                    json_kv("lines_skipped", json!(outcome.lines_skipped)),
                    json_kv("lines_cleared", json!(outcome.lines_cleared)),
                    json_kv("bytes", json!(outcome.bytes)),
                ],
            );
        }
    }

    fn finalize(&mut self) {
        let uptime = self.uptime(Instant::now());
        let frames = self.renderer.metrics_snapshot(uptime).frames;
        self.log_runtime_event(
            LogLevel::Info,
            "draw_loop_stopped",
            [
                json_kv("uptime_ms", json!(uptime.as_millis() as u64)),
                json_kv("frames", json!(frames)),
            ],
        );
    }

    fn uptime(&self, now: Instant) -> Duration {
        self.start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default()
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }
        let Some(logger) = self.config.logger.as_ref() else {
            return;
        };

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => {
                return;
            }
            _ => {
                self.last_metrics_emit = Some(now);
            }
        }

        let snapshot = self.renderer.metrics_snapshot(self.uptime(now));
        let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
    }
}

/// A draw loop running on its own thread.
pub struct DrawLoopHandle {
    renderer: Arc<InteractiveRenderer>,
    thread: JoinHandle<Result<()>>,
}

impl DrawLoopHandle {
    pub fn renderer(&self) -> &Arc<InteractiveRenderer> {
        &self.renderer
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the loop to observe root completion and draw its last frame.
    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| ScopeError::DrawThread)?
    }

    /// Complete the root regardless of open scopes, then join.
    pub fn stop(self) -> Result<()> {
        self.renderer.root().complete();
        self.join()
    }
}
