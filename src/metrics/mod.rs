use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters maintained by the interactive renderer.
#[derive(Debug, Default, Clone)]
pub struct RenderMetrics {
    events: u64,
    frames: u64,
    lines_written: u64,
    lines_skipped: u64,
    bytes_written: u64,
}

impl RenderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_frame(&mut self, lines_written: usize, lines_skipped: usize, bytes: usize) {
        self.frames = self.frames.saturating_add(1);
        self.lines_written = self.lines_written.saturating_add(lines_written as u64);
        self.lines_skipped = self.lines_skipped.saturating_add(lines_skipped as u64);
        self.bytes_written = self.bytes_written.saturating_add(bytes as u64);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            frames: self.frames,
            lines_written: self.lines_written,
            lines_skipped: self.lines_skipped,
            bytes_written: self.bytes_written,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub frames: u64,
    pub lines_written: u64,
    pub lines_skipped: u64,
    pub bytes_written: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "render_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("lines_written".to_string(), json!(self.lines_written));
        map.insert("lines_skipped".to_string(), json!(self.lines_skipped));
        map.insert("bytes_written".to_string(), json!(self.bytes_written));
        map
    }
}
