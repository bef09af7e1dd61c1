//! Tracing setup. Log lines land in an in-memory ring buffer that the TUI
//! shows in its log overlay (F5); nothing is written to the terminal while
//! the alternate screen is active.

use chrono::Local;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of log entries kept in memory.
const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries.
#[derive(Clone, Default)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= MAX_LOG_ENTRIES {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().rev().take(count).rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer that parses the compact fmt layer output back into entries.
#[derive(Clone)]
pub struct RingBufferWriter {
    buffer: LogRingBuffer,
}

impl RingBufferWriter {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self { buffer }
    }
}

impl std::io::Write for RingBufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(message) = std::str::from_utf8(buf) {
            let message = message.trim();
            if !message.is_empty() {
                // Compact format is "LEVEL target: message".
                let (level, rest) = if let Some(rest) = message.strip_prefix("TRACE ") {
                    (Level::TRACE, rest)
                } else if let Some(rest) = message.strip_prefix("DEBUG ") {
                    (Level::DEBUG, rest)
                } else if let Some(rest) = message.strip_prefix("INFO ") {
                    (Level::INFO, rest)
                } else if let Some(rest) = message.strip_prefix("WARN ") {
                    (Level::WARN, rest)
                } else if let Some(rest) = message.strip_prefix("ERROR ") {
                    (Level::ERROR, rest)
                } else {
                    self.buffer
                        .push(LogEntry::new(Level::INFO, "general", message.to_string()));
                    return Ok(buf.len());
                };

                let (target, msg) = match rest.find(':') {
                    Some(pos) if !rest[..pos].contains(' ') => {
                        (&rest[..pos], rest[pos + 1..].trim())
                    }
                    _ => ("general", rest),
                };

                self.buffer
                    .push(LogEntry::new(level, target, msg.to_string()));
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RingBufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();

/// Initialize tracing with the ring-buffer writer. Safe to call once per
/// process; later calls return the existing buffer.
pub fn init_tracing() -> LogRingBuffer {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(buffer) = LOG_BUFFER.get() {
        return buffer.clone();
    }

    let buffer = LOG_BUFFER.get_or_init(LogRingBuffer::new).clone();
    let writer = RingBufferWriter::new(buffer.clone());

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "system", "tracing initialized");

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_caps_entries() {
        let buffer = LogRingBuffer::new();
        for i in 0..(MAX_LOG_ENTRIES + 10) {
            buffer.push(LogEntry::new(Level::INFO, "test", format!("entry {i}")));
        }
        assert_eq!(buffer.len(), MAX_LOG_ENTRIES);
        let recent = buffer.get_recent(1);
        assert!(recent[0].message.ends_with(&format!("{}", MAX_LOG_ENTRIES + 9)));
    }

    #[test]
    fn test_writer_parses_compact_format() {
        use std::io::Write;

        let buffer = LogRingBuffer::new();
        let mut writer = RingBufferWriter::new(buffer.clone());
        writer.write_all(b"INFO search: new query\n").unwrap();

        let recent = buffer.get_recent(1);
        assert_eq!(recent[0].level, "INFO");
        assert_eq!(recent[0].target, "search");
        assert_eq!(recent[0].message, "new query");
    }

    #[test]
    fn test_writer_handles_unstructured_lines() {
        use std::io::Write;

        let buffer = LogRingBuffer::new();
        let mut writer = RingBufferWriter::new(buffer.clone());
        writer.write_all(b"something odd\n").unwrap();

        let recent = buffer.get_recent(1);
        assert_eq!(recent[0].target, "general");
        assert_eq!(recent[0].message, "something odd");
    }
}
