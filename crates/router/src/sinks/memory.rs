//! MemorySink - keeps rendered records in memory
//!
//! Used for inspection and tests; the buffer handle stays readable after the
//! router owns the sink.

use contracts::{ContractError, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shared view of a [`MemorySink`]'s output.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    lines: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered records in append order, without trailing newlines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// True when any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn push(&self, rendered: &[u8]) {
        let line = String::from_utf8_lossy(rendered);
        self.lines.lock().push(line.trim_end_matches('\n').to_string());
    }
}

/// Sink appending rendered records to a [`MemoryBuffer`]
pub struct MemorySink {
    name: String,
    buffer: MemoryBuffer,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_buffer(name, MemoryBuffer::new())
    }

    pub fn with_buffer(name: impl Into<String>, buffer: MemoryBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }

    pub fn buffer(&self) -> &MemoryBuffer {
        &self.buffer
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, rendered: &[u8]) -> Result<(), ContractError> {
        if self.buffer.fail_writes.load(Ordering::SeqCst) {
            return Err(ContractError::sink_write(&self.name, "memory sink rejected write"));
        }
        self.buffer.push(rendered);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "memory_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.buffer.closed.store(true, Ordering::SeqCst);
        debug!(sink = %self.name, "MemorySink closed");
        Ok(())
    }
}
