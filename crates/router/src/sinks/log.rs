//! LogSink - re-emits rendered records via tracing

use contracts::{ContractError, Sink};
use tracing::{info, instrument};

/// Sink that forwards every record to the process' tracing subscriber
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Sink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, rendered: &[u8]) -> Result<(), ContractError> {
        let line = String::from_utf8_lossy(rendered);
        info!(sink = %self.name, "{}", line.trim_end());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
