//! Sink factories
//!
//! `FileSinkFactory` opens one append-only file per identity,
//! `BuiltinSinkFactory` picks the backend from configuration and
//! `MemorySinkFactory` captures output in memory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{ContractError, Identity, RouterConfig, Sink, SinkFactory, SinkSettings, SinkType};
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::sinks::{FileSink, LogSink, MemoryBuffer, MemorySink};

/// Sink name for `identity` under logger `name`: `name` or `name.key`
pub fn sink_name(name: &str, identity: &Identity) -> String {
    match identity {
        Identity::Aggregate => name.to_string(),
        Identity::Keyed(key) => format!("{name}.{key}"),
    }
}

/// Opens `<name>.log` for the aggregate identity and `<name>.<key>.log` for
/// keyed identities inside `base_path`.
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    name: String,
    base_path: PathBuf,
}

impl FileSinkFactory {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File name for `identity`. Path separators in keys become `_`.
    pub fn file_name(&self, identity: &Identity) -> String {
        match identity {
            Identity::Aggregate => format!("{}.log", self.name),
            Identity::Keyed(key) => {
                let safe: String = key
                    .chars()
                    .map(|c| match c {
                        '/' | '\\' | '\0' => '_',
                        c => c,
                    })
                    .collect();
                format!("{}.{}.log", self.name, safe)
            }
        }
    }

    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        self.base_path.join(self.file_name(identity))
    }
}

impl SinkFactory for FileSinkFactory {
    type Output = FileSink;

    #[instrument(name = "file_factory_create", skip(self, identity), fields(identity = %identity))]
    async fn create(&self, identity: &Identity) -> Result<FileSink, ContractError> {
        let sink_name = sink_name(&self.name, identity);
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| ContractError::sink_creation(&sink_name, e.to_string()))?;

        let path = self.path_for(identity);
        let sink = FileSink::open(&sink_name, &path)
            .await
            .map_err(|e| ContractError::sink_creation(&sink_name, e.to_string()))?;
        debug!(sink = %sink_name, path = %path.display(), "File sink opened");
        Ok(sink)
    }
}

/// Sink produced by [`BuiltinSinkFactory`]
pub enum BuiltinSink {
    File(FileSink),
    Log(LogSink),
}

impl Sink for BuiltinSink {
    fn name(&self) -> &str {
        match self {
            BuiltinSink::File(sink) => sink.name(),
            BuiltinSink::Log(sink) => sink.name(),
        }
    }

    async fn write(&mut self, rendered: &[u8]) -> Result<(), ContractError> {
        match self {
            BuiltinSink::File(sink) => sink.write(rendered).await,
            BuiltinSink::Log(sink) => sink.write(rendered).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            BuiltinSink::File(sink) => sink.flush().await,
            BuiltinSink::Log(sink) => sink.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            BuiltinSink::File(sink) => sink.close().await,
            BuiltinSink::Log(sink) => sink.close().await,
        }
    }
}

/// Factory selecting the sink backend from [`SinkSettings`]
#[derive(Debug, Clone)]
pub struct BuiltinSinkFactory {
    name: String,
    sink_type: SinkType,
    files: FileSinkFactory,
}

impl BuiltinSinkFactory {
    pub fn new(name: impl Into<String>, settings: &SinkSettings) -> Self {
        let name = name.into();
        Self {
            files: FileSinkFactory::new(name.clone(), settings.base_path.clone()),
            sink_type: settings.sink_type,
            name,
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.name.clone(), &config.sink)
    }

    pub fn sink_type(&self) -> SinkType {
        self.sink_type
    }

    pub fn files(&self) -> &FileSinkFactory {
        &self.files
    }
}

impl SinkFactory for BuiltinSinkFactory {
    type Output = BuiltinSink;

    async fn create(&self, identity: &Identity) -> Result<BuiltinSink, ContractError> {
        match self.sink_type {
            SinkType::File => Ok(BuiltinSink::File(self.files.create(identity).await?)),
            SinkType::Log => {
                let name = sink_name(&self.name, identity);
                Ok(BuiltinSink::Log(LogSink::new(name)))
            }
        }
    }
}

/// Factory producing [`MemorySink`]s.
///
/// Keeps the buffer of the latest sink created per identity and counts
/// invocations, and can be told to fail or slow down creation.
#[derive(Debug, Default)]
pub struct MemorySinkFactory {
    buffers: DashMap<Identity, MemoryBuffer>,
    invocations: DashMap<Identity, usize>,
    pending_failures: DashMap<Identity, usize>,
    delay: Option<Duration>,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every creation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `times` creations for `identity`
    pub fn fail_next(&self, identity: Identity, times: usize) {
        self.pending_failures.insert(identity, times);
    }

    pub fn buffer(&self, identity: &Identity) -> Option<MemoryBuffer> {
        self.buffers.get(identity).map(|entry| entry.value().clone())
    }

    /// Number of `create` calls for `identity`, failed ones included
    pub fn invocations(&self, identity: &Identity) -> usize {
        self.invocations
            .get(identity)
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }

    pub fn total_invocations(&self) -> usize {
        self.invocations.iter().map(|entry| *entry.value()).sum()
    }

    fn take_failure(&self, identity: &Identity) -> bool {
        match self.pending_failures.get_mut(identity) {
            Some(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl SinkFactory for MemorySinkFactory {
    type Output = MemorySink;

    async fn create(&self, identity: &Identity) -> Result<MemorySink, ContractError> {
        *self.invocations.entry(identity.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.take_failure(identity) {
            return Err(ContractError::sink_creation(
                identity.to_string(),
                "resource unavailable",
            ));
        }

        let sink = MemorySink::new(identity.to_string());
        self.buffers.insert(identity.clone(), sink.buffer().clone());
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RoutingKey;
    use tempfile::tempdir;

    fn keyed(s: &str) -> Identity {
        Identity::Keyed(RoutingKey::new(s).unwrap())
    }

    #[test]
    fn test_file_naming() {
        let factory = FileSinkFactory::new("my.company", "/var/log/app");
        assert_eq!(factory.file_name(&Identity::Aggregate), "my.company.log");
        assert_eq!(factory.file_name(&keyed("server1")), "my.company.server1.log");
        assert_eq!(factory.file_name(&keyed("a/../b")), "my.company.a_.._b.log");
    }

    #[tokio::test]
    async fn test_file_factory_creates_base_dir() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("logs");
        let factory = FileSinkFactory::new("svc", &base);

        let mut sink = factory.create(&keyed("job7")).await.unwrap();
        sink.write(b"line\n").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.name(), "svc.job7");
        let content = std::fs::read_to_string(base.join("svc.job7.log")).unwrap();
        assert_eq!(content, "line\n");
    }

    #[tokio::test]
    async fn test_file_factory_failure() {
        let dir = tempdir().unwrap();
        // A regular file where the directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();

        let factory = FileSinkFactory::new("svc", &blocker);
        let result = factory.create(&Identity::Aggregate).await;
        assert!(matches!(result, Err(ContractError::SinkCreation { .. })));
    }

    #[tokio::test]
    async fn test_builtin_log_backend() {
        let settings = SinkSettings {
            sink_type: SinkType::Log,
            ..SinkSettings::default()
        };
        let factory = BuiltinSinkFactory::new("svc", &settings);
        let sink = factory.create(&keyed("server1")).await.unwrap();
        assert!(matches!(sink, BuiltinSink::Log(_)));
        assert_eq!(sink.name(), "svc.server1");
    }

    #[tokio::test]
    async fn test_memory_factory_failure_injection() {
        let factory = MemorySinkFactory::new();
        factory.fail_next(keyed("s"), 1);

        assert!(factory.create(&keyed("s")).await.is_err());
        assert!(factory.create(&keyed("s")).await.is_ok());
        assert_eq!(factory.invocations(&keyed("s")), 2);
        assert!(factory.buffer(&keyed("s")).is_some());
    }
}
