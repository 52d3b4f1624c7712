//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract checks across crates
//! - Routing end to end on file and memory sinks
//! - Configuration driven routers

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Level, PolicyKind, RouterConfig};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_config_round_trip_through_loader() {
        let mut config = RouterConfig::named("my.company");
        config.policy = PolicyKind::Hierarchical;
        config.level = Level::Warning;

        let toml = ConfigLoader::to_toml(&config).unwrap();
        let loaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(loaded.policy, PolicyKind::Hierarchical);
        assert_eq!(loaded.level, Level::Warning);

        let json = ConfigLoader::to_json(&config).unwrap();
        let loaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(loaded.name, "my.company");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use contracts::{Delivery, Identity, Level, Record, RoutingKey};
    use observability::RoutingStatsAggregator;
    use router::{
        BuiltinSinkFactory, FileSinkFactory, HierarchicalPolicy, MemorySinkFactory, Router,
        RouterError, SelectorPolicy,
    };

    fn key(s: &str) -> RoutingKey {
        RoutingKey::new(s).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// End-to-end: aggregate record, two server1 records, a server2 record
    /// and ten concurrent resolutions of server3, all on file sinks.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_scenario_on_files() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::builder(FileSinkFactory::new("my.company", dir.path()))
            .policy(Arc::new(SelectorPolicy))
            .build()
            .await
            .unwrap();

        let aggregate = dir.path().join("my.company.log");
        let server1 = dir.path().join("my.company.server1.log");
        let server2 = dir.path().join("my.company.server2.log");

        // startup goes only to the aggregate file
        router.info("startup").await.unwrap();

        let first = router
            .emit(Record::new(Level::Info, "first").with_routing_key(key("server1")))
            .await
            .unwrap();
        assert_eq!(first, Delivery::Written(Identity::Keyed(key("server1"))));
        let server1_sink = router.registry().get("server1").unwrap();

        router
            .emit(Record::new(Level::Info, "second").with_routing_key(key("server1")))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(
            &server1_sink,
            &router.registry().get("server1").unwrap()
        ));

        router
            .emit(Record::new(Level::Error, "other").with_routing_key(key("server2")))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(
            &server1_sink,
            &router.registry().get("server1").unwrap()
        ));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let router = router.clone();
            handles.push(tokio::spawn(
                async move { router.resolve(&key("server3")).await },
            ));
        }
        let mut resolved = Vec::new();
        for handle in handles {
            resolved.push(handle.await.unwrap().unwrap());
        }
        assert!(resolved.iter().all(|d| Arc::ptr_eq(d, &resolved[0])));
        assert_eq!(router.registry().len(), 3);

        router.shutdown().await;

        let aggregate_lines = read_lines(&aggregate);
        assert_eq!(aggregate_lines.len(), 1);
        assert!(aggregate_lines[0].ends_with("[INFO]: startup"));

        let server1_lines = read_lines(&server1);
        assert_eq!(server1_lines.len(), 2);
        assert!(server1_lines[0].ends_with("first"));
        assert!(server1_lines[1].ends_with("second"));

        let server2_lines = read_lines(&server2);
        assert_eq!(server2_lines.len(), 1);
        assert!(server2_lines[0].contains("[ERROR]: other"));

        assert!(dir.path().join("my.company.server3.log").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_each_key_created_once() {
        let router = Router::builder(
            MemorySinkFactory::new().with_delay(Duration::from_millis(20)),
        )
        .build()
        .await
        .unwrap();

        let mut handles = Vec::new();
        for i in 0..30 {
            let router = router.clone();
            let name = format!("server{}", i % 3);
            handles.push(tokio::spawn(async move {
                router
                    .emit(Record::new(Level::Info, format!("event {i}")).with_routing_key(key(&name)))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_written());
        }

        let factory = router.factory();
        for name in ["server0", "server1", "server2"] {
            let identity = Identity::Keyed(key(name));
            assert_eq!(factory.invocations(&identity), 1);
            assert_eq!(factory.buffer(&identity).unwrap().len(), 10);
        }
        assert_eq!(factory.invocations(&Identity::Aggregate), 1);
        assert!(factory.buffer(&Identity::Aggregate).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_hierarchical_children() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::builder(FileSinkFactory::new("app", dir.path()))
            .policy(Arc::new(HierarchicalPolicy))
            .build()
            .await
            .unwrap();

        let jobs = router.child(key("jobs")).await.unwrap();
        jobs.info("job started").await.unwrap();
        // a key on a root record does not move it off the aggregate
        router
            .emit(Record::new(Level::Info, "root record").with_routing_key(key("jobs")))
            .await
            .unwrap();
        router.child(key("jobs")).await.unwrap().info("job done").await.unwrap();
        router.shutdown().await;

        let aggregate = read_lines(&dir.path().join("app.log"));
        assert_eq!(aggregate.len(), 1);
        assert!(aggregate[0].ends_with("root record"));

        let job_lines = read_lines(&dir.path().join("app.jobs.log"));
        assert_eq!(job_lines.len(), 2);
        assert!(job_lines[0].ends_with("job started"));
        assert!(job_lines[1].ends_with("job done"));
    }

    #[tokio::test]
    async fn test_e2e_config_driven_router() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let config_path = dir.path().join("router.toml");
        fs::write(
            &config_path,
            format!(
                r#"
name = "svc"
policy = "selector"
level = "debug"

[format]
kind = "pattern"
pattern = "{{level}} {{key}} {{message}}"

[sink]
sink_type = "file"
base_path = "{}"
level = "info"
"#,
                logs.display().to_string().replace('\\', "/")
            ),
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let router = Router::builder(BuiltinSinkFactory::from_config(&config))
            .config(&config)
            .build()
            .await
            .unwrap();

        let mut stats = RoutingStatsAggregator::new();
        let records = [
            Record::new(Level::Info, "boot"),
            Record::new(Level::Debug, "chatty").with_attribute("server", "s1"),
            Record::new(Level::Warning, "hot").with_attribute("server", "s1"),
        ];
        for record in records {
            let delivery = router
                .emit(record.lift_selector(&config.selector))
                .await
                .unwrap();
            stats.record(&delivery);
        }
        router.shutdown().await;

        let summary = stats.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.below_threshold, 1);

        assert_eq!(read_lines(&logs.join("svc.log")), vec!["INFO  boot"]);
        assert_eq!(read_lines(&logs.join("svc.s1.log")), vec!["WARNING s1 hot"]);
    }

    #[tokio::test]
    async fn test_e2e_factory_failure_does_not_poison() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::builder(FileSinkFactory::new("app", dir.path()))
            .build()
            .await
            .unwrap();

        // A directory where the keyed log file should go makes open fail
        let blocked = dir.path().join("app.blocked.log");
        fs::create_dir(&blocked).unwrap();

        let err = router
            .emit(Record::new(Level::Info, "lost").with_routing_key(key("blocked")))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Factory { .. }));
        assert!(!router.registry().contains("blocked"));

        router.info("still fine").await.unwrap();

        fs::remove_dir(&blocked).unwrap();
        let delivery = router
            .emit(Record::new(Level::Info, "recovered").with_routing_key(key("blocked")))
            .await
            .unwrap();
        assert!(delivery.is_written());
        router.shutdown().await;

        let lines = read_lines(&blocked);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("recovered"));
    }

    #[tokio::test]
    async fn test_e2e_emit_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::builder(FileSinkFactory::new("app", dir.path()))
            .build()
            .await
            .unwrap();
        router.info("before").await.unwrap();
        router.shutdown().await;
        router.shutdown().await;

        let err = router.info("after").await.unwrap_err();
        assert!(matches!(err, RouterError::Closed { .. }));
        assert_eq!(read_lines(&dir.path().join("app.log")).len(), 1);
    }
}
