//! Unit tests for neardb-core

use std::io::Write;

use neardb_core::config::{Config, IndexKindConfig, LogFormat, LogLevel};
use neardb_core::metrics::{Metrics, Timer};
use neardb_core::{DistanceMetric, Error, ObjectId, ObjectRecord, Properties};
use tempfile::NamedTempFile;

mod config_tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[collection]
name = "things"
dimension = 300
metric = "manhattan"

[collection.certainty]
reference_scale = 25.0

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.collection.name, "things");
        assert_eq!(config.collection.dimension, 300);
        assert_eq!(config.collection.metric, DistanceMetric::Manhattan);
        assert_eq!(config.collection.index, IndexKindConfig::Flat);
        assert_eq!(config.collection.certainty.reference_scale, 25.0);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::parse_str("[collection\ndimension = "),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_vamana_search_list_smaller_than_degree() {
        let toml = r#"
            [collection]
            dimension = 16

            [collection.index]
            kind = "vamana"
            max_degree = 32
            search_list_size = 8
        "#;
        let err = Config::parse_str(toml).unwrap_err();
        assert!(err.to_string().contains("search_list_size"));
    }

    #[test]
    fn test_vamana_alpha_below_one() {
        let toml = r#"
            [collection]
            dimension = 16

            [collection.index]
            kind = "vamana"
            alpha = 0.5
        "#;
        assert!(Config::parse_str(toml).is_err());
    }
}

mod type_tests {
    use super::*;

    #[test]
    fn test_object_ids_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| ObjectId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_bad_object_id_string() {
        assert!("not-a-uuid".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_record_serializes_properties_verbatim() {
        let mut properties = Properties::new();
        properties.insert("name".into(), serde_json::json!("Banana"));
        properties.insert("nested".into(), serde_json::json!({ "ripe": true }));

        let record = ObjectRecord {
            id: ObjectId::new(),
            vector: None,
            properties: properties.clone(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let decoded: ObjectRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.properties, properties);
        assert!(decoded.vector.is_none());
    }

    #[test]
    fn test_metric_bounds() {
        assert_eq!(DistanceMetric::Cosine.max_distance(), Some(2.0));
        assert_eq!(DistanceMetric::L2Squared.max_distance(), None);
        assert_eq!(DistanceMetric::Manhattan.max_distance(), None);
    }
}

mod metrics_tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_at_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), Default::default());
    }

    #[test]
    fn test_concurrent_counting() {
        let metrics = Metrics::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_near_vector();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().near_vector_queries, 8000);
    }

    #[test]
    fn test_timer_measures() {
        let timer = Timer::new("sleep");
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.elapsed() >= std::time::Duration::from_millis(2));
        timer.stop();
    }
}
