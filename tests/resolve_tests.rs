//! Integration tests for layered resolution.
//!
//! Every test injects its own environment and argument list, so nothing here
//! reads or mutates the process environment.

use layercfg::{ConfigError, Environment, FileFormat, Loader, SourceTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Simple {
    port: u16,
    host: String,
}

layercfg::record!(Simple { port, host });

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Scalars {
    text: String,
    flag: bool,
    byte: u8,
    port: u16,
    count: u32,
    total: u64,
    size: usize,
    tiny: i8,
    small: i16,
    medium: i32,
    large: i64,
    offset: isize,
    float: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Sequences {
    texts: Vec<String>,
    flags: Vec<bool>,
    bytes: Vec<u8>,
    counts: Vec<u32>,
    offsets: Vec<i16>,
    deltas: Vec<i64>,
    floats: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Everything {
    scalars: Scalars,
    sequences: Sequences,
    retries: Option<u8>,
    enabled: Option<bool>,
}

layercfg::record!(Scalars {
    text,
    flag,
    byte,
    port,
    count,
    total,
    size,
    tiny,
    small,
    medium,
    large,
    offset,
    float,
});
layercfg::record!(Sequences { texts, flags, bytes, counts, offsets, deltas, floats });
layercfg::record!(Everything { scalars, sequences, retries, enabled });

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Clashing {
    database_url: String,
    database: ClashingDatabase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ClashingDatabase {
    url: String,
}

layercfg::record!(ClashingDatabase { url });
layercfg::record!(Clashing { database_url, database });

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Loader isolated from the process: files only from `dir`, no env, no args.
fn isolated(dir: &Path) -> Loader {
    Loader::new()
        .file_paths([dir])
        .environment(HashMap::<String, String>::new())
        .args(Vec::<String>::new())
}

fn everything() -> Everything {
    Everything {
        scalars: Scalars {
            text: "some-testing".to_string(),
            flag: true,
            byte: u8::MAX,
            port: 8080,
            count: 70_000,
            total: u64::MAX,
            size: 42,
            tiny: i8::MIN,
            small: -300,
            medium: -70_000,
            large: i64::MIN,
            offset: -42,
            float: -273.25,
        },
        sequences: Sequences {
            texts: vec!["a".to_string(), "b c".to_string(), "d".to_string()],
            flags: vec![true, false, true],
            bytes: vec![0, 127, 255],
            counts: vec![3, 2, 1],
            offsets: vec![-1, 0, 1],
            deltas: vec![i64::MIN, -5, i64::MAX],
            floats: vec![12.5, -994.25, 1024.0],
        },
        retries: Some(3),
        enabled: Some(true),
    }
}

/// Counts lookups so tests can assert none happened.
#[derive(Clone, Default)]
struct CountingEnv {
    lookups: Arc<AtomicUsize>,
}

impl Environment for CountingEnv {
    fn var_os(&self, _key: &str) -> Option<OsString> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        None
    }
}

#[test]
fn test_precedence_across_all_tiers() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "port: 8083\nhost: yaml\n").unwrap();

    let defaults = Simple {
        port: 8086,
        host: "default".to_string(),
    };
    let report = isolated(temp.path())
        .environment(vars(&[("HOST", "env")]))
        .args(["--port", "8081"])
        .load_report(&[defaults])
        .unwrap();

    assert_eq!(
        report.config(),
        &Simple {
            port: 8081,
            host: "env".to_string()
        }
    );
    let tiers: Vec<SourceTier> = report.contributions().iter().map(|c| c.tier).collect();
    assert_eq!(
        tiers,
        vec![
            SourceTier::Defaults,
            SourceTier::File(FileFormat::Yaml),
            SourceTier::Environment,
            SourceTier::Flags,
        ]
    );
}

#[test]
fn test_defaults_merge_in_order() {
    let temp = TempDir::new().unwrap();
    let base = Simple {
        port: 1,
        host: "base".to_string(),
    };
    let overlay = Simple {
        port: 2,
        host: String::new(),
    };
    let config = isolated(temp.path()).load(&[base, overlay]).unwrap();
    assert_eq!(config.port, 2);
    assert_eq!(config.host, "base");
}

#[test]
fn test_absent_files_still_resolve() {
    let temp = TempDir::new().unwrap();
    let report = isolated(temp.path().join("missing").as_path())
        .environment(vars(&[("PORT", "9000")]))
        .load_report(&[Simple {
            port: 1,
            host: "default".to_string(),
        }])
        .unwrap();

    assert_eq!(report.config().port, 9000);
    assert_eq!(report.config().host, "default");
    assert!(report.file_paths().is_empty());
}

#[test]
fn test_no_sources_yields_zero_record() {
    let temp = TempDir::new().unwrap();
    let config = isolated(temp.path()).load::<Simple>(&[]).unwrap();
    assert_eq!(config, Simple::default());
}

#[test]
fn test_yaml_round_trip() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yaml"),
        serde_yaml::to_string(&everything()).unwrap(),
    )
    .unwrap();

    let config = isolated(temp.path()).load::<Everything>(&[]).unwrap();
    assert_eq!(config, everything());
}

#[test]
fn test_json_round_trip() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.json"),
        serde_json::to_string_pretty(&everything()).unwrap(),
    )
    .unwrap();

    let config = isolated(temp.path()).load::<Everything>(&[]).unwrap();
    assert_eq!(config, everything());
}

#[test]
fn test_msgpack_round_trip() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.bin"),
        rmp_serde::to_vec_named(&everything()).unwrap(),
    )
    .unwrap();

    let report = isolated(temp.path()).load_report::<Everything>(&[]).unwrap();
    assert_eq!(report.config(), &everything());
    assert_eq!(
        report.file_paths(),
        vec![temp.path().join("config.bin").as_path()]
    );
}

#[test]
fn test_file_formats_stack_in_fixed_order() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "port: 1\nhost: yaml\n").unwrap();
    std::fs::write(temp.path().join("config.json"), r#"{"port": 2}"#).unwrap();
    std::fs::write(
        temp.path().join("config.bin"),
        rmp_serde::to_vec_named(&Simple {
            port: 3,
            host: String::new(),
        })
        .unwrap(),
    )
    .unwrap();

    let config = isolated(temp.path()).load::<Simple>(&[]).unwrap();
    assert_eq!(config.port, 3);
    assert_eq!(config.host, "yaml");
}

#[test]
fn test_env_and_flags_cover_every_kind() {
    let temp = TempDir::new().unwrap();
    let env = vars(&[
        ("APP_SCALARS_TEXT", "from env"),
        ("APP_SCALARS_FLAG", "TRUE"),
        ("APP_SCALARS_TINY", "-128"),
        ("APP_SCALARS_TOTAL", "18446744073709551615"),
        ("APP_SCALARS_FLOAT", "-0.5"),
        ("APP_SEQUENCES_FLAGS", "t,F,1"),
        ("APP_SEQUENCES_DELTAS", "-1,2,-3"),
        ("APP_RETRIES", "0"),
        ("APP_ENABLED", "false"),
    ]);

    let config = isolated(temp.path())
        .env_prefix("APP")
        .environment(env)
        .args([
            "--scalars-medium=-7",
            "--sequences-texts",
            "x",
            "--sequences-texts",
            "y,z",
            "--sequences-counts",
            "0x10",
            "--sequences-counts",
            "0b11",
        ])
        .load::<Everything>(&[])
        .unwrap();

    assert_eq!(config.scalars.text, "from env");
    assert!(config.scalars.flag);
    assert_eq!(config.scalars.tiny, i8::MIN);
    assert_eq!(config.scalars.total, u64::MAX);
    assert_eq!(config.scalars.float, -0.5);
    assert_eq!(config.scalars.medium, -7);
    assert_eq!(config.sequences.flags, vec![true, false, true]);
    assert_eq!(config.sequences.deltas, vec![-1, 2, -3]);
    assert_eq!(config.sequences.texts, vec!["x".to_string(), "y,z".to_string()]);
    assert_eq!(config.sequences.counts, vec![16, 3]);
    assert_eq!(config.retries, Some(0));
    assert_eq!(config.enabled, Some(false));
}

#[test]
fn test_sequence_overwrite_rule() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yaml"),
        "sequences:\n  counts: [1, 2, 3]\n  texts: [a, b]\n",
    )
    .unwrap();

    // An empty env value supplies nothing; a one-element flag list replaces.
    let config = isolated(temp.path())
        .environment(vars(&[("SEQUENCES_COUNTS", "")]))
        .args(["--sequences-texts", "c"])
        .load::<Everything>(&[])
        .unwrap();

    assert_eq!(config.sequences.counts, vec![1, 2, 3]);
    assert_eq!(config.sequences.texts, vec!["c".to_string()]);
}

#[test]
fn test_zero_scalar_cannot_clear_lower_tier() {
    let temp = TempDir::new().unwrap();
    let defaults = Everything {
        scalars: Scalars {
            flag: true,
            port: 8080,
            ..Default::default()
        },
        enabled: Some(true),
        ..Default::default()
    };

    let config = isolated(temp.path())
        .environment(vars(&[("SCALARS_FLAG", "false"), ("SCALARS_PORT", "0")]))
        .args(["--enabled=false"])
        .load(&[defaults])
        .unwrap();

    // Plain scalars keep their value; the optional leaf takes the explicit false.
    assert!(config.scalars.flag);
    assert_eq!(config.scalars.port, 8080);
    assert_eq!(config.enabled, Some(false));
}

#[test]
fn test_duplicate_keys_fail_before_any_lookup() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "not: [valid").unwrap();
    let env = CountingEnv::default();
    let lookups = env.lookups.clone();

    let err = isolated(temp.path())
        .environment(env)
        .load::<Clashing>(&[])
        .unwrap_err();

    match err {
        ConfigError::DuplicateKey { key, first, second } => {
            assert_eq!(key, "DATABASE_URL");
            assert_eq!(first.to_string(), "database_url");
            assert_eq!(second.to_string(), "database.url");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[test]
fn test_env_coercion_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = isolated(temp.path())
        .environment(vars(&[("PORT", "eighty")]))
        .load::<Simple>(&[])
        .unwrap_err();
    assert!(matches!(err, ConfigError::Coercion { ref key, .. } if key == "PORT"));
    assert!(!err.is_not_found());
}

#[test]
fn test_unknown_flag_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = isolated(temp.path())
        .args(["--colour", "blue"])
        .load::<Simple>(&[])
        .unwrap_err();
    assert!(matches!(err, ConfigError::Flags(_)));
}

#[test]
fn test_empty_record_resolves() {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Nothing {}
    layercfg::record!(Nothing {});

    let temp = TempDir::new().unwrap();
    let report = isolated(temp.path()).load_report::<Nothing>(&[]).unwrap();
    assert_eq!(report.config(), &Nothing {});
    assert!(report.contributions().is_empty());
}

#[test]
fn test_resolve_is_deterministic() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.json"), r#"{"host": "json"}"#).unwrap();
    let loader = isolated(temp.path())
        .environment(vars(&[("PORT", "7")]))
        .args(["--host", "flag"]);

    let first = loader.load::<Simple>(&[]).unwrap();
    for _ in 0..5 {
        assert_eq!(loader.load::<Simple>(&[]).unwrap(), first);
    }
    assert_eq!(first.port, 7);
    assert_eq!(first.host, "flag");
}
