use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use wavecast::{config::GlobalConfig, AppError};

fn sample_toml() -> &'static str {
    r#"
bind_address = "127.0.0.1"
port = 8080

[producer]
tick_interval_ms = 20
phase_step = 0.1

[session]
producer_grace_ms = 250
"#
}

#[test]
fn defaults_bind_all_interfaces_on_9999() {
    let config = GlobalConfig::default();

    assert_eq!(
        config.listen_addr(),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9999)
    );
    assert_eq!(config.producer.tick_interval(), Duration::from_millis(100));
    assert!((config.producer.phase_step - 0.05).abs() < f64::EPSILON);
    assert_eq!(config.session.producer_grace(), Duration::from_millis(100));
}

#[test]
fn empty_document_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config parses");
    assert_eq!(config, GlobalConfig::default());
}

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.listen_addr(), "127.0.0.1:8080".parse().unwrap());
    assert_eq!(config.producer.tick_interval_ms, 20);
    assert!((config.producer.phase_step - 0.1).abs() < f64::EPSILON);
    assert_eq!(config.session.producer_grace_ms, 250);
}

#[test]
fn partial_tables_fill_missing_fields() {
    let config = GlobalConfig::from_toml_str("[producer]\ntick_interval_ms = 50\n")
        .expect("partial config parses");

    assert_eq!(config.producer.tick_interval_ms, 50);
    assert!((config.producer.phase_step - 0.05).abs() < f64::EPSILON);
    assert_eq!(config.port, 9999);
}

#[test]
fn zero_tick_interval_is_rejected() {
    let result = GlobalConfig::from_toml_str("[producer]\ntick_interval_ms = 0\n");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("tick_interval_ms")));
}

#[test]
fn non_finite_phase_step_is_rejected() {
    let result = GlobalConfig::from_toml_str("[producer]\nphase_step = nan\n");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("phase_step")));
}

#[test]
fn oversized_grace_is_rejected() {
    let result = GlobalConfig::from_toml_str("[session]\nproducer_grace_ms = 60000\n");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("producer_grace_ms")));
}

#[test]
fn malformed_toml_is_config_error() {
    let result = GlobalConfig::from_toml_str("port = \"not a number\"");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.starts_with("invalid config")));
}

#[test]
fn loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample_toml().as_bytes()).expect("write config");

    let config = GlobalConfig::load_from_path(file.path()).expect("config loads");
    assert_eq!(config.port, 8080);
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = GlobalConfig::load_from_path(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("failed to read config")));
}
