//! Config Tests
//!
//! Tests for loading, saving and editing the client config file.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};

use kisslight::config::{Config, DEFAULT_PORT};
use kisslight::protocol::ProtocolVersion;
use kisslight::KlError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.hub_ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.hub_port, DEFAULT_PORT);
    assert_eq!(config.protocol, ProtocolVersion::CURRENT);
    assert_eq!(config.hub_addr().to_string(), "127.0.0.1:1155");
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .hub_ip("192.168.1.20".parse().unwrap())
        .hub_port(2000)
        .protocol(ProtocolVersion::new(0, 2))
        .read_timeout_ms(0)
        .build();

    assert_eq!(config.hub_addr().to_string(), "192.168.1.20:2000");
    assert_eq!(config.protocol, ProtocolVersion::new(0, 2));
    assert_eq!(config.read_timeout_ms, 0);
}

// =============================================================================
// Load / Save
// =============================================================================

#[test]
fn test_missing_file_gives_defaults() {
    let dir = setup_temp_dir();
    let config = Config::load(dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_then_load() {
    let dir = setup_temp_dir();
    let path = dir.path().join("nested").join("client.json");

    let config = Config::builder()
        .hub_ip("10.0.0.5".parse().unwrap())
        .hub_port(1200)
        .protocol(ProtocolVersion::new(0, 2))
        .build();
    config.save(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"protocol\": \"KL/0.2\""));
    assert!(content.ends_with('\n'));

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = setup_temp_dir();
    let path = dir.path().join("client.json");
    fs::write(&path, r#"{ "hub_ip": "192.168.0.2" }"#).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.hub_ip, "192.168.0.2".parse::<IpAddr>().unwrap());
    assert_eq!(config.hub_port, DEFAULT_PORT);
    assert_eq!(config.protocol, ProtocolVersion::CURRENT);
}

#[test]
fn test_invalid_json_is_config_error() {
    let dir = setup_temp_dir();
    let path = dir.path().join("client.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load(&path), Err(KlError::Config(_))));
}

#[test]
fn test_invalid_protocol_is_config_error() {
    let dir = setup_temp_dir();
    let path = dir.path().join("client.json");
    fs::write(&path, r#"{ "protocol": "KL/zero" }"#).unwrap();

    assert!(matches!(Config::load(&path), Err(KlError::Config(_))));
}

#[test]
fn test_port_zero_in_file_rejected() {
    let dir = setup_temp_dir();
    let path = dir.path().join("client.json");
    fs::write(&path, r#"{ "hub_port": 0 }"#).unwrap();

    assert!(matches!(Config::load(&path), Err(KlError::Config(_))));
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn test_set_ip() {
    let mut config = Config::default();
    config.set_ip(" 192.168.1.50 ").unwrap();
    assert_eq!(config.hub_ip, "192.168.1.50".parse::<IpAddr>().unwrap());

    config.set_ip("::1").unwrap();
    assert!(config.hub_ip.is_ipv6());
}

#[test]
fn test_set_ip_invalid() {
    let mut config = Config::default();
    assert!(matches!(config.set_ip("hub.local"), Err(KlError::Usage(_))));
    assert!(matches!(config.set_ip("300.1.1.1"), Err(KlError::Usage(_))));
    assert_eq!(config, Config::default());
}

#[test]
fn test_set_port() {
    let mut config = Config::default();
    config.set_port(8080).unwrap();
    assert_eq!(config.hub_port, 8080);
    assert!(matches!(config.set_port(0), Err(KlError::Usage(_))));
    assert_eq!(config.hub_port, 8080);
}

#[test]
fn test_set_and_persist() {
    let dir = setup_temp_dir();
    let path = dir.path().join("client.json");

    let mut config = Config::load(&path).unwrap();
    config.set_ip("192.168.1.99").unwrap();
    config.save(&path).unwrap();

    let mut config = Config::load(&path).unwrap();
    config.set_port(1156).unwrap();
    config.save(&path).unwrap();

    let reloaded = Config::load(&path).unwrap();
    assert_eq!(reloaded.hub_addr().to_string(), "192.168.1.99:1156");
}
