//! Integration tests for parsing datacenter response data.
//!
//! These tests validate that the compute resources correctly map actual
//! cloud API response shapes, including embedded server collections.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use ionoscloud_core::entity::Entity;
use ionoscloud_core::resource::Resource;
use ionoscloud_compute::{Datacenter, Server};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load the datacenter list fixture from disk.
fn load_datacenter_list_fixture() -> Value {
    let fixture_path = fixtures_dir().join("datacenter_list.json");
    let raw = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read datacenter fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&raw).expect("fixture is valid JSON")
}

fn datacenters() -> Vec<Datacenter> {
    let data = load_datacenter_list_fixture();
    data["items"]
        .as_array()
        .expect("collection items")
        .iter()
        .map(|item| Datacenter::from_entity(Entity::from_item(item).unwrap()))
        .collect()
}

#[test]
fn test_parse_datacenter_collection() {
    let datacenters = datacenters();
    assert_eq!(datacenters.len(), 2, "Expected 2 datacenters in test data");
}

#[test]
fn test_datacenter_fields() {
    let datacenters = datacenters();
    let production = datacenters
        .iter()
        .find(|d| d.name() == Some("production"))
        .expect("production datacenter present");

    assert_eq!(
        production.entity().id(),
        Some("6a2f1a3e-3ff5-4f68-9d4c-0a6f4a5c28de")
    );
    assert_eq!(production.location(), Some("de/fra"));
    assert_eq!(production.description(), Some("primary workloads"));
    assert_eq!(production.version(), Some(87));
    assert_eq!(
        production.entity().metadata().get("state"),
        Some(&Value::String("AVAILABLE".to_string()))
    );
}

#[test]
fn test_null_description_reads_as_unset() {
    let datacenters = datacenters();
    let staging = datacenters
        .iter()
        .find(|d| d.name() == Some("staging"))
        .expect("staging datacenter present");
    assert_eq!(staging.description(), None);
}

#[test]
fn test_embedded_servers_parse() {
    let datacenters = datacenters();
    let production = datacenters
        .iter()
        .find(|d| d.name() == Some("production"))
        .unwrap();

    let servers: Vec<Server> = production.entity().entities()["servers"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| Server::from_entity(Entity::from_item(item).unwrap()))
        .collect();

    assert_eq!(servers.len(), 2);
    let db = servers
        .iter()
        .find(|s| s.name() == Some("db-01"))
        .expect("db server present");
    assert_eq!(db.cores(), Some(8));
    assert_eq!(db.ram(), Some(16384));
    assert_eq!(db.availability_zone(), Some("ZONE_1"));
    assert_eq!(db.vm_state(), Some("RUNNING"));
}
