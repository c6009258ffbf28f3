//! Server resource, nested below a datacenter.

use std::sync::LazyLock;

use serde_json::Map;

use ionoscloud_core::entity::{Entity, PropertySchema, PropertyType};
use ionoscloud_core::resource::{Resource, ResourceDescriptor};

static DESCRIPTOR: LazyLock<ResourceDescriptor> = LazyLock::new(|| ResourceDescriptor {
    // Path template; servers are reached through the owning datacenter's
    // sub-path (see `Datacenter::servers`).
    base_path: "datacenters/{datacenterId}/servers",
    schema: PropertySchema::new(&[
        ("name", PropertyType::STRING),
        ("cores", PropertyType::INT),
        ("ram", PropertyType::INT),
        ("availabilityZone", PropertyType::OPT_STRING),
        ("cpuFamily", PropertyType::OPT_STRING),
    ]),
    defaults: Map::new(),
    unique_attr: None,
});

/// One server of a datacenter.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    entity: Entity,
}

impl Resource for Server {
    fn descriptor() -> &'static ResourceDescriptor {
        &DESCRIPTOR
    }

    fn from_entity(entity: Entity) -> Self {
        Self { entity }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl Server {
    /// Server name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.entity.property_str("name")
    }

    /// Number of cores.
    #[must_use]
    pub fn cores(&self) -> Option<i64> {
        self.entity.property_i64("cores")
    }

    /// RAM in MiB.
    #[must_use]
    pub fn ram(&self) -> Option<i64> {
        self.entity.property_i64("ram")
    }

    /// Availability zone, e.g. `AUTO`.
    #[must_use]
    pub fn availability_zone(&self) -> Option<&str> {
        self.entity.property_str("availabilityZone")
    }

    /// Power state as reported by the server (`RUNNING`, `SHUTOFF`, ...);
    /// server-managed, never sent on writes.
    #[must_use]
    pub fn vm_state(&self) -> Option<&str> {
        self.entity.property_str("vmState")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_fragment() {
        let item = json!({
            "id": "c0c9248e-5b22-4b2b-a2a9-6f28cb7e7f6b",
            "type": "server",
            "properties": {
                "name": "web-01",
                "cores": 4,
                "ram": 4096,
                "availabilityZone": "AUTO",
                "vmState": "RUNNING"
            }
        });
        let server = Server::from_entity(Entity::from_item(&item).unwrap());
        assert_eq!(server.name(), Some("web-01"));
        assert_eq!(server.cores(), Some(4));
        assert_eq!(server.ram(), Some(4096));
        assert_eq!(server.availability_zone(), Some("AUTO"));
        assert_eq!(server.vm_state(), Some("RUNNING"));
    }

    #[test]
    fn test_schema_requires_integer_cores() {
        let attrs = json!({"cores": "4"}).as_object().cloned().unwrap();
        assert!(Server::descriptor().schema.check(&attrs).is_err());
    }
}
