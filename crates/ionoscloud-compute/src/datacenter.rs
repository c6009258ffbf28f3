//! Datacenter resource.

use std::sync::LazyLock;

use serde_json::Map;

use ionoscloud_core::client::CloudClient;
use ionoscloud_core::entity::{Entity, PropertySchema, PropertyType};
use ionoscloud_core::error::{Error, Result};
use ionoscloud_core::query::QueryParams;
use ionoscloud_core::resource::{Resource, ResourceDescriptor};
use ionoscloud_core::transport::Method;

use crate::server::Server;

static DESCRIPTOR: LazyLock<ResourceDescriptor> = LazyLock::new(|| ResourceDescriptor {
    base_path: "datacenters",
    schema: PropertySchema::new(&[
        ("name", PropertyType::STRING),
        ("location", PropertyType::STRING),
        ("description", PropertyType::OPT_STRING),
        ("secAuthProtection", PropertyType::OPT_BOOL),
    ]),
    defaults: Map::new(),
    unique_attr: Some("name"),
});

/// One virtual datacenter, addressable by UUID or name.
#[derive(Debug, Clone, PartialEq)]
pub struct Datacenter {
    entity: Entity,
}

impl Resource for Datacenter {
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

impl Datacenter {
    /// Datacenter name, also the unique lookup attribute.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.entity.property_str("name")
    }

    /// Provider location id, e.g. `de/fra`.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.entity.property_str("location")
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.entity.property_str("description")
    }

    /// Server-managed datacenter version, bumped on every change.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        self.entity.property_i64("version")
    }

    /// Lists the servers of this datacenter. A depth of 3 embeds NICs
    /// including their IP addresses.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the datacenter has no id yet, plus the
    /// call-path errors.
    pub async fn servers(&self, client: &CloudClient, depth: u32) -> Result<Vec<Server>> {
        let id = self.require_id()?;
        let payload = client
            .resource::<Self>()
            .call(
                &format!("{id}/servers"),
                &QueryParams::depth(depth),
                Method::Get,
                None,
            )
            .await?;
        let items = payload.into_items().ok_or_else(|| {
            Error::MalformedResponse("expected a server collection".to_string())
        })?;
        items
            .iter()
            .map(|item| Entity::from_item(item).map(Server::from_entity))
            .collect()
    }

    /// Fetches one server of this datacenter by UUID.
    ///
    /// # Errors
    ///
    /// As for [`Datacenter::servers`].
    pub async fn server(
        &self,
        client: &CloudClient,
        server_id: &str,
        depth: u32,
    ) -> Result<Server> {
        let id = self.require_id()?;
        let payload = client
            .resource::<Self>()
            .call(
                &format!("{id}/servers/{server_id}"),
                &QueryParams::depth(depth),
                Method::Get,
                None,
            )
            .await?;
        let value = payload.into_value().ok_or_else(|| {
            Error::MalformedResponse("expected a single server".to_string())
        })?;
        Entity::from_item(&value).map(Server::from_entity)
    }

    fn require_id(&self) -> Result<&str> {
        self.entity
            .id()
            .ok_or_else(|| Error::NotFound("datacenter has no id yet".to_string()))
    }
}
