//! Group resource of the user-management API.

use std::sync::LazyLock;

use serde_json::{Map, Value};

use ionoscloud_core::client::CloudClient;
use ionoscloud_core::entity::{Entity, PropertySchema, PropertyType};
use ionoscloud_core::error::{Error, Result};
use ionoscloud_core::query::QueryParams;
use ionoscloud_core::resource::{to_wire, Resource, ResourceDescriptor};
use ionoscloud_core::transport::Method;

use crate::user::User;

/// Privilege flags of a group; all optional booleans defaulting to false.
const PRIVILEGES: &[&str] = &[
    "createDataCenter",
    "createSnapshot",
    "reserveIp",
    "accessActivityLog",
    "createPcc",
    "s3Privilege",
    "createBackupUnit",
    "createInternetAccess",
    "createK8sCluster",
    "createFlowLog",
    "accessAndManageMonitoring",
    "accessAndManageCertificates",
    "manageDBaaS",
    "accessAndManageDns",
    "manageRegistry",
    "manageDataplatform",
];

static DESCRIPTOR: LazyLock<ResourceDescriptor> = LazyLock::new(|| ResourceDescriptor {
    base_path: "um/groups",
    schema: PropertySchema::new(&[
        ("name", PropertyType::STRING),
        ("createDataCenter", PropertyType::OPT_BOOL),
        ("createSnapshot", PropertyType::OPT_BOOL),
        ("reserveIp", PropertyType::OPT_BOOL),
        ("accessActivityLog", PropertyType::OPT_BOOL),
        ("createPcc", PropertyType::OPT_BOOL),
        ("s3Privilege", PropertyType::OPT_BOOL),
        ("createBackupUnit", PropertyType::OPT_BOOL),
        ("createInternetAccess", PropertyType::OPT_BOOL),
        ("createK8sCluster", PropertyType::OPT_BOOL),
        ("createFlowLog", PropertyType::OPT_BOOL),
        ("accessAndManageMonitoring", PropertyType::OPT_BOOL),
        ("accessAndManageCertificates", PropertyType::OPT_BOOL),
        ("manageDBaaS", PropertyType::OPT_BOOL),
        ("accessAndManageDns", PropertyType::OPT_BOOL),
        ("manageRegistry", PropertyType::OPT_BOOL),
        ("manageDataplatform", PropertyType::OPT_BOOL),
    ]),
    defaults: PRIVILEGES
        .iter()
        .map(|name| ((*name).to_string(), Value::Bool(false)))
        .collect::<Map<String, Value>>(),
    unique_attr: Some("name"),
});

/// One permission group, addressable by UUID or name.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    entity: Entity,
}

impl Resource for Group {
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

impl Group {
    /// Group name, also the unique lookup attribute.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.entity.property_str("name")
    }

    /// Value of one privilege flag, false when unset.
    #[must_use]
    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.entity.property_bool(privilege).unwrap_or(false)
    }

    /// Names of all privilege flags a group carries.
    #[must_use]
    pub const fn privileges() -> &'static [&'static str] {
        PRIVILEGES
    }

    /// Adds a user as member of this group
    /// (`POST um/groups/{id}/users` with the user's wire form).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when this group has no id yet, plus the call-path
    /// errors.
    pub async fn add_member(&self, client: &CloudClient, user: &User) -> Result<()> {
        let id = self
            .entity
            .id()
            .ok_or_else(|| Error::NotFound("group has no id yet".to_string()))?;
        let body = to_wire(user);
        client
            .resource::<Self>()
            .call(
                &format!("{id}/users"),
                &QueryParams::new(),
                Method::Post,
                Some(&body),
            )
            .await?;
        Ok(())
    }
}
