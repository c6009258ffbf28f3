//! User resource of the user-management API.

use std::sync::LazyLock;

use serde_json::{Map, Value};

use ionoscloud_core::client::CloudClient;
use ionoscloud_core::entity::{Entity, PropertySchema, PropertyType};
use ionoscloud_core::error::{Error, Result};
use ionoscloud_core::query::QueryParams;
use ionoscloud_core::resource::{Resource, ResourceDescriptor};
use ionoscloud_core::transport::Method;

use crate::group::Group;
use crate::s3key::S3Key;

static DESCRIPTOR: LazyLock<ResourceDescriptor> = LazyLock::new(|| ResourceDescriptor {
    base_path: "um/users",
    schema: PropertySchema::new(&[
        ("firstname", PropertyType::STRING),
        ("lastname", PropertyType::STRING),
        ("email", PropertyType::STRING),
        ("password", PropertyType::STRING),
        ("administrator", PropertyType::OPT_BOOL),
        ("active", PropertyType::OPT_BOOL),
    ]),
    defaults: Map::from_iter([
        ("administrator".to_string(), Value::Bool(false)),
        ("active".to_string(), Value::Bool(true)),
    ]),
    unique_attr: Some("email"),
});

/// One account of the contract, addressable by UUID or email.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    entity: Entity,
}

impl Resource for User {
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

impl User {
    /// First name.
    #[must_use]
    pub fn firstname(&self) -> Option<&str> {
        self.entity.property_str("firstname")
    }

    /// Last name.
    #[must_use]
    pub fn lastname(&self) -> Option<&str> {
        self.entity.property_str("lastname")
    }

    /// E-mail address, also the unique lookup attribute.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.entity.property_str("email")
    }

    /// Contract administrator flag.
    #[must_use]
    pub fn administrator(&self) -> bool {
        self.entity.property_bool("administrator").unwrap_or(false)
    }

    /// Active flag.
    #[must_use]
    pub fn active(&self) -> bool {
        self.entity.property_bool("active").unwrap_or(false)
    }

    /// Adds this user to a group, addressed by name or UUID.
    ///
    /// Returns `false` when the user's embedded group memberships (depth > 0)
    /// already contain the group, `true` after a successful add.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the group does not exist, plus the call-path
    /// errors of the membership POST.
    pub async fn add_membership(&self, client: &CloudClient, group_key: &str) -> Result<bool> {
        let group = client.resource::<Group>().get(group_key, 1).await?;
        if let Some(group_id) = group.entity().id() {
            let already_member = self
                .entity
                .entities()
                .get("groups")
                .and_then(|groups| groups.get("items"))
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| item.get("id").and_then(Value::as_str) == Some(group_id))
                });
            if already_member {
                return Ok(false);
            }
        }
        group.add_member(client, self).await?;
        Ok(true)
    }

    /// The user's S3 keys.
    ///
    /// Embedded `s3Keys` items (depth > 0) are used when present; otherwise
    /// a key is provisioned via `POST um/users/{id}/s3keys` and returned as
    /// the only element.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the user has no id yet, plus the call-path
    /// errors of the provisioning POST.
    pub async fn s3_keys(&self, client: &CloudClient) -> Result<Vec<S3Key>> {
        let embedded = self
            .entity
            .entities()
            .get("s3Keys")
            .and_then(|keys| keys.get("items"))
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .cloned();
        let items = match embedded {
            Some(items) => items,
            None => {
                let id = self
                    .entity
                    .id()
                    .ok_or_else(|| Error::NotFound("user has no id yet".to_string()))?;
                let payload = client
                    .resource::<Self>()
                    .call(
                        &format!("{id}/s3keys"),
                        &QueryParams::new(),
                        Method::Post,
                        None,
                    )
                    .await?;
                match payload {
                    ionoscloud_core::Payload::Items(items) => items,
                    ionoscloud_core::Payload::Value(value) => vec![value],
                    ionoscloud_core::Payload::Empty => Vec::new(),
                }
            }
        };
        items
            .iter()
            .map(|item| Entity::from_item(item).map(S3Key::from_entity))
            .collect()
    }
}
