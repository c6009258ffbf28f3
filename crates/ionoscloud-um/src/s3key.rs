//! S3 key resource, nested below a user.

use std::sync::LazyLock;

use serde_json::Map;

use ionoscloud_core::entity::{Entity, PropertySchema, PropertyType};
use ionoscloud_core::resource::{Resource, ResourceDescriptor};

static DESCRIPTOR: LazyLock<ResourceDescriptor> = LazyLock::new(|| ResourceDescriptor {
    // Path template; keys are reached through the owning user's sub-path
    // (see `User::s3_keys`), not through direct collection CRUD.
    base_path: "um/users/{userId}/s3keys",
    schema: PropertySchema::new(&[("secretKey", PropertyType::STRING)]),
    defaults: Map::new(),
    unique_attr: None,
});

/// One S3 credential of a user; the key id is the entity id.
#[derive(Debug, Clone, PartialEq)]
pub struct S3Key {
    entity: Entity,
}

impl Resource for S3Key {
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

impl S3Key {
    /// Access key id (the entity id).
    #[must_use]
    pub fn access_key(&self) -> Option<&str> {
        self.entity.id()
    }

    /// Secret key.
    #[must_use]
    pub fn secret_key(&self) -> Option<&str> {
        self.entity.property_str("secretKey")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_fragment() {
        let item = json!({
            "id": "00a29d110b48daa3a18b",
            "type": "s3key",
            "properties": {"secretKey": "wJalrXUtnFEMI", "active": true}
        });
        let key = S3Key::from_entity(Entity::from_item(&item).unwrap());
        assert_eq!(key.access_key(), Some("00a29d110b48daa3a18b"));
        assert_eq!(key.secret_key(), Some("wJalrXUtnFEMI"));
    }

    #[test]
    fn test_no_unique_attr() {
        assert!(S3Key::descriptor().unique_attr.is_none());
    }
}
