//! Generic entity model: identity, schema-checked properties, wire form.
//!
//! Every concrete resource is a thin wrapper around [`Entity`]. Decoded JSON
//! is mapped through an explicit property schema rather than bound onto
//! fields by reflection: caller-supplied attributes are validated against
//! the schema before any network call, while server-returned properties are
//! kept readable as delivered.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Runtime kind of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// JSON string.
    String,
    /// JSON boolean.
    Bool,
    /// JSON integer.
    Int,
}

/// Declared type of a schema property; `nullable` mirrors the `?` prefix of
/// the source descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyType {
    /// Value kind.
    pub kind: PropertyKind,
    /// True when the property may be absent or null.
    pub nullable: bool,
}

impl PropertyType {
    /// Required string.
    pub const STRING: Self = Self {
        kind: PropertyKind::String,
        nullable: false,
    };
    /// Optional string (`?string`).
    pub const OPT_STRING: Self = Self {
        kind: PropertyKind::String,
        nullable: true,
    };
    /// Required boolean.
    pub const BOOL: Self = Self {
        kind: PropertyKind::Bool,
        nullable: false,
    };
    /// Optional boolean (`?bool`).
    pub const OPT_BOOL: Self = Self {
        kind: PropertyKind::Bool,
        nullable: true,
    };
    /// Required integer.
    pub const INT: Self = Self {
        kind: PropertyKind::Int,
        nullable: false,
    };
    /// Optional integer (`?int`).
    pub const OPT_INT: Self = Self {
        kind: PropertyKind::Int,
        nullable: true,
    };

    /// True when the value's runtime type matches the declared kind.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self.kind {
            PropertyKind::String => value.is_string(),
            PropertyKind::Bool => value.is_boolean(),
            PropertyKind::Int => value.is_i64() || value.is_u64(),
        }
    }

    /// Descriptor form for error messages, e.g. `?bool`.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match (self.kind, self.nullable) {
            (PropertyKind::String, false) => "string",
            (PropertyKind::String, true) => "?string",
            (PropertyKind::Bool, false) => "bool",
            (PropertyKind::Bool, true) => "?bool",
            (PropertyKind::Int, false) => "int",
            (PropertyKind::Int, true) => "?int",
        }
    }
}

/// Runtime type name of a JSON value, for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Property schema of one resource kind: name/type pairs in declaration
/// order.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    fields: &'static [(&'static str, PropertyType)],
}

impl PropertySchema {
    /// Wrap a static field list.
    #[must_use]
    pub const fn new(fields: &'static [(&'static str, PropertyType)]) -> Self {
        Self { fields }
    }

    /// Declared type of a field, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyType> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, ty)| *ty)
    }

    /// Iterate over the declared fields.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, PropertyType)> + '_ {
        self.fields.iter().copied()
    }

    /// Validates caller-supplied attributes: every key must be declared and
    /// every value must match its declared type (`null` only for nullable
    /// fields). This is the single gate before the network.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] naming the offending field, the declared type
    /// and the actual type.
    pub fn check(&self, attrs: &Map<String, Value>) -> Result<()> {
        for (name, value) in attrs {
            let Some(declared) = self.get(name) else {
                return Err(Error::Validation(format!("unknown property '{name}'")));
            };
            if value.is_null() {
                if !declared.nullable {
                    return Err(Error::Validation(format!(
                        "property '{name}' is not a {} (got null)",
                        declared.describe()
                    )));
                }
            } else if !declared.matches(value) {
                return Err(Error::Validation(format!(
                    "property '{name}' is not a {} (got {})",
                    declared.describe(),
                    json_type_name(value)
                )));
            }
        }
        Ok(())
    }
}

/// One typed resource instance: identity plus properties.
///
/// Entities are immutable value snapshots; mutation happens by constructing
/// a new entity from a server response or a merged attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: Option<String>,
    kind: Option<String>,
    href: Option<String>,
    metadata: Map<String, Value>,
    properties: Map<String, Value>,
    entities: Map<String, Value>,
}

impl Entity {
    /// Builds an entity from one server-returned JSON fragment
    /// (`{type,id,href,metadata,properties,entities?}`).
    ///
    /// Server data is trusted: no schema validation, and properties outside
    /// the schema stay readable (they are never serialized back).
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] when the fragment is not a JSON object.
    pub fn from_item(item: &Value) -> Result<Self> {
        let object = item.as_object().ok_or_else(|| {
            Error::MalformedResponse(format!(
                "resource fragment is not an object (got {})",
                json_type_name(item)
            ))
        })?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(ToString::to_string)
        };
        let map = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default()
        };
        Ok(Self {
            id: text("id"),
            kind: text("type"),
            href: text("href"),
            metadata: map("metadata"),
            properties: map("properties"),
            entities: map("entities"),
        })
    }

    /// Builds a not-yet-persisted entity from caller attributes, validated
    /// against the schema, with defaults merged under the supplied values.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for unknown or wrongly-typed attributes.
    pub fn from_attrs(
        attrs: Map<String, Value>,
        schema: &PropertySchema,
        defaults: &Map<String, Value>,
    ) -> Result<Self> {
        schema.check(&attrs)?;
        let mut properties = defaults.clone();
        for (name, value) in attrs {
            properties.insert(name, value);
        }
        Ok(Self {
            id: None,
            kind: None,
            href: None,
            metadata: Map::new(),
            properties,
            entities: Map::new(),
        })
    }

    /// Returns a new snapshot with `attrs` (validated) applied over the
    /// current properties; identity fields are carried over unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for unknown or wrongly-typed attributes.
    pub fn with_attrs(&self, attrs: Map<String, Value>, schema: &PropertySchema) -> Result<Self> {
        schema.check(&attrs)?;
        let mut updated = self.clone();
        for (name, value) in attrs {
            updated.properties.insert(name, value);
        }
        Ok(updated)
    }

    /// Wire form for PUT/POST bodies: `{id?, properties}`.
    ///
    /// The id is included only once assigned. Every required schema field is
    /// emitted (null when unset); optional fields are emitted only when set.
    /// `type`, `href`, `metadata` and embedded `entities` never appear.
    #[must_use]
    pub fn to_wire(&self, schema: &PropertySchema) -> Value {
        let mut properties = Map::new();
        for (name, declared) in schema.fields() {
            match self.properties.get(name) {
                Some(value) if !value.is_null() => {
                    properties.insert(name.to_string(), value.clone());
                }
                _ => {
                    if !declared.nullable {
                        properties.insert(name.to_string(), Value::Null);
                    }
                }
            }
        }
        let mut root = Map::new();
        if let Some(id) = &self.id {
            root.insert("id".to_string(), Value::String(id.clone()));
        }
        root.insert("properties".to_string(), Value::Object(properties));
        Value::Object(root)
    }

    /// Opaque identifier; `None` before the entity is persisted.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Server-assigned resource-kind tag.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Server-assigned canonical URL.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Server-managed metadata (etag, timestamps); read-only.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Resource properties as delivered or constructed.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Embedded sub-resource collections (depth > 0); read-only.
    #[must_use]
    pub const fn entities(&self) -> &Map<String, Value> {
        &self.entities
    }

    /// Raw property value.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// String property value.
    #[must_use]
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_str)
    }

    /// Boolean property value.
    #[must_use]
    pub fn property_bool(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(Value::as_bool)
    }

    /// Integer property value.
    #[must_use]
    pub fn property_i64(&self, name: &str) -> Option<i64> {
        self.property(name).and_then(Value::as_i64)
    }
}

/// True for the canonical lowercase `8-4-4-4-12` hex form; anything else
/// (uppercase, braced, simple) is treated as an alternate lookup key.
#[must_use]
pub fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && Uuid::try_parse(s).is_ok()
        && s.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
        })
}
