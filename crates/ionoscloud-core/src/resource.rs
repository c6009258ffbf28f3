//! Generic CRUD engine, instantiated per resource kind.
//!
//! A concrete resource supplies its [`ResourceDescriptor`] (base path,
//! property schema, defaults, optional unique attribute) and a constructor
//! from [`Entity`]; [`ResourceClient`] provides index/get/add/update/delete
//! on top of [`CloudClient::call`].

use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::warn;

use crate::client::{CloudClient, Payload};
use crate::entity::{is_uuid, Entity, PropertySchema};
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::transport::Method;

/// Page size used by the unique-attribute pagination scan.
pub const SCAN_PAGE_LIMIT: u32 = 100;

/// A warning is logged each time a scan has crossed this many further pages.
const SCAN_WARN_EVERY: u32 = 10;

/// Static description of one resource kind.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    /// Path below the cloud API base, e.g. `um/users`.
    pub base_path: &'static str,
    /// Property schema for validation and wire serialization.
    pub schema: PropertySchema,
    /// Default property values, merged under caller-supplied attributes.
    pub defaults: Map<String, Value>,
    /// Unique attribute usable as an alternate lookup key, e.g. `email`.
    pub unique_attr: Option<&'static str>,
}

/// A concrete resource kind backed by the generic engine.
pub trait Resource: Sized + Send + Sync {
    /// The resource's static descriptor.
    fn descriptor() -> &'static ResourceDescriptor;

    /// Wraps a constructed entity.
    fn from_entity(entity: Entity) -> Self;

    /// The underlying entity.
    fn entity(&self) -> &Entity;
}

/// Typed CRUD view onto one resource kind.
pub struct ResourceClient<'a, R: Resource> {
    client: &'a CloudClient,
    _marker: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> ResourceClient<'a, R> {
    pub(crate) fn new(client: &'a CloudClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// Lists one collection page; every item becomes one entity.
    ///
    /// `depth` controls how many levels of nested sub-resources the server
    /// embeds and is passed through unmodified.
    ///
    /// # Errors
    ///
    /// Call-path errors, or [`Error::MalformedResponse`] when the server
    /// does not answer with a collection.
    pub async fn index(&self, depth: u32, offset: u32, limit: u32) -> Result<Vec<R>> {
        let payload = self
            .client
            .call(
                R::descriptor().base_path,
                &QueryParams::paged(depth, offset, limit),
                Method::Get,
                None,
                &[],
            )
            .await?;
        let items = payload.into_items().ok_or_else(|| {
            Error::MalformedResponse(format!(
                "expected a collection from '{}'",
                R::descriptor().base_path
            ))
        })?;
        items
            .iter()
            .map(|item| Entity::from_item(item).map(R::from_entity))
            .collect()
    }

    /// Lists the first page with the default page size.
    ///
    /// # Errors
    ///
    /// As for [`ResourceClient::index`].
    pub async fn list(&self, depth: u32) -> Result<Vec<R>> {
        self.index(depth, 0, SCAN_PAGE_LIMIT).await
    }

    /// Fetches one resource by UUID, or by the resource's unique attribute
    /// when the key is not UUID-shaped.
    ///
    /// The unique-attribute path is a pagination scan: pages are fetched
    /// with increasing offset until the first match or a short page. This is
    /// O(n) in collection size and intended for small collections.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] carrying the lookup key when the collection is
    /// exhausted or the resource declares no unique attribute.
    pub async fn get(&self, id_or_key: &str, depth: u32) -> Result<R> {
        if !is_uuid(id_or_key) {
            return self.find_by_unique_attr(id_or_key, depth).await;
        }
        let path = format!("{}/{}", R::descriptor().base_path, id_or_key);
        let payload = self
            .client
            .call(&path, &QueryParams::depth(depth), Method::Get, None, &[])
            .await?;
        Self::single(payload, &path)
    }

    async fn find_by_unique_attr(&self, key: &str, depth: u32) -> Result<R> {
        let descriptor = R::descriptor();
        let not_found = || Error::NotFound(format!("invalid value for id: '{key}'"));
        let attr = descriptor.unique_attr.ok_or_else(not_found)?;
        if key.is_empty() {
            return Err(not_found());
        }

        let mut offset = 0;
        let mut pages = 0;
        loop {
            let page = self.index(depth, offset, SCAN_PAGE_LIMIT).await?;
            pages += 1;
            if pages % SCAN_WARN_EVERY == 0 {
                warn!(
                    target: "ionoscloud::resource",
                    base_path = descriptor.base_path,
                    pages,
                    "unique-attribute scan for '{key}' still running"
                );
            }
            let exhausted = (page.len() as u32) < SCAN_PAGE_LIMIT;
            for item in page {
                if item.entity().property_str(attr) == Some(key) {
                    return Ok(item);
                }
            }
            if exhausted {
                return Err(Error::NotFound(format!(
                    "no {} with {attr} '{key}'",
                    descriptor.base_path
                )));
            }
            offset += SCAN_PAGE_LIMIT;
        }
    }

    /// Creates a resource from caller attributes.
    ///
    /// Attributes are validated against the schema before any network call;
    /// defaults are merged under them. The returned resource is
    /// reconstructed from the server's response (server-assigned id, href
    /// and metadata).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] before I/O, then the call-path errors.
    pub async fn add(&self, attrs: Map<String, Value>) -> Result<R> {
        let descriptor = R::descriptor();
        let candidate = Entity::from_attrs(attrs, &descriptor.schema, &descriptor.defaults)?;
        let body = candidate.to_wire(&descriptor.schema);
        let payload = self
            .client
            .call(
                descriptor.base_path,
                &QueryParams::new(),
                Method::Post,
                Some(&body),
                &[],
            )
            .await?;
        Self::single(payload, descriptor.base_path)
    }

    /// Updates a resource: `attrs` validated and applied over the current
    /// properties, full entity PUT to the server, result reconstructed from
    /// the response.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] before I/O; [`Error::NotFound`] when the entity
    /// has no id yet.
    pub async fn update(&self, item: &R, attrs: Map<String, Value>) -> Result<R> {
        let descriptor = R::descriptor();
        let entity = item.entity();
        let id = Self::require_id(entity)?;
        let merged = entity.with_attrs(attrs, &descriptor.schema)?;
        let path = format!("{}/{id}", descriptor.base_path);
        let body = merged.to_wire(&descriptor.schema);
        let payload = self
            .client
            .call(&path, &QueryParams::new(), Method::Put, Some(&body), &[])
            .await?;
        Self::single(payload, &path)
    }

    /// Deletes a resource by its id. An empty 2xx or 204 response is
    /// success.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the entity has no id; otherwise the
    /// call-path errors (an empty body with non-2xx status among them).
    pub async fn delete(&self, item: &R) -> Result<()> {
        let id = Self::require_id(item.entity())?;
        let path = format!("{}/{id}", R::descriptor().base_path);
        self.client
            .call(&path, &QueryParams::new(), Method::Delete, None, &[])
            .await?;
        Ok(())
    }

    /// Raw call below this resource's base path, for resource-specific
    /// operations built from the generic primitives.
    ///
    /// # Errors
    ///
    /// The call-path errors.
    pub async fn call(
        &self,
        subpath: &str,
        params: &QueryParams,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Payload> {
        let base = R::descriptor().base_path;
        let path = if subpath.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{subpath}")
        };
        self.client.call(&path, params, method, body, &[]).await
    }

    fn require_id(entity: &Entity) -> Result<&str> {
        entity
            .id()
            .ok_or_else(|| Error::NotFound("entity has no id yet".to_string()))
    }

    fn single(payload: Payload, path: &str) -> Result<R> {
        let value = payload.into_value().ok_or_else(|| {
            Error::MalformedResponse(format!("expected a single resource from '{path}'"))
        })?;
        Entity::from_item(&value).map(R::from_entity)
    }
}

/// Serializes a resource to its wire form (`{id?, properties}`), for bodies
/// of resource-specific calls.
#[must_use]
pub fn to_wire<R: Resource>(item: &R) -> Value {
    item.entity().to_wire(&R::descriptor().schema)
}
