use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::RwLock;

/// EndpointKey identifies one endpoint lookup.
///
/// Product code and region id are lowercased, so `ECS`/`CN-Hangzhou` and
/// `ecs`/`cn-hangzhou` share the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey(String);

impl EndpointKey {
    /// Build the key from its parts.
    pub fn new(
        product_code: &str,
        location_service_code: &str,
        region_id: &str,
        endpoint_type: &str,
    ) -> Self {
        Self(format!(
            "{}.{}.{}.{}",
            product_code.to_lowercase(),
            location_service_code,
            region_id.to_lowercase(),
            endpoint_type
        ))
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EndpointKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// EndpointEntry is a remembered lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEntry {
    /// The location service returned this endpoint.
    Found(String),
    /// The lookup finished without an endpoint. Never retried.
    NotFound,
}

impl EndpointEntry {
    /// The endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            EndpointEntry::Found(v) => Some(v),
            EndpointEntry::NotFound => None,
        }
    }
}

impl From<Option<String>> for EndpointEntry {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(v) => EndpointEntry::Found(v),
            None => EndpointEntry::NotFound,
        }
    }
}

/// EndpointCache remembers endpoint lookups and rejected codes.
///
/// Entries are never evicted. Product codes and region ids are compared
/// case-insensitively.
#[derive(Debug, Default)]
pub struct EndpointCache {
    entries: RwLock<HashMap<EndpointKey, EndpointEntry>>,

    invalid_products: RwLock<HashSet<String>>,
    invalid_regions: RwLock<HashSet<String>>,
    valid_products: RwLock<HashSet<String>>,
    valid_regions: RwLock<HashSet<String>>,
}

impl EndpointCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the remembered result for this key.
    ///
    /// `None` means the key was never looked up, which differs from
    /// `Some(EndpointEntry::NotFound)`.
    pub fn lookup(&self, key: &EndpointKey) -> Option<EndpointEntry> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
    }

    /// Remember the result for this key. `None` stores a permanent miss.
    pub fn store(&self, key: EndpointKey, endpoint: Option<String>) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key, endpoint.into());
    }

    /// Number of remembered keys.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Check if nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a product code rejected by the location service.
    pub fn mark_product_invalid(&self, product_code: &str) {
        insert(&self.invalid_products, product_code);
    }

    /// Record a region id rejected by the location service.
    pub fn mark_region_invalid(&self, region_id: &str) {
        insert(&self.invalid_regions, region_id);
    }

    /// Check that the product code has not been rejected.
    pub fn is_product_valid(&self, product_code: &str) -> bool {
        !contains(&self.invalid_products, product_code)
    }

    /// Check that the region id has not been rejected.
    pub fn is_region_valid(&self, region_id: &str) -> bool {
        !contains(&self.invalid_regions, region_id)
    }

    /// Record a product code accepted by the location service.
    pub fn mark_product_valid(&self, product_code: &str) {
        insert(&self.valid_products, product_code);
    }

    /// Record a region id accepted by the location service.
    pub fn mark_region_valid(&self, region_id: &str) {
        insert(&self.valid_regions, region_id);
    }

    /// Check that the product code has been accepted at least once.
    pub fn is_product_confirmed(&self, product_code: &str) -> bool {
        contains(&self.valid_products, product_code)
    }

    /// Check that the region id has been accepted at least once.
    pub fn is_region_confirmed(&self, region_id: &str) -> bool {
        contains(&self.valid_regions, region_id)
    }
}

fn insert(set: &RwLock<HashSet<String>>, code: &str) {
    set.write().expect("lock poisoned").insert(code.to_lowercase());
}

fn contains(set: &RwLock<HashSet<String>>, code: &str) -> bool {
    set.read()
        .expect("lock poisoned")
        .contains(&code.to_lowercase())
}
