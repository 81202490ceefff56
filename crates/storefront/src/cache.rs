//! Read-through cache for catalog data that changes rarely.
//!
//! Uses `moka` with a short TTL (`CATALOG_CACHE_TTL_SECS`). Admin edits show
//! up on the storefront once the entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use souk_core::catalog::ProductTypeNode;
use souk_core::records::{DeliveryArea, OfferEntry};

/// Cache key for catalog data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Tree,
    DeliveryAreas,
    Offers,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Tree(Arc<Vec<ProductTypeNode>>),
    DeliveryAreas(Arc<Vec<DeliveryArea>>),
    Offers(Arc<Vec<OfferEntry>>),
}

/// Cache of the catalog tree, active delivery areas and active offers.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl CatalogCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    /// Cached catalog tree, if present.
    pub async fn tree(&self) -> Option<Arc<Vec<ProductTypeNode>>> {
        match self.inner.get(&CacheKey::Tree).await {
            Some(CacheValue::Tree(tree)) => {
                debug!("Cache hit for catalog tree");
                Some(tree)
            }
            _ => None,
        }
    }

    pub async fn set_tree(&self, tree: Arc<Vec<ProductTypeNode>>) {
        self.inner.insert(CacheKey::Tree, CacheValue::Tree(tree)).await;
    }

    /// Cached active delivery areas, if present.
    pub async fn delivery_areas(&self) -> Option<Arc<Vec<DeliveryArea>>> {
        match self.inner.get(&CacheKey::DeliveryAreas).await {
            Some(CacheValue::DeliveryAreas(areas)) => Some(areas),
            _ => None,
        }
    }

    pub async fn set_delivery_areas(&self, areas: Arc<Vec<DeliveryArea>>) {
        self.inner
            .insert(CacheKey::DeliveryAreas, CacheValue::DeliveryAreas(areas))
            .await;
    }

    /// Cached active offers, if present.
    pub async fn offers(&self) -> Option<Arc<Vec<OfferEntry>>> {
        match self.inner.get(&CacheKey::Offers).await {
            Some(CacheValue::Offers(offers)) => Some(offers),
            _ => None,
        }
    }

    pub async fn set_offers(&self, offers: Arc<Vec<OfferEntry>>) {
        self.inner.insert(CacheKey::Offers, CacheValue::Offers(offers)).await;
    }
}
