//! Menu catalogue with a read-through cache.
//!
//! The menu changes rarely and is read on every page of the ordering flow,
//! so responses are cached with `moka` for the configured TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use cafe_amka_core::{Category, CategoryId, MenuItem, MenuItemId};

use crate::db::{MenuRepository, RepositoryError};

/// Largest `limit` accepted for featured items.
pub const MAX_FEATURED: i64 = 24;
/// Featured items returned when no limit is given.
pub const DEFAULT_FEATURED: i64 = 6;

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("menu item not found: {0}")]
    ItemNotFound(MenuItemId),
}

/// The whole menu.
#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Menu,
    Featured(i64),
    Category(CategoryId),
    Item(MenuItemId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Menu(Arc<Menu>),
    Items(Arc<Vec<MenuItem>>),
    Item(Box<MenuItem>),
}

/// Cached access to the menu.
#[derive(Clone)]
pub struct MenuCatalog {
    inner: Arc<MenuCatalogInner>,
}

struct MenuCatalogInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl MenuCatalog {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(MenuCatalogInner { pool, cache }),
        }
    }

    fn repo(&self) -> MenuRepository<'_> {
        MenuRepository::new(&self.inner.pool)
    }

    /// All categories and available items.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Repository` if the database read fails.
    #[instrument(skip(self))]
    pub async fn menu(&self) -> Result<Arc<Menu>, MenuError> {
        if let Some(CacheValue::Menu(menu)) = self.inner.cache.get(&CacheKey::Menu).await {
            debug!("Cache hit for menu");
            return Ok(menu);
        }

        let repo = self.repo();
        let menu = Arc::new(Menu {
            categories: repo.list_categories().await?,
            items: repo.list_items().await?,
        });

        self.inner
            .cache
            .insert(CacheKey::Menu, CacheValue::Menu(Arc::clone(&menu)))
            .await;

        Ok(menu)
    }

    /// The newest items. `limit` is clamped to `1..=MAX_FEATURED`.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Repository` if the database read fails.
    #[instrument(skip(self))]
    pub async fn featured(&self, limit: Option<i64>) -> Result<Arc<Vec<MenuItem>>, MenuError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED).clamp(1, MAX_FEATURED);
        let key = CacheKey::Featured(limit);

        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for featured items");
            return Ok(items);
        }

        let items = Arc::new(self.repo().featured(limit).await?);
        self.inner
            .cache
            .insert(key, CacheValue::Items(Arc::clone(&items)))
            .await;

        Ok(items)
    }

    /// Items in one category. An unknown category yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Repository` if the database read fails.
    #[instrument(skip(self))]
    pub async fn category(&self, id: CategoryId) -> Result<Arc<Vec<MenuItem>>, MenuError> {
        let key = CacheKey::Category(id);

        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for category");
            return Ok(items);
        }

        let items = Arc::new(self.repo().list_by_category(id).await?);
        self.inner
            .cache
            .insert(key, CacheValue::Items(Arc::clone(&items)))
            .await;

        Ok(items)
    }

    /// One item that can currently be ordered.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::ItemNotFound` if the item is missing or unavailable.
    /// Returns `MenuError::Repository` if the database read fails.
    #[instrument(skip(self))]
    pub async fn item(&self, id: MenuItemId) -> Result<MenuItem, MenuError> {
        let key = CacheKey::Item(id);

        if let Some(CacheValue::Item(item)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for menu item");
            return Ok(*item);
        }

        let item = self
            .repo()
            .get_available(id)
            .await?
            .ok_or(MenuError::ItemNotFound(id))?;

        self.inner
            .cache
            .insert(key, CacheValue::Item(Box::new(item.clone())))
            .await;

        Ok(item)
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
