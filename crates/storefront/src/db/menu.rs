//! Menu repository.
//!
//! Option groups are stored as JSONB on `menu_items.customization_options`
//! and decoded into [`OptionGroup`]s when read.

use sqlx::PgPool;
use sqlx::types::Json;

use cafe_amka_core::{Category, CategoryId, MenuItem, MenuItemId, Money, OptionGroup};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: MenuItemId,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    name: String,
    description: Option<String>,
    price: Money,
    image_url: Option<String>,
    customization_options: serde_json::Value,
}

impl TryFrom<MenuItemRow> for MenuItem {
    type Error = RepositoryError;

    fn try_from(row: MenuItemRow) -> Result<Self, Self::Error> {
        if row.price <= Money::ZERO {
            return Err(RepositoryError::DataCorruption(format!(
                "menu item {} has non-positive price {}",
                row.id,
                row.price.amount()
            )));
        }

        let options: Vec<OptionGroup> = if row.customization_options.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(row.customization_options).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid customization options for menu item {}: {e}",
                    row.id
                ))
            })?
        };

        Ok(Self {
            id: row.id,
            category_id: row.category_id,
            category_name: row.category_name,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            options,
        })
    }
}

const ITEM_COLUMNS: &str = r"
    m.id, m.category_id, c.name AS category_name, m.name, m.description,
    m.price, m.image_url, m.customization_options
";

/// New or updated menu item, as loaded by the seeding tool.
#[derive(Debug, Clone)]
pub struct NewMenuItem<'a> {
    pub category_id: CategoryId,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Money,
    pub image_url: Option<&'a str>,
    pub options: &'a [OptionGroup],
}

/// Repository for menu reads and catalogue seeding.
pub struct MenuRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// List every available item, grouped by category name then item name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an item's options are malformed.
    pub async fn list_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM menu_items m
            LEFT JOIN categories c ON c.id = m.category_id
            WHERE m.is_available
            ORDER BY c.name NULLS LAST, m.name
            "
        );

        sqlx::query_as::<_, MenuItemRow>(&sql)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(MenuItem::try_from)
            .collect()
    }

    /// List available items in one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an item's options are malformed.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM menu_items m
            LEFT JOIN categories c ON c.id = m.category_id
            WHERE m.is_available AND m.category_id = $1
            ORDER BY m.name
            "
        );

        sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(category_id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(MenuItem::try_from)
            .collect()
    }

    /// The newest available items, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an item's options are malformed.
    pub async fn featured(&self, limit: i64) -> Result<Vec<MenuItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM menu_items m
            LEFT JOIN categories c ON c.id = m.category_id
            WHERE m.is_available
            ORDER BY m.created_at DESC
            LIMIT $1
            "
        );

        sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(MenuItem::try_from)
            .collect()
    }

    /// Get one item by ID, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the item's options are malformed.
    pub async fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM menu_items m
            LEFT JOIN categories c ON c.id = m.category_id
            WHERE m.id = $1
            "
        );

        sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(MenuItem::try_from)
            .transpose()
    }

    /// Get an item only if it can currently be ordered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_available(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let available: Option<bool> =
            sqlx::query_scalar("SELECT is_available FROM menu_items WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match available {
            Some(true) => self.get(id).await,
            _ => Ok(None),
        }
    }

    /// Insert a category or return the existing one with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id, name, description
            ",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Insert an item, or update price, description and options of the item
    /// with the same name in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_item(&self, item: &NewMenuItem<'_>) -> Result<MenuItemId, RepositoryError> {
        let id: MenuItemId = sqlx::query_scalar(
            r"
            INSERT INTO menu_items
                (category_id, name, description, price, image_url, customization_options)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (category_id, name) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                customization_options = EXCLUDED.customization_options,
                is_available = TRUE,
                updated_at = now()
            RETURNING id
            ",
        )
        .bind(item.category_id)
        .bind(item.name)
        .bind(item.description)
        .bind(item.price)
        .bind(item.image_url)
        .bind(Json(item.options))
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(options: serde_json::Value) -> MenuItemRow {
        MenuItemRow {
            id: MenuItemId::generate(),
            category_id: None,
            category_name: Some("Coffee".to_owned()),
            name: "Cappuccino".to_owned(),
            description: None,
            price: Money::from_shillings(280),
            image_url: None,
            customization_options: options,
        }
    }

    #[test]
    fn test_row_decodes_option_groups() {
        let item = MenuItem::try_from(row(serde_json::json!([
            {
                "id": "milk",
                "name": "Milk",
                "type": "single",
                "required": true,
                "options": [
                    { "id": "whole", "name": "Whole", "price": "0" },
                    { "id": "oat", "name": "Oat", "price": "50" }
                ]
            }
        ])))
        .unwrap();

        assert_eq!(item.options.len(), 1);
        assert_eq!(
            item.option_group("milk").unwrap().choice("oat").unwrap().price,
            Money::from_shillings(50)
        );
    }

    #[test]
    fn test_null_options_means_plain_item() {
        let item = MenuItem::try_from(row(serde_json::Value::Null)).unwrap();
        assert!(item.options.is_empty());
    }

    #[test]
    fn test_malformed_options_are_corruption() {
        let err = MenuItem::try_from(row(serde_json::json!({ "milk": "oat" }))).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_zero_price_is_corruption() {
        let mut r = row(serde_json::json!([]));
        r.price = Money::ZERO;
        assert!(matches!(
            MenuItem::try_from(r),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
