//! Seed the menu from a YAML catalogue.
//!
//! Categories are matched by name and items by name within their category,
//! so running the same file twice updates prices and options in place.
//!
//! ```yaml
//! categories:
//!   - name: Coffee
//!     description: Espresso drinks
//!     items:
//!       - name: Cappuccino
//!         price: "320"
//!         options:
//!           - id: milk
//!             name: Milk
//!             type: single
//!             required: true
//!             options:
//!               - { id: whole, name: Whole milk }
//!               - { id: oat, name: Oat milk, price: "50" }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use cafe_amka_core::{Money, OptionGroup};
use cafe_amka_storefront::config::get_database_url;
use cafe_amka_storefront::db::{self, MenuRepository, menu::NewMenuItem};

/// Top-level YAML document.
#[derive(Debug, Deserialize)]
pub struct MenuCatalogue {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

/// Counts reported after seeding.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub categories: usize,
    pub items: usize,
}

/// Check a catalogue before touching the database.
///
/// Returns one message per problem found.
#[must_use]
pub fn validate_catalogue(catalogue: &MenuCatalogue) -> Vec<String> {
    let mut errors = Vec::new();
    let mut category_names = HashSet::new();

    for category in &catalogue.categories {
        if category.name.trim().is_empty() {
            errors.push("category with a blank name".to_owned());
        }
        if !category_names.insert(category.name.as_str()) {
            errors.push(format!("duplicate category: {}", category.name));
        }

        let mut item_names = HashSet::new();
        for item in &category.items {
            let label = format!("{} / {}", category.name, item.name);
            if !item_names.insert(item.name.as_str()) {
                errors.push(format!("duplicate item: {label}"));
            }
            if item.price <= Money::ZERO {
                errors.push(format!("{label}: price must be positive"));
            }
            errors.extend(validate_groups(&label, &item.options));
        }
    }

    errors
}

fn validate_groups(label: &str, groups: &[OptionGroup]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut group_ids = HashSet::new();

    for group in groups {
        if !group_ids.insert(group.id.as_str()) {
            errors.push(format!("{label}: duplicate option group {}", group.id));
        }
        if group.choices.is_empty() {
            errors.push(format!("{label}: option group {} has no choices", group.id));
        }

        let mut choice_ids = HashSet::new();
        for choice in &group.choices {
            if !choice_ids.insert(choice.id.as_str()) {
                errors.push(format!(
                    "{label}: duplicate choice {} in group {}",
                    choice.id, group.id
                ));
            }
            if choice.price.is_negative() {
                errors.push(format!(
                    "{label}: choice {} has a negative surcharge",
                    choice.id
                ));
            }
        }
    }

    errors
}

/// Seed the menu from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn menu(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading menu catalogue");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalogue: MenuCatalogue = serde_yaml::from_str(&content)?;

    let errors = validate_catalogue(&catalogue);
    if !errors.is_empty() {
        error!("Catalogue validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let database_url = get_database_url("CAFE_DATABASE_URL")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repo = MenuRepository::new(&pool);
    let mut result = SeedResult::default();

    for entry in &catalogue.categories {
        let category = repo
            .upsert_category(&entry.name, entry.description.as_deref())
            .await?;
        result.categories += 1;

        for item in &entry.items {
            repo.upsert_item(&NewMenuItem {
                category_id: category.id,
                name: &item.name,
                description: item.description.as_deref(),
                price: item.price,
                image_url: item.image_url.as_deref(),
                options: &item.options,
            })
            .await?;
            result.items += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Categories: {}", result.categories);
    info!("  Items: {}", result.items);

    Ok(())
}
