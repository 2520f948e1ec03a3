//! Menu items, categories and customization option groups.
//!
//! Option groups are stored alongside each menu item as JSON in the shape
//! `{ "id", "name", "type": "single" | "multiple", "required", "options": [...] }`.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, MenuItemId, Money};

/// A menu category ("Coffee", "Pastries", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Whether a group accepts one choice or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    #[default]
    Single,
    Multiple,
}

/// One selectable choice inside an option group, with its surcharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Money,
}

/// A customization group offered on a menu item ("Milk", "Extra shots").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: SelectionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "options", default)]
    pub choices: Vec<Choice>,
}

impl OptionGroup {
    #[must_use]
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// A purchasable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub category_id: Option<CategoryId>,
    /// Denormalised category name, carried onto cart lines.
    pub category_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

impl MenuItem {
    #[must_use]
    pub fn option_group(&self, id: &str) -> Option<&OptionGroup> {
        self.options.iter().find(|g| g.id == id)
    }

    /// Whether the item has any customization groups at all.
    #[must_use]
    pub fn is_customizable(&self) -> bool {
        !self.options.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_option_group_reads_stored_shape() {
        let json = r#"{
            "id": "milk",
            "name": "Milk",
            "type": "single",
            "required": true,
            "options": [
                { "id": "whole", "name": "Whole milk", "price": "0" },
                { "id": "oat", "name": "Oat milk", "price": "50" }
            ]
        }"#;
        let group: OptionGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.kind, SelectionKind::Single);
        assert!(group.required);
        assert_eq!(group.choice("oat").unwrap().price, Money::from_shillings(50));
        assert!(group.choice("soy").is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let group: OptionGroup =
            serde_json::from_str(r#"{ "id": "extras", "name": "Extras" }"#).unwrap();
        assert_eq!(group.kind, SelectionKind::Single);
        assert!(!group.required);
        assert!(group.choices.is_empty());
    }
}
