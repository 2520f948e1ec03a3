//! Keyed cart store with derived totals.
//!
//! A cart line is one distinct purchasable configuration: a menu item, a set
//! of customizations and optional special instructions. Adding the same
//! configuration again grows the existing line instead of creating a new one.
//!
//! After every mutation:
//! - each line has `quantity >= 1` and `total_price == unit_price × quantity`
//! - `total_items` is the sum of line quantities
//! - `total_amount` is the sum of line totals

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::menu::MenuItem;
use crate::pricing::{self, Customizations, PricingError, SelectedOption};
use crate::types::{MenuItemId, Money};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("quantity is too large")]
    QuantityOverflow,
    #[error("cart line not found: {0}")]
    LineNotFound(LineKey),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Identity of a cart line.
///
/// Hex SHA-256 over the menu item id, the canonical customization JSON and
/// the trimmed special instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    #[must_use]
    pub fn compute(
        menu_item_id: MenuItemId,
        customizations: &Customizations,
        special_instructions: Option<&str>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(menu_item_id.as_uuid().as_bytes());
        hasher.update([0x1f]);
        hasher.update(customizations.signature().as_bytes());
        hasher.update([0x1f]);
        hasher.update(special_instructions.unwrap_or_default().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LineKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub key: LineKey,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    #[serde(default)]
    pub customizations: Customizations,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    pub special_instructions: Option<String>,
}

impl CartLineItem {
    fn set_quantity(&mut self, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        self.total_price = pricing::line_total(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartLineItem>,
}

/// The customer's cart.
///
/// Deserializing a cart rebuilds every derived figure from the stored lines,
/// so a saved cart can never come back with stale totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCart")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total_items: u32,
    total_amount: Money,
}

impl TryFrom<StoredCart> for Cart {
    type Error = CartError;

    fn try_from(stored: StoredCart) -> Result<Self, Self::Error> {
        Self::from_lines(stored.items)
    }
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from saved lines.
    ///
    /// Lines with zero quantity are dropped and line totals are recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if any total overflows.
    pub fn from_lines(lines: Vec<CartLineItem>) -> Result<Self, CartError> {
        let mut cart = Self {
            items: Vec::with_capacity(lines.len()),
            ..Self::default()
        };
        for mut line in lines.into_iter().filter(|l| l.quantity > 0) {
            line.set_quantity(line.quantity)?;
            cart.items.push(line);
        }
        cart.recompute()?;
        Ok(cart)
    }

    /// Add `quantity` of a configured menu item.
    ///
    /// Blank instructions count as none. If a line with the same identity
    /// exists its quantity grows by `quantity`, otherwise a new line is
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity, a pricing
    /// error for an invalid selection, or an overflow error.
    pub fn add(
        &mut self,
        item: &MenuItem,
        quantity: u32,
        customizations: Customizations,
        special_instructions: Option<&str>,
    ) -> Result<&CartLineItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let instructions = special_instructions
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let key = LineKey::compute(item.id, &customizations, instructions);

        let (index, line) = if let Some(index) = self.position(&key) {
            let mut line = self
                .items
                .get(index)
                .cloned()
                .ok_or_else(|| CartError::LineNotFound(key.clone()))?;
            let combined = line
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow)?;
            line.set_quantity(combined)?;
            (Some(index), line)
        } else {
            let selected_options = pricing::resolve_selection(item, &customizations)?;
            let unit_price = pricing::unit_price(item, &selected_options)?;
            let line = CartLineItem {
                key: key.clone(),
                menu_item_id: item.id,
                name: item.name.clone(),
                category: item.category_name.clone(),
                image_url: item.image_url.clone(),
                quantity,
                unit_price,
                total_price: pricing::line_total(unit_price, quantity)?,
                customizations,
                selected_options,
                special_instructions: instructions.map(str::to_owned),
            };
            (None, line)
        };

        let index = self.put_line(index, line)?;
        self.items.get(index).ok_or(CartError::LineNotFound(key))
    }

    /// Drop a line. Returns `false` if no line had that key.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.take_line(index);
        true
    }

    /// Set a line's quantity. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown key, or an overflow
    /// error. The cart is unchanged on error.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        let index = self
            .position(key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;

        if quantity <= 0 {
            self.take_line(index);
            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_| CartError::QuantityOverflow)?;
        let mut line = self
            .items
            .get(index)
            .cloned()
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;
        line.set_quantity(quantity)?;
        self.put_line(Some(index), line)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total_items = 0;
        self.total_amount = Money::ZERO;
    }

    /// Total quantity of a menu item across all of its configurations.
    #[must_use]
    pub fn quantity_of(&self, menu_item_id: MenuItemId) -> u32 {
        self.items
            .iter()
            .filter(|line| line.menu_item_id == menu_item_id)
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.items.iter().find(|line| &line.key == key)
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.total_items
    }

    #[must_use]
    pub const fn total_amount(&self) -> Money {
        self.total_amount
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|line| &line.key == key)
    }

    /// Replace the line at `index`, or append when `index` is `None`.
    ///
    /// Totals are checked against the would-be lines first, so a failure
    /// leaves the cart as it was.
    fn put_line(&mut self, index: Option<usize>, line: CartLineItem) -> Result<usize, CartError> {
        let (total_items, total_amount) = match index {
            Some(at) => sum_lines(
                self.items
                    .iter()
                    .enumerate()
                    .map(|(i, existing)| if i == at { &line } else { existing }),
            )?,
            None => sum_lines(self.items.iter().chain(std::iter::once(&line)))?,
        };

        let index = match index {
            Some(at) => {
                let slot = self
                    .items
                    .get_mut(at)
                    .ok_or_else(|| CartError::LineNotFound(line.key.clone()))?;
                *slot = line;
                at
            }
            None => {
                self.items.push(line);
                self.items.len() - 1
            }
        };
        self.total_items = total_items;
        self.total_amount = total_amount;
        Ok(index)
    }

    /// Removing a line can only shrink the sums, so they are adjusted in place.
    fn take_line(&mut self, index: usize) {
        let line = self.items.remove(index);
        self.total_items = self.total_items.saturating_sub(line.quantity);
        self.total_amount = self.total_amount - line.total_price;
    }

    fn recompute(&mut self) -> Result<(), CartError> {
        let (total_items, total_amount) = sum_lines(&self.items)?;
        self.total_items = total_items;
        self.total_amount = total_amount;
        Ok(())
    }
}

fn sum_lines<'a>(
    lines: impl IntoIterator<Item = &'a CartLineItem>,
) -> Result<(u32, Money), CartError> {
    lines
        .into_iter()
        .try_fold((0u32, Money::ZERO), |(items, amount), line| {
            let items = items
                .checked_add(line.quantity)
                .ok_or(CartError::QuantityOverflow)?;
            let amount = amount
                .checked_add(line.total_price)
                .ok_or(PricingError::Overflow)?;
            Ok((items, amount))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::menu::{Choice, OptionGroup, SelectionKind};

    fn item(name: &str, price: i64) -> MenuItem {
        MenuItem {
            id: MenuItemId::generate(),
            category_id: None,
            category_name: Some("Coffee".to_owned()),
            name: name.to_owned(),
            description: None,
            price: Money::from_shillings(price),
            image_url: None,
            options: vec![OptionGroup {
                id: "milk".to_owned(),
                name: "Milk".to_owned(),
                kind: SelectionKind::Multiple,
                required: false,
                choices: vec![
                    Choice {
                        id: "oat".to_owned(),
                        name: "Oat".to_owned(),
                        price: Money::from_shillings(50),
                    },
                    Choice {
                        id: "foam".to_owned(),
                        name: "Extra foam".to_owned(),
                        price: Money::from_shillings(20),
                    },
                ],
            }],
        }
    }

    fn assert_consistent(cart: &Cart) {
        for line in cart.items() {
            assert!(line.quantity >= 1);
            assert_eq!(
                line.total_price,
                line.unit_price.checked_times(line.quantity).unwrap()
            );
        }
        assert_eq!(
            cart.total_items(),
            cart.items().iter().map(|l| l.quantity).sum::<u32>()
        );
        assert_eq!(
            cart.total_amount(),
            cart.items().iter().map(|l| l.total_price).sum::<Money>()
        );
    }

    #[test]
    fn test_add_same_configuration_merges() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, 1, Customizations::new(), None).unwrap();
        cart.add(&latte, 2, Customizations::new(), Some("   ")).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_amount(), Money::from_shillings(960));
        assert_consistent(&cart);
    }

    #[test]
    fn test_distinct_configurations_are_distinct_lines() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, 1, Customizations::new(), None).unwrap();
        cart.add(&latte, 1, Customizations::new().with("milk", "oat"), None)
            .unwrap();
        cart.add(&latte, 1, Customizations::new(), Some("extra hot"))
            .unwrap();

        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.quantity_of(latte.id), 3);
        assert_eq!(cart.total_amount(), Money::from_shillings(1010));
        assert_consistent(&cart);
    }

    #[test]
    fn test_choice_order_does_not_split_lines() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(
            &latte,
            1,
            Customizations::new().with("milk", "oat").with("milk", "foam"),
            None,
        )
        .unwrap();
        cart.add(
            &latte,
            1,
            Customizations::new().with("milk", "foam").with("milk", "oat"),
            None,
        )
        .unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].unit_price, Money::from_shillings(390));
        assert_eq!(cart.total_amount(), Money::from_shillings(780));
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        let key = cart
            .add(&latte, 1, Customizations::new(), None)
            .unwrap()
            .key
            .clone();

        cart.update_quantity(&key, 4).unwrap();
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total_amount(), Money::from_shillings(1280));

        cart.update_quantity(&key, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::ZERO);

        assert_eq!(
            cart.update_quantity(&key, 1),
            Err(CartError::LineNotFound(key.clone()))
        );
        assert!(!cart.remove(&key));
    }

    #[test]
    fn test_removing_one_of_several_lines_keeps_totals() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, 2, Customizations::new(), None).unwrap();
        let hot = cart
            .add(&latte, 3, Customizations::new(), Some("extra hot"))
            .unwrap()
            .key
            .clone();

        assert!(cart.remove(&hot));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_amount(), Money::from_shillings(640));
        assert_consistent(&cart);
    }

    #[test]
    fn test_negative_quantity_removes() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        let key = cart
            .add(&latte, 2, Customizations::new(), None)
            .unwrap()
            .key
            .clone();
        cart.update_quantity(&key, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_add_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(&item("Latte", 320), 0, Customizations::new(), None)
                .map(|_| ()),
            Err(CartError::ZeroQuantity)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_overflow_rejected() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, u32::MAX, Customizations::new(), None)
            .unwrap();
        assert_eq!(
            cart.add(&latte, 1, Customizations::new(), None).map(|_| ()),
            Err(CartError::QuantityOverflow)
        );
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_consistent(&cart);
    }

    #[test]
    fn test_overflowing_new_line_is_not_added() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, u32::MAX, Customizations::new(), None)
            .unwrap();

        let result = cart.add(&latte, 1, Customizations::new(), Some("extra hot"));
        assert_eq!(result.map(|_| ()), Err(CartError::QuantityOverflow));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), u32::MAX);
        assert_consistent(&cart);
    }

    #[test]
    fn test_overflowing_update_keeps_old_quantity() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, u32::MAX - 1, Customizations::new(), None)
            .unwrap();
        let key = cart
            .add(&latte, 1, Customizations::new(), Some("no foam"))
            .unwrap()
            .key
            .clone();

        assert_eq!(
            cart.update_quantity(&key, 2),
            Err(CartError::QuantityOverflow)
        );
        assert_eq!(cart.get(&key).unwrap().quantity, 1);
        assert_eq!(cart.total_items(), u32::MAX);
        assert_consistent(&cart);
    }

    #[test]
    fn test_invalid_selection_leaves_cart_untouched() {
        let mut cart = Cart::new();
        let result = cart.add(
            &item("Latte", 320),
            1,
            Customizations::new().with("size", "large"),
            None,
        );
        assert!(matches!(result, Err(CartError::Pricing(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&item("Latte", 320), 2, Customizations::new(), None)
            .unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_load_recomputes_totals() {
        let latte = item("Latte", 320);
        let mut cart = Cart::new();
        cart.add(&latte, 2, Customizations::new(), None).unwrap();

        let mut json: serde_json::Value = serde_json::to_value(&cart).unwrap();
        json["total_amount"] = serde_json::json!("1");
        json["items"][0]["quantity"] = serde_json::json!(5);

        let loaded: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.total_items(), 5);
        assert_eq!(loaded.total_amount(), Money::from_shillings(1600));
        assert_consistent(&loaded);
    }
}
