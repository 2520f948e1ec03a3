//! Customization selection and price calculation.
//!
//! A line's unit price is the menu item's base price plus the surcharge of
//! every chosen option. The line total is unit price × quantity. All sums use
//! checked decimal arithmetic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::menu::{MenuItem, SelectionKind};
use crate::types::Money;

/// Errors raised while validating a customization selection or pricing a line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("unknown option group: {0}")]
    UnknownGroup(String),
    #[error("unknown choice {choice} in option group {group}")]
    UnknownChoice { group: String, choice: String },
    #[error("option group {0} accepts a single choice")]
    TooManyChoices(String),
    #[error("option group {0} is required")]
    MissingRequired(String),
    #[error("price overflow")]
    Overflow,
}

/// Chosen options keyed by option-group id.
///
/// Keys and values are kept sorted and empty groups are dropped, so two
/// selections that contain the same choices always serialize to the same
/// JSON no matter what order the client sent them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeSet<String>>")]
pub struct Customizations(BTreeMap<String, BTreeSet<String>>);

impl Customizations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a choice to a group, builder-style.
    #[must_use]
    pub fn with(mut self, group: impl Into<String>, choice: impl Into<String>) -> Self {
        self.0.entry(group.into()).or_default().insert(choice.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Chosen choice ids for a group.
    pub fn choices(&self, group: &str) -> impl Iterator<Item = &str> {
        self.0.get(group).into_iter().flatten().map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical JSON form, used in cart line identity.
    #[must_use]
    pub fn signature(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for Customizations {
    fn from(mut map: BTreeMap<String, BTreeSet<String>>) -> Self {
        map.retain(|_, choices| !choices.is_empty());
        Self(map)
    }
}

/// A resolved choice with the names and surcharge needed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub group_id: String,
    pub group_name: String,
    pub choice_id: String,
    pub choice_name: String,
    pub price: Money,
}

/// Validate `customizations` against the item's option groups.
///
/// Returns the chosen options in menu order.
///
/// # Errors
///
/// Returns a [`PricingError`] if a group or choice does not exist on the item,
/// a single-choice group has more than one choice, or a required group has
/// none.
pub fn resolve_selection(
    item: &MenuItem,
    customizations: &Customizations,
) -> Result<Vec<SelectedOption>, PricingError> {
    if let Some((unknown, _)) = customizations
        .groups()
        .find(|(group, _)| item.option_group(group).is_none())
    {
        return Err(PricingError::UnknownGroup(unknown.to_owned()));
    }
    if !item.is_customizable() {
        return Ok(Vec::new());
    }

    let mut selected = Vec::new();
    for group in &item.options {
        let chosen: Vec<&str> = customizations.choices(&group.id).collect();

        if group.required && chosen.is_empty() {
            return Err(PricingError::MissingRequired(group.id.clone()));
        }
        if group.kind == SelectionKind::Single && chosen.len() > 1 {
            return Err(PricingError::TooManyChoices(group.id.clone()));
        }

        for choice_id in chosen {
            let choice = group
                .choice(choice_id)
                .ok_or_else(|| PricingError::UnknownChoice {
                    group: group.id.clone(),
                    choice: choice_id.to_owned(),
                })?;
            selected.push(SelectedOption {
                group_id: group.id.clone(),
                group_name: group.name.clone(),
                choice_id: choice.id.clone(),
                choice_name: choice.name.clone(),
                price: choice.price,
            });
        }
    }

    Ok(selected)
}

/// Base price plus every surcharge.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the sum does not fit.
pub fn unit_price(item: &MenuItem, selection: &[SelectedOption]) -> Result<Money, PricingError> {
    selection.iter().try_fold(item.price, |acc, option| {
        acc.checked_add(option.price).ok_or(PricingError::Overflow)
    })
}

/// # Errors
///
/// Returns [`PricingError::Overflow`] if the product does not fit.
pub fn line_total(unit: Money, quantity: u32) -> Result<Money, PricingError> {
    unit.checked_times(quantity).ok_or(PricingError::Overflow)
}

/// Sum of line totals.
pub fn aggregate<I>(line_totals: I) -> Money
where
    I: IntoIterator<Item = Money>,
{
    line_totals.into_iter().sum()
}
