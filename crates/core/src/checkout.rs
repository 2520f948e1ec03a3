//! Checkout gate.
//!
//! Before an order is submitted the gate looks at the whole checkout state
//! (who is buying, what is in the cart, how it will be fulfilled and paid
//! for) and reports every problem at once so the customer can fix them in a
//! single pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::summary::{OrderSummary, PricingPolicy};
use crate::types::{Money, OrderType, PaymentMethod, Phone};

/// How the rider should get in touch on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactPreference {
    #[default]
    Call,
    Text,
    Both,
}

/// When a delivery should arrive.
///
/// On the wire this is a `delivery_time` of `"asap"` or `"scheduled"` plus a
/// `scheduled_time` for the latter. A missing `delivery_time` means ASAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "TimingFields", into = "TimingFields")]
pub enum DeliveryTiming {
    #[default]
    Asap,
    Scheduled { scheduled_time: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TimingKind {
    #[default]
    Asap,
    Scheduled,
}

#[derive(Serialize, Deserialize)]
struct TimingFields {
    #[serde(default)]
    delivery_time: TimingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheduled_time: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug)]
#[error("a scheduled delivery needs a scheduled_time")]
pub struct MissingScheduledTime;

impl TryFrom<TimingFields> for DeliveryTiming {
    type Error = MissingScheduledTime;

    fn try_from(fields: TimingFields) -> Result<Self, Self::Error> {
        match fields.delivery_time {
            TimingKind::Asap => Ok(Self::Asap),
            TimingKind::Scheduled => fields
                .scheduled_time
                .map(|scheduled_time| Self::Scheduled { scheduled_time })
                .ok_or(MissingScheduledTime),
        }
    }
}

impl From<DeliveryTiming> for TimingFields {
    fn from(timing: DeliveryTiming) -> Self {
        match timing {
            DeliveryTiming::Asap => Self {
                delivery_time: TimingKind::Asap,
                scheduled_time: None,
            },
            DeliveryTiming::Scheduled { scheduled_time } => Self {
                delivery_time: TimingKind::Scheduled,
                scheduled_time: Some(scheduled_time),
            },
        }
    }
}

/// Where and how to deliver an order.
///
/// Held in the session while the customer checks out and copied onto the
/// order once it is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryDetails {
    pub address: String,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub delivery_instructions: String,
    pub phone: String,
    #[serde(flatten)]
    pub timing: DeliveryTiming,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    #[serde(default)]
    pub leave_at_door: bool,
}

/// A reason checkout cannot proceed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CheckoutIssue {
    #[error("please sign in to place an order")]
    NotAuthenticated,
    #[error("your cart is empty")]
    EmptyCart,
    #[error("please accept the terms and conditions")]
    TermsNotAccepted,
    #[error("please add delivery details")]
    MissingDeliveryDetails,
    #[error("delivery address is required")]
    MissingDeliveryAddress,
    #[error("a contact phone number is required")]
    MissingContactPhone,
    #[error("contact phone number is not valid")]
    InvalidContactPhone,
    #[error("scheduled delivery time must be in the future")]
    ScheduledTimeInPast,
    #[error("wallet balance {available} is less than the order total {required}")]
    InsufficientWalletBalance { required: Money, available: Money },
}

/// Everything the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    pub cart: &'a Cart,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery: Option<&'a DeliveryDetails>,
    pub authenticated: bool,
    pub terms_accepted: bool,
    /// Current wallet balance, when known.
    pub wallet_balance: Option<Money>,
    pub now: DateTime<Utc>,
}

/// A checkout that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPlan {
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub summary: OrderSummary,
    /// Present for delivery orders only.
    pub delivery: Option<DeliveryDetails>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutGate {
    policy: PricingPolicy,
}

impl CheckoutGate {
    #[must_use]
    pub const fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Check the request and build the plan.
    ///
    /// # Errors
    ///
    /// Returns every [`CheckoutIssue`] found, in a stable order.
    pub fn evaluate(&self, request: &CheckoutRequest<'_>) -> Result<CheckoutPlan, Vec<CheckoutIssue>> {
        let mut issues = Vec::new();

        if !request.authenticated {
            issues.push(CheckoutIssue::NotAuthenticated);
        }
        if request.cart.is_empty() {
            issues.push(CheckoutIssue::EmptyCart);
        }
        if !request.terms_accepted {
            issues.push(CheckoutIssue::TermsNotAccepted);
        }

        let delivery = if request.order_type.requires_delivery_details() {
            match request.delivery {
                Some(details) => {
                    check_delivery(details, request.now, &mut issues);
                    Some(details.clone())
                }
                None => {
                    issues.push(CheckoutIssue::MissingDeliveryDetails);
                    None
                }
            }
        } else {
            None
        };

        let summary = OrderSummary::calculate(request.cart, request.order_type, &self.policy);

        if request.authenticated && request.payment_method.debits_wallet() {
            let available = request.wallet_balance.unwrap_or(Money::ZERO);
            if available < summary.total {
                issues.push(CheckoutIssue::InsufficientWalletBalance {
                    required: summary.total,
                    available,
                });
            }
        }

        if issues.is_empty() {
            Ok(CheckoutPlan {
                order_type: request.order_type,
                payment_method: request.payment_method,
                summary,
                delivery,
            })
        } else {
            Err(issues)
        }
    }

    /// Whether the order button should be enabled.
    #[must_use]
    pub fn can_submit(&self, request: &CheckoutRequest<'_>) -> bool {
        self.evaluate(request).is_ok()
    }
}

fn check_delivery(details: &DeliveryDetails, now: DateTime<Utc>, issues: &mut Vec<CheckoutIssue>) {
    if details.address.trim().is_empty() {
        issues.push(CheckoutIssue::MissingDeliveryAddress);
    }

    if details.phone.trim().is_empty() {
        issues.push(CheckoutIssue::MissingContactPhone);
    } else if Phone::parse(&details.phone).is_err() {
        issues.push(CheckoutIssue::InvalidContactPhone);
    }

    if let DeliveryTiming::Scheduled { scheduled_time } = details.timing {
        if scheduled_time <= now {
            issues.push(CheckoutIssue::ScheduledTimeInPast);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::menu::MenuItem;
    use crate::pricing::Customizations;
    use crate::types::MenuItemId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
    }

    fn cart_with_total(shillings: i64) -> Cart {
        let item = MenuItem {
            id: MenuItemId::generate(),
            category_id: None,
            category_name: None,
            name: "Chapati wrap".to_owned(),
            description: None,
            price: Money::from_shillings(shillings),
            image_url: None,
            options: Vec::new(),
        };
        let mut cart = Cart::new();
        cart.add(&item, 1, Customizations::new(), None).unwrap();
        cart
    }

    fn details() -> DeliveryDetails {
        DeliveryDetails {
            address: "Ngong Road, Kilimani".to_owned(),
            phone: "+254712345678".to_owned(),
            ..DeliveryDetails::default()
        }
    }

    fn request<'a>(cart: &'a Cart, delivery: Option<&'a DeliveryDetails>) -> CheckoutRequest<'a> {
        CheckoutRequest {
            cart,
            order_type: OrderType::Delivery,
            payment_method: PaymentMethod::Mpesa,
            delivery,
            authenticated: true,
            terms_accepted: true,
            wallet_balance: None,
            now: now(),
        }
    }

    #[test]
    fn test_valid_delivery_checkout() {
        let cart = cart_with_total(800);
        let details = details();
        let plan = CheckoutGate::default()
            .evaluate(&request(&cart, Some(&details)))
            .unwrap();
        assert_eq!(plan.summary.total, Money::from_shillings(1000));
        assert_eq!(plan.delivery, Some(details));
    }

    #[test]
    fn test_collects_every_issue() {
        let cart = Cart::new();
        let req = CheckoutRequest {
            authenticated: false,
            terms_accepted: false,
            ..request(&cart, None)
        };
        let issues = CheckoutGate::default().evaluate(&req).unwrap_err();
        assert_eq!(
            issues,
            vec![
                CheckoutIssue::NotAuthenticated,
                CheckoutIssue::EmptyCart,
                CheckoutIssue::TermsNotAccepted,
                CheckoutIssue::MissingDeliveryDetails,
            ]
        );
    }

    #[test]
    fn test_blank_delivery_fields() {
        let cart = cart_with_total(500);
        let blank = DeliveryDetails {
            address: "  ".to_owned(),
            phone: String::new(),
            timing: DeliveryTiming::Scheduled {
                scheduled_time: now() - chrono::Duration::minutes(5),
            },
            ..DeliveryDetails::default()
        };
        let issues = CheckoutGate::default()
            .evaluate(&request(&cart, Some(&blank)))
            .unwrap_err();
        assert_eq!(
            issues,
            vec![
                CheckoutIssue::MissingDeliveryAddress,
                CheckoutIssue::MissingContactPhone,
                CheckoutIssue::ScheduledTimeInPast,
            ]
        );
    }

    #[test]
    fn test_pickup_ignores_delivery_details() {
        let cart = cart_with_total(500);
        let blank = DeliveryDetails::default();
        let req = CheckoutRequest {
            order_type: OrderType::Pickup,
            ..request(&cart, Some(&blank))
        };
        let plan = CheckoutGate::default().evaluate(&req).unwrap();
        assert!(plan.delivery.is_none());
        assert_eq!(plan.summary.delivery_fee, Money::ZERO);
    }

    #[test]
    fn test_wallet_needs_enough_balance() {
        let cart = cart_with_total(500);
        let req = CheckoutRequest {
            order_type: OrderType::DineIn,
            payment_method: PaymentMethod::Wallet,
            wallet_balance: Some(Money::from_shillings(549)),
            ..request(&cart, None)
        };
        let gate = CheckoutGate::default();
        assert_eq!(
            gate.evaluate(&req).unwrap_err(),
            vec![CheckoutIssue::InsufficientWalletBalance {
                required: Money::from_shillings(550),
                available: Money::from_shillings(549),
            }]
        );

        let enough = CheckoutRequest {
            wallet_balance: Some(Money::from_shillings(550)),
            ..req
        };
        assert!(gate.can_submit(&enough));
    }

    #[test]
    fn test_delivery_details_wire_shape() {
        let json = r#"{
            "address": "Ngong Road",
            "phone": "0712345678",
            "delivery_time": "scheduled",
            "scheduled_time": "2026-03-14T12:30:00Z",
            "contact_preference": "text",
            "leave_at_door": true
        }"#;
        let details: DeliveryDetails = serde_json::from_str(json).unwrap();
        assert!(matches!(details.timing, DeliveryTiming::Scheduled { .. }));
        assert_eq!(details.contact_preference, ContactPreference::Text);
        assert!(details.leave_at_door);

        let asap: DeliveryDetails = serde_json::from_str(
            r#"{ "address": "Ngong Road", "phone": "0712345678", "delivery_time": "asap" }"#,
        )
        .unwrap();
        assert_eq!(asap.timing, DeliveryTiming::Asap);
    }

    #[test]
    fn test_delivery_time_defaults_to_asap() {
        let details: DeliveryDetails =
            serde_json::from_str(r#"{ "address": "Ngong Road", "phone": "0712345678" }"#)
                .unwrap();
        assert_eq!(details.timing, DeliveryTiming::Asap);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["delivery_time"], "asap");
        assert!(json.get("scheduled_time").is_none());
    }

    #[test]
    fn test_scheduled_delivery_requires_time() {
        let result = serde_json::from_str::<DeliveryDetails>(
            r#"{ "address": "Ngong Road", "phone": "0712345678", "delivery_time": "scheduled" }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_issue_serializes_with_code() {
        let json = serde_json::to_value(CheckoutIssue::EmptyCart).unwrap();
        assert_eq!(json["code"], "empty_cart");
    }
}
