//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`cafe-cli migrate`)
//! - The menu seeded from `crates/cli/seed/menu.yaml` (`cafe-cli seed menu`)
//! - The storefront running (`cargo run -p cafe-amka-storefront`)
//!
//! Run with: `cargo test -p cafe-amka-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Local};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use cafe_amka_integration_tests::storefront_base_url;

const PASSWORD: &str = "kahawa-tamu-2026";

/// A cookie-keeping client with its own forwarded address, so each test
/// gets a separate rate limit bucket.
fn client() -> Client {
    let id = Uuid::new_v4();
    let [a, b, c, ..] = *id.as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).unwrap(),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

fn url(path: &str) -> String {
    format!("{}{path}", storefront_base_url())
}

/// Register a fresh customer; the client keeps the session cookie.
async fn signed_in_client() -> (Client, String) {
    let client = client();
    let email = format!("test-{}@example.co.ke", Uuid::new_v4());

    let resp = client
        .post(url("/auth/register"))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "password_confirm": PASSWORD,
            "first_name": "Test",
            "last_name": "Customer",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    (client, email)
}

/// First seeded menu item with no option groups.
async fn plain_item(client: &Client) -> Value {
    plain_items(client)
        .await
        .into_iter()
        .next()
        .expect("seeded menu has an item without options")
}

/// Seeded menu items with no option groups.
async fn plain_items(client: &Client) -> Vec<Value> {
    let menu: Value = client
        .get(url("/api/menu"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    menu["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|item| item["options"].as_array().is_none_or(Vec::is_empty))
        .cloned()
        .collect()
}

async fn add_to_cart(client: &Client, item: &Value, quantity: u32) -> Value {
    let resp = client
        .post(url("/api/cart/items"))
        .json(&json!({
            "menu_item_id": item["id"],
            "quantity": quantity,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_register_login_logout() {
    let (client, email) = signed_in_client().await;

    let me: Value = client
        .get(url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], email.as_str());

    let resp = client.post(url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(url("/auth/login"))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(url("/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_duplicate_registration_conflicts() {
    let (_, email) = signed_in_client().await;

    let resp = client()
        .post(url("/auth/register"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_anonymous_cart_survives_sign_in() {
    let client = client();
    let item = plain_item(&client).await;

    let cart = add_to_cart(&client, &item, 2).await;
    assert_eq!(cart["total_items"], 2);

    let email = format!("test-{}@example.co.ke", Uuid::new_v4());
    let resp = client
        .post(url("/auth/register"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let count: Value = client
        .get(url("/api/cart/count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_pickup_checkout_places_order_and_clears_cart() {
    let (client, _) = signed_in_client().await;
    let item = plain_item(&client).await;
    add_to_cart(&client, &item, 1).await;

    let resp = client
        .post(url("/api/checkout"))
        .json(&json!({
            "order_type": "pickup",
            "payment_method": "paylater",
            "terms_accepted": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    let order_id = order["id"].as_str().unwrap().to_owned();

    let count: Value = client
        .get(url("/api/cart/count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 0);

    let history: Value = client
        .get(url("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        history
            .as_array()
            .unwrap()
            .iter()
            .any(|o| o["id"] == order_id.as_str())
    );

    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_order_lines_keep_cart_order() {
    let (client, _) = signed_in_client().await;
    let mut items = plain_items(&client).await;
    assert!(items.len() >= 2, "seeded menu has two items without options");
    items.sort_by(|a, b| b["name"].as_str().cmp(&a["name"].as_str()));
    let (later, earlier) = (items.first().unwrap(), items.last().unwrap());
    assert_ne!(later["name"], earlier["name"]);

    // Reverse alphabetical on purpose
    add_to_cart(&client, later, 1).await;
    add_to_cart(&client, earlier, 2).await;

    let resp = client
        .post(url("/api/checkout"))
        .json(&json!({
            "order_type": "pickup",
            "payment_method": "paylater",
            "terms_accepted": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_owned();

    let detail: Value = client
        .get(url(&format!("/api/orders/{order_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&Value> = detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| &line["name"])
        .collect();
    assert_eq!(names, [&later["name"], &earlier["name"]]);
}

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_wallet_checkout_needs_funds() {
    let (client, _) = signed_in_client().await;
    let item = plain_item(&client).await;
    add_to_cart(&client, &item, 1).await;

    let checkout = json!({
        "order_type": "dine-in",
        "payment_method": "wallet",
        "terms_accepted": true,
    });

    let resp = client
        .post(url("/api/checkout"))
        .json(&checkout)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["issues"][0]["code"], "insufficient_wallet_balance");

    let resp = client
        .post(url("/api/wallet/top-up"))
        .json(&json!({ "amount": "2000", "payment_method": "mpesa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(url("/api/checkout"))
        .json(&checkout)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// ============================================================================
// Wallet and loyalty
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_top_up_bonus_and_redemption() {
    let (client, _) = signed_in_client().await;

    let wallet: Value = client
        .get(url("/api/wallet"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wallet["points"], 0);
    assert_eq!(wallet["tier"]["tier"], "bronze");

    let resp = client
        .post(url("/api/wallet/top-up"))
        .json(&json!({ "amount": "0", "payment_method": "mpesa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let wallet: Value = client
        .post(url("/api/wallet/top-up"))
        .json(&json!({ "amount": "1500", "payment_method": "card" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wallet["points"], 50);

    // 50 bonus points do not cover a free coffee
    let resp = client
        .post(url("/api/wallet/redeem"))
        .json(&json!({ "reward": "free-coffee" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let ledger: Value = client
        .get(url("/api/wallet/transactions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!ledger.as_array().unwrap().is_empty());

    let loyalty: Value = client
        .get(url("/api/loyalty"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loyalty["totalPoints"], 50);
    assert_eq!(loyalty["nextReward"]["reward"], "free-coffee");
}

// ============================================================================
// Reservations and profile
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_book_and_cancel_table() {
    let (client, email) = signed_in_client().await;
    let date = (Local::now().date_naive() + Duration::days(30)).to_string();

    let availability: Value = client
        .get(url(&format!(
            "/api/reservations/availability?date={date}&guests=2&seating_area=quiet"
        )))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slot = availability["available_slots"][0]
        .as_str()
        .expect("an open slot a month out")
        .to_owned();

    let resp = client
        .post(url("/api/reservations"))
        .json(&json!({
            "reservation_date": date,
            "reservation_time": slot,
            "guests": 2,
            "seating_area": "quiet",
            "customer_name": "Test Customer",
            "customer_phone": "0712 345 678",
            "customer_email": email,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booking: Value = resp.json().await.unwrap();
    assert_eq!(booking["customer_phone"], "0712345678");
    let id = booking["id"].as_str().unwrap().to_owned();

    let resp = client
        .post(url(&format!("/api/reservations/{id}/cancel")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    let resp = client
        .post(url("/api/reservations"))
        .json(&json!({
            "reservation_date": date,
            "reservation_time": slot,
            "guests": 12,
            "customer_name": "Test Customer",
            "customer_phone": "0712 345 678",
            "customer_email": email,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront with migrated and seeded database"]
async fn test_profile_update() {
    let (client, _) = signed_in_client().await;

    let resp = client
        .put(url("/api/profile"))
        .json(&json!({
            "first_name": "  Amani ",
            "phone": "+254 733-111-222",
            "dietary_preferences": ["vegetarian"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let profile: Value = resp.json().await.unwrap();
    assert_eq!(profile["first_name"], "Amani");
    assert_eq!(profile["phone"], "+254733111222");
    assert_eq!(profile["last_name"], "Customer");
    assert_eq!(profile["dietary_preferences"], json!(["vegetarian"]));

    let resp = client
        .put(url("/api/profile"))
        .json(&json!({ "phone": "not a phone" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
