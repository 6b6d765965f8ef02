//! End-to-end checkout flow over HTTP: seed a product, fill a cart, quote
//! both payment methods, place orders on the cash and online paths, and play
//! the gateway's part on the redirect callback.
//!
//! Runs fully in-process against the local (in-memory) repository; no
//! external infrastructure is required.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use art_hub_checkout::application::checkout_service::CheckoutSettings;
use art_hub_checkout::build_server;
use art_hub_checkout::gateway::{CallbackParams, HmacSha256Signer, PaymentGateway};
use art_hub_checkout::infrastructure::local::LocalStore;
use art_hub_checkout::AppState;

const GATEWAY_SALT: &str = "integration-test-salt";

fn free_port() -> u16 {
    // Bind to port 0 to let the OS assign a free port, then release it.
    // There is a small TOCTOU window, but it is acceptable for test usage.
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind failed")
        .local_addr()
        .expect("addr failed")
        .port()
}

fn gateway() -> Arc<PaymentGateway> {
    Arc::new(PaymentGateway::new(
        Arc::new(HmacSha256Signer::new(GATEWAY_SALT)),
        "merchant-key",
        "https://gateway.test/checkout",
    ))
}

/// Start the service on a free port and return its base URL plus the gateway
/// handle used to sign callbacks the way the real gateway would.
async fn spawn_app() -> (String, Arc<PaymentGateway>) {
    let store = Arc::new(LocalStore::in_memory());
    let gateway = gateway();

    let state = AppState::new(
        store.clone(),
        store.clone(),
        store,
        gateway.clone(),
        CheckoutSettings {
            online_discount_percent: 10,
            callback_url: "https://shop.test/checkout/callback".to_string(),
        },
    );

    let port = free_port();
    let server = build_server(state, "127.0.0.1", port).expect("Failed to bind server");
    tokio::spawn(server);

    let base = format!("http://127.0.0.1:{}", port);

    // Wait for the server to accept connections.
    let client = Client::new();
    for _ in 0..50 {
        if client.get(format!("{}/products", base)).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    (base, gateway)
}

async fn seed_product(client: &Client, base: &str, price: &str, stock: i32) -> Uuid {
    let resp = client
        .post(format!("{}/products", base))
        .json(&json!({
            "name": "Campus mural print",
            "price": price,
            "image_url": "https://img.test/mural.jpg",
            "stock": stock
        }))
        .send()
        .await
        .expect("POST /products");
    assert_eq!(resp.status(), 201);

    let body: Value = resp.json().await.expect("product json");
    body["id"].as_str().unwrap().parse().expect("product uuid")
}

async fn add_to_cart(client: &Client, base: &str, shopper: Uuid, product: Uuid, qty: i32) -> Value {
    let resp = client
        .post(format!("{}/cart/{}/items", base, shopper))
        .json(&json!({ "product_id": product, "quantity": qty }))
        .send()
        .await
        .expect("POST cart item");
    assert_eq!(resp.status(), 200);
    resp.json().await.expect("cart json")
}

fn customer() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "5550100"
    })
}

fn signed_callback_query(
    gateway: &PaymentGateway,
    order_id: Uuid,
    status: &str,
    txn_id: Option<&str>,
) -> Vec<(String, String)> {
    let mut cb = CallbackParams {
        status: status.to_string(),
        order_id,
        txn_id: txn_id.map(str::to_string),
        checksum: String::new(),
    };
    cb.checksum = gateway.sign_callback(&cb);

    let mut query = vec![
        ("status".to_string(), cb.status),
        ("orderId".to_string(), order_id.to_string()),
        ("checksum".to_string(), cb.checksum),
    ];
    if let Some(txn) = txn_id {
        query.push(("txnId".to_string(), txn.to_string()));
    }
    query
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_lines() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "12.00", 10).await;
    let shopper = Uuid::new_v4();

    add_to_cart(&client, &base, shopper, product, 1).await;
    let cart = add_to_cart(&client, &base, shopper, product, 1).await;

    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(cart["subtotal"], "24.00");
}

#[tokio::test]
async fn quote_discounts_online_but_not_cash() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "1000.00", 5).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 2).await;

    let online: Value = client
        .get(format!("{}/checkout/{}/quote?method=online", base, shopper))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(online["subtotal"], "2000.00");
    assert_eq!(online["discount"], "200.00");
    assert_eq!(online["total"], "1800.00");

    let cash: Value = client
        .get(format!(
            "{}/checkout/{}/quote?method=cash_on_delivery",
            base, shopper
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cash["discount"], "0");
    assert_eq!(cash["total"], "2000.00");

    let bad = client
        .get(format!("{}/checkout/{}/quote?method=wire", base, shopper))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
}

#[tokio::test]
async fn cash_checkout_places_pending_order_and_empties_cart() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "25.00", 10).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 2).await;

    let resp = client
        .post(format!("{}/checkout/{}/cash", base, shopper))
        .json(&customer())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_method"], "cash_on_delivery");
    assert_eq!(order["total"], "50.00");

    let cart: Value = client
        .get(format!("{}/cart/{}", base, shopper))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cart["lines"].as_array().unwrap().is_empty());

    // Stock was decremented by the ordered quantity.
    let stored: Value = client
        .get(format!("{}/products/{}", base, product))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["stock"], 8);
}

#[tokio::test]
async fn online_checkout_returns_signed_redirect_and_pending_order() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "1000.00", 5).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 2).await;

    let resp = client
        .post(format!("{}/checkout/{}/online", base, shopper))
        .json(&customer())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["redirect_url"], "https://gateway.test/checkout");
    assert_eq!(body["fields"]["amount"], "1800.00");
    assert!(body["fields"]["checksum"].as_str().is_some());

    // The order is in the ledger, pending, before any gateway response.
    let order_id = body["order"]["id"].as_str().unwrap();
    let stored: Value = client
        .get(format!("{}/orders/{}", base, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["status"], "pending");
}

#[tokio::test]
async fn verified_success_callback_marks_order_paid() {
    let (base, gateway) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "100.00", 5).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 1).await;

    let body: Value = client
        .post(format!("{}/checkout/{}/online", base, shopper))
        .json(&customer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id: Uuid = body["order"]["id"].as_str().unwrap().parse().unwrap();

    let query = signed_callback_query(&gateway, order_id, "success", Some("TXN-314"));
    let resp = client
        .get(format!("{}/checkout/callback", base))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "paid");
    assert_eq!(order["txn_id"], "TXN-314");
}

#[tokio::test]
async fn tampered_callback_is_rejected_and_order_stays_pending() {
    let (base, gateway) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "100.00", 5).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 1).await;

    let body: Value = client
        .post(format!("{}/checkout/{}/online", base, shopper))
        .json(&customer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id: Uuid = body["order"]["id"].as_str().unwrap().parse().unwrap();

    // Sign a failure, then flip the status on the query string.
    let mut query = signed_callback_query(&gateway, order_id, "failure", None);
    for pair in &mut query {
        if pair.0 == "status" {
            pair.1 = "success".to_string();
        }
    }
    query.push(("txnId".to_string(), "TXN-EVIL".to_string()));

    let resp = client
        .get(format!("{}/checkout/callback", base))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let stored: Value = client
        .get(format!("{}/orders/{}", base, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["status"], "pending");
    assert!(stored["txn_id"].is_null());
}

#[tokio::test]
async fn failure_callback_marks_order_failed() {
    let (base, gateway) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "100.00", 5).await;
    let shopper = Uuid::new_v4();
    add_to_cart(&client, &base, shopper, product, 1).await;

    let body: Value = client
        .post(format!("{}/checkout/{}/online", base, shopper))
        .json(&customer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id: Uuid = body["order"]["id"].as_str().unwrap().parse().unwrap();

    let query = signed_callback_query(&gateway, order_id, "failure", None);
    let resp = client
        .get(format!("{}/checkout/callback", base))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "failed");
    assert!(order["txn_id"].is_null());
}

#[tokio::test]
async fn relay_endpoint_signs_an_order_summary() {
    let (base, _) = spawn_app().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/api/payment/initiate", base))
        .json(&json!({
            "orderId": Uuid::new_v4(),
            "amount": "1800.00",
            "customerId": "shopper-7",
            "callbackUrl": "https://shop.test/checkout/callback",
            "email": "ada@example.com",
            "phone": "5550100"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fields"]["amount"], "1800.00");
    assert!(body["fields"]["checksum"].as_str().is_some());

    let bad = client
        .post(format!("{}/api/payment/initiate", base))
        .json(&json!({
            "orderId": Uuid::new_v4(),
            "amount": "not-a-number",
            "customerId": "shopper-7",
            "callbackUrl": "https://shop.test/checkout/callback",
            "email": "ada@example.com",
            "phone": "5550100"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
}

#[tokio::test]
async fn cart_clamps_to_remaining_stock_after_another_order() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "10.00", 3).await;

    // First shopper has 3 in the cart; stock then drops to 1 because a
    // second shopper checks out 2.
    let first = Uuid::new_v4();
    add_to_cart(&client, &base, first, product, 3).await;

    let second = Uuid::new_v4();
    add_to_cart(&client, &base, second, product, 2).await;
    let resp = client
        .post(format!("{}/checkout/{}/cash", base, second))
        .json(&customer())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let cart: Value = client
        .get(format!("{}/cart/{}", base, first))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn admin_lists_orders_and_overrides_status() {
    let (base, _) = spawn_app().await;
    let client = Client::new();
    let product = seed_product(&client, &base, "20.00", 10).await;

    for _ in 0..3 {
        let shopper = Uuid::new_v4();
        add_to_cart(&client, &base, shopper, product, 1).await;
        let resp = client
            .post(format!("{}/checkout/{}/cash", base, shopper))
            .json(&customer())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let page: Value = client
        .get(format!("{}/orders?page=1&limit=2", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let order_id = page["items"][0]["id"].as_str().unwrap();
    let resp = client
        .put(format!("{}/orders/{}/status", base, order_id))
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["status"], "delivered");

    let resp = client
        .put(format!("{}/orders/{}/status", base, order_id))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .put(format!("{}/orders/{}/status", base, Uuid::new_v4()))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn checkout_with_empty_cart_is_a_validation_error() {
    let (base, _) = spawn_app().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/checkout/{}/cash", base, Uuid::new_v4()))
        .json(&customer())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
