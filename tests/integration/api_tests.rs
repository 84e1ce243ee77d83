//! API integration tests against a running server and database.
//!
//! Expects an administrator account `admin` / `admin123` and at least one
//! book with available copies.

use std::sync::atomic::{AtomicU32, Ordering};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:5000/api";

/// Server default for `library.max_active_bookings`
const MAX_ACTIVE_BOOKINGS: usize = 5;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Short suffix keeping names unique across test runs
fn unique_suffix() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() % 1_000_000_000;
    format!("{}{}", nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Helper to get a token for the administrator
async fn get_auth_token(client: &Client) -> String {
    login(client, "admin", "admin123").await
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Sign up and log in a fresh reader account
async fn new_reader(client: &Client) -> String {
    let username = format!("reader{}", unique_suffix());

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "secret123"
        }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), 201);

    login(client, &username, "secret123").await
}

/// First book with a copy on the shelf
async fn available_book(client: &Client) -> i64 {
    let body: Value = client
        .get(format!("{}/books?available_only=true&per_page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    body["items"][0]["book_id"].as_i64().expect("No available book")
}

fn book_payload(name: &str, author: &str, copies: i32) -> Value {
    json!({
        "name": name,
        "author_name": author,
        "category": "Literary Criticism",
        "genre": "Nonfiction",
        "publish_date": "1993-11-01",
        "language": "English",
        "page_count": 566,
        "copies_available": copies,
        "rated_type": "E for Everyone"
    })
}

/// Create a book as administrator and return its id
async fn create_book(client: &Client, admin: &str, copies: i32) -> i64 {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin)
        .json(&book_payload(&format!("Test book {}", suffix), &format!("Author {}", suffix), copies))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["book_id"].as_i64().expect("No book id")
}

async fn book(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/bookings", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn wishlist(client: &Client, token: &str, book_id: i64) -> StatusCode {
    client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "admin");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_list_books_and_categories() {
    let client = Client::new();

    let body: Value = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());

    let body: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert!(body["categories"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_booking_return_cycle() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;
    let book_id = available_book(&client).await;

    let copies_before = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse response")["copies_available"]
        .as_i64()
        .unwrap();

    // Wishlist, then book: the wishlist entry disappears
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["booking_id"].as_i64().unwrap();
    assert_eq!(booking["state"], "booked");

    let status: Value = client
        .get(format!("{}/books/{}/status", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(status["action"], "return");
    assert_eq!(status["wishlisted"], false);
    assert_eq!(status["copies_available"], copies_before - 1);

    // Booking the same book twice is a conflict
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Reader requests the return but cannot approve it
    let response = client
        .post(format!("{}/bookings/{}/return-request", BASE_URL, booking_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/bookings/{}/approve-return", BASE_URL, booking_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let pending: Value = client
        .get(format!("{}/bookings/pending", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(pending["version"]
        .as_str()
        .unwrap()
        .contains(&format!("{}-true", booking_id)));

    // Approve the way the settings panel does: clear the pending flag
    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .bearer_auth(&admin)
        .json(&json!({ "pending_return": false }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["state"], "returned");

    // Returned is terminal
    let response = client
        .post(format!("{}/bookings/{}/approve-return", BASE_URL, booking_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    let transactions: Value = client
        .get(format!("{}/transactions?book_id={}", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let kinds: Vec<&str> = transactions["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["returned", "reserved"]);
}

#[tokio::test]
#[ignore]
async fn test_review_upsert_updates_rating() {
    let client = Client::new();
    let reader = new_reader(&client).await;
    let book_id = available_book(&client).await;

    for rating in [2, 5] {
        let response = client
            .post(format!("{}/reviews", BASE_URL))
            .bearer_auth(&reader)
            .json(&json!({ "book_id": book_id, "rating": rating }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    let status: Value = client
        .get(format!("{}/books/{}/status", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(status["personal_rating"], 5);
}

#[tokio::test]
#[ignore]
async fn test_wishlist_rejections() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;
    let book_id = create_book(&client, &admin, 2).await;

    assert_eq!(wishlist(&client, &reader, book_id).await, 201);
    assert_eq!(wishlist(&client, &reader, book_id).await, 409);

    assert_eq!(book(&client, &reader, book_id).await.status(), 201);

    // Holding the book rules out wishlisting it
    assert_eq!(wishlist(&client, &reader, book_id).await, 422);
    assert_eq!(wishlist(&client, &reader, i32::MAX as i64).await, 404);
}

#[tokio::test]
#[ignore]
async fn test_booking_without_copies_is_rejected() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;
    let book_id = create_book(&client, &admin, 0).await;

    let response = book(&client, &reader, book_id).await;
    assert_eq!(response.status(), 422);

    let status: Value = client
        .get(format!("{}/books/{}/status", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(status["action"], "unavailable");
    assert_eq!(status["copies_available"], 0);
}

#[tokio::test]
#[ignore]
async fn test_active_booking_limit() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;

    for _ in 0..MAX_ACTIVE_BOOKINGS {
        let book_id = create_book(&client, &admin, 1).await;
        assert_eq!(book(&client, &reader, book_id).await.status(), 201);
    }

    let extra = create_book(&client, &admin, 1).await;
    let response = book(&client, &reader, extra).await;
    assert_eq!(response.status(), 422);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("Maximum active bookings"));
}

#[tokio::test]
#[ignore]
async fn test_delete_book_with_active_booking_requires_force() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;
    let book_id = create_book(&client, &admin, 1).await;
    assert_eq!(book(&client, &reader, book_id).await.status(), 201);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .delete(format!("{}/books/{}?force=true", BASE_URL, book_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_force_delete_races_return_approval() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let reader = new_reader(&client).await;

    for _ in 0..10 {
        let book_id = create_book(&client, &admin, 1).await;
        let booking: Value = book(&client, &reader, book_id)
            .await
            .json()
            .await
            .expect("Failed to parse response");
        let booking_id = booking["booking_id"].as_i64().unwrap();

        let (approve, delete) = tokio::join!(
            client
                .post(format!("{}/bookings/{}/approve-return", BASE_URL, booking_id))
                .bearer_auth(&admin)
                .send(),
            client
                .delete(format!("{}/books/{}?force=true", BASE_URL, book_id))
                .bearer_auth(&admin)
                .send(),
        );

        let approve = approve.expect("Failed to send request").status();
        let delete = delete.expect("Failed to send request").status();
        assert!(approve == 200 || approve == 404, "approve returned {}", approve);
        assert_eq!(delete, 204);
    }
}

#[tokio::test]
#[ignore]
async fn test_concurrent_signups_with_same_username() {
    let client = Client::new();
    let username = format!("twin{}", unique_suffix());
    let signup = |email: String| {
        client
            .post(format!("{}/auth/signup", BASE_URL))
            .json(&json!({
                "username": username,
                "email": email,
                "password": "secret123"
            }))
            .send()
    };

    let (first, second) = tokio::join!(
        signup(format!("{}a@example.com", username)),
        signup(format!("{}b@example.com", username)),
    );

    let mut statuses = vec![
        first.expect("Failed to send request").status().as_u16(),
        second.expect("Failed to send request").status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_books_share_new_author() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let author = format!("Shared Author {}", unique_suffix());

    let create = |name: String| {
        client
            .post(format!("{}/books", BASE_URL))
            .bearer_auth(&admin)
            .json(&book_payload(&name, &author, 1))
            .send()
    };
    let (first, second) = tokio::join!(
        create(format!("First {}", unique_suffix())),
        create(format!("Second {}", unique_suffix())),
    );
    assert_eq!(first.expect("Failed to send request").status(), 201);
    assert_eq!(second.expect("Failed to send request").status(), 201);

    let authors: Vec<Value> = client
        .get(format!("{}/authors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let matching = authors
        .iter()
        .filter(|a| a["name"].as_str() == Some(author.as_str()))
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
#[ignore]
async fn test_search_wildcards_match_literally() {
    let client = Client::new();

    let body: Value = client
        .get(format!("{}/books?title=_&per_page=100", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    for book in body["items"].as_array().unwrap() {
        assert!(book["name"].as_str().unwrap().contains('_'));
    }
}

#[tokio::test]
#[ignore]
async fn test_huge_page_number_is_empty() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?page={}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}
