//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use wishreg_store_sqlite::{FsBlobStore, SqliteStore};

use crate::app;

struct Harness {
  app:  Router,
  _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
  let dir = tempfile::tempdir().unwrap();
  let store = SqliteStore::open_in_memory().await.unwrap();
  let blobs = FsBlobStore::new(dir.path(), "http://localhost:8080/blobs");
  Harness { app: app(Arc::new(store), Arc::new(blobs), dir.path()), _dir: dir }
}

impl Harness {
  async fn call(
    &self,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(body) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };

    let resp = self.app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
      })
    };
    (status, value)
  }

  /// Sign up and sign in; returns `(user_id, token)`.
  async fn user(&self, email: &str, name: &str) -> (String, String) {
    let (status, _) = self
      .call(
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": email, "password": "secret123", "full_name": name })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, session) = self
      .call(
        Method::POST,
        "/api/auth/signin",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
      )
      .await;
    assert_eq!(status, StatusCode::OK);
    (
      session["identity"]["id"].as_str().unwrap().to_owned(),
      session["token"].as_str().unwrap().to_owned(),
    )
  }
}

#[tokio::test]
async fn health_is_open() {
  let h = harness().await;
  let (status, body) = h.call(Method::GET, "/health", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn routes_require_a_session() {
  let h = harness().await;
  let (status, body) = h.call(Method::GET, "/api/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());

  let (status, _) = h.call(Method::GET, "/api/me", Some("not-a-token"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_errors_map_to_statuses() {
  let h = harness().await;
  h.user("ada@example.com", "Ada").await;

  let (status, _) = h
    .call(
      Method::POST,
      "/api/auth/signup",
      None,
      Some(json!({ "email": "ADA@example.com", "password": "secret123" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = h
    .call(
      Method::POST,
      "/api/auth/signin",
      None,
      Some(json!({ "email": "ada@example.com", "password": "wrong-one" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_round_trip_and_signout() {
  let h = harness().await;
  let (id, token) = h.user("bo@example.com", "Bo").await;

  let (status, me) = h.call(Method::GET, "/api/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["id"], Value::String(id));
  assert_eq!(me["display_name"], "Bo");
  assert_eq!(me["username"], "bo");

  let (status, saved) = h
    .call(
      Method::PUT,
      "/api/me",
      Some(&token),
      Some(json!({ "full_name": "Bo Peep", "birthday": "1990-03-04" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(saved["profile"]["display_name"], "Bo Peep");
  assert_eq!(saved["profile"]["birthday"], "1990-03-04");
  assert!(saved["group_join"].is_null());

  let (status, _) = h.call(Method::POST, "/api/auth/signout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = h.call(Method::GET, "/api/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gift_flow_with_reservation_conflict() {
  let h = harness().await;
  let (a_id, a) = h.user("a@example.com", "A").await;
  let (b_id, b) = h.user("b@example.com", "B").await;
  let (_c_id, c) = h.user("c@example.com", "C").await;

  let (status, _) =
    h.call(Method::POST, &format!("/api/people/{a_id}/follow"), Some(&b), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, gift) = h
    .call(
      Method::POST,
      "/api/gifts",
      Some(&a),
      Some(json!({ "name": "Keyboard", "price": "150,000", "currency": "NGN" })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(gift["price"], "150000");
  let gift_id = gift["id"].as_str().unwrap().to_owned();

  // B can see A's list; C cannot.
  let list_uri = format!("/api/lists/{a_id}/gifts");
  let (status, cards) = h.call(Method::GET, &list_uri, Some(&b), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(cards[0]["price_label"], "₦150,000");
  assert_eq!(cards[0]["reservation"]["state"], "free");
  let (status, _) = h.call(Method::GET, &list_uri, Some(&c), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Nor can C reserve from a list it cannot see.
  let reservation_uri = format!("/api/gifts/{gift_id}/reservation");
  let (status, _) = h.call(Method::POST, &reservation_uri, Some(&c), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = h.call(Method::POST, &reservation_uri, Some(&b), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "outcome": "reserved" }));

  let (status, _) =
    h.call(Method::POST, &format!("/api/people/{a_id}/follow"), Some(&c), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = h.call(Method::POST, &reservation_uri, Some(&c), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body, json!({ "outcome": "race_lost" }));

  // The owner sees no reservation details.
  let (status, card) =
    h.call(Method::GET, &format!("/api/gifts/{gift_id}"), Some(&a), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(card["role"], "owner");
  assert!(card["reservation"].is_null());
  assert_eq!(card["gift"]["reserved_by"], Value::String(b_id));

  let (status, _) = h
    .call(
      Method::PUT,
      &format!("/api/gifts/{gift_id}"),
      Some(&b),
      Some(json!({ "name": "Mine now" })),
    )
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = h
    .call(Method::POST, &format!("{reservation_uri}/toggle"), Some(&b), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "released");

  let (status, _) =
    h.call(Method::DELETE, &format!("/api/gifts/{gift_id}"), Some(&a), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) =
    h.call(Method::GET, &format!("/api/gifts/{gift_id}"), Some(&a), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn groups_share_visibility() {
  let h = harness().await;
  let (a_id, a) = h.user("a@example.com", "A").await;
  let (_b_id, b) = h.user("b@example.com", "B").await;

  let (status, group) =
    h.call(Method::POST, "/api/groups", Some(&a), Some(json!({ "name": "Family" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let code = group["code"].as_str().unwrap().to_lowercase();

  let (status, joined) = h
    .call(Method::POST, "/api/groups/join", Some(&b), Some(json!({ "code": format!(" {code} ") })))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(joined["id"], group["id"]);

  let (status, _) = h
    .call(Method::POST, "/api/groups/join", Some(&b), Some(json!({ "code": "NOPE00" })))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, visible) = h.call(Method::GET, "/api/people/visible", Some(&b), None).await;
  assert_eq!(visible[0]["id"], Value::String(a_id.clone()));
  let (status, _) = h.call(Method::GET, &format!("/api/lists/{a_id}/gifts"), Some(&b), None).await;
  assert_eq!(status, StatusCode::OK);

  let (_, sidebar) = h.call(Method::GET, "/api/groups", Some(&a), None).await;
  assert_eq!(sidebar[0]["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn uploaded_images_are_served() {
  let h = harness().await;
  let (_id, a) = h.user("a@example.com", "A").await;

  let (status, gift) = h
    .call(
      Method::POST,
      "/api/gifts",
      Some(&a),
      Some(json!({
        "name": "Lamp",
        "image": { "media_type": "image/png", "data": "aGVsbG8=" }
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);

  let url = gift["image_url"].as_str().unwrap();
  let path = url.strip_prefix("http://localhost:8080").unwrap();
  assert!(path.starts_with("/blobs/gifts/"));
  assert!(path.ends_with(".png"));

  let (status, body) = h.call(Method::GET, path, None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, Value::String("hello".into()));
}

#[tokio::test]
async fn search_and_currencies() {
  let h = harness().await;
  let (_id, a) = h.user("a@example.com", "Alice").await;
  h.user("al@example.com", "Alan").await;

  let (status, people) = h.call(Method::GET, "/api/people?q=AL", Some(&a), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(people.as_array().unwrap().len(), 2);

  let (_, people) = h.call(Method::GET, "/api/people?q=a", Some(&a), None).await;
  assert_eq!(people, json!([]));

  let (status, currencies) = h.call(Method::GET, "/api/currencies", Some(&a), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(currencies[0], json!({ "code": "NGN", "symbol": "₦" }));
  assert_eq!(currencies.as_array().unwrap().len(), 8);
}
