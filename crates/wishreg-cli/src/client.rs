//! Async HTTP client wrapping the wishreg JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;
use wishreg_core::{
  gift::Gift,
  graph::{Group, GroupRoster, Person},
  identity::{Identity, Session},
  profiles::{ProfileSaved, ProfileView},
  reservation::{GiftCard, ReservationOutcome},
};

/// Connection settings for the wishreg API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Session token from `wishreg signin`.
  pub token:    Option<String>,
}

/// A local file to send as `{"media_type", "data"}`.
#[derive(Debug, Clone)]
pub struct FileUpload {
  pub media_type: String,
  pub bytes:      Vec<u8>,
}

impl FileUpload {
  pub fn to_json(&self) -> Value {
    json!({ "media_type": self.media_type, "data": B64.encode(&self.bytes) })
  }
}

/// Async HTTP client for the wishreg JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn send(&self, what: &str, req: RequestBuilder) -> Result<Response> {
    tracing::debug!(request = what, "sending");
    let resp = self.auth(req).send().await.with_context(|| format!("{what} failed"))?;
    if resp.status().is_success() {
      return Ok(resp);
    }
    Err(error_from(what, resp).await)
  }

  async fn json<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    self
      .send(what, req)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"))
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/signup`
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str,
    full_name: Option<&str>,
  ) -> Result<Identity> {
    let body = json!({ "email": email, "password": password, "full_name": full_name });
    self
      .json("POST /auth/signup", self.client.post(self.url("/auth/signup")).json(&body))
      .await
  }

  /// `POST /api/auth/signin`
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    let body = json!({ "email": email, "password": password });
    self
      .json("POST /auth/signin", self.client.post(self.url("/auth/signin")).json(&body))
      .await
  }

  /// `POST /api/auth/signout`
  pub async fn sign_out(&self) -> Result<()> {
    self
      .send("POST /auth/signout", self.client.post(self.url("/auth/signout")))
      .await?;
    Ok(())
  }

  // ── Profile ───────────────────────────────────────────────────────────────

  /// `GET /api/me`
  pub async fn me(&self) -> Result<ProfileView> {
    self.json("GET /me", self.client.get(self.url("/me"))).await
  }

  /// `PUT /api/me`
  pub async fn save_profile(&self, body: &Value) -> Result<ProfileSaved> {
    self.json("PUT /me", self.client.put(self.url("/me")).json(body)).await
  }

  // ── People ────────────────────────────────────────────────────────────────

  /// `GET /api/people?q=<term>`
  pub async fn search(&self, term: &str) -> Result<Vec<Person>> {
    self
      .json("GET /people", self.client.get(self.url("/people")).query(&[("q", term)]))
      .await
  }

  /// `GET /api/people/visible`
  pub async fn visible(&self) -> Result<Vec<Person>> {
    self
      .json("GET /people/visible", self.client.get(self.url("/people/visible")))
      .await
  }

  /// `GET /api/circle`
  pub async fn circle(&self) -> Result<Vec<Person>> {
    self.json("GET /circle", self.client.get(self.url("/circle"))).await
  }

  /// `POST /api/people/:id/follow`
  pub async fn follow(&self, id: Uuid) -> Result<()> {
    let url = self.url(&format!("/people/{id}/follow"));
    self.send("POST /people/:id/follow", self.client.post(url)).await?;
    Ok(())
  }

  /// `DELETE /api/people/:id/follow`
  pub async fn unfollow(&self, id: Uuid) -> Result<()> {
    let url = self.url(&format!("/people/{id}/follow"));
    self.send("DELETE /people/:id/follow", self.client.delete(url)).await?;
    Ok(())
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  /// `GET /api/groups`
  pub async fn groups(&self) -> Result<Vec<GroupRoster>> {
    self.json("GET /groups", self.client.get(self.url("/groups"))).await
  }

  /// `POST /api/groups`
  pub async fn create_group(&self, name: &str) -> Result<Group> {
    let body = json!({ "name": name });
    self
      .json("POST /groups", self.client.post(self.url("/groups")).json(&body))
      .await
  }

  /// `POST /api/groups/join`
  pub async fn join_group(&self, code: &str) -> Result<Group> {
    let body = json!({ "code": code });
    self
      .json("POST /groups/join", self.client.post(self.url("/groups/join")).json(&body))
      .await
  }

  // ── Gifts ─────────────────────────────────────────────────────────────────

  /// `GET /api/currencies`
  pub async fn currencies(&self) -> Result<Vec<Value>> {
    self.json("GET /currencies", self.client.get(self.url("/currencies"))).await
  }

  /// `GET /api/lists/:owner/gifts[?q=<text>]`
  pub async fn wishlist(&self, owner: Uuid, text: Option<&str>) -> Result<Vec<GiftCard>> {
    let mut req = self.client.get(self.url(&format!("/lists/{owner}/gifts")));
    if let Some(text) = text {
      req = req.query(&[("q", text)]);
    }
    self.json("GET /lists/:owner/gifts", req).await
  }

  /// `GET /api/gifts/:id`
  pub async fn gift(&self, id: Uuid) -> Result<GiftCard> {
    self
      .json("GET /gifts/:id", self.client.get(self.url(&format!("/gifts/{id}"))))
      .await
  }

  /// `POST /api/gifts`
  pub async fn create_gift(&self, body: &Value) -> Result<Gift> {
    self
      .json("POST /gifts", self.client.post(self.url("/gifts")).json(body))
      .await
  }

  /// `PUT /api/gifts/:id`
  pub async fn update_gift(&self, id: Uuid, body: &Value) -> Result<Gift> {
    let url = self.url(&format!("/gifts/{id}"));
    self.json("PUT /gifts/:id", self.client.put(url).json(body)).await
  }

  /// `DELETE /api/gifts/:id`
  pub async fn delete_gift(&self, id: Uuid) -> Result<()> {
    let url = self.url(&format!("/gifts/{id}"));
    self.send("DELETE /gifts/:id", self.client.delete(url)).await?;
    Ok(())
  }

  // ── Reservations ──────────────────────────────────────────────────────────

  /// `POST|DELETE /api/gifts/:id/reservation[/toggle]`.
  ///
  /// A `409` carries a [`ReservationOutcome::RaceLost`] body and is returned
  /// as `Ok`.
  async fn reservation(&self, what: &str, req: RequestBuilder) -> Result<ReservationOutcome> {
    #[derive(serde::Deserialize)]
    struct Reply {
      outcome: ReservationOutcome,
    }

    let resp = self.auth(req).send().await.with_context(|| format!("{what} failed"))?;
    if resp.status().is_success() || resp.status() == StatusCode::CONFLICT {
      let reply: Reply = resp
        .json()
        .await
        .with_context(|| format!("deserialising {what} response"))?;
      return Ok(reply.outcome);
    }
    Err(error_from(what, resp).await)
  }

  pub async fn reserve(&self, id: Uuid) -> Result<ReservationOutcome> {
    let url = self.url(&format!("/gifts/{id}/reservation"));
    self.reservation("POST /gifts/:id/reservation", self.client.post(url)).await
  }

  pub async fn release(&self, id: Uuid) -> Result<ReservationOutcome> {
    let url = self.url(&format!("/gifts/{id}/reservation"));
    self.reservation("DELETE /gifts/:id/reservation", self.client.delete(url)).await
  }

  pub async fn toggle(&self, id: Uuid) -> Result<ReservationOutcome> {
    let url = self.url(&format!("/gifts/{id}/reservation/toggle"));
    self
      .reservation("POST /gifts/:id/reservation/toggle", self.client.post(url))
      .await
  }
}

/// Turn a non-success response into an error carrying the server's message.
async fn error_from(what: &str, resp: Response) -> anyhow::Error {
  let status = resp.status();
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned));
  match message {
    Some(message) => anyhow!("{what} → {status}: {message}"),
    None => anyhow!("{what} → {status}"),
  }
}
