//! [`IdentityProvider`] for [`SqliteStore`]: argon2 password hashes and opaque
//! session tokens in the `users` and `sessions` tables.

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use wishreg_core::{
  identity::{Credentials, Identity, IdentityPatch, Session, email_local_part},
  store::IdentityProvider,
};

use crate::{
  Error, Result,
  encode::{RawUser, USER_COLUMNS, encode_date, encode_dt, encode_uuid},
  store::SqliteStore,
};

/// Random bytes per session token (hex-encoded on the wire).
const TOKEN_BYTES: usize = 32;

fn new_token() -> String {
  let mut buf = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::PasswordHash(e.to_string()))
  })
  .await?
}

async fn verify_password(password: String, phc: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&phc).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
  })
  .await?
}

impl SqliteStore {
  async fn user_where(&self, clause: &'static str, key: String) -> Result<Option<Identity>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}"),
              rusqlite::params![key],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_identity).transpose()
  }
}

impl IdentityProvider for SqliteStore {
  type Error = Error;

  async fn sign_up(&self, credentials: Credentials, full_name: Option<String>) -> Result<Identity> {
    let email    = credentials.normalized_email();
    let hash     = hash_password(credentials.password).await?;
    let id       = Uuid::new_v4();
    let now      = Utc::now();
    let username = email_local_part(&email).to_owned();
    let name     = full_name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .map(str::to_owned);

    let id_str       = encode_uuid(id);
    let at_str       = encode_dt(now);
    let email_row    = email.clone();
    let name_row     = name.clone();
    let profile_name = name.clone().unwrap_or_else(|| username.clone());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, email, password_hash, full_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email_row, hash, name_row, at_str],
        )?;
        tx.execute(
          "INSERT INTO profiles (profile_id, full_name, username) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, profile_name, username],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(user = %id, "identity registered");
    Ok(Identity {
      id,
      email,
      full_name: name,
      avatar_url: None,
      birthday: None,
      created_at: now,
    })
  }

  async fn sign_in(&self, credentials: Credentials) -> Result<Session> {
    let email = credentials.normalized_email();

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, password_hash FROM users WHERE email = ?1",
              rusqlite::params![email],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((user_id, phc)) = row else {
      return Err(Error::InvalidCredentials);
    };
    if !verify_password(credentials.password, phc).await? {
      return Err(Error::InvalidCredentials);
    }

    let token     = new_token();
    let token_row = token.clone();
    let user_row  = user_id.clone();
    let at_str    = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_row, user_row, at_str],
        )?;
        Ok(())
      })
      .await?;

    let identity = self
      .user_where("user_id = ?1", user_id)
      .await?
      .ok_or(Error::InvalidCredentials)?;
    tracing::info!(user = %identity.id, "session opened");
    Ok(Session { token, identity })
  }

  async fn sign_out(&self, token: String) -> Result<()> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![token])?)
      })
      .await?;
    tracing::debug!(removed, "session closed");
    Ok(())
  }

  async fn current_session(&self, token: String) -> Result<Option<Identity>> {
    self
      .user_where("user_id = (SELECT user_id FROM sessions WHERE token = ?1)", token)
      .await
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    self.user_where("user_id = ?1", encode_uuid(id)).await
  }

  async fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> Result<Identity> {
    let id_str   = encode_uuid(id);
    let birthday = patch.birthday.map(encode_date);

    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET full_name = ?2, avatar_url = ?3, birthday = ?4 WHERE user_id = ?1",
          rusqlite::params![id_str, patch.full_name, patch.avatar_url, birthday],
        )?)
      })
      .await?;
    if touched == 0 {
      return Err(Error::UserNotFound(id));
    }

    self.get_identity(id).await?.ok_or(Error::UserNotFound(id))
  }
}
