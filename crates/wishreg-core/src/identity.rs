//! Authenticated identities and sessions.
//!
//! The identity record is owned by the auth provider. It carries a small bag of
//! editable metadata (name, avatar, birthday) that is kept in step with the
//! separate [`Profile`](crate::graph::Profile) row by the profile manager.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signed-up user as seen by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:         Uuid,
  pub email:      String,
  pub full_name:  Option<String>,
  pub avatar_url: Option<String>,
  pub birthday:   Option<NaiveDate>,
  pub created_at: DateTime<Utc>,
}

impl Identity {
  /// The name to show for this identity; falls back to the email local-part.
  pub fn display_name(&self) -> String {
    match self.full_name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.to_owned(),
      _ => email_local_part(&self.email).to_owned(),
    }
  }
}

/// Everything before the `@` of an email address (or the whole string).
pub fn email_local_part(email: &str) -> &str {
  email.split_once('@').map_or(email, |(local, _)| local)
}

/// Email and password as typed into the sign-in form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl Credentials {
  /// Trimmed, lower-cased email used as the lookup key.
  pub fn normalized_email(&self) -> String { self.email.trim().to_lowercase() }
}

/// A live session. The token is the only thing a caller needs to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token:    String,
  pub identity: Identity,
}

/// Metadata written by [`IdentityProvider::update_identity`].
///
/// Each field replaces the stored value wholesale, `None` included.
///
/// [`IdentityProvider::update_identity`]: crate::store::IdentityProvider::update_identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPatch {
  pub full_name:  Option<String>,
  pub avatar_url: Option<String>,
  pub birthday:   Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn identity(email: &str, full_name: Option<&str>) -> Identity {
    Identity {
      id:         Uuid::new_v4(),
      email:      email.into(),
      full_name:  full_name.map(Into::into),
      avatar_url: None,
      birthday:   None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn display_name_prefers_full_name() {
    assert_eq!(identity("ada@example.com", Some("Ada L")).display_name(), "Ada L");
  }

  #[test]
  fn display_name_defaults_to_local_part() {
    assert_eq!(identity("ada@example.com", None).display_name(), "ada");
    assert_eq!(identity("ada@example.com", Some("  ")).display_name(), "ada");
  }

  #[test]
  fn normalized_email_trims_and_lowercases() {
    let creds = Credentials { email: "  Ada@Example.COM ".into(), password: "x".into() };
    assert_eq!(creds.normalized_email(), "ada@example.com");
  }
}
