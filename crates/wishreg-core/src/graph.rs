//! Social-graph records: profiles, follow edges, groups and memberships.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The public-facing record for an identity. Exactly one per identity; always
/// written by upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// Same value as the owning [`Identity`](crate::identity::Identity) id.
  pub id:         Uuid,
  pub full_name:  String,
  pub username:   String,
  pub avatar_url: Option<String>,
  pub birthday:   Option<NaiveDate>,
  /// Last invite code used to join a group; advisory only.
  pub group_code: Option<String>,
}

impl Profile {
  pub fn display_name(&self) -> &str {
    if self.full_name.trim().is_empty() {
      &self.username
    } else {
      &self.full_name
    }
  }
}

/// Display data for someone whose wishlist the viewer can open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:         Uuid,
  pub name:       String,
  pub username:   String,
  pub avatar_url: Option<String>,
  pub birthday:   Option<NaiveDate>,
}

impl From<Profile> for Person {
  fn from(p: Profile) -> Self {
    Self {
      id:         p.id,
      name:       p.display_name().to_owned(),
      username:   p.username,
      avatar_url: p.avatar_url,
      birthday:   p.birthday,
    }
  }
}

// ─── Follows ─────────────────────────────────────────────────────────────────

/// One direction of a follow. A circle link is two of these, one each way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
  pub follower_id:  Uuid,
  pub following_id: Uuid,
}

impl FollowEdge {
  pub fn new(follower_id: Uuid, following_id: Uuid) -> Self {
    Self { follower_id, following_id }
  }

  pub fn reversed(self) -> Self {
    Self { follower_id: self.following_id, following_id: self.follower_id }
  }
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// Length of a generated invite code.
pub const INVITE_CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A short, case-insensitive token that lets anyone holding it join a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteCode(String);

impl InviteCode {
  /// Draw a fresh random code from the OS RNG.
  pub fn generate() -> Self {
    // Bytes at or above 252 are rejected so every symbol is equally likely.
    let limit = (u8::MAX as usize / CODE_ALPHABET.len()) * CODE_ALPHABET.len();
    let mut code = String::with_capacity(INVITE_CODE_LEN);
    let mut buf = [0u8; 16];
    while code.len() < INVITE_CODE_LEN {
      OsRng.fill_bytes(&mut buf);
      for b in buf {
        if code.len() == INVITE_CODE_LEN {
          break;
        }
        if (b as usize) < limit {
          code.push(CODE_ALPHABET[b as usize % CODE_ALPHABET.len()] as char);
        }
      }
    }
    Self(code)
  }

  /// Normalise user input (trim, uppercase) for lookup.
  pub fn parse(raw: &str) -> Self { Self(raw.trim().to_uppercase()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for InviteCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id:         Uuid,
  pub name:       String,
  pub code:       InviteCode,
  pub creator_id: Uuid,
  pub created_at: DateTime<Utc>,
}

/// Composite-unique on `(group_id, user_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub group_id:  Uuid,
  pub user_id:   Uuid,
  pub joined_at: DateTime<Utc>,
}

/// A group and the members the viewer sees in the sidebar (viewer excluded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRoster {
  pub group:   Group,
  pub members: Vec<Person>,
}
