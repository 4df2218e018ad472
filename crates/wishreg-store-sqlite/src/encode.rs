//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings and currencies are their ISO codes.

use chrono::{DateTime, NaiveDate, Utc};
use wishreg_core::{
  gift::{Currency, Gift},
  graph::{Group, InviteCode, Membership, Profile},
  identity::Identity,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── Currency ────────────────────────────────────────────────────────────────

pub fn decode_currency(s: &str) -> Result<Currency> {
  s.parse().map_err(|_| Error::UnknownCurrency(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, email, full_name, avatar_url, birthday, created_at";

/// Raw strings read directly from a `users` row (without the hash).
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub avatar_url: Option<String>,
  pub birthday:   Option<String>,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      email:      row.get(1)?,
      full_name:  row.get(2)?,
      avatar_url: row.get(3)?,
      birthday:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:         decode_uuid(&self.user_id)?,
      email:      self.email,
      full_name:  self.full_name,
      avatar_url: self.avatar_url,
      birthday:   decode_opt_date(self.birthday.as_deref())?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const PROFILE_COLUMNS: &str =
  "profile_id, full_name, username, avatar_url, birthday, group_code";

pub struct RawProfile {
  pub profile_id: String,
  pub full_name:  String,
  pub username:   String,
  pub avatar_url: Option<String>,
  pub birthday:   Option<String>,
  pub group_code: Option<String>,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id: row.get(0)?,
      full_name:  row.get(1)?,
      username:   row.get(2)?,
      avatar_url: row.get(3)?,
      birthday:   row.get(4)?,
      group_code: row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:         decode_uuid(&self.profile_id)?,
      full_name:  self.full_name,
      username:   self.username,
      avatar_url: self.avatar_url,
      birthday:   decode_opt_date(self.birthday.as_deref())?,
      group_code: self.group_code,
    })
  }
}

pub const GROUP_COLUMNS: &str = "g.group_id, g.name, g.code, g.creator_id, g.created_at";

pub struct RawGroup {
  pub group_id:   String,
  pub name:       String,
  pub code:       String,
  pub creator_id: String,
  pub created_at: String,
}

impl RawGroup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:   row.get(0)?,
      name:       row.get(1)?,
      code:       row.get(2)?,
      creator_id: row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      id:         decode_uuid(&self.group_id)?,
      name:       self.name,
      code:       InviteCode::parse(&self.code),
      creator_id: decode_uuid(&self.creator_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawMembership {
  pub group_id:  String,
  pub user_id:   String,
  pub joined_at: String,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      group_id:  decode_uuid(&self.group_id)?,
      user_id:   decode_uuid(&self.user_id)?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub const GIFT_COLUMNS: &str = "gift_id, owner_id, name, price, currency, description, \
                                image_url, reserved_by, created_at";

pub struct RawGift {
  pub gift_id:     String,
  pub owner_id:    String,
  pub name:        String,
  pub price:       String,
  pub currency:    String,
  pub description: String,
  pub image_url:   Option<String>,
  pub reserved_by: Option<String>,
  pub created_at:  String,
}

impl RawGift {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      gift_id:     row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      price:       row.get(3)?,
      currency:    row.get(4)?,
      description: row.get(5)?,
      image_url:   row.get(6)?,
      reserved_by: row.get(7)?,
      created_at:  row.get(8)?,
    })
  }

  pub fn into_gift(self) -> Result<Gift> {
    Ok(Gift {
      id:          decode_uuid(&self.gift_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      price:       self.price,
      currency:    decode_currency(&self.currency)?,
      description: self.description,
      image_url:   self.image_url,
      reserved_by: decode_opt_uuid(self.reserved_by.as_deref())?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Escape `%`, `_` and `\` so `term` matches literally inside a `LIKE` pattern
/// using `ESCAPE '\'`. The term is lower-cased the same way as the `fold`
/// SQL function applied to the searched columns.
pub fn like_pattern(term: &str) -> String {
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for ch in term.to_lowercase().chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out.push('%');
  out
}
