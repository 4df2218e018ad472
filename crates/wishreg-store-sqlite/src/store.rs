//! [`SqliteStore`] — the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, functions::FunctionFlags};
use uuid::Uuid;

use wishreg_core::{
  gift::{Gift, GiftPatch},
  graph::{FollowEdge, Group, InviteCode, Membership, Profile},
  store::RegistryStore,
};

use crate::{
  Result,
  encode::{
    GIFT_COLUMNS, GROUP_COLUMNS, PROFILE_COLUMNS, RawGift, RawGroup, RawMembership, RawProfile,
    decode_uuid, encode_date, encode_dt, encode_uuid, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A wishreg store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised onto one connection thread, so each statement (in
/// particular the conditional reservation update) executes atomically.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// Unicode-aware lower-casing, registered on every connection. SQLite's own
/// `lower()` only folds ASCII.
const FOLD_FN: &str = "fold";

/// `?, ?, ?` for `n` bound parameters.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          FOLD_FN,
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = crate::Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn upsert_profile(&self, profile: Profile) -> Result<Profile> {
    let id_str     = encode_uuid(profile.id);
    let full_name  = profile.full_name.clone();
    let username   = profile.username.clone();
    let avatar_url = profile.avatar_url.clone();
    let birthday   = profile.birthday.map(encode_date);
    let group_code = profile.group_code.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, full_name, username, avatar_url, birthday, group_code)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (profile_id) DO UPDATE SET
             full_name  = excluded.full_name,
             username   = excluded.username,
             avatar_url = excluded.avatar_url,
             birthday   = excluded.birthday,
             group_code = excluded.group_code",
          rusqlite::params![id_str, full_name, username, avatar_url, birthday, group_code],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(profile = %profile.id, "profile upserted");
    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
              rusqlite::params![id_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(&self, ids: Vec<Uuid>) -> Result<Vec<Profile>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.into_iter().map(encode_uuid).collect();

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn search_profiles(&self, term: String, limit: usize) -> Result<Vec<Profile>> {
    let pattern   = like_pattern(&term);
    let limit_val = limit as i64;

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles
           WHERE {FOLD_FN}(full_name) LIKE ?1 ESCAPE '\\'
              OR {FOLD_FN}(username)  LIKE ?1 ESCAPE '\\'
           ORDER BY {FOLD_FN}(full_name)
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit_val], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Follows ───────────────────────────────────────────────────────────────

  async fn insert_follow(&self, edge: FollowEdge) -> Result<()> {
    let follower  = encode_uuid(edge.follower_id);
    let following = encode_uuid(edge.following_id);
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![follower, following, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_follow(&self, edge: FollowEdge) -> Result<u64> {
    let follower  = encode_uuid(edge.follower_id);
    let following = encode_uuid(edge.following_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
          rusqlite::params![follower, following],
        )?)
      })
      .await?;
    Ok(removed as u64)
  }

  async fn list_following(&self, follower_id: Uuid) -> Result<Vec<FollowEdge>> {
    let follower = encode_uuid(follower_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT following_id FROM follows WHERE follower_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![follower], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids
      .iter()
      .map(|s| Ok(FollowEdge::new(follower_id, decode_uuid(s)?)))
      .collect()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn insert_group(&self, group: Group) -> Result<Group> {
    let id_str      = encode_uuid(group.id);
    let name        = group.name.clone();
    let code        = group.code.to_string();
    let creator_str = encode_uuid(group.creator_id);
    let at_str      = encode_dt(group.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_groups (group_id, name, code, creator_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, code, creator_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn find_group_by_code(&self, code: InviteCode) -> Result<Option<Group>> {
    let code_str = code.to_string();

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GROUP_COLUMNS} FROM user_groups g WHERE g.code = ?1"),
              rusqlite::params![code_str],
              RawGroup::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn insert_membership(&self, membership: Membership) -> Result<()> {
    let group_str = encode_uuid(membership.group_id);
    let user_str  = encode_uuid(membership.user_id);
    let at_str    = encode_dt(membership.joined_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![group_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_groups_for_user(&self, user_id: Uuid) -> Result<Vec<Group>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GROUP_COLUMNS}
           FROM user_groups g
           JOIN group_members m ON m.group_id = g.group_id
           WHERE m.user_id = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawGroup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn list_memberships(&self, group_ids: Vec<Uuid>) -> Result<Vec<Membership>> {
    if group_ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = group_ids.into_iter().map(encode_uuid).collect();

    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT group_id, user_id, joined_at FROM group_members
           WHERE group_id IN ({})
           ORDER BY joined_at",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), |row| {
            Ok(RawMembership {
              group_id:  row.get(0)?,
              user_id:   row.get(1)?,
              joined_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  // ── Gifts ─────────────────────────────────────────────────────────────────

  async fn list_gifts(&self) -> Result<Vec<Gift>> {
    let raws: Vec<RawGift> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {GIFT_COLUMNS} FROM gifts ORDER BY created_at"))?;
        let rows = stmt
          .query_map([], RawGift::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGift::into_gift).collect()
  }

  async fn get_gift(&self, id: Uuid) -> Result<Option<Gift>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGift> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GIFT_COLUMNS} FROM gifts WHERE gift_id = ?1"),
              rusqlite::params![id_str],
              RawGift::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGift::into_gift).transpose()
  }

  async fn insert_gift(&self, gift: Gift) -> Result<Gift> {
    let id_str       = encode_uuid(gift.id);
    let owner_str    = encode_uuid(gift.owner_id);
    let name         = gift.name.clone();
    let price        = gift.price.clone();
    let currency     = gift.currency.to_string();
    let description  = gift.description.clone();
    let image_url    = gift.image_url.clone();
    let reserved_str = gift.reserved_by.map(encode_uuid);
    let at_str       = encode_dt(gift.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gifts (
             gift_id, owner_id, name, price, currency, description,
             image_url, reserved_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            owner_str,
            name,
            price,
            currency,
            description,
            image_url,
            reserved_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(gift = %gift.id, "gift inserted");
    Ok(gift)
  }

  async fn update_gift(&self, id: Uuid, patch: GiftPatch) -> Result<u64> {
    let id_str   = encode_uuid(id);
    let currency = patch.currency.to_string();

    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE gifts
           SET name = ?2, price = ?3, currency = ?4, description = ?5, image_url = ?6
           WHERE gift_id = ?1",
          rusqlite::params![
            id_str,
            patch.name,
            patch.price,
            currency,
            patch.description,
            patch.image_url,
          ],
        )?)
      })
      .await?;
    Ok(touched as u64)
  }

  async fn set_reserved_by(
    &self,
    id:       Uuid,
    expected: Option<Uuid>,
    new:      Option<Uuid>,
  ) -> Result<u64> {
    let id_str       = encode_uuid(id);
    let expected_str = expected.map(encode_uuid);
    let new_str      = new.map(encode_uuid);

    // `IS` rather than `=` so a NULL expectation matches a free gift.
    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE gifts SET reserved_by = ?2 WHERE gift_id = ?1 AND reserved_by IS ?3",
          rusqlite::params![id_str, new_str, expected_str],
        )?)
      })
      .await?;

    tracing::debug!(gift = %id, touched, "conditional reservation write");
    Ok(touched as u64)
  }

  async fn delete_gift(&self, id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM gifts WHERE gift_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(removed as u64)
  }
}
