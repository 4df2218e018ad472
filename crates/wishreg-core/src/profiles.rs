//! Profile manager: identity metadata and the profile record, kept in step.
//!
//! Saving writes the identity first and the profile row second. A supplied
//! invite code then triggers a group join whose failure is reported but does
//! not undo the save.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::{ImageSource, resolve_image},
  graph::{Group, GroupRoster, InviteCode, Profile},
  groups,
  identity::{Identity, IdentityPatch, email_local_part},
  store::{BlobStore, IdentityProvider, RegistryStore},
};

/// Object-name prefix for uploaded avatars.
pub const AVATAR_PREFIX: &str = "avatars";

/// What the profile screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
  pub id:           Uuid,
  pub email:        String,
  pub display_name: String,
  pub username:     String,
  pub avatar_url:   Option<String>,
  pub birthday:     Option<NaiveDate>,
  pub group_code:   Option<String>,
}

impl ProfileView {
  fn assemble(identity: &Identity, profile: Option<&Profile>) -> Self {
    let display_name = profile
      .map(|p| p.full_name.trim())
      .filter(|n| !n.is_empty())
      .map_or_else(|| identity.display_name(), str::to_owned);
    Self {
      id: identity.id,
      email: identity.email.clone(),
      display_name,
      username: profile
        .map(|p| p.username.clone())
        .unwrap_or_else(|| email_local_part(&identity.email).to_owned()),
      avatar_url: profile
        .and_then(|p| p.avatar_url.clone())
        .or_else(|| identity.avatar_url.clone()),
      birthday: profile.and_then(|p| p.birthday).or(identity.birthday),
      group_code: profile.and_then(|p| p.group_code.clone()),
    }
  }
}

async fn identity_of<I: IdentityProvider>(identity: &I, user_id: Uuid) -> Result<Identity> {
  identity
    .get_identity(user_id)
    .await
    .map_err(Error::upstream)?
    .ok_or(Error::UserNotFound(user_id))
}

pub async fn load<S: RegistryStore, I: IdentityProvider>(
  store: &S,
  identity: &I,
  user_id: Uuid,
) -> Result<ProfileView> {
  let ident = identity_of(identity, user_id).await?;
  let profile = store.get_profile(user_id).await.map_err(Error::upstream)?;
  Ok(ProfileView::assemble(&ident, profile.as_ref()))
}

/// The edit-profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
  pub full_name:  String,
  /// Blank keeps the current username.
  pub username:   Option<String>,
  /// An upload wins over a stored URL.
  pub avatar:     ImageSource,
  pub birthday:   Option<NaiveDate>,
  /// Blank means "don't join anything".
  pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupJoin {
  Joined { group: Group },
  Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSaved {
  pub profile:    ProfileView,
  pub group_join: Option<GroupJoin>,
  /// Refreshed sidebar, present when a join succeeded.
  pub sidebar:    Option<Vec<GroupRoster>>,
}

pub async fn save<S, B, I>(
  store: &S,
  blobs: &B,
  identity: &I,
  actor: Uuid,
  draft: ProfileDraft,
) -> Result<ProfileSaved>
where
  S: RegistryStore,
  B: BlobStore,
  I: IdentityProvider,
{
  let current = identity_of(identity, actor).await?;
  // No new avatar keeps the current one.
  let avatar_url = resolve_image(blobs, AVATAR_PREFIX, actor, draft.avatar)
    .await?
    .or_else(|| current.avatar_url.clone());
  let full_name = match draft.full_name.trim() {
    "" => current.display_name(),
    name => name.to_owned(),
  };

  let updated = identity
    .update_identity(actor, IdentityPatch {
      full_name:  Some(full_name.clone()),
      avatar_url: avatar_url.clone(),
      birthday:   draft.birthday,
    })
    .await
    .map_err(|e| Error::IdentityUpdate(Box::new(e)))?;

  let existing = store
    .get_profile(actor)
    .await
    .map_err(|e| Error::ProfileUpdate(Box::new(e)))?;
  let username = draft
    .username
    .as_deref()
    .map(str::trim)
    .filter(|u| !u.is_empty())
    .map(str::to_owned)
    .or_else(|| existing.as_ref().map(|p| p.username.clone()))
    .unwrap_or_else(|| email_local_part(&updated.email).to_owned());
  let join_code = draft
    .group_code
    .as_deref()
    .map(InviteCode::parse)
    .filter(|c| !c.is_empty());
  let group_code = join_code
    .as_ref()
    .map(ToString::to_string)
    .or_else(|| existing.and_then(|p| p.group_code));

  let profile = store
    .upsert_profile(Profile {
      id: actor,
      full_name,
      username,
      avatar_url,
      birthday: draft.birthday,
      group_code,
    })
    .await
    .map_err(|e| Error::ProfileUpdate(Box::new(e)))?;
  tracing::info!(user = %actor, "profile saved");

  let (group_join, sidebar) = match join_code {
    None => (None, None),
    Some(code) => match groups::join_group(store, code.as_str(), actor).await {
      Ok(group) => {
        let sidebar = match groups::sidebar(store, actor).await {
          Ok(rosters) => Some(rosters),
          Err(e) => {
            tracing::warn!(error = %e, "sidebar refresh failed after join");
            None
          }
        };
        (Some(GroupJoin::Joined { group }), sidebar)
      }
      Err(e) => {
        tracing::warn!(user = %actor, %code, error = %e, "group join during profile save failed");
        (Some(GroupJoin::Failed { reason: e.to_string() }), None)
      }
    },
  };

  Ok(ProfileSaved {
    profile: ProfileView::assemble(&updated, Some(&profile)),
    group_join,
    sidebar,
  })
}

// ─── Rendering helpers ───────────────────────────────────────────────────────

/// `"March 4"`, or `"No Date Set"`.
pub fn format_birthday(birthday: Option<NaiveDate>) -> String {
  birthday.map_or_else(|| "No Date Set".to_owned(), |d| d.format("%B %-d").to_string())
}

/// The stored avatar, or a generated initials placeholder for `name`.
pub fn avatar_or_placeholder(name: &str, avatar_url: Option<&str>) -> String {
  if let Some(url) = avatar_url.filter(|u| !u.trim().is_empty()) {
    return url.to_owned();
  }
  let mut encoded = String::with_capacity(name.len());
  for b in name.trim().bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
        encoded.push(b as char)
      }
      b' ' => encoded.push('+'),
      other => encoded.push_str(&format!("%{other:02X}")),
    }
  }
  format!("https://ui-avatars.com/api/?name={encoded}&background=6366f1&color=fff")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn birthday_rendering() {
    let d = NaiveDate::from_ymd_opt(1990, 3, 4).unwrap();
    assert_eq!(format_birthday(Some(d)), "March 4");
    assert_eq!(format_birthday(None), "No Date Set");
  }

  #[test]
  fn placeholder_avatar_encodes_name() {
    assert_eq!(
      avatar_or_placeholder("Ada Lovelace", None),
      "https://ui-avatars.com/api/?name=Ada+Lovelace&background=6366f1&color=fff"
    );
    assert_eq!(
      avatar_or_placeholder("Zoë", Some("")),
      "https://ui-avatars.com/api/?name=Zo%C3%AB&background=6366f1&color=fff"
    );
    assert_eq!(avatar_or_placeholder("x", Some("https://img/a.png")), "https://img/a.png");
  }

  #[test]
  fn view_prefers_profile_fields() {
    let ident = Identity {
      id:         Uuid::new_v4(),
      email:      "ada@example.com".into(),
      full_name:  None,
      avatar_url: Some("https://id/avatar.png".into()),
      birthday:   None,
      created_at: chrono::Utc::now(),
    };
    let view = ProfileView::assemble(&ident, None);
    assert_eq!(view.display_name, "ada");
    assert_eq!(view.username, "ada");
    assert_eq!(view.avatar_url.as_deref(), Some("https://id/avatar.png"));

    let profile = Profile {
      id:         ident.id,
      full_name:  "Ada Lovelace".into(),
      username:   "countess".into(),
      avatar_url: None,
      birthday:   None,
      group_code: Some("X7K2QP".into()),
    };
    let view = ProfileView::assemble(&ident, Some(&profile));
    assert_eq!(view.display_name, "Ada Lovelace");
    assert_eq!(view.username, "countess");
    assert_eq!(view.avatar_url.as_deref(), Some("https://id/avatar.png"));
    assert_eq!(view.group_code.as_deref(), Some("X7K2QP"));
  }
}
