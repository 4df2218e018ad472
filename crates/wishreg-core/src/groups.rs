//! Group membership manager: invite codes, joining and rosters.
//!
//! Group co-membership is its own visibility channel. Joining a group never
//! writes follow edges.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  graph::{Group, GroupRoster, InviteCode, Membership, Person},
  store::{FailureKind, RegistryStore, StoreFailure},
};

/// How many fresh codes `create_group` tries before giving up on collisions.
pub const CODE_ATTEMPTS: usize = 3;

async fn enroll<S: RegistryStore>(store: &S, group_id: Uuid, user_id: Uuid) -> Result<()> {
  let membership = Membership { group_id, user_id, joined_at: Utc::now() };
  match store.insert_membership(membership).await {
    Ok(()) => {
      tracing::info!(group = %group_id, user = %user_id, "joined group");
      Ok(())
    }
    Err(e) if e.kind() == FailureKind::UniqueViolation => Ok(()),
    Err(e) if e.kind() == FailureKind::ForeignKeyViolation => Err(Error::UserNotFound(user_id)),
    Err(e) => Err(Error::upstream(e)),
  }
}

/// Create a group named `name` with a fresh invite code and enrol the
/// creator. Returns the stored group; share `group.code` to invite others.
pub async fn create_group<S: RegistryStore>(
  store: &S,
  name: &str,
  creator_id: Uuid,
) -> Result<Group> {
  let name = name.trim();
  if name.is_empty() {
    return Err(Error::InvalidInput("group name must not be empty".into()));
  }

  let mut attempt = 0;
  let group = loop {
    attempt += 1;
    let candidate = Group {
      id: Uuid::new_v4(),
      name: name.to_owned(),
      code: InviteCode::generate(),
      creator_id,
      created_at: Utc::now(),
    };
    match store.insert_group(candidate).await {
      Ok(group) => break group,
      Err(e) if e.kind() == FailureKind::UniqueViolation && attempt < CODE_ATTEMPTS => {
        tracing::warn!(attempt, "invite code collision, regenerating");
      }
      Err(e) => return Err(Error::upstream(e)),
    }
  };

  enroll(store, group.id, creator_id).await?;
  tracing::info!(group = %group.id, code = %group.code, "group created");
  Ok(group)
}

/// Join the group using `code`. Case and surrounding whitespace are ignored;
/// joining a group twice is a no-op.
pub async fn join_group<S: RegistryStore>(store: &S, code: &str, user_id: Uuid) -> Result<Group> {
  let code = InviteCode::parse(code);
  if code.is_empty() {
    return Err(Error::GroupNotFound(String::new()));
  }
  let group = store
    .find_group_by_code(code.clone())
    .await
    .map_err(Error::upstream)?
    .ok_or_else(|| Error::GroupNotFound(code.to_string()))?;
  enroll(store, group.id, user_id).await?;
  Ok(group)
}

/// Groups `user_id` belongs to, oldest first.
pub async fn my_groups<S: RegistryStore>(store: &S, user_id: Uuid) -> Result<Vec<Group>> {
  let mut groups = store
    .list_groups_for_user(user_id)
    .await
    .map_err(Error::upstream)?;
  groups.sort_by_key(|g| g.created_at);
  Ok(groups)
}

async fn roster_for<S: RegistryStore>(
  store: &S,
  viewer: Uuid,
  groups: Vec<Group>,
) -> Result<Vec<GroupRoster>> {
  if groups.is_empty() {
    return Ok(Vec::new());
  }
  let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
  let memberships = store
    .list_memberships(group_ids)
    .await
    .map_err(Error::upstream)?;

  let member_ids: HashSet<Uuid> = memberships
    .iter()
    .map(|m| m.user_id)
    .filter(|id| *id != viewer)
    .collect();
  let people: HashMap<Uuid, Person> = store
    .list_profiles(member_ids.into_iter().collect())
    .await
    .map_err(Error::upstream)?
    .into_iter()
    .map(|p| (p.id, Person::from(p)))
    .collect();

  let mut by_group: HashMap<Uuid, Vec<Person>> = HashMap::new();
  for m in memberships {
    if let Some(person) = people.get(&m.user_id) {
      by_group.entry(m.group_id).or_default().push(person.clone());
    }
  }

  Ok(
    groups
      .into_iter()
      .map(|group| {
        let mut members = by_group.remove(&group.id).unwrap_or_default();
        members.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        GroupRoster { group, members }
      })
      .collect(),
  )
}

/// Members of each of `group_ids` (the viewer excluded), grouped by group.
///
/// Only groups the viewer belongs to are returned; other ids are ignored.
pub async fn roster<S: RegistryStore>(
  store: &S,
  viewer: Uuid,
  group_ids: &[Uuid],
) -> Result<Vec<GroupRoster>> {
  let wanted: HashSet<&Uuid> = group_ids.iter().collect();
  let groups = my_groups(store, viewer)
    .await?
    .into_iter()
    .filter(|g| wanted.contains(&g.id))
    .collect();
  roster_for(store, viewer, groups).await
}

/// Roster of every group the user belongs to, for the sidebar.
pub async fn sidebar<S: RegistryStore>(store: &S, user_id: Uuid) -> Result<Vec<GroupRoster>> {
  let groups = my_groups(store, user_id).await?;
  roster_for(store, user_id, groups).await
}
