//! Social graph manager: people search, mutual follows and the circle.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
  Error, Result, groups,
  graph::{FollowEdge, Person},
  store::{FailureKind, RegistryStore, StoreFailure},
};

/// Most people a single search returns.
pub const SEARCH_LIMIT: usize = 5;

/// Shortest search term that reaches the store.
pub const MIN_SEARCH_CHARS: usize = 2;

/// People whose name or username contains `term`, case-insensitively.
///
/// Terms shorter than [`MIN_SEARCH_CHARS`] (after trimming) return nothing.
pub async fn search<S: RegistryStore>(store: &S, term: &str) -> Result<Vec<Person>> {
  let term = term.trim();
  if term.chars().count() < MIN_SEARCH_CHARS {
    return Ok(Vec::new());
  }
  let found = store
    .search_profiles(term.to_owned(), SEARCH_LIMIT)
    .await
    .map_err(Error::upstream)?;
  Ok(found.into_iter().take(SEARCH_LIMIT).map(Person::from).collect())
}

pub async fn person<S: RegistryStore>(store: &S, id: Uuid) -> Result<Person> {
  store
    .get_profile(id)
    .await
    .map_err(Error::upstream)?
    .map(Person::from)
    .ok_or(Error::ProfileNotFound(id))
}

/// Write one edge. `Ok(false)` means it already existed.
async fn link<S: RegistryStore>(store: &S, edge: FollowEdge, target: Uuid) -> Result<bool> {
  match store.insert_follow(edge).await {
    Ok(()) => {
      tracing::debug!(from = %edge.follower_id, to = %edge.following_id, "follow edge written");
      Ok(true)
    }
    Err(e) if e.kind() == FailureKind::UniqueViolation => Ok(false),
    Err(e) if e.kind() == FailureKind::ForeignKeyViolation => Err(Error::UserNotFound(target)),
    Err(e) => Err(Error::upstream(e)),
  }
}

/// Link `actor` and `target` in both directions.
///
/// Edges that already exist count as written, so repeating a follow is a
/// no-op. An unknown `target` is [`Error::UserNotFound`]. If the reverse edge
/// cannot be written, a forward edge written by this call is removed again.
pub async fn follow<S: RegistryStore>(store: &S, actor: Uuid, target: Uuid) -> Result<()> {
  if actor == target {
    return Err(Error::SelfFollow);
  }
  let forward = FollowEdge::new(actor, target);
  let wrote_forward = link(store, forward, target).await?;
  if let Err(e) = link(store, forward.reversed(), target).await {
    if wrote_forward {
      if let Err(undo) = store.delete_follow(forward).await {
        tracing::warn!(user = %actor, %target, error = %undo, "one-way follow edge left behind");
      }
    }
    return Err(e);
  }
  tracing::info!(user = %actor, %target, "now following each other");
  Ok(())
}

/// Remove both edges between `actor` and `target`. Missing edges are ignored.
pub async fn unfollow<S: RegistryStore>(store: &S, actor: Uuid, target: Uuid) -> Result<()> {
  let forward = FollowEdge::new(actor, target);
  let mut removed = 0;
  for edge in [forward, forward.reversed()] {
    removed += store.delete_follow(edge).await.map_err(Error::upstream)?;
  }
  tracing::info!(user = %actor, %target, removed, "unfollowed");
  Ok(())
}

/// Everyone `user_id` follows, with profile display data, sorted by name.
pub async fn circle<S: RegistryStore>(store: &S, user_id: Uuid) -> Result<Vec<Person>> {
  let ids: Vec<Uuid> = store
    .list_following(user_id)
    .await
    .map_err(Error::upstream)?
    .into_iter()
    .map(|e| e.following_id)
    .collect();
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  let mut people: Vec<Person> = store
    .list_profiles(ids)
    .await
    .map_err(Error::upstream)?
    .into_iter()
    .map(Person::from)
    .collect();
  people.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
  Ok(people)
}

/// The circle plus every co-member of the user's groups, de-duplicated and
/// excluding the user.
pub async fn visible_people<S: RegistryStore>(store: &S, user_id: Uuid) -> Result<Vec<Person>> {
  let mut by_id: BTreeMap<Uuid, Person> = BTreeMap::new();
  for person in circle(store, user_id).await? {
    by_id.insert(person.id, person);
  }
  for roster in groups::sidebar(store, user_id).await? {
    for person in roster.members {
      by_id.entry(person.id).or_insert(person);
    }
  }
  by_id.remove(&user_id);

  let mut people: Vec<Person> = by_id.into_values().collect();
  people.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
  Ok(people)
}

/// Whether `viewer` may open `owner`'s wishlist.
pub async fn can_view<S: RegistryStore>(store: &S, viewer: Uuid, owner: Uuid) -> Result<bool> {
  if viewer == owner {
    return Ok(true);
  }
  Ok(visible_people(store, viewer).await?.iter().any(|p| p.id == owner))
}
