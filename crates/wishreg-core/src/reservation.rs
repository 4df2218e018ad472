//! Reservation engine: claiming and releasing gifts, and deriving how a gift
//! looks to a given viewer.
//!
//! Two viewers may race to claim the same gift. Every write here goes through
//! [`RegistryStore::set_reserved_by`], a compare-and-swap on `reserved_by`;
//! a zero row count means another client got there first and is reported as
//! [`ReservationOutcome::RaceLost`], never as success.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  gift::Gift,
  graph::Person,
  social,
  store::RegistryStore,
};

/// Label used when the reserver is not among the people the viewer can see.
pub const UNKNOWN_RESERVER: &str = "Someone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationOutcome {
  Reserved,
  Released,
  /// The conditional write touched no row: someone else changed the gift
  /// first. Refresh and show current state; do not retry blindly.
  RaceLost,
}

async fn load<S: RegistryStore>(store: &S, gift_id: Uuid) -> Result<Gift> {
  store
    .get_gift(gift_id)
    .await
    .map_err(Error::upstream)?
    .ok_or(Error::GiftNotFound(gift_id))
}

async fn claim<S: RegistryStore>(
  store: &S,
  gift: &Gift,
  actor: Uuid,
) -> Result<ReservationOutcome> {
  if gift.owner_id == actor {
    return Err(Error::OwnGiftReservation(gift.id));
  }
  if !social::can_view(store, actor, gift.owner_id).await? {
    return Err(Error::ListHidden(gift.owner_id));
  }
  match gift.reserved_by {
    Some(holder) if holder == actor => return Ok(ReservationOutcome::Reserved),
    Some(holder) => {
      tracing::warn!(gift = %gift.id, %holder, "gift already reserved");
      return Ok(ReservationOutcome::RaceLost);
    }
    None => {}
  }

  let touched = store
    .set_reserved_by(gift.id, None, Some(actor))
    .await
    .map_err(Error::upstream)?;
  if touched == 0 {
    tracing::warn!(gift = %gift.id, user = %actor, "lost reservation race");
    return Ok(ReservationOutcome::RaceLost);
  }
  tracing::info!(gift = %gift.id, user = %actor, "gift reserved");
  Ok(ReservationOutcome::Reserved)
}

async fn unclaim<S: RegistryStore>(
  store: &S,
  gift: &Gift,
  actor: Uuid,
) -> Result<ReservationOutcome> {
  if gift.reserved_by != Some(actor) {
    return Err(Error::NotReserver(gift.id));
  }
  let touched = store
    .set_reserved_by(gift.id, Some(actor), None)
    .await
    .map_err(Error::upstream)?;
  if touched == 0 {
    tracing::warn!(gift = %gift.id, user = %actor, "reservation changed before release");
    return Ok(ReservationOutcome::RaceLost);
  }
  tracing::info!(gift = %gift.id, user = %actor, "reservation released");
  Ok(ReservationOutcome::Released)
}

/// Claim `gift_id` for `actor`.
///
/// The actor must be able to see the owner's list ([`Error::ListHidden`]
/// otherwise). Releasing a held reservation needs no such check.
///
/// Re-reserving a gift the actor already holds succeeds without a write. A
/// gift held by someone else reports [`ReservationOutcome::RaceLost`].
pub async fn reserve<S: RegistryStore>(
  store: &S,
  gift_id: Uuid,
  actor: Uuid,
) -> Result<ReservationOutcome> {
  let gift = load(store, gift_id).await?;
  claim(store, &gift, actor).await
}

/// Clear `actor`'s reservation on `gift_id`. Fails with
/// [`Error::NotReserver`] if the gift is free or held by someone else.
pub async fn release<S: RegistryStore>(
  store: &S,
  gift_id: Uuid,
  actor: Uuid,
) -> Result<ReservationOutcome> {
  let gift = load(store, gift_id).await?;
  unclaim(store, &gift, actor).await
}

/// Reserve a free gift, or release it if `actor` holds it.
pub async fn toggle<S: RegistryStore>(
  store: &S,
  gift_id: Uuid,
  actor: Uuid,
) -> Result<ReservationOutcome> {
  let gift = load(store, gift_id).await?;
  if gift.reserved_by.is_some_and(|holder| holder == actor) {
    unclaim(store, &gift, actor).await
  } else {
    claim(store, &gift, actor).await
  }
}

// ─── Display state ───────────────────────────────────────────────────────────

/// How a gift's reservation appears to a non-owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "by", rename_all = "snake_case")]
pub enum ReservationDisplay {
  Free,
  ReservedByViewer,
  ReservedByOther(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
  /// Sees edit and delete; never sees reservation state.
  Owner,
  Viewer,
}

/// Classify `gift` for `viewer`, naming the reserver from `roster`.
pub fn display_state(gift: &Gift, viewer: Uuid, roster: &[Person]) -> ReservationDisplay {
  match gift.reserved_by {
    None => ReservationDisplay::Free,
    Some(holder) if holder == viewer => ReservationDisplay::ReservedByViewer,
    Some(holder) => ReservationDisplay::ReservedByOther(
      roster
        .iter()
        .find(|p| p.id == holder)
        .map_or_else(|| UNKNOWN_RESERVER.to_owned(), |p| p.name.clone()),
    ),
  }
}

/// A gift as rendered in a wishlist grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCard {
  pub gift:        Gift,
  pub price_label: String,
  pub role:        ViewerRole,
  /// `None` for the owner, who never sees who reserved what.
  pub reservation: Option<ReservationDisplay>,
}

pub fn present(gift: Gift, viewer: Uuid, roster: &[Person]) -> GiftCard {
  let (role, reservation) = if gift.owner_id == viewer {
    (ViewerRole::Owner, None)
  } else {
    (ViewerRole::Viewer, Some(display_state(&gift, viewer, roster)))
  };
  GiftCard { price_label: gift.display_price(), gift, role, reservation }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::gift::Currency;

  fn gift(owner: Uuid, reserved_by: Option<Uuid>) -> Gift {
    Gift {
      id: Uuid::new_v4(),
      owner_id: owner,
      name: "Keyboard".into(),
      price: "150000".into(),
      currency: Currency::Ngn,
      description: String::new(),
      image_url: None,
      reserved_by,
      created_at: Utc::now(),
    }
  }

  fn person(id: Uuid, name: &str) -> Person {
    Person {
      id,
      name: name.into(),
      username: name.to_lowercase(),
      avatar_url: None,
      birthday: None,
    }
  }

  #[test]
  fn free_gift() {
    let g = gift(Uuid::new_v4(), None);
    assert_eq!(display_state(&g, Uuid::new_v4(), &[]), ReservationDisplay::Free);
  }

  #[test]
  fn three_viewers_of_one_reservation() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let roster = [person(a, "A"), person(b, "B"), person(c, "C")];
    let g = gift(a, Some(b));

    let for_b = present(g.clone(), b, &roster);
    assert_eq!(for_b.role, ViewerRole::Viewer);
    assert_eq!(for_b.reservation, Some(ReservationDisplay::ReservedByViewer));

    let for_c = present(g.clone(), c, &roster);
    assert_eq!(for_c.reservation, Some(ReservationDisplay::ReservedByOther("B".into())));

    let for_a = present(g, a, &roster);
    assert_eq!(for_a.role, ViewerRole::Owner);
    assert_eq!(for_a.reservation, None);
    assert_eq!(for_a.price_label, "₦150,000");
  }

  #[test]
  fn unknown_reserver_gets_generic_label() {
    let g = gift(Uuid::new_v4(), Some(Uuid::new_v4()));
    assert_eq!(
      display_state(&g, Uuid::new_v4(), &[]),
      ReservationDisplay::ReservedByOther(UNKNOWN_RESERVER.into())
    );
  }
}
