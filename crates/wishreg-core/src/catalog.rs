//! Gift catalog manager: the owner's CRUD over their wishlist, plus uploads.

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  Error, Result,
  gift::{Currency, Gift, GiftPatch, normalize_price},
  reservation::{self, GiftCard},
  social,
  store::{BlobStore, RegistryStore},
};

/// Object-name prefix for gift images.
pub const GIFT_IMAGE_PREFIX: &str = "gifts";

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// A file picked by the user, not yet in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
  pub media_type: String,
  pub bytes:      Bytes,
}

impl Upload {
  pub fn extension(&self) -> &'static str {
    match self.media_type.trim().to_ascii_lowercase().as_str() {
      "image/png" => "png",
      "image/jpeg" | "image/jpg" => "jpg",
      "image/gif" => "gif",
      "image/webp" => "webp",
      _ => "bin",
    }
  }

  /// Content-addressed object name: `{prefix}/{owner}/{sha256}.{ext}`.
  pub fn object_path(&self, prefix: &str, owner: Uuid) -> String {
    let digest = hex::encode(Sha256::digest(&self.bytes));
    format!("{prefix}/{owner}/{digest}.{}", self.extension())
  }
}

/// Where an image reference comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
  #[default]
  None,
  /// Keep this URL as-is.
  Link(String),
  /// Upload first, then store the resulting public URL.
  Upload(Upload),
}

/// Turn an [`ImageSource`] into the URL to persist, uploading if needed.
pub async fn resolve_image<B: BlobStore>(
  blobs: &B,
  prefix: &str,
  owner: Uuid,
  source: ImageSource,
) -> Result<Option<String>> {
  match source {
    ImageSource::None => Ok(None),
    ImageSource::Link(url) => {
      let url = url.trim();
      Ok((!url.is_empty()).then(|| url.to_owned()))
    }
    ImageSource::Upload(upload) => {
      let path = upload.object_path(prefix, owner);
      blobs
        .put(path.clone(), upload.bytes, upload.media_type)
        .await
        .map_err(Error::upstream)?;
      tracing::debug!(%path, "image uploaded");
      Ok(Some(blobs.public_url(&path)))
    }
  }
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// The add/edit gift form.
#[derive(Debug, Clone, Default)]
pub struct GiftDraft {
  pub name:        String,
  /// Raw user input; normalised to digits before it is stored.
  pub price:       String,
  pub currency:    Currency,
  pub description: String,
  pub image:       ImageSource,
}

impl GiftDraft {
  async fn into_patch<B: BlobStore>(self, blobs: &B, owner: Uuid) -> Result<GiftPatch> {
    let name = self.name.trim();
    if name.is_empty() {
      return Err(Error::InvalidInput("gift name must not be empty".into()));
    }
    let name = name.to_owned();
    let image_url = resolve_image(blobs, GIFT_IMAGE_PREFIX, owner, self.image).await?;
    Ok(GiftPatch {
      name,
      price: normalize_price(&self.price),
      currency: self.currency,
      description: self.description.trim().to_owned(),
      image_url,
    })
  }
}

/// Optional free-text narrowing of a wishlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilter {
  pub text: Option<String>,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Gifts on `owner_id`'s list, oldest first, optionally narrowed by
/// [`ListFilter::text`].
pub async fn list<S: RegistryStore>(
  store: &S,
  owner_id: Uuid,
  filter: &ListFilter,
) -> Result<Vec<Gift>> {
  let needle = filter.text.as_deref().unwrap_or_default();
  let mut gifts: Vec<Gift> = store
    .list_gifts()
    .await
    .map_err(Error::upstream)?
    .into_iter()
    .filter(|g| g.owner_id == owner_id && g.matches(needle))
    .collect();
  gifts.sort_by_key(|g| g.created_at);
  Ok(gifts)
}

pub async fn get<S: RegistryStore>(store: &S, gift_id: Uuid) -> Result<Gift> {
  store
    .get_gift(gift_id)
    .await
    .map_err(Error::upstream)?
    .ok_or(Error::GiftNotFound(gift_id))
}

/// `owner_id`'s list as `viewer` sees it. The viewer must be the owner or
/// someone in their visible set.
pub async fn wishlist<S: RegistryStore>(
  store: &S,
  viewer: Uuid,
  owner_id: Uuid,
  filter: &ListFilter,
) -> Result<Vec<GiftCard>> {
  if !social::can_view(store, viewer, owner_id).await? {
    return Err(Error::ListHidden(owner_id));
  }
  let roster = social::visible_people(store, viewer).await?;
  Ok(
    list(store, owner_id, filter)
      .await?
      .into_iter()
      .map(|gift| reservation::present(gift, viewer, &roster))
      .collect(),
  )
}

/// A single gift as `viewer` sees it, under the same visibility rule as
/// [`wishlist`].
pub async fn card<S: RegistryStore>(store: &S, viewer: Uuid, gift_id: Uuid) -> Result<GiftCard> {
  let gift = get(store, gift_id).await?;
  if !social::can_view(store, viewer, gift.owner_id).await? {
    return Err(Error::ListHidden(gift.owner_id));
  }
  let roster = social::visible_people(store, viewer).await?;
  Ok(reservation::present(gift, viewer, &roster))
}

async fn owned<S: RegistryStore>(store: &S, gift_id: Uuid, actor: Uuid) -> Result<Gift> {
  let gift = get(store, gift_id).await?;
  if gift.owner_id != actor {
    return Err(Error::NotGiftOwner(gift_id));
  }
  Ok(gift)
}

pub async fn create<S: RegistryStore, B: BlobStore>(
  store: &S,
  blobs: &B,
  owner_id: Uuid,
  draft: GiftDraft,
) -> Result<Gift> {
  let patch = draft.into_patch(blobs, owner_id).await?;
  let gift = Gift {
    id: Uuid::new_v4(),
    owner_id,
    name: patch.name,
    price: patch.price,
    currency: patch.currency,
    description: patch.description,
    image_url: patch.image_url,
    reserved_by: None,
    created_at: Utc::now(),
  };
  let gift = store.insert_gift(gift).await.map_err(Error::upstream)?;
  tracing::info!(gift = %gift.id, owner = %owner_id, "gift added");
  Ok(gift)
}

/// Replace the editable fields of `gift_id`. Only the owner may do this and
/// the owner can never be changed.
pub async fn update<S: RegistryStore, B: BlobStore>(
  store: &S,
  blobs: &B,
  actor: Uuid,
  gift_id: Uuid,
  draft: GiftDraft,
) -> Result<Gift> {
  owned(store, gift_id, actor).await?;
  let patch = draft.into_patch(blobs, actor).await?;
  let touched = store
    .update_gift(gift_id, patch)
    .await
    .map_err(Error::upstream)?;
  if touched == 0 {
    return Err(Error::GiftNotFound(gift_id));
  }
  tracing::info!(gift = %gift_id, "gift updated");
  get(store, gift_id).await
}

/// Remove `gift_id`. Any reservation goes with the row.
pub async fn delete<S: RegistryStore>(store: &S, actor: Uuid, gift_id: Uuid) -> Result<()> {
  owned(store, gift_id, actor).await?;
  store.delete_gift(gift_id).await.map_err(Error::upstream)?;
  tracing::info!(gift = %gift_id, "gift removed");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn object_path_is_content_addressed() {
    let owner = Uuid::nil();
    let upload = Upload { media_type: "image/PNG".into(), bytes: Bytes::from_static(b"abc") };
    assert_eq!(
      upload.object_path("gifts", owner),
      format!(
        "gifts/{owner}/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png"
      )
    );
  }

  #[test]
  fn unknown_media_type_gets_bin() {
    let upload = Upload { media_type: "application/x-thing".into(), bytes: Bytes::new() };
    assert_eq!(upload.extension(), "bin");
  }
}
