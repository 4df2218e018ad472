//! Dashboard view state.
//!
//! The whole screen is one [`DashboardState`] value changed only through
//! [`DashboardState::apply`]. At most one modal is open at a time, its edit
//! buffer lives inside the [`Modal`] variant, and `busy` blocks duplicate
//! submissions while a request is in flight.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  catalog::{GiftDraft, ImageSource, Upload},
  gift::{Currency, Gift},
  profiles::{ProfileDraft, ProfileView},
};

/// Inline `data:` URL used to preview a picked file before it is uploaded.
pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
  format!("data:{media_type};base64,{}", B64.encode(bytes))
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftForm {
  pub name:        String,
  pub price:       String,
  pub currency:    Currency,
  pub description: String,
  pub image_link:  String,
  pub upload:      Option<Upload>,
}

impl GiftForm {
  fn from_gift(gift: &Gift) -> Self {
    Self {
      name:        gift.name.clone(),
      price:       gift.price.clone(),
      currency:    gift.currency,
      description: gift.description.clone(),
      image_link:  gift.image_url.clone().unwrap_or_default(),
      upload:      None,
    }
  }

  /// What the image slot shows right now.
  pub fn image_preview(&self) -> Option<String> {
    match &self.upload {
      Some(u) => Some(data_url(&u.media_type, &u.bytes)),
      None => (!self.image_link.trim().is_empty()).then(|| self.image_link.clone()),
    }
  }

  pub fn to_draft(&self) -> GiftDraft {
    GiftDraft {
      name:        self.name.clone(),
      price:       self.price.clone(),
      currency:    self.currency,
      description: self.description.clone(),
      image:       image_source(self.upload.as_ref(), &self.image_link),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
  pub full_name:  String,
  pub birthday:   Option<NaiveDate>,
  pub group_code: String,
  pub avatar_url: String,
  pub upload:     Option<Upload>,
}

impl ProfileForm {
  fn from_view(view: &ProfileView) -> Self {
    Self {
      full_name:  view.display_name.clone(),
      birthday:   view.birthday,
      group_code: String::new(),
      avatar_url: view.avatar_url.clone().unwrap_or_default(),
      upload:     None,
    }
  }

  /// A local preview for a picked file, otherwise the stored URL. The preview
  /// is never persisted.
  pub fn avatar_preview(&self) -> Option<String> {
    match &self.upload {
      Some(u) => Some(data_url(&u.media_type, &u.bytes)),
      None => (!self.avatar_url.trim().is_empty()).then(|| self.avatar_url.clone()),
    }
  }

  pub fn to_draft(&self) -> ProfileDraft {
    ProfileDraft {
      full_name:  self.full_name.clone(),
      username:   None,
      avatar:     image_source(self.upload.as_ref(), &self.avatar_url),
      birthday:   self.birthday,
      group_code: Some(self.group_code.clone()).filter(|c| !c.trim().is_empty()),
    }
  }
}

fn image_source(upload: Option<&Upload>, link: &str) -> ImageSource {
  match upload {
    Some(u) => ImageSource::Upload(u.clone()),
    None if !link.trim().is_empty() => ImageSource::Link(link.trim().to_owned()),
    None => ImageSource::None,
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Modal {
  #[default]
  None,
  AddGift(GiftForm),
  EditGift { gift_id: Uuid, form: GiftForm },
  Profile(ProfileForm),
  CreateGroup { name: String },
  JoinGroup { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub id:      u64,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
  pub viewer:            Uuid,
  /// Whose wishlist is on screen.
  pub active_list:       Uuid,
  pub search:            String,
  pub modal:             Modal,
  pub busy:              bool,
  pub notifications:     Vec<Notification>,
  next_notification:     u64,
}

/// A single edit to whichever form is open. Edits that do not fit the open
/// modal are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
  GiftName(String),
  GiftPrice(String),
  GiftCurrency(Currency),
  GiftDescription(String),
  GiftImageLink(String),
  ProfileName(String),
  ProfileBirthday(Option<NaiveDate>),
  ProfileGroupCode(String),
  /// The group name or invite code field.
  GroupText(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  SelectList(Uuid),
  Search(String),
  OpenAddGift,
  OpenEditGift(Gift),
  OpenProfile(ProfileView),
  OpenCreateGroup,
  OpenJoinGroup,
  Close,
  Edit(FormEdit),
  PickFile { media_type: String, bytes: Bytes },
  Submit,
  /// The in-flight request succeeded.
  Completed { message: String },
  /// The in-flight request failed; the modal and its buffer stay as they were.
  Failed { message: String },
  Dismiss(u64),
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone)]
pub enum Command {
  CreateGift(GiftDraft),
  UpdateGift { gift_id: Uuid, draft: GiftDraft },
  SaveProfile(ProfileDraft),
  CreateGroup(String),
  JoinGroup(String),
  /// Re-fetch the affected collections; the only way state catches up.
  Refresh,
}

impl DashboardState {
  pub fn new(viewer: Uuid) -> Self {
    Self {
      viewer,
      active_list: viewer,
      search: String::new(),
      modal: Modal::None,
      busy: false,
      notifications: Vec::new(),
      next_notification: 1,
    }
  }

  pub fn is_own_list(&self) -> bool { self.active_list == self.viewer }

  fn notify(&mut self, message: String) {
    let id = self.next_notification;
    self.next_notification += 1;
    self.notifications.push(Notification { id, message });
  }

  fn open(&mut self, modal: Modal) {
    if !self.busy {
      self.modal = modal;
    }
  }

  pub fn apply(&mut self, action: Action) -> Option<Command> {
    match action {
      Action::SelectList(id) => {
        self.active_list = id;
        self.search.clear();
        Some(Command::Refresh)
      }
      Action::Search(text) => {
        self.search = text;
        None
      }
      Action::OpenAddGift if self.is_own_list() => {
        self.open(Modal::AddGift(GiftForm::default()));
        None
      }
      Action::OpenAddGift => None,
      Action::OpenEditGift(gift) if gift.owner_id == self.viewer => {
        self.open(Modal::EditGift { gift_id: gift.id, form: GiftForm::from_gift(&gift) });
        None
      }
      Action::OpenEditGift(_) => None,
      Action::OpenProfile(view) => {
        self.open(Modal::Profile(ProfileForm::from_view(&view)));
        None
      }
      Action::OpenCreateGroup => {
        self.open(Modal::CreateGroup { name: String::new() });
        None
      }
      Action::OpenJoinGroup => {
        self.open(Modal::JoinGroup { code: String::new() });
        None
      }
      Action::Close => {
        if !self.busy {
          self.modal = Modal::None;
        }
        None
      }
      Action::Edit(edit) => {
        if !self.busy {
          self.edit(edit);
        }
        None
      }
      Action::PickFile { media_type, bytes } => {
        if self.busy {
          return None;
        }
        let upload = Some(Upload { media_type, bytes });
        match &mut self.modal {
          Modal::AddGift(form) | Modal::EditGift { form, .. } => form.upload = upload,
          Modal::Profile(form) => form.upload = upload,
          _ => {}
        }
        None
      }
      Action::Submit => self.submit(),
      Action::Completed { message } => {
        self.busy = false;
        self.modal = Modal::None;
        self.notify(message);
        Some(Command::Refresh)
      }
      Action::Failed { message } => {
        self.busy = false;
        self.notify(message);
        None
      }
      Action::Dismiss(id) => {
        self.notifications.retain(|n| n.id != id);
        None
      }
    }
  }

  fn edit(&mut self, edit: FormEdit) {
    match (&mut self.modal, edit) {
      (Modal::AddGift(f) | Modal::EditGift { form: f, .. }, FormEdit::GiftName(v)) => f.name = v,
      (Modal::AddGift(f) | Modal::EditGift { form: f, .. }, FormEdit::GiftPrice(v)) => f.price = v,
      (Modal::AddGift(f) | Modal::EditGift { form: f, .. }, FormEdit::GiftCurrency(v)) => {
        f.currency = v
      }
      (Modal::AddGift(f) | Modal::EditGift { form: f, .. }, FormEdit::GiftDescription(v)) => {
        f.description = v
      }
      (Modal::AddGift(f) | Modal::EditGift { form: f, .. }, FormEdit::GiftImageLink(v)) => {
        f.image_link = v;
        f.upload = None;
      }
      (Modal::Profile(f), FormEdit::ProfileName(v)) => f.full_name = v,
      (Modal::Profile(f), FormEdit::ProfileBirthday(v)) => f.birthday = v,
      (Modal::Profile(f), FormEdit::ProfileGroupCode(v)) => f.group_code = v,
      (Modal::CreateGroup { name }, FormEdit::GroupText(v)) => *name = v,
      (Modal::JoinGroup { code }, FormEdit::GroupText(v)) => *code = v,
      _ => {}
    }
  }

  fn submit(&mut self) -> Option<Command> {
    if self.busy {
      return None;
    }
    let command = match &self.modal {
      Modal::None => return None,
      Modal::AddGift(form) => Command::CreateGift(form.to_draft()),
      Modal::EditGift { gift_id, form } => {
        Command::UpdateGift { gift_id: *gift_id, draft: form.to_draft() }
      }
      Modal::Profile(form) => Command::SaveProfile(form.to_draft()),
      Modal::CreateGroup { name } => Command::CreateGroup(name.clone()),
      Modal::JoinGroup { code } => Command::JoinGroup(code.clone()),
    };
    self.busy = true;
    Some(command)
  }
}
