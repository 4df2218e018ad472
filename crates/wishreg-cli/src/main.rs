//! `wishreg` — command-line client for the wishreg gift registry.
//!
//! # Usage
//!
//! ```
//! wishreg signin ada@example.com 'hunter22'      # prints a session token
//! export WISHREG_TOKEN=<token>
//! wishreg gifts add "Keyboard" --price 150000 --currency NGN
//! wishreg --config ~/.config/wishreg/config.toml circle
//! ```

mod client;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, FileUpload};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use wishreg_core::{
  gift::{Currency, Gift},
  profiles::ProfileView,
};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "wishreg", about = "Command-line client for the wishreg gift registry")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the wishreg server (default: http://localhost:8080).
  #[arg(long, env = "WISHREG_URL", global = true)]
  url: Option<String>,

  /// Session token from `wishreg signin`.
  #[arg(long, env = "WISHREG_TOKEN", global = true, hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account.
  Signup {
    email:    String,
    password: String,
    /// Display name; defaults to the part of the email before `@`.
    #[arg(long)]
    name:     Option<String>,
  },
  /// Sign in and print a session token.
  Signin { email: String, password: String },
  /// End the current session.
  Signout,
  /// Show your profile.
  Me,
  /// Edit your profile.
  Profile(ProfileArgs),
  /// Find people by name or username.
  Search { term: String },
  /// Follow someone (they follow you back).
  Follow { id: Uuid },
  /// Remove someone from your circle.
  Unfollow { id: Uuid },
  /// People you follow.
  Circle,
  /// Everyone whose list you can open.
  Visible,
  /// Manage groups.
  #[command(subcommand)]
  Groups(GroupsCommand),
  /// Manage wishlists.
  #[command(subcommand)]
  Gifts(GiftsCommand),
  /// Reserve a gift.
  Reserve { id: Uuid },
  /// Release your reservation.
  Release { id: Uuid },
  /// Reserve if free, release if yours.
  Toggle { id: Uuid },
  /// List supported currencies.
  Currencies,
}

#[derive(clap::Args, Debug)]
struct ProfileArgs {
  /// Full name.
  #[arg(long)]
  name:       Option<String>,
  #[arg(long)]
  username:   Option<String>,
  /// `YYYY-MM-DD`.
  #[arg(long)]
  birthday:   Option<NaiveDate>,
  /// Invite code of a group to join while saving.
  #[arg(long)]
  join:       Option<String>,
  #[arg(long, conflicts_with = "avatar_file")]
  avatar_url: Option<String>,
  /// Image file to upload as the avatar.
  #[arg(long)]
  avatar_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum GroupsCommand {
  /// Your groups and their members.
  List,
  /// Create a group and print its invite code.
  Create { name: String },
  /// Join a group by invite code.
  Join { code: String },
}

#[derive(clap::Args, Debug)]
struct GiftFields {
  /// Price; anything but digits is ignored. Empty means "Any Price".
  #[arg(long, default_value = "")]
  price:       String,
  #[arg(long, default_value_t = Currency::default())]
  currency:    Currency,
  #[arg(long, default_value = "")]
  description: String,
  #[arg(long, conflicts_with = "image_file")]
  image_url:   Option<String>,
  /// Image file to upload.
  #[arg(long)]
  image_file:  Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GiftEdits {
  #[arg(long)]
  name:        Option<String>,
  #[arg(long)]
  price:       Option<String>,
  #[arg(long)]
  currency:    Option<Currency>,
  #[arg(long)]
  description: Option<String>,
  #[arg(long, conflicts_with = "image_file")]
  image_url:   Option<String>,
  #[arg(long)]
  image_file:  Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum GiftsCommand {
  /// Show a wishlist (your own by default).
  List {
    /// Whose list to show.
    #[arg(long)]
    owner: Option<Uuid>,
    /// Only gifts whose name or description contains this.
    #[arg(long, short)]
    query: Option<String>,
  },
  /// Show one gift.
  Show { id: Uuid },
  /// Add a gift to your list.
  Add {
    name: String,
    #[command(flatten)]
    fields: GiftFields,
  },
  /// Change a gift's details. Flags left out keep their current values.
  Edit {
    id: Uuid,
    #[command(flatten)]
    edits: GiftEdits,
  },
  /// Remove a gift from your list.
  Rm { id: Uuid },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

fn media_type_for(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}

async fn read_upload(path: &Path) -> Result<FileUpload> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading {}", path.display()))?;
  Ok(FileUpload { media_type: media_type_for(path).to_owned(), bytes })
}

async fn gift_body(name: String, fields: GiftFields) -> Result<Value> {
  let mut body = Map::new();
  body.insert("name".into(), json!(name));
  body.insert("price".into(), json!(fields.price));
  body.insert("currency".into(), json!(fields.currency));
  body.insert("description".into(), json!(fields.description));
  if let Some(url) = fields.image_url {
    body.insert("image_url".into(), json!(url));
  }
  if let Some(path) = fields.image_file {
    body.insert("image".into(), read_upload(&path).await?.to_json());
  }
  Ok(Value::Object(body))
}

/// Flags left unset keep their current values.
/// `current` with `edits` laid over it. The server replaces every field, so
/// anything not edited is sent back unchanged.
async fn edit_body(edits: GiftEdits, current: &Gift) -> Result<Value> {
  let mut body = Map::new();
  body.insert("name".into(), json!(edits.name.unwrap_or_else(|| current.name.clone())));
  body.insert("price".into(), json!(edits.price.unwrap_or_else(|| current.price.clone())));
  body.insert("currency".into(), json!(edits.currency.unwrap_or(current.currency)));
  let description = edits.description.unwrap_or_else(|| current.description.clone());
  body.insert("description".into(), json!(description));
  match edits.image_file {
    Some(path) => {
      body.insert("image".into(), read_upload(&path).await?.to_json());
    }
    None => {
      let image_url = edits.image_url.or_else(|| current.image_url.clone());
      body.insert("image_url".into(), json!(image_url));
    }
  }
  Ok(Value::Object(body))
}

async fn profile_body(args: ProfileArgs, current: &ProfileView) -> Result<Value> {
  let mut body = Map::new();
  let full_name = args.name.unwrap_or_else(|| current.display_name.clone());
  body.insert("full_name".into(), json!(full_name));
  body.insert("username".into(), json!(args.username));
  body.insert("birthday".into(), json!(args.birthday.or(current.birthday)));
  body.insert("group_code".into(), json!(args.join));
  if let Some(url) = args.avatar_url {
    body.insert("avatar_url".into(), json!(url));
  }
  if let Some(path) = args.avatar_file {
    body.insert("avatar".into(), read_upload(&path).await?.to_json());
  }
  Ok(Value::Object(body))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args
      .token
      .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone())),
  };
  let signed_in = api_config.token.is_some();
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Signup { .. } | Command::Signin { .. } => {}
    _ if !signed_in => bail!("not signed in: run `wishreg signin` and set WISHREG_TOKEN"),
    _ => {}
  }

  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Signup { email, password, name } => {
      let identity = client.sign_up(&email, &password, name.as_deref()).await?;
      println!("Created account for {} ({})", identity.display_name(), identity.id);
    }
    Command::Signin { email, password } => {
      let session = client.sign_in(&email, &password).await?;
      eprintln!("Signed in as {}", session.identity.display_name());
      println!("{}", session.token);
    }
    Command::Signout => {
      client.sign_out().await?;
      println!("Signed out");
    }
    Command::Me => render::profile(&client.me().await?),
    Command::Profile(profile) => {
      let current = client.me().await?;
      let saved = client.save_profile(&profile_body(profile, &current).await?).await?;
      render::profile_saved(&saved);
    }
    Command::Search { term } => render::people(&client.search(&term).await?),
    Command::Follow { id } => {
      client.follow(id).await?;
      println!("Following {id}");
    }
    Command::Unfollow { id } => {
      client.unfollow(id).await?;
      println!("Unfollowed {id}");
    }
    Command::Circle => render::people(&client.circle().await?),
    Command::Visible => render::people(&client.visible().await?),
    Command::Groups(GroupsCommand::List) => render::rosters(&client.groups().await?),
    Command::Groups(GroupsCommand::Create { name }) => {
      let group = client.create_group(&name).await?;
      println!("Created {} with invite code {}", group.name, group.code);
    }
    Command::Groups(GroupsCommand::Join { code }) => {
      let group = client.join_group(&code).await?;
      println!("Joined {}", group.name);
    }
    Command::Gifts(GiftsCommand::List { owner, query }) => {
      let owner = match owner {
        Some(owner) => owner,
        None => client.me().await?.id,
      };
      render::cards(&client.wishlist(owner, query.as_deref()).await?);
    }
    Command::Gifts(GiftsCommand::Show { id }) => render::card(&client.gift(id).await?),
    Command::Gifts(GiftsCommand::Add { name, fields }) => {
      let gift = client.create_gift(&gift_body(name, fields).await?).await?;
      println!("Added {} ({})", gift.name, gift.id);
    }
    Command::Gifts(GiftsCommand::Edit { id, edits }) => {
      let current = client.gift(id).await?.gift;
      let gift = client.update_gift(id, &edit_body(edits, &current).await?).await?;
      println!("Updated {} ({})", gift.name, gift.display_price());
    }
    Command::Gifts(GiftsCommand::Rm { id }) => {
      client.delete_gift(id).await?;
      println!("Removed {id}");
    }
    Command::Reserve { id } => render::outcome(client.reserve(id).await?),
    Command::Release { id } => render::outcome(client.release(id).await?),
    Command::Toggle { id } => render::outcome(client.toggle(id).await?),
    Command::Currencies => {
      for c in client.currencies().await? {
        println!(
          "{:<4} {}",
          c["code"].as_str().unwrap_or_default(),
          c["symbol"].as_str().unwrap_or_default()
        );
      }
    }
  }
  Ok(())
}
