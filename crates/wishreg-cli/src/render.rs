//! Plain-text rendering of API responses.

use wishreg_core::{
  graph::{GroupRoster, Person},
  profiles::{self, GroupJoin, ProfileSaved, ProfileView},
  reservation::{GiftCard, ReservationDisplay, ReservationOutcome, ViewerRole},
};

pub fn profile(view: &ProfileView) {
  println!("{} (@{})", view.display_name, view.username);
  println!("  id:       {}", view.id);
  println!("  email:    {}", view.email);
  println!("  birthday: {}", profiles::format_birthday(view.birthday));
  println!(
    "  avatar:   {}",
    profiles::avatar_or_placeholder(&view.display_name, view.avatar_url.as_deref())
  );
  if let Some(code) = &view.group_code {
    println!("  group:    {code}");
  }
}

pub fn profile_saved(saved: &ProfileSaved) {
  profile(&saved.profile);
  match &saved.group_join {
    Some(GroupJoin::Joined { group }) => println!("Joined {}", group.name),
    Some(GroupJoin::Failed { reason }) => eprintln!("Profile saved, but joining failed: {reason}"),
    None => {}
  }
  if let Some(sidebar) = &saved.sidebar {
    rosters(sidebar);
  }
}

pub fn people(people: &[Person]) {
  if people.is_empty() {
    println!("No one found.");
    return;
  }
  for p in people {
    println!("{}  {} (@{})", p.id, p.name, p.username);
  }
}

pub fn rosters(rosters: &[GroupRoster]) {
  if rosters.is_empty() {
    println!("You are not in any groups.");
    return;
  }
  for r in rosters {
    println!("{} [{}]", r.group.name, r.group.code);
    if r.members.is_empty() {
      println!("  (no other members)");
    }
    for m in &r.members {
      println!("  {}  {}", m.id, m.name);
    }
  }
}

fn reservation_label(card: &GiftCard) -> String {
  match (&card.role, &card.reservation) {
    (ViewerRole::Owner, _) => "yours".to_owned(),
    (_, None | Some(ReservationDisplay::Free)) => "available".to_owned(),
    (_, Some(ReservationDisplay::ReservedByViewer)) => "reserved by you".to_owned(),
    (_, Some(ReservationDisplay::ReservedByOther(name))) => format!("reserved by {name}"),
  }
}

pub fn card(card: &GiftCard) {
  println!("{}  {}", card.gift.id, card.gift.name);
  println!("  price:  {}", card.price_label);
  println!("  status: {}", reservation_label(card));
  if !card.gift.description.is_empty() {
    println!("  {}", card.gift.description);
  }
  if let Some(url) = &card.gift.image_url {
    println!("  image:  {url}");
  }
}

pub fn cards(cards: &[GiftCard]) {
  if cards.is_empty() {
    println!("No gifts.");
    return;
  }
  for c in cards {
    println!("{}  {:<30} {:>14}  {}", c.gift.id, c.gift.name, c.price_label, reservation_label(c));
  }
}

pub fn outcome(outcome: ReservationOutcome) {
  match outcome {
    ReservationOutcome::Reserved => println!("Reserved."),
    ReservationOutcome::Released => println!("Released."),
    ReservationOutcome::RaceLost => {
      eprintln!("Someone else changed this gift first. Refresh and try again.")
    }
  }
}
