//! Gifts, currencies and price handling.
//!
//! Prices are stored as bare digit strings (`"3000000"`) alongside a currency
//! code; grouping and the currency symbol are applied only when rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Currency ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
  #[default]
  Ngn,
  Eur,
  Gbp,
  Jpy,
  Usd,
  Cad,
  Aud,
  Inr,
}

/// Shown for currency codes outside the table.
pub const FALLBACK_SYMBOL: &str = "¤";

impl Currency {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Ngn => "₦",
      Self::Eur => "€",
      Self::Gbp => "£",
      Self::Jpy => "¥",
      Self::Usd => "$",
      Self::Cad => "C$",
      Self::Aud => "A$",
      Self::Inr => "₹",
    }
  }

  /// Symbol for an arbitrary stored code, falling back to [`FALLBACK_SYMBOL`].
  pub fn symbol_for_code(code: &str) -> &'static str {
    code
      .trim()
      .parse::<Self>()
      .map_or(FALLBACK_SYMBOL, Self::symbol)
  }
}

// ─── Price ───────────────────────────────────────────────────────────────────

/// Strip everything but ASCII digits: `"₦3,000,000"` becomes `"3000000"`.
pub fn normalize_price(input: &str) -> String {
  input.chars().filter(char::is_ascii_digit).collect()
}

/// Insert a `,` every three digits from the right.
pub fn group_digits(digits: &str) -> String {
  let len = digits.len();
  let mut out = String::with_capacity(len + len / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

/// Render a stored price as `{symbol}{grouped-digits}`.
///
/// An empty price means the owner did not set one.
pub fn format_price(stored: &str, currency_code: &str) -> String {
  let digits = normalize_price(stored);
  if digits.is_empty() {
    return "Any Price".to_owned();
  }
  format!("{}{}", Currency::symbol_for_code(currency_code), group_digits(&digits))
}

// ─── Gift ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
  pub id:          Uuid,
  /// Immutable after creation.
  pub owner_id:    Uuid,
  pub name:        String,
  /// Digits only; empty when no price was given.
  pub price:       String,
  pub currency:    Currency,
  pub description: String,
  pub image_url:   Option<String>,
  /// `None` is free; otherwise the identity holding the reservation.
  pub reserved_by: Option<Uuid>,
  pub created_at:  DateTime<Utc>,
}

impl Gift {
  pub fn is_reserved(&self) -> bool { self.reserved_by.is_some() }

  pub fn display_price(&self) -> String { format_price(&self.price, self.currency.as_ref()) }

  /// Case-insensitive substring match on name or description. A blank needle
  /// matches everything.
  pub fn matches(&self, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty()
      || self.name.to_lowercase().contains(&needle)
      || self.description.to_lowercase().contains(&needle)
  }
}

/// Owner-editable fields. Never carries `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftPatch {
  pub name:        String,
  pub price:       String,
  pub currency:    Currency,
  pub description: String,
  pub image_url:   Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_symbols_and_separators() {
    assert_eq!(normalize_price("3,000,000"), "3000000");
    assert_eq!(normalize_price("₦150,000.00"), "15000000");
    assert_eq!(normalize_price("Any"), "");
  }

  #[test]
  fn grouping() {
    assert_eq!(group_digits(""), "");
    assert_eq!(group_digits("7"), "7");
    assert_eq!(group_digits("999"), "999");
    assert_eq!(group_digits("1000"), "1,000");
    assert_eq!(group_digits("150000"), "150,000");
    assert_eq!(group_digits("3000000"), "3,000,000");
  }

  #[test]
  fn format_uses_symbol_table() {
    assert_eq!(format_price("150000", "NGN"), "₦150,000");
    assert_eq!(format_price("25", "usd"), "$25");
    assert_eq!(format_price("1200", "CAD"), "C$1,200");
    assert_eq!(format_price("1200", "AUD"), "A$1,200");
    assert_eq!(format_price("1200", "XYZ"), "¤1,200");
    assert_eq!(format_price("", "EUR"), "Any Price");
  }

  #[test]
  fn price_round_trip_is_stable() {
    for input in ["3,000,000", "150000", "1,2,3", "₦ 42", "0", "Any", "10.000"] {
      let once = normalize_price(input);
      for code in ["NGN", "CAD", "AUD", "JPY", "??"] {
        assert_eq!(normalize_price(&format_price(&once, code)), once, "{input} / {code}");
      }
    }
  }

  #[test]
  fn currency_codes_parse_case_insensitively() {
    assert_eq!("gbp".parse::<Currency>().unwrap(), Currency::Gbp);
    assert_eq!(Currency::Inr.to_string(), "INR");
    assert!("BTC".parse::<Currency>().is_err());
  }

  #[test]
  fn matches_name_or_description() {
    let gift = Gift {
      id:          Uuid::new_v4(),
      owner_id:    Uuid::new_v4(),
      name:        "Mechanical Keyboard".into(),
      price:       "150000".into(),
      currency:    Currency::Ngn,
      description: "Brown switches please".into(),
      image_url:   None,
      reserved_by: None,
      created_at:  Utc::now(),
    };
    assert!(gift.matches("keyboard"));
    assert!(gift.matches("BROWN"));
    assert!(gift.matches("  "));
    assert!(!gift.matches("mouse"));
  }
}
