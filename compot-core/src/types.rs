use crate::error::{CoreError, Result};
use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Monetary amount in pence.
///
/// Persisted as a decimal pounds number so stored records keep the
/// `125.0` shape; arithmetic stays in integer minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    pub const fn from_pounds_whole(pounds: i64) -> Self {
        Self(pounds * 100)
    }

    /// Largest magnitude the ledger will hold: one billion pounds.
    pub const MAX: Money = Money(100_000_000_000);

    /// Convert a pounds value, rejecting anything non-finite or beyond
    /// [`Money::MAX`].
    pub fn try_from_pounds(pounds: f64) -> Option<Self> {
        if !pounds.is_finite() {
            return None;
        }
        let pence = (pounds * 100.0).round();
        if pence.abs() > Self::MAX.0 as f64 {
            return None;
        }
        Some(Self(pence as i64))
    }

    pub const fn pence(self) -> i64 {
        self.0
    }

    pub fn to_pounds(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    fn in_bounds(self) -> bool {
        self.0.unsigned_abs() <= Self::MAX.0.unsigned_abs()
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self).filter(|m| m.in_bounds())
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self).filter(|m| m.in_bounds())
    }

    pub fn checked_mul(self, qty: u32) -> Option<Self> {
        self.0
            .checked_mul(i64::from(qty))
            .map(Self)
            .filter(|m| m.in_bounds())
    }

    /// Display with an explicit sign, as used in the transaction list.
    pub fn signed(self) -> String {
        if self.0 >= 0 {
            format!("+{}", self)
        } else {
            format!("-{}", self.abs())
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}£{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('£');
        let pounds: f64 = trimmed
            .parse()
            .map_err(|_| CoreError::invalid_amount(format!("'{}' is not an amount", s)))?;
        Money::try_from_pounds(pounds)
            .ok_or_else(|| CoreError::invalid_amount(format!("'{}' is out of range", s)))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_pounds())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pounds = f64::deserialize(deserializer)?;
        Money::try_from_pounds(pounds)
            .ok_or_else(|| serde::de::Error::custom(format!("amount {} is out of range", pounds)))
    }
}

/// Highest ticket number ever issued. Stored records are read by
/// JavaScript clients too, so numbers stay within the exact-integer range
/// of an `f64`.
pub const MAX_TICKET_NO: u64 = (1 << 53) - 1;

/// Inclusive range of consecutive ticket numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketRange {
    pub start: u64,
    pub end: u64,
}

impl TicketRange {
    /// `quantity` numbers starting at `start`; `None` if the range would
    /// run past [`MAX_TICKET_NO`].
    pub fn new(start: u64, quantity: u32) -> Option<Self> {
        let end = start.checked_add(u64::from(quantity.max(1)) - 1)?;
        (end <= MAX_TICKET_NO).then_some(Self { start, end })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn overlaps(&self, other: &TicketRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for TicketRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "#{}", self.start)
        } else {
            write!(f, "#{}–{}", self.start, self.end)
        }
    }
}

impl FromStr for TicketRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || CoreError::corrupt(format!("invalid ticket range '{}'", s));
        let body = s.trim().strip_prefix('#').ok_or_else(bad)?;

        let (start, end) = match body.split_once(['–', '-']) {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (body, body),
        };
        let start: u64 = start.parse().map_err(|_| bad())?;
        let end: u64 = end.parse().map_err(|_| bad())?;
        if end < start {
            return Err(bad());
        }

        Ok(Self { start, end })
    }
}

impl Serialize for TicketRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TicketRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    Live,
    Drawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(rename = "compId")]
    pub competition_id: String,
    #[serde(rename = "compName", default)]
    pub competition_name: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(rename = "ticketRange")]
    pub range: TicketRange,
    /// Zero when missing from a stored record; repaired from the range on load.
    #[serde(rename = "qty", default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub date: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    pub amount: Money, // +ve for credits, -ve for debits
}

impl Transaction {
    pub fn now(description: impl Into<String>, amount: Money) -> Self {
        Self {
            date: Local::now().format("%d %b %Y").to_string(),
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    #[serde(default)]
    pub sold: u32,
    pub cap: u32,
    #[serde(rename = "price", default)]
    pub price_per_ticket: Money,
    #[serde(default)]
    pub odds: String,
    #[serde(rename = "ends", default)]
    pub ends_label: String,
}

impl Competition {
    pub fn remaining(&self) -> u32 {
        self.cap.saturating_sub(self.sold)
    }

    pub fn is_sold_out(&self) -> bool {
        self.sold >= self.cap
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: "John Smith".to_string(),
            email: "john@example.com".to_string(),
        }
    }
}

/// The single persisted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub user: User,
    pub balance: Money,
    pub next_ticket_no: u64,
    pub tickets: Vec<TicketRecord>,
    pub transactions: Vec<Transaction>,
    pub competitions: BTreeMap<String, Competition>,
}

pub const DEFAULT_BALANCE: Money = Money::from_pounds_whole(125);
pub const DEFAULT_NEXT_TICKET_NO: u64 = 1500;

pub fn default_competitions() -> BTreeMap<String, Competition> {
    let mut competitions = BTreeMap::new();
    competitions.insert(
        "weekly-1000".to_string(),
        Competition {
            sold: 650,
            cap: 1000,
            price_per_ticket: Money::from_pounds_whole(5),
            odds: "1 in 1000".to_string(),
            ends_label: "Ends in 3 days".to_string(),
        },
    );
    competitions.insert(
        "midweek-500".to_string(),
        Competition {
            sold: 410,
            cap: 500,
            price_per_ticket: Money::from_pounds_whole(2),
            odds: "1 in 500".to_string(),
            ends_label: "Ends tomorrow".to_string(),
        },
    );
    competitions
}

impl Default for State {
    fn default() -> Self {
        Self {
            user: User::default(),
            balance: DEFAULT_BALANCE,
            next_ticket_no: DEFAULT_NEXT_TICKET_NO,
            tickets: vec![
                TicketRecord {
                    competition_id: "weekly-1000".to_string(),
                    competition_name: "Weekly Community Draw".to_string(),
                    status: TicketStatus::Live,
                    range: TicketRange { start: 1023, end: 1027 },
                    quantity: 5,
                },
                TicketRecord {
                    competition_id: "midweek-500".to_string(),
                    competition_name: "Midweek Quick Draw".to_string(),
                    status: TicketStatus::Live,
                    range: TicketRange { start: 1201, end: 1202 },
                    quantity: 2,
                },
            ],
            transactions: vec![
                Transaction {
                    date: "12 Jan 2026".to_string(),
                    description: "Flash Draw – Winnings".to_string(),
                    amount: Money::from_pounds_whole(250),
                },
                Transaction {
                    date: "10 Jan 2026".to_string(),
                    description: "Weekly Draw Tickets".to_string(),
                    amount: Money::from_pounds_whole(-25),
                },
            ],
            competitions: default_competitions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_pence(1250).to_string(), "£12.50");
        assert_eq!(Money::from_pence(-200).to_string(), "-£2.00");
        assert_eq!(Money::from_pence(5).signed(), "+£0.05");
        assert_eq!(Money::from_pence(-200).signed(), "-£2.00");
    }

    #[test]
    fn test_money_parse_and_rounding() {
        assert_eq!("£12.5".parse::<Money>().unwrap(), Money::from_pence(1250));
        assert_eq!(Money::try_from_pounds(0.1 + 0.2), Some(Money::from_pence(30)));
        assert!("twelve".parse::<Money>().is_err());
    }

    #[test]
    fn test_money_rejects_out_of_range_amounts() {
        assert!(matches!("1e300".parse::<Money>(), Err(CoreError::InvalidAmount(_))));
        assert!("inf".parse::<Money>().is_err());
        assert!(serde_json::from_str::<Money>("1e300").is_err());
        assert_eq!("1000000000".parse::<Money>().unwrap(), Money::MAX);

        assert_eq!(Money::MAX.checked_add(Money::from_pence(1)), None);
        assert_eq!(
            Money::from_pence(100).checked_sub(Money::from_pence(30)),
            Some(Money::from_pence(70))
        );
        assert_eq!(Money::from_pence(i64::MAX) + Money::from_pence(1), Money::from_pence(i64::MAX));
    }

    #[test]
    fn test_ticket_range_format() {
        assert_eq!(TicketRange::new(1500, 1).unwrap().to_string(), "#1500");
        assert_eq!(TicketRange::new(1500, 5).unwrap().to_string(), "#1500–1504");
        assert_eq!(TicketRange::new(MAX_TICKET_NO, 2), None);
        assert_eq!(TicketRange::new(u64::MAX, 1), None);
        assert_eq!("#1023–1027".parse::<TicketRange>().unwrap().len(), 5);
        assert_eq!(
            "#1201-1202".parse::<TicketRange>().unwrap(),
            TicketRange { start: 1201, end: 1202 }
        );
        assert!("1201".parse::<TicketRange>().is_err());
    }

    #[test]
    fn test_state_wire_shape() {
        let json = serde_json::to_value(State::default()).unwrap();
        assert_eq!(json["balance"], serde_json::json!(125.0));
        assert_eq!(json["nextTicketNo"], serde_json::json!(1500));
        assert_eq!(json["tickets"][0]["ticketRange"], "#1023–1027");
        assert_eq!(json["tickets"][0]["compId"], "weekly-1000");
        assert_eq!(json["transactions"][1]["desc"], "Weekly Draw Tickets");
        assert_eq!(json["competitions"]["midweek-500"]["ends"], "Ends tomorrow");
    }
}
