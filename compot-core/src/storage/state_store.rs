//! Load, repair and save the persisted [`State`] record.
//!
//! Reads never reject a record outright. Each top-level field is checked on
//! its own and replaced by its default when missing or malformed, so a
//! partially-upgraded or hand-edited record still loads.

use crate::error::{CoreError, Result};
use crate::storage::BlobStore;
use crate::types::{
    default_competitions, Competition, Money, State, TicketRecord, TicketStatus, Transaction,
    User, DEFAULT_BALANCE, DEFAULT_NEXT_TICKET_NO, MAX_TICKET_NO,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const STORE_KEY: &str = "compot_data_v1";

#[derive(Clone)]
pub struct StateStore {
    blobs: Arc<dyn BlobStore>,
    key: String,
}

impl StateStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            key: STORE_KEY.to_string(),
        }
    }

    /// Load the state, creating and persisting the defaults on first use.
    pub fn load(&self) -> Result<State> {
        let Some(raw) = self.blobs.get(&self.key)? else {
            tracing::info!("No stored state under '{}', creating defaults", self.key);
            return self.reset();
        };

        match parse_root(&raw) {
            Ok(root) => Ok(repair(root)),
            Err(e) => {
                tracing::warn!("{}; replacing stored state with defaults", e);
                self.reset()
            }
        }
    }

    pub fn save(&self, state: &State) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.blobs.put(&self.key, &raw)
    }

    /// Overwrite whatever is stored with a fresh default state.
    pub fn reset(&self) -> Result<State> {
        let fresh = State::default();
        self.save(&fresh)?;
        Ok(fresh)
    }
}

fn parse_root(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::corrupt(format!(
            "expected an object at the root, found {}",
            kind_of(&other)
        ))),
        Err(e) => Err(CoreError::corrupt(format!("unreadable JSON: {}", e))),
    }
}

/// Field-by-field repair of a parsed record.
pub(crate) fn repair(mut root: Map<String, Value>) -> State {
    let user = take_field(&mut root, "user").unwrap_or_else(|| {
        tracing::warn!("Repairing 'user' with defaults");
        User::default()
    });

    let balance = take_field::<Money>(&mut root, "balance")
        .filter(|b| !b.is_negative())
        .unwrap_or_else(|| {
            tracing::warn!("Repairing 'balance' with default {}", DEFAULT_BALANCE);
            DEFAULT_BALANCE
        });

    let tickets: Vec<TicketRecord> = take_list(&mut root, "tickets", prepare_ticket)
        .into_iter()
        .map(fill_ticket)
        .collect();
    let transactions = take_list::<Transaction>(&mut root, "transactions", prepare_transaction);
    let competitions = take_competitions(&mut root);

    // The exhausted state (one past the last number) is still valid.
    let next_ticket_no = take_field::<u64>(&mut root, "nextTicketNo")
        .filter(|n| *n <= MAX_TICKET_NO + 1)
        .unwrap_or_else(|| {
            let after_issued = tickets
                .iter()
                .map(|t| t.range.end.saturating_add(1))
                .max()
                .unwrap_or(0);
            let next = after_issued.max(DEFAULT_NEXT_TICKET_NO);
            tracing::warn!("Repairing 'nextTicketNo' with {}", next);
            next
        });

    State {
        user,
        balance,
        next_ticket_no,
        tickets,
        transactions,
        competitions,
    }
}

fn take_field<T: DeserializeOwned>(root: &mut Map<String, Value>, name: &str) -> Option<T> {
    let value = root.remove(name)?;
    serde_json::from_value(value).ok()
}

/// Remove `field` from `entry` when it is present but not a valid `T`, so
/// the type's serde default takes its place.
fn drop_malformed<T: DeserializeOwned>(entry: &mut Value, field: &str) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    let malformed = object
        .get(field)
        .is_some_and(|v| serde_json::from_value::<T>(v.clone()).is_err());
    if malformed {
        tracing::warn!("Defaulting malformed '{}'", field);
        object.remove(field);
    }
}

fn prepare_ticket(entry: &mut Value) {
    drop_malformed::<String>(entry, "compName");
    drop_malformed::<TicketStatus>(entry, "status");
    drop_malformed::<u32>(entry, "qty");
}

fn fill_ticket(mut ticket: TicketRecord) -> TicketRecord {
    if ticket.competition_name.is_empty() {
        ticket.competition_name = ticket.competition_id.clone();
    }
    if ticket.quantity == 0 {
        ticket.quantity = u32::try_from(ticket.range.len()).unwrap_or(u32::MAX);
    }
    ticket
}

fn prepare_transaction(entry: &mut Value) {
    drop_malformed::<String>(entry, "date");
    drop_malformed::<String>(entry, "desc");
}

fn prepare_competition(entry: &mut Value) {
    drop_malformed::<u32>(entry, "sold");
    drop_malformed::<Money>(entry, "price");
    drop_malformed::<String>(entry, "odds");
    drop_malformed::<String>(entry, "ends");
}

fn take_list<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    name: &str,
    prepare: fn(&mut Value),
) -> Vec<T> {
    let items = match root.remove(name) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!("'{}' is {}, resetting to empty", name, kind_of(&other));
            return Vec::new();
        }
        None => {
            tracing::warn!("'{}' missing, resetting to empty", name);
            return Vec::new();
        }
    };

    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|mut item| {
            prepare(&mut item);
            serde_json::from_value(item).ok()
        })
        .collect();

    if kept.len() != total {
        tracing::warn!(
            "Dropped {} malformed entries from '{}'",
            total - kept.len(),
            name
        );
    }
    kept
}

fn take_competitions(root: &mut Map<String, Value>) -> BTreeMap<String, Competition> {
    let entries = match root.remove("competitions") {
        Some(Value::Object(entries)) => entries,
        _ => {
            tracing::warn!("Repairing 'competitions' with defaults");
            return default_competitions();
        }
    };

    let mut competitions = BTreeMap::new();
    for (id, mut value) in entries {
        prepare_competition(&mut value);
        match serde_json::from_value::<Competition>(value) {
            Ok(mut competition) => {
                if competition.sold > competition.cap {
                    tracing::warn!(
                        "Competition '{}' sold {} over cap {}, clamping",
                        id,
                        competition.sold,
                        competition.cap
                    );
                    competition.sold = competition.cap;
                }
                competitions.insert(id, competition);
            }
            Err(e) => tracing::warn!("Dropping malformed competition '{}': {}", id, e),
        }
    }
    competitions
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use serde_json::json;

    fn store_with(raw: &str) -> (Arc<MemoryBlobStore>, StateStore) {
        let blobs = Arc::new(MemoryBlobStore::with_raw(STORE_KEY, raw));
        let store = StateStore::new(blobs.clone());
        (blobs, store)
    }

    #[test]
    fn test_first_load_persists_defaults() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = StateStore::new(blobs.clone());

        let state = store.load().unwrap();
        assert_eq!(state, State::default());
        assert!(blobs.get(STORE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_garbage_is_replaced_with_defaults() {
        let (blobs, store) = store_with("{not json");
        assert_eq!(store.load().unwrap(), State::default());

        let saved = blobs.get(STORE_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<State>(&saved).is_ok());
    }

    #[test]
    fn test_non_object_root_is_corrupt() {
        let err = parse_root("[1, 2]").unwrap_err();
        assert!(matches!(err, CoreError::CorruptPersistedState(_)));
    }

    #[test]
    fn test_field_level_repair_keeps_good_fields() {
        let raw = json!({
            "user": "nobody",
            "balance": "lots",
            "nextTicketNo": 2000,
            "tickets": [
                { "compId": "weekly-1000", "compName": "Weekly", "status": "Live",
                  "ticketRange": "#1990–1999", "qty": 10 },
                { "compId": "broken" }
            ],
            "transactions": { "oops": true },
            "extra": 42
        });
        let (_, store) = store_with(&raw.to_string());

        let state = store.load().unwrap();
        assert_eq!(state.user, User::default());
        assert_eq!(state.balance, DEFAULT_BALANCE);
        assert_eq!(state.next_ticket_no, 2000);
        assert_eq!(state.tickets.len(), 1);
        assert_eq!(state.tickets[0].quantity, 10);
        assert!(state.transactions.is_empty());
        assert_eq!(state.competitions, default_competitions());
    }

    #[test]
    fn test_negative_balance_is_repaired() {
        let (_, store) = store_with(&json!({ "balance": -4.0 }).to_string());
        assert_eq!(store.load().unwrap().balance, DEFAULT_BALANCE);
    }

    #[test]
    fn test_oversold_competition_is_clamped() {
        let raw = json!({
            "competitions": {
                "flash": { "sold": 12, "cap": 10, "price": 1.5, "odds": "1 in 10", "ends": "Soon" },
                "bad": { "sold": "many" }
            }
        });
        let (_, store) = store_with(&raw.to_string());

        let state = store.load().unwrap();
        assert_eq!(state.competitions.len(), 1);
        assert_eq!(state.competitions["flash"].sold, 10);
        assert_eq!(
            state.competitions["flash"].price_per_ticket,
            Money::from_pence(150)
        );
    }

    #[test]
    fn test_partial_competition_keeps_its_listing() {
        let raw = json!({
            "competitions": {
                "weekly-1000": { "sold": 650, "cap": 1000, "price": 5 },
                "midweek-500": { "sold": "lots", "cap": 500, "price": 2, "odds": 7 }
            }
        });
        let (_, store) = store_with(&raw.to_string());

        let state = store.load().unwrap();
        assert_eq!(state.competitions.len(), 2);
        let weekly = &state.competitions["weekly-1000"];
        assert_eq!(weekly.price_per_ticket, Money::from_pounds_whole(5));
        assert_eq!(weekly.odds, "");
        assert_eq!(weekly.remaining(), 350);
        let midweek = &state.competitions["midweek-500"];
        assert_eq!(midweek.sold, 0);
        assert!(!midweek.is_sold_out());
    }

    #[test]
    fn test_partial_tickets_and_transactions_are_filled_in() {
        let raw = json!({
            "tickets": [{ "compId": "weekly-1000", "ticketRange": "#10–12", "status": 3 }],
            "transactions": [{ "desc": "Top-up", "amount": 5 }]
        });
        let (_, store) = store_with(&raw.to_string());

        let state = store.load().unwrap();
        assert_eq!(state.tickets.len(), 1);
        assert_eq!(state.tickets[0].competition_name, "weekly-1000");
        assert_eq!(state.tickets[0].status, TicketStatus::Live);
        assert_eq!(state.tickets[0].quantity, 3);
        assert_eq!(state.transactions.len(), 1);
        assert_eq!(state.transactions[0].amount, Money::from_pounds_whole(5));
    }

    #[test]
    fn test_out_of_range_numbers_are_repaired() {
        let raw = json!({
            "balance": 1e300,
            "nextTicketNo": u64::MAX,
            "tickets": [{ "compId": "weekly-1000", "compName": "Weekly", "status": "Live",
                          "ticketRange": "#4000–4009", "qty": 10 }]
        });
        let (_, store) = store_with(&raw.to_string());

        let state = store.load().unwrap();
        assert_eq!(state.balance, DEFAULT_BALANCE);
        assert_eq!(state.next_ticket_no, 4010);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_, store) = store_with("{}");
        let mut state = store.load().unwrap();
        state.balance = Money::from_pence(1);
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap().balance, Money::from_pence(1));
    }
}
