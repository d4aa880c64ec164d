//! Read-only projections of [`State`] for the account, ticket, transaction
//! and competition screens.

use crate::types::{Competition, State, TicketRecord, TicketStatus, Transaction};

pub const ACTIVE_TICKETS_LIMIT: usize = 8;
pub const RECENT_TICKETS_LIMIT: usize = 20;
pub const RECENT_TRANSACTIONS_LIMIT: usize = 30;

pub fn active_tickets(state: &State) -> Vec<&TicketRecord> {
    state
        .tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Live)
        .take(ACTIVE_TICKETS_LIMIT)
        .collect()
}

pub fn recent_tickets(state: &State) -> &[TicketRecord] {
    let end = state.tickets.len().min(RECENT_TICKETS_LIMIT);
    &state.tickets[..end]
}

pub fn recent_transactions(state: &State) -> &[Transaction] {
    let end = state.transactions.len().min(RECENT_TRANSACTIONS_LIMIT);
    &state.transactions[..end]
}

/// Percentage sold, rounded. A zero cap reads as fully sold.
pub fn progress_percent(competition: &Competition) -> u32 {
    if competition.cap == 0 {
        return 100;
    }
    (f64::from(competition.sold) / f64::from(competition.cap) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Money, TicketRange};

    #[test]
    fn test_active_tickets_skip_drawn_and_cap_at_eight() {
        let mut state = State::default();
        state.tickets[0].status = TicketStatus::Drawn;
        for i in 0..10 {
            state.tickets.push(TicketRecord {
                competition_id: "weekly-1000".to_string(),
                competition_name: "Weekly Community Draw".to_string(),
                status: TicketStatus::Live,
                range: TicketRange::new(2000 + i, 1).unwrap(),
                quantity: 1,
            });
        }

        let active = active_tickets(&state);
        assert_eq!(active.len(), ACTIVE_TICKETS_LIMIT);
        assert_eq!(active[0].competition_id, "midweek-500");
    }

    #[test]
    fn test_recent_lists_are_truncated() {
        let mut state = State::default();
        for _ in 0..40 {
            state.apply_credit(Money::from_pence(1), "Tick").unwrap();
        }
        assert_eq!(recent_transactions(&state).len(), RECENT_TRANSACTIONS_LIMIT);
        assert_eq!(recent_tickets(&state).len(), 2);
    }

    #[test]
    fn test_progress_percent() {
        let state = State::default();
        assert_eq!(progress_percent(&state.competitions["weekly-1000"]), 65);
        assert_eq!(progress_percent(&state.competitions["midweek-500"]), 82);
    }
}
