use crate::error::{CoreError, Result};
use crate::ledger::Ledger;
use crate::types::{Money, TicketRecord};

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub competition_id: String,
    pub competition_name: String,
    pub price_per_ticket: Money,
    pub quantity: u32,
}

impl PurchaseRequest {
    pub fn new(
        competition_id: impl Into<String>,
        competition_name: impl Into<String>,
        price_per_ticket: Money,
        quantity: u32,
    ) -> Self {
        Self {
            competition_id: competition_id.into(),
            competition_name: competition_name.into(),
            price_per_ticket,
            quantity,
        }
    }

    pub fn total(&self) -> Result<Money> {
        self.price_per_ticket
            .checked_mul(self.quantity)
            .ok_or_else(|| CoreError::invalid_amount("ticket total overflows"))
    }
}

/// Buy tickets: debit the total and allocate numbers in one ledger cycle.
///
/// Nothing is persisted when the total is not positive or the balance does
/// not cover it.
pub fn buy(ledger: &Ledger, request: &PurchaseRequest) -> Result<TicketRecord> {
    let total = request.total()?;
    if !total.is_positive() {
        return Err(CoreError::invalid_amount(format!(
            "purchase total must be positive, got {}",
            total
        )));
    }

    let description = format!(
        "{} – Tickets ({} × {})",
        request.competition_name, request.quantity, request.price_per_ticket
    );

    let record = ledger.transact(|state| {
        state.apply_debit(total, &description)?;
        state.allocate_tickets(
            &request.competition_id,
            &request.competition_name,
            request.quantity,
        )
    })?;

    tracing::info!(
        "Purchased {} for '{}' at {} total",
        record.range,
        request.competition_id,
        total
    );
    Ok(record)
}

/// Buy at the price stored for a listed competition.
pub fn buy_from_listing(
    ledger: &Ledger,
    competition_id: &str,
    competition_name: &str,
    quantity: u32,
) -> Result<TicketRecord> {
    let state = ledger.state()?;
    let competition =
        state
            .competitions
            .get(competition_id)
            .ok_or_else(|| CoreError::UnknownCompetition {
                id: competition_id.to_string(),
            })?;

    let request = PurchaseRequest::new(
        competition_id,
        competition_name,
        competition.price_per_ticket,
        quantity,
    );
    buy(ledger, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBlobStore, StateStore};
    use std::sync::Arc;

    fn ledger() -> Ledger {
        Ledger::new(StateStore::new(Arc::new(MemoryBlobStore::new())))
    }

    #[test]
    fn test_buy_debits_and_issues() {
        let ledger = ledger();
        let request = PurchaseRequest::new(
            "weekly-1000",
            "Weekly Community Draw",
            Money::from_pounds_whole(5),
            3,
        );

        let record = buy(&ledger, &request).unwrap();
        assert_eq!(record.range.to_string(), "#1500–1502");

        let state = ledger.state().unwrap();
        assert_eq!(state.balance, Money::from_pounds_whole(110));
        assert_eq!(
            state.transactions[0].description,
            "Weekly Community Draw – Tickets (3 × £5.00)"
        );
        assert_eq!(state.transactions[0].amount, Money::from_pounds_whole(-15));
        assert_eq!(state.competitions["weekly-1000"].sold, 653);
    }

    #[test]
    fn test_zero_total_is_invalid() {
        let ledger = ledger();
        let free = PurchaseRequest::new("weekly-1000", "Weekly", Money::ZERO, 2);
        let none = PurchaseRequest::new("weekly-1000", "Weekly", Money::from_pence(500), 0);

        assert!(matches!(buy(&ledger, &free), Err(CoreError::InvalidAmount(_))));
        assert!(matches!(buy(&ledger, &none), Err(CoreError::InvalidAmount(_))));
        assert_eq!(ledger.state().unwrap().next_ticket_no, 1500);
    }

    #[test]
    fn test_buy_from_listing_uses_stored_price() {
        let ledger = ledger();
        buy_from_listing(&ledger, "midweek-500", "Midweek Quick Draw", 2).unwrap();
        assert_eq!(ledger.balance().unwrap(), Money::from_pounds_whole(121));

        let err = buy_from_listing(&ledger, "nope", "Nope", 1).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCompetition { .. }));
    }
}
