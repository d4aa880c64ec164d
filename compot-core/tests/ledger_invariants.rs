use compot_core::{
    buy, CoreError, Ledger, MemoryBlobStore, Money, PurchaseRequest, StateStore, TicketRange,
};
use std::sync::Arc;

fn fresh_ledger(balance: Money) -> Ledger {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let ledger = Ledger::new(StateStore::new(Arc::new(MemoryBlobStore::new())));
    ledger
        .transact(|state| {
            state.balance = balance;
            state.transactions.clear();
            state.tickets.clear();
            Ok(())
        })
        .unwrap();
    ledger
}

#[test]
fn balance_replays_as_credits_minus_accepted_debits() {
    let initial = Money::from_pounds_whole(10);
    let ledger = fresh_ledger(initial);

    // (is_debit, pence)
    let ops = [
        (true, 250),
        (false, 100),
        (true, 2_000),
        (true, 700),
        (false, 1),
        (true, 151),
        (true, 1),
        (false, 0),
        (true, 300),
    ];

    let mut credits = Money::ZERO;
    let mut debits = Money::ZERO;
    for (is_debit, pence) in ops {
        let amount = Money::from_pence(pence);
        if is_debit {
            match ledger.debit(amount, "Play") {
                Ok(_) => debits += amount,
                Err(CoreError::InsufficientFunds { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        } else {
            ledger.credit(amount, "Win").unwrap();
            credits += amount;
        }

        let balance = ledger.balance().unwrap();
        assert!(!balance.is_negative());
        assert_eq!(balance, initial + credits - debits);
    }

    let state = ledger.state().unwrap();
    let logged = state
        .transactions
        .iter()
        .fold(Money::ZERO, |acc, tx| acc + tx.amount);
    assert_eq!(initial + logged, state.balance);
}

#[test]
fn ticket_ranges_are_disjoint_and_monotonic() {
    let ledger = fresh_ledger(Money::ZERO);
    let mut issued: Vec<TicketRange> = Vec::new();

    for quantity in [1, 5, 2, 10, 1, 3] {
        let prior = ledger.state().unwrap().next_ticket_no;
        let record = ledger
            .issue_tickets("weekly-1000", "Weekly Community Draw", quantity)
            .unwrap();

        assert_eq!(record.range.start, prior);
        assert_eq!(record.range.len(), u64::from(quantity));
        assert_eq!(
            ledger.state().unwrap().next_ticket_no,
            prior + u64::from(quantity)
        );
        assert!(issued.iter().all(|r| !r.overlaps(&record.range)));
        issued.push(record.range);
    }
}

#[test]
fn sold_is_min_of_cap_and_demand() {
    let ledger = fresh_ledger(Money::ZERO);
    let initial = ledger.state().unwrap().competitions["midweek-500"].sold;

    let mut demand = initial;
    for quantity in [30, 40, 25, 10] {
        ledger
            .issue_tickets("midweek-500", "Midweek Quick Draw", quantity)
            .unwrap();
        demand += quantity;

        let sold = ledger.state().unwrap().competitions["midweek-500"].sold;
        assert_eq!(sold, demand.min(500));
    }
}

#[test]
fn purchase_beyond_balance_changes_nothing() {
    let ledger = fresh_ledger(Money::from_pounds_whole(3));
    let before = ledger.state().unwrap();

    let request = PurchaseRequest::new(
        "weekly-1000",
        "Weekly Community Draw",
        Money::from_pounds_whole(5),
        1,
    );
    let err = buy(&ledger, &request).unwrap_err();

    assert!(matches!(err, CoreError::InsufficientFunds { .. }));
    let after = ledger.state().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.balance, Money::from_pounds_whole(3));
    assert!(after.tickets.is_empty());
}
