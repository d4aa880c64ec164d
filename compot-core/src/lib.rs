//! Compot core - state store and transactional ledger
//!
//! Holds the single persisted [`State`] record, repairs it on load, and
//! exposes the ledger operations (debit, credit, ticket issuance, purchase)
//! that every game builds on.

pub mod error;
pub mod ledger;
pub mod purchase;
pub mod storage;
pub mod types;
pub mod views;

pub use error::{CoreError, Result};
pub use ledger::{Ledger, ViewRefresher};
pub use purchase::{buy, buy_from_listing, PurchaseRequest};
pub use storage::{BlobStore, MemoryBlobStore, SqliteBlobStore, StateStore};
pub use types::{Competition, Money, State, TicketRange, TicketRecord, TicketStatus, Transaction};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_ledger_over_sqlite() {
        let temp_dir = tempdir().unwrap();
        let blobs = Arc::new(SqliteBlobStore::open(&temp_dir.path().join("compot.db")).unwrap());
        let ledger = Ledger::new(StateStore::new(blobs));

        ledger.debit(Money::from_pounds_whole(5), "Play").unwrap();
        assert_eq!(ledger.balance().unwrap(), Money::from_pounds_whole(120));
    }
}
