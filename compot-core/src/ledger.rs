use crate::error::{CoreError, Result};
use crate::storage::StateStore;
use crate::types::{Money, State, TicketRange, TicketRecord, TicketStatus, Transaction};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Views that repaint from state after a ledger mutation.
pub trait ViewRefresher: Send + Sync {
    fn refresh_balance(&self, state: &State);
    fn refresh_transactions(&self, state: &State);
    fn refresh_tickets(&self, _state: &State) {}
}

impl State {
    pub fn affordable(&self, cost: Money) -> bool {
        self.balance >= cost
    }

    /// Take `cost` off the balance and log it. Leaves `self` untouched on error.
    pub fn apply_debit(&mut self, cost: Money, description: &str) -> Result<()> {
        if !cost.is_positive() {
            return Err(CoreError::invalid_amount(format!(
                "debit must be positive, got {}",
                cost
            )));
        }
        if !self.affordable(cost) {
            return Err(CoreError::InsufficientFunds {
                need: cost,
                available: self.balance,
            });
        }

        self.balance = self
            .balance
            .checked_sub(cost)
            .ok_or_else(|| CoreError::invalid_amount(format!("debit of {} is out of range", cost)))?;
        self.transactions
            .insert(0, Transaction::now(description, -cost));
        Ok(())
    }

    /// Returns false (and changes nothing) for a non-positive amount.
    /// A credit that would push the balance past [`Money::MAX`] is rejected.
    pub fn apply_credit(&mut self, amount: Money, description: &str) -> Result<bool> {
        if !amount.is_positive() {
            return Ok(false);
        }

        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            CoreError::invalid_amount(format!(
                "crediting {} would take the balance past {}",
                amount,
                Money::MAX
            ))
        })?;
        self.transactions
            .insert(0, Transaction::now(description, amount));
        Ok(true)
    }

    pub fn allocate_tickets(
        &mut self,
        competition_id: &str,
        competition_name: &str,
        quantity: u32,
    ) -> Result<TicketRecord> {
        if quantity == 0 {
            return Err(CoreError::invalid_amount("ticket quantity must be at least 1"));
        }

        let range = TicketRange::new(self.next_ticket_no, quantity).ok_or(
            CoreError::TicketNumbersExhausted {
                next: self.next_ticket_no,
            },
        )?;
        self.next_ticket_no = range.end + 1;

        let record = TicketRecord {
            competition_id: competition_id.to_string(),
            competition_name: competition_name.to_string(),
            status: TicketStatus::Live,
            range,
            quantity,
        };
        self.tickets.insert(0, record.clone());

        // Numbers are issued even past the cap; only the counter is clamped.
        if let Some(competition) = self.competitions.get_mut(competition_id) {
            let wanted = competition.sold.saturating_add(quantity);
            if wanted > competition.cap {
                tracing::warn!(
                    "Competition '{}' oversold: {} tickets past cap {}",
                    competition_id,
                    wanted - competition.cap,
                    competition.cap
                );
            }
            competition.sold = wanted.min(competition.cap);
        }

        Ok(record)
    }
}

/// Balance, transaction log and ticket allocation over a [`StateStore`].
///
/// Every operation is one whole load-mutate-save cycle. Cycles are
/// serialised so that two callers on different threads can never lose
/// each other's update.
pub struct Ledger {
    store: StateStore,
    cycle: Mutex<()>,
    refreshers: RwLock<Vec<Arc<dyn ViewRefresher>>>,
}

impl Ledger {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            cycle: Mutex::new(()),
            refreshers: RwLock::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn add_refresher(&self, refresher: Arc<dyn ViewRefresher>) {
        self.refreshers.write().push(refresher);
    }

    pub fn state(&self) -> Result<State> {
        self.store.load()
    }

    pub fn balance(&self) -> Result<Money> {
        Ok(self.store.load()?.balance)
    }

    pub fn affordable(&self, cost: Money) -> Result<bool> {
        Ok(self.store.load()?.affordable(cost))
    }

    /// Run `f` against a freshly loaded state and persist the result.
    ///
    /// Nothing is written if `f` fails.
    pub fn transact<T>(&self, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let (value, state, before) = {
            let _cycle = self.cycle.lock();

            let mut state = self.store.load()?;
            let before = (state.balance, state.transactions.len(), state.tickets.len());

            let value = f(&mut state)?;
            self.store.save(&state)?;
            (value, state, before)
        };

        self.notify(&state, before);
        Ok(value)
    }

    pub fn debit(&self, cost: Money, description: &str) -> Result<Money> {
        let balance = self.transact(|state| {
            state.apply_debit(cost, description)?;
            Ok(state.balance)
        })?;

        tracing::info!("Debited {} for '{}', balance {}", cost, description, balance);
        Ok(balance)
    }

    pub fn credit(&self, amount: Money, description: &str) -> Result<Money> {
        if !amount.is_positive() {
            tracing::debug!("Skipping non-positive credit {} for '{}'", amount, description);
            return self.balance();
        }

        let balance = self.transact(|state| {
            state.apply_credit(amount, description)?;
            Ok(state.balance)
        })?;

        tracing::info!("Credited {} for '{}', balance {}", amount, description, balance);
        Ok(balance)
    }

    pub fn top_up(&self, amount: Money) -> Result<Money> {
        if !amount.is_positive() {
            return Err(CoreError::invalid_amount(format!(
                "top-up must be positive, got {}",
                amount
            )));
        }
        self.credit(amount, "Account Top-up")
    }

    pub fn issue_tickets(
        &self,
        competition_id: &str,
        competition_name: &str,
        quantity: u32,
    ) -> Result<TicketRecord> {
        let record = self
            .transact(|state| state.allocate_tickets(competition_id, competition_name, quantity))?;

        tracing::info!(
            "Issued {} for '{}' ({} tickets)",
            record.range,
            competition_id,
            quantity
        );
        Ok(record)
    }

    /// Throw away the stored state and start from the defaults.
    pub fn reset(&self) -> Result<State> {
        let state = {
            let _cycle = self.cycle.lock();
            self.store.reset()?
        };

        self.notify_all(&state);
        tracing::info!("Ledger reset to defaults");
        Ok(state)
    }

    fn notify(&self, state: &State, (balance, tx_count, ticket_count): (Money, usize, usize)) {
        let refreshers = self.refreshers.read();
        for refresher in refreshers.iter() {
            if state.balance != balance {
                refresher.refresh_balance(state);
            }
            if state.transactions.len() != tx_count {
                refresher.refresh_transactions(state);
            }
            if state.tickets.len() != ticket_count {
                refresher.refresh_tickets(state);
            }
        }
    }

    fn notify_all(&self, state: &State) {
        for refresher in self.refreshers.read().iter() {
            refresher.refresh_balance(state);
            refresher.refresh_transactions(state);
            refresher.refresh_tickets(state);
        }
    }
}
