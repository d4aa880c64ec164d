pub mod account;
pub mod competitions;
pub mod games;

use anyhow::Context as _;
use compot_core::{CoreError, Ledger, SqliteBlobStore, State, StateStore, ViewRefresher};
use compot_games::{random_source, GameConfig, GameError, RandomSource};
use std::path::Path;
use std::sync::Arc;

pub const DB_FILE: &str = "compot.db";
pub const GAME_CONFIG_FILE: &str = "games.json";

/// Everything a command needs: the account ledger, game settings and RNG.
pub struct Context {
    pub ledger: Arc<Ledger>,
    pub games: GameConfig,
    pub rng: Box<dyn RandomSource>,
}

impl Context {
    pub fn open(data_dir: &Path, seed: Option<u64>) -> anyhow::Result<Self> {
        let blobs = SqliteBlobStore::open(&data_dir.join(DB_FILE))
            .with_context(|| format!("cannot open account store in {}", data_dir.display()))?;
        let ledger = Arc::new(Ledger::new(StateStore::new(Arc::new(blobs))));
        ledger.add_refresher(Arc::new(BalanceEcho));

        let games = GameConfig::load_or_default(&data_dir.join(GAME_CONFIG_FILE))?;

        Ok(Self {
            ledger,
            games,
            rng: random_source(seed),
        })
    }
}

/// Prints the balance line and newest transaction after every change.
struct BalanceEcho;

impl ViewRefresher for BalanceEcho {
    fn refresh_balance(&self, state: &State) {
        println!("Balance: {}", state.balance);
    }

    fn refresh_transactions(&self, state: &State) {
        if let Some(latest) = state.transactions.first() {
            println!("  {}  {}", latest.description, latest.amount.signed());
        }
    }
}

/// Print a user-facing message for `e`. Returns false for errors the
/// player should never see.
pub fn report(e: &anyhow::Error) -> bool {
    let core = match e.downcast_ref::<GameError>() {
        Some(game) if game.is_silent() => {
            tracing::debug!("Ignoring rejected play: {}", game);
            return false;
        }
        Some(GameError::Core(core)) => Some(core),
        Some(_) => None,
        None => e.downcast_ref::<CoreError>(),
    };

    match core {
        Some(CoreError::InsufficientFunds { need, available }) => {
            eprintln!("Not enough balance. Please add funds.");
            eprintln!("Need: {}, Available: {}", need, available);
            eprintln!("Top up with: compot top-up <amount>");
        }
        Some(CoreError::InvalidAmount(_)) => {
            eprintln!("Enter a valid amount.");
        }
        Some(CoreError::UnknownCompetition { id }) => {
            eprintln!("Error: Competition '{}' not found", id);
            eprintln!("Use 'compot competitions' to see what is running");
        }
        _ => {
            eprintln!("Error: {:#}", e);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use compot_core::Money;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_default_account() {
        let dir = tempdir().unwrap();
        let ctx = Context::open(dir.path(), Some(7)).unwrap();

        assert_eq!(ctx.ledger.balance().unwrap(), Money::from_pounds_whole(125));
        assert!(dir.path().join(DB_FILE).exists());
    }

    #[test]
    fn test_account_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let ctx = Context::open(dir.path(), None).unwrap();
            ctx.ledger.top_up(Money::from_pounds_whole(10)).unwrap();
        }

        let ctx = Context::open(dir.path(), None).unwrap();
        assert_eq!(ctx.ledger.balance().unwrap(), Money::from_pounds_whole(135));
    }

    #[test]
    fn test_bad_game_config_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(GAME_CONFIG_FILE), "{not json").unwrap();

        assert!(Context::open(dir.path(), None).is_err());
    }

    #[test]
    fn test_rejected_play_is_silent() {
        let silent = anyhow::Error::new(GameError::ConcurrentPlayRejected);
        assert!(!report(&silent));

        let shown = anyhow::Error::new(GameError::Core(CoreError::InsufficientFunds {
            need: Money::from_pounds_whole(2),
            available: Money::ZERO,
        }));
        assert!(report(&shown));
    }
}
