//! Instant-win games for Compot
//!
//! Scratch card, pick-a-box and spin-the-wheel. Every game debits its stake
//! through the [`compot_core::Ledger`], resolves the prize with the shared
//! weighted selector, and credits wins back through the ledger.

pub mod config;
pub mod error;
pub mod pick_box;
pub mod rng;
pub mod scratch;
pub mod selector;
pub mod wheel;

pub use config::GameConfig;
pub use error::{GameError, Result};
pub use pick_box::{BoxPick, BoxSlot, PickABox};
pub use rng::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use scratch::{ScratchCard, ScratchMask, ScratchOutcome, ScratchPhase, Symbol};
pub use selector::{draw_prize, PrizeTable, WeightedTable};
pub use wheel::{SpinOutcome, SpinPlan, SpinWheel, WheelPhase};

/// The random source for real play: seeded when a seed is given.
pub fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    }
}
