use crate::config::{GameConfig, ScratchConfig};
use crate::error::{GameError, Result};
use crate::rng::{pick_index, RandomSource};
use crate::selector::draw_prize;
use compot_core::{Ledger, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grid of overlay cells that are either opaque or scratched clear.
#[derive(Debug, Clone)]
pub struct ScratchMask {
    width: usize,
    height: usize,
    cleared: Vec<bool>,
}

impl ScratchMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cleared: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn reset(&mut self) {
        self.cleared.fill(false);
    }

    pub fn clear_all(&mut self) {
        self.cleared.fill(true);
    }

    /// Clear every cell whose centre lies within `radius` of `(x, y)`.
    pub fn clear_disc(&mut self, x: f64, y: f64, radius: f64) {
        if radius <= 0.0 || self.cleared.is_empty() {
            return;
        }

        let clamp = |v: f64, max: usize| v.floor().clamp(0.0, max as f64) as usize;
        let x0 = clamp(x - radius, self.width);
        let x1 = clamp(x + radius + 1.0, self.width);
        let y0 = clamp(y - radius, self.height);
        let y1 = clamp(y + radius + 1.0, self.height);

        let r2 = radius * radius;
        for row in y0..y1 {
            for col in x0..x1 {
                let dx = col as f64 + 0.5 - x;
                let dy = row as f64 + 0.5 - y;
                if dx * dx + dy * dy <= r2 {
                    self.cleared[row * self.width + col] = true;
                }
            }
        }
    }

    /// Fraction of cleared cells, looking only at every `stride`-th cell.
    pub fn cleared_fraction(&self, stride: usize) -> f64 {
        let mut sampled = 0usize;
        let mut clear = 0usize;
        for cell in self.cleared.iter().step_by(stride.max(1)) {
            sampled += 1;
            if *cell {
                clear += 1;
            }
        }

        if sampled == 0 {
            return 0.0;
        }
        clear as f64 / sampled as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Cherry,
    Lemon,
    Bell,
    Star,
    Seven,
    Diamond,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Seven,
        Symbol::Diamond,
    ];

    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Cherry => "🍒",
            Symbol::Lemon => "🍋",
            Symbol::Bell => "🔔",
            Symbol::Star => "⭐",
            Symbol::Seven => "7️⃣",
            Symbol::Diamond => "💎",
        }
    }

    /// The following glyph, wrapping around at the end.
    pub fn next(self) -> Symbol {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn random(rng: &mut dyn RandomSource) -> Symbol {
        Self::ALL[pick_index(rng, Self::ALL.len())]
    }
}

pub fn is_triple(symbols: &[Symbol; 3]) -> bool {
    symbols[0] == symbols[1] && symbols[1] == symbols[2]
}

/// Three matching symbols for a win, never three matching for a loss.
pub fn deal_symbols(rng: &mut dyn RandomSource, win: bool) -> [Symbol; 3] {
    if win {
        let symbol = Symbol::random(rng);
        return [symbol; 3];
    }

    let mut symbols = [
        Symbol::random(rng),
        Symbol::random(rng),
        Symbol::random(rng),
    ];
    if is_triple(&symbols) {
        symbols[2] = symbols[2].next();
    }
    symbols
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchPhase {
    Idle,
    Armed,
    Revealing,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchOutcome {
    Win(Money),
    Lose,
}

#[derive(Debug)]
pub struct ScratchCard {
    id: Uuid,
    config: ScratchConfig,
    win_probability: f64,
    phase: ScratchPhase,
    symbols: Option<[Symbol; 3]>,
    pending_prize: Money,
    mask: ScratchMask,
    outcome: Option<ScratchOutcome>,
}

impl ScratchCard {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_config(config.scratch.clone(), config.win_probability)
    }

    pub fn with_config(config: ScratchConfig, win_probability: f64) -> Self {
        let mask = ScratchMask::new(config.width, config.height);
        Self {
            id: Uuid::new_v4(),
            config,
            win_probability,
            phase: ScratchPhase::Idle,
            symbols: None,
            pending_prize: Money::ZERO,
            mask,
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cost(&self) -> Money {
        self.config.cost
    }

    pub fn phase(&self) -> ScratchPhase {
        self.phase
    }

    /// Symbols under the overlay, `None` while no card is in play.
    pub fn symbols(&self) -> Option<[Symbol; 3]> {
        self.symbols
    }

    pub fn pending_prize(&self) -> Money {
        self.pending_prize
    }

    pub fn outcome(&self) -> Option<ScratchOutcome> {
        self.outcome
    }

    pub fn mask(&self) -> &ScratchMask {
        &self.mask
    }

    pub fn cleared_fraction(&self) -> f64 {
        self.mask.cleared_fraction(self.config.sample_stride)
    }

    /// Pay for a card and deal its symbols.
    pub fn play(&mut self, ledger: &Ledger, rng: &mut dyn RandomSource) -> Result<[Symbol; 3]> {
        match self.phase {
            ScratchPhase::Idle => {}
            ScratchPhase::Armed | ScratchPhase::Revealing => {
                tracing::warn!("Scratch card {} already in play, ignoring", self.id);
                return Err(GameError::ConcurrentPlayRejected);
            }
            ScratchPhase::Resolved => {
                return Err(GameError::invalid_state(
                    "card already revealed, call new_card first",
                ));
            }
        }

        ledger.debit(self.config.cost, "Scratch Card (Play)")?;

        let prize = draw_prize(rng, self.win_probability, &self.config.prizes);
        let symbols = deal_symbols(rng, prize.is_positive());

        self.pending_prize = prize;
        self.symbols = Some(symbols);
        self.mask.reset();
        self.outcome = None;
        self.phase = ScratchPhase::Armed;

        tracing::info!("Scratch card {} armed", self.id);
        Ok(symbols)
    }

    /// Scratch at `(x, y)`; resolves once enough of the overlay is gone.
    pub fn scratch(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        ledger: &Ledger,
    ) -> Result<Option<ScratchOutcome>> {
        match self.phase {
            ScratchPhase::Idle => {
                return Err(GameError::invalid_state("no scratch card in play"));
            }
            ScratchPhase::Resolved => return Ok(None),
            ScratchPhase::Armed => self.phase = ScratchPhase::Revealing,
            ScratchPhase::Revealing => {}
        }

        self.mask.clear_disc(x, y, radius);

        let cleared = self.cleared_fraction();
        if cleared < self.config.reveal_threshold {
            return Ok(None);
        }

        tracing::debug!("Scratch card {} {:.0}% cleared, revealing", self.id, cleared * 100.0);
        self.mask.clear_all();
        self.resolve(ledger).map(Some)
    }

    fn resolve(&mut self, ledger: &Ledger) -> Result<ScratchOutcome> {
        let matched = self.symbols.as_ref().is_some_and(is_triple);

        let outcome = if matched && self.pending_prize.is_positive() {
            ledger.credit(self.pending_prize, "Scratch Card – Win")?;
            ScratchOutcome::Win(self.pending_prize)
        } else {
            ScratchOutcome::Lose
        };

        self.pending_prize = Money::ZERO;
        self.outcome = Some(outcome);
        self.phase = ScratchPhase::Resolved;

        tracing::info!("Scratch card {} resolved: {:?}", self.id, outcome);
        Ok(outcome)
    }

    /// Back to a blank, unpaid card. Any unrevealed prize is forfeited.
    pub fn new_card(&mut self) {
        if self.pending_prize.is_positive() {
            tracing::warn!(
                "Scratch card {} discarded with {} unrevealed",
                self.id,
                self.pending_prize
            );
        }

        self.phase = ScratchPhase::Idle;
        self.symbols = None;
        self.pending_prize = Money::ZERO;
        self.outcome = None;
        self.mask.reset();
    }
}
