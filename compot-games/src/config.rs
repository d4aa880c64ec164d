use crate::error::{GameError, Result};
use crate::selector::PrizeTable;
use compot_core::Money;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Chance that a play enters the weighted prize draw at all.
pub const DEFAULT_WIN_PROBABILITY: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub win_probability: f64,
    pub scratch: ScratchConfig,
    pub pick_box: PickBoxConfig,
    pub wheel: WheelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchConfig {
    pub cost: Money,
    pub prizes: PrizeTable,
    pub width: usize,
    pub height: usize,
    pub reveal_threshold: f64,
    pub sample_stride: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickBoxConfig {
    pub cost: Money,
    pub box_count: usize,
    pub prizes: PrizeTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    pub cost: Money,
    /// Prize per slice, clockwise from the pointer. Must contain a 0 slice.
    pub slices: Vec<Money>,
    pub prizes: PrizeTable,
    pub base_turns: u32,
    pub max_extra_turns: u32,
    pub spin_duration_ms: u64,
}

impl WheelConfig {
    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }
}

fn table(entries: &[(i64, f64)]) -> PrizeTable {
    let entries = entries
        .iter()
        .map(|&(pence, weight)| (Money::from_pence(pence), weight));
    match PrizeTable::new(entries) {
        Ok(table) => table,
        Err(e) => unreachable!("built-in prize table is invalid: {}", e),
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            cost: Money::from_pounds_whole(2),
            prizes: table(&[(200, 50.0), (500, 30.0), (1_000, 15.0), (5_000, 5.0)]),
            width: 300,
            height: 150,
            reveal_threshold: 0.75,
            sample_stride: 16,
        }
    }
}

impl Default for PickBoxConfig {
    fn default() -> Self {
        Self {
            cost: Money::from_pounds_whole(1),
            box_count: 9,
            prizes: table(&[(100, 50.0), (200, 30.0), (500, 15.0), (2_000, 5.0)]),
        }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            cost: Money::from_pounds_whole(3),
            slices: [0, 1, 2, 5, 10, 20, 50, 100]
                .into_iter()
                .map(Money::from_pounds_whole)
                .collect(),
            prizes: table(&[
                (100, 40.0),
                (200, 30.0),
                (500, 15.0),
                (1_000, 9.0),
                (2_000, 4.0),
                (5_000, 1.5),
                (10_000, 0.5),
            ]),
            base_turns: 5,
            max_extra_turns: 2,
            spin_duration_ms: 3_250,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_probability: DEFAULT_WIN_PROBABILITY,
            scratch: ScratchConfig::default(),
            pick_box: PickBoxConfig::default(),
            wheel: WheelConfig::default(),
        }
    }
}

impl GameConfig {
    /// Read a config file, falling back to the defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GameError::invalid_config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.win_probability) {
            return Err(GameError::invalid_config(
                "win probability must be between 0 and 1",
            ));
        }

        self.scratch.validate()?;
        self.pick_box.validate()?;
        self.wheel.validate()?;
        Ok(())
    }
}

fn validate_prizes(game: &str, cost: Money, prizes: &PrizeTable) -> Result<()> {
    if !cost.is_positive() {
        return Err(GameError::invalid_config(format!(
            "{} cost must be positive",
            game
        )));
    }
    if prizes.prizes().any(|p| !p.is_positive()) {
        return Err(GameError::invalid_config(format!(
            "{} prize table may only hold positive prizes",
            game
        )));
    }
    Ok(())
}

impl ScratchConfig {
    pub fn validate(&self) -> Result<()> {
        validate_prizes("scratch card", self.cost, &self.prizes)?;

        if self.width == 0 || self.height == 0 {
            return Err(GameError::invalid_config("scratch mask cannot be empty"));
        }
        if self.sample_stride == 0 {
            return Err(GameError::invalid_config("sample stride must be at least 1"));
        }
        if !(self.reveal_threshold > 0.0 && self.reveal_threshold <= 1.0) {
            return Err(GameError::invalid_config(
                "reveal threshold must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

impl PickBoxConfig {
    pub fn validate(&self) -> Result<()> {
        validate_prizes("pick-a-box", self.cost, &self.prizes)?;

        if self.box_count == 0 {
            return Err(GameError::invalid_config("pick-a-box needs at least one box"));
        }
        Ok(())
    }
}

impl WheelConfig {
    pub fn validate(&self) -> Result<()> {
        validate_prizes("wheel", self.cost, &self.prizes)?;

        if !self.slices.contains(&Money::ZERO) {
            return Err(GameError::invalid_config("wheel needs a 0 slice for losses"));
        }
        if let Some(orphan) = self.prizes.prizes().find(|p| !self.slices.contains(p)) {
            return Err(GameError::invalid_config(format!(
                "wheel prize {} has no slice",
                orphan
            )));
        }
        Ok(())
    }
}
