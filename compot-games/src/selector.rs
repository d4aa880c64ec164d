use crate::error::{GameError, Result};
use crate::rng::{chance, RandomSource};
use compot_core::Money;
use serde::{Deserialize, Serialize};

/// One weighted entry of a prize table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub prize: T,
    pub weight: f64,
}

/// Ordered `(prize, weight)` list with relative, strictly positive weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Weighted<T>>",
    into = "Vec<Weighted<T>>",
    bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>")
)]
pub struct WeightedTable<T: Clone> {
    entries: Vec<Weighted<T>>,
    total_weight: f64,
}

impl<T: Clone> WeightedTable<T> {
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>) -> Result<Self> {
        let entries: Vec<Weighted<T>> = entries
            .into_iter()
            .map(|(prize, weight)| Weighted { prize, weight })
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<Weighted<T>>) -> Result<Self> {
        if entries.is_empty() {
            return Err(GameError::invalid_config("prize table is empty"));
        }
        if let Some(bad) = entries
            .iter()
            .position(|e| !(e.weight.is_finite() && e.weight > 0.0))
        {
            return Err(GameError::invalid_config(format!(
                "weight at position {} must be positive, got {}",
                bad, entries[bad].weight
            )));
        }

        let total_weight = entries.iter().map(|e| e.weight).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    pub fn entries(&self) -> &[Weighted<T>] {
        &self.entries
    }

    pub fn prizes(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.prize)
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Map one uniform draw in `[0, 1)` to a prize.
    pub fn select_with(&self, draw: f64) -> T {
        let mut remaining = draw * self.total_weight;
        for entry in &self.entries {
            remaining -= entry.weight;
            if remaining <= 0.0 {
                return entry.prize.clone();
            }
        }

        // Float drift can walk off the end; the last entry absorbs it.
        self.entries[self.entries.len() - 1].prize.clone()
    }

    pub fn select(&self, rng: &mut dyn RandomSource) -> T {
        self.select_with(rng.next_f64())
    }
}

impl<T: Clone> TryFrom<Vec<Weighted<T>>> for WeightedTable<T> {
    type Error = GameError;

    fn try_from(entries: Vec<Weighted<T>>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl<T: Clone> From<WeightedTable<T>> for Vec<Weighted<T>> {
    fn from(table: WeightedTable<T>) -> Self {
        table.entries
    }
}

pub type PrizeTable = WeightedTable<Money>;

/// Win/lose gate followed by a weighted prize draw.
///
/// A losing gate draw yields zero without consulting the table.
pub fn draw_prize(rng: &mut dyn RandomSource, win_probability: f64, table: &PrizeTable) -> Money {
    if !chance(rng, win_probability) {
        tracing::debug!("Gate draw lost");
        return Money::ZERO;
    }

    let prize = table.select(rng);
    tracing::debug!("Gate draw won, prize {}", prize);
    prize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{SeededRandom, SequenceRandom};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Letter {
        A,
        B,
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(WeightedTable::new(Vec::<(u8, f64)>::new()).is_err());
        assert!(WeightedTable::new([(1u8, 1.0), (2, 0.0)]).is_err());
        assert!(WeightedTable::new([(1u8, f64::NAN)]).is_err());
        assert!(WeightedTable::new([(1u8, -3.0)]).is_err());
    }

    #[test]
    fn test_select_with_is_deterministic() {
        let table = WeightedTable::new([('a', 1.0), ('b', 2.0), ('c', 1.0)]).unwrap();
        assert_eq!(table.select_with(0.0), 'a');
        assert_eq!(table.select_with(0.25), 'a');
        assert_eq!(table.select_with(0.26), 'b');
        assert_eq!(table.select_with(0.75), 'b');
        assert_eq!(table.select_with(0.76), 'c');
        assert_eq!(table.select_with(0.999_999), 'c');
    }

    #[test]
    fn test_drift_falls_back_to_last() {
        let table = WeightedTable::new([('a', 1.0), ('z', 1.0)]).unwrap();
        assert_eq!(table.select_with(1.5), 'z');
    }

    #[test]
    fn test_empirical_frequency_converges() {
        let table = WeightedTable::new([(Letter::A, 90.0), (Letter::B, 10.0)]).unwrap();
        let mut rng = SeededRandom::new(42);

        let draws = 100_000;
        let hits = (0..draws)
            .filter(|_| table.select(&mut rng) == Letter::A)
            .count();
        let frequency = hits as f64 / draws as f64;
        assert!((frequency - 0.9).abs() < 0.01, "frequency {}", frequency);
    }

    #[test]
    fn test_gate_loss_skips_table() {
        let table = PrizeTable::new([(Money::from_pence(500), 1.0)]).unwrap();
        let mut rng = SequenceRandom::new([0.95, 0.0]);

        assert_eq!(draw_prize(&mut rng, 0.1, &table), Money::ZERO);
        assert_eq!(rng.remaining(), 1);
    }

    #[test]
    fn test_gate_win_selects_prize() {
        let table = PrizeTable::new([
            (Money::from_pence(200), 1.0),
            (Money::from_pence(500), 1.0),
        ])
        .unwrap();
        let mut rng = SequenceRandom::new([0.05, 0.9]);
        assert_eq!(draw_prize(&mut rng, 0.1, &table), Money::from_pence(500));
    }

    #[test]
    fn test_table_serde_validates() {
        let table: PrizeTable =
            serde_json::from_str(r#"[{"prize": 2.0, "weight": 3}, {"prize": 5.0, "weight": 1}]"#)
                .unwrap();
        assert_eq!(table.total_weight(), 4.0);
        assert!(serde_json::from_str::<PrizeTable>(r#"[{"prize": 2.0, "weight": 0}]"#).is_err());
    }
}
