use crate::config::{GameConfig, PickBoxConfig};
use crate::error::{GameError, Result};
use crate::rng::RandomSource;
use crate::selector::draw_prize;
use compot_core::{Ledger, Money};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxSlot {
    /// Prize written on the box once opened; `None` while unopened.
    pub label: Option<Money>,
    pub enabled: bool,
}

impl BoxSlot {
    const CLOSED: BoxSlot = BoxSlot {
        label: None,
        enabled: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxPick {
    pub index: usize,
    pub prize: Money,
}

impl BoxPick {
    pub fn is_win(&self) -> bool {
        self.prize.is_positive()
    }
}

/// One pick per round: `Idle -> Locked` until [`PickABox::reset`].
#[derive(Debug)]
pub struct PickABox {
    id: Uuid,
    config: PickBoxConfig,
    win_probability: f64,
    boxes: Vec<BoxSlot>,
    locked: bool,
}

impl PickABox {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_config(config.pick_box.clone(), config.win_probability)
    }

    pub fn with_config(config: PickBoxConfig, win_probability: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            boxes: vec![BoxSlot::CLOSED; config.box_count],
            config,
            win_probability,
            locked: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cost(&self) -> Money {
        self.config.cost
    }

    pub fn boxes(&self) -> &[BoxSlot] {
        &self.boxes
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn pick(
        &mut self,
        index: usize,
        ledger: &Ledger,
        rng: &mut dyn RandomSource,
    ) -> Result<BoxPick> {
        if self.locked {
            tracing::warn!("Pick-a-box {} already resolved this round, ignoring", self.id);
            return Err(GameError::ConcurrentPlayRejected);
        }
        if index >= self.boxes.len() {
            return Err(GameError::InvalidBox {
                index,
                count: self.boxes.len(),
            });
        }

        ledger.debit(self.config.cost, "Pick-a-Box (Play)")?;

        let prize = draw_prize(rng, self.win_probability, &self.config.prizes);
        self.boxes[index].label = Some(prize);
        for slot in &mut self.boxes {
            slot.enabled = false;
        }
        self.locked = true;

        if prize.is_positive() {
            ledger.credit(prize, "Pick-a-Box – Win")?;
        }

        tracing::info!("Pick-a-box {} opened box {} for {}", self.id, index, prize);
        Ok(BoxPick { index, prize })
    }

    pub fn reset(&mut self) {
        self.boxes.fill(BoxSlot::CLOSED);
        self.locked = false;
    }
}
