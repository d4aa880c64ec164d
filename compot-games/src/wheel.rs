//! Spin-the-wheel.
//!
//! The debit and the draw happen synchronously when the spin starts. The
//! credit happens when the spin animation finishes, on a tokio task owned by
//! the wheel session. Tearing the session down aborts that task: the stake
//! is kept and no prize is paid.

use crate::config::{GameConfig, WheelConfig};
use crate::error::{GameError, Result};
use crate::rng::{pick_index, RandomSource};
use crate::selector::draw_prize;
use compot_core::{Ledger, Money};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub fn slice_width(slice_count: usize) -> f64 {
    360.0 / slice_count as f64
}

/// Rotation that lands the middle of `slice_index` under the pointer after
/// `base_turns + extra_turns` whole turns.
pub fn target_angle(slice_index: usize, slice_count: usize, base_turns: u32, extra_turns: u32) -> f64 {
    let width = slice_width(slice_count);
    f64::from(base_turns + extra_turns) * 360.0 + slice_index as f64 * width + width / 2.0
}

/// Slice selected by a rotation angle.
pub fn slice_at(angle: f64, slice_count: usize) -> usize {
    let index = (angle.rem_euclid(360.0) / slice_width(slice_count)) as usize;
    index.min(slice_count - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelPhase {
    Idle,
    Spinning,
    Resolved,
}

/// What a spin will do, known as soon as it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    pub prize: Money,
    pub slice_index: usize,
    pub extra_turns: u32,
    pub target_angle: f64,
    pub total_rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinOutcome {
    pub prize: Money,
    pub slice_index: usize,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.prize.is_positive()
    }
}

pub struct SpinWheel {
    id: Uuid,
    config: WheelConfig,
    win_probability: f64,
    rotation: f64,
    busy: Arc<AtomicBool>,
    resolved: Arc<Mutex<Option<SpinOutcome>>>,
    task: Option<JoinHandle<Result<SpinOutcome>>>,
}

impl SpinWheel {
    pub fn new(config: &GameConfig) -> Result<Self> {
        Self::with_config(config.wheel.clone(), config.win_probability)
    }

    pub fn with_config(config: WheelConfig, win_probability: f64) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            win_probability,
            rotation: 0.0,
            busy: Arc::new(AtomicBool::new(false)),
            resolved: Arc::new(Mutex::new(None)),
            task: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cost(&self) -> Money {
        self.config.cost
    }

    pub fn slices(&self) -> &[Money] {
        &self.config.slices
    }

    /// Total rotation applied so far, in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> WheelPhase {
        if self.is_busy() {
            WheelPhase::Spinning
        } else if self.resolved.lock().is_some() {
            WheelPhase::Resolved
        } else {
            WheelPhase::Idle
        }
    }

    pub fn last_outcome(&self) -> Option<SpinOutcome> {
        *self.resolved.lock()
    }

    pub fn slice_for(&self, prize: Money) -> Option<usize> {
        self.config.slices.iter().position(|s| *s == prize)
    }

    /// Start a spin. Must be called from within a tokio runtime.
    pub fn spin(&mut self, ledger: &Arc<Ledger>, rng: &mut dyn RandomSource) -> Result<SpinPlan> {
        if self.is_busy() {
            tracing::warn!("Wheel {} is still spinning, ignoring", self.id);
            return Err(GameError::ConcurrentPlayRejected);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GameError::Internal(format!("wheel needs a tokio runtime: {}", e)))?;

        ledger.debit(self.config.cost, "Spin the Wheel (Play)")?;

        let prize = draw_prize(rng, self.win_probability, &self.config.prizes);
        let slice_index = self.slice_for(prize).ok_or_else(|| {
            GameError::Internal(format!("prize {} has no slice on the wheel", prize))
        })?;
        let extra_turns = pick_index(rng, self.config.max_extra_turns as usize + 1) as u32;

        let target = target_angle(
            slice_index,
            self.config.slices.len(),
            self.config.base_turns,
            extra_turns,
        );
        self.rotation += target;

        self.busy.store(true, Ordering::SeqCst);
        *self.resolved.lock() = None;

        let outcome = SpinOutcome { prize, slice_index };
        let ledger = Arc::clone(ledger);
        let busy = Arc::clone(&self.busy);
        let resolved = Arc::clone(&self.resolved);
        let duration = self.config.spin_duration();
        let id = self.id;

        self.task = Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;

            let paid = if outcome.is_win() {
                ledger
                    .credit(outcome.prize, "Spin the Wheel – Win")
                    .map(|_| ())
            } else {
                Ok(())
            };

            if paid.is_ok() {
                *resolved.lock() = Some(outcome);
            }
            busy.store(false, Ordering::SeqCst);

            paid?;
            tracing::info!("Wheel {} landed on slice {} for {}", id, outcome.slice_index, outcome.prize);
            Ok::<_, GameError>(outcome)
        }));

        tracing::info!(
            "Wheel {} spinning to {:.1} degrees (slice {})",
            self.id,
            target,
            slice_index
        );
        Ok(SpinPlan {
            prize,
            slice_index,
            extra_turns,
            target_angle: target,
            total_rotation: self.rotation,
        })
    }

    /// Wait for the current spin to finish. Returns the last outcome when
    /// nothing is in flight.
    pub async fn await_result(&mut self) -> Result<Option<SpinOutcome>> {
        let Some(task) = self.task.take() else {
            return Ok(self.last_outcome());
        };

        let outcome = task
            .await
            .map_err(|e| GameError::Internal(format!("spin task failed: {}", e)))??;
        Ok(Some(outcome))
    }

    /// Abort an in-flight spin. The stake is not refunded.
    pub fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                tracing::warn!("Wheel {} torn down mid-spin; stake kept, no payout", self.id);
            }
            task.abort();
        }
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl Drop for SpinWheel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for SpinWheel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinWheel")
            .field("id", &self.id)
            .field("rotation", &self.rotation)
            .field("busy", &self.is_busy())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}
