//! Grab batch executor
//!
//! Pairs run strictly in input order. Each pair is validated only when
//! its turn comes: the first malformed or out-of-range pair aborts the
//! batch, and pairs already delivered stay delivered.

use medpick_protocol::{ErrorCode, GrabList, PairToken};

use crate::grid::{GridTable, Slot};
use crate::motion::Position;
use crate::traits::Axis;

/// Batch execution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchPhase {
    /// Validate and start the next pair
    Next,
    /// Moving to the slot
    ToSlot,
    /// Moving to the drop-off position
    ToDropOff,
    /// All pairs delivered or batch aborted
    Finished,
}

/// Events produced by [`GrabBatch::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchEvent {
    /// Keep ticking
    InProgress,
    /// A pair reached the drop-off position
    PairDone { slot: u8, quantity: u32 },
    /// Every pair delivered
    BatchDone,
    /// A pair was rejected; remaining pairs are abandoned
    Failed(ErrorCode),
}

/// Executor for one GRAB command
#[derive(Debug, Clone)]
pub struct GrabBatch {
    pairs: GrabList,
    index: usize,
    phase: BatchPhase,
    /// Pair being delivered
    current: Option<(Slot, u32)>,
}

impl GrabBatch {
    /// Create an executor for the given pairs
    pub fn new(pairs: GrabList) -> Self {
        Self {
            pairs,
            index: 0,
            phase: BatchPhase::Next,
            current: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Number of pairs delivered so far
    pub fn delivered(&self) -> usize {
        self.index
    }

    /// Total pairs in the batch
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if the batch holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Advance the batch after both axes have been ticked
    pub fn update<H: Axis, V: Axis>(
        &mut self,
        horizontal: &mut H,
        vertical: &mut V,
        grid: &GridTable,
    ) -> BatchEvent {
        match self.phase {
            BatchPhase::Next => {
                let Some(token) = self.pairs.get(self.index).copied() else {
                    self.phase = BatchPhase::Finished;
                    return BatchEvent::BatchDone;
                };

                match resolve(token, grid) {
                    Ok((slot, quantity, target)) => {
                        log_debug!("Grab: slot {} x{}", slot.number(), quantity);
                        self.current = Some((slot, quantity));
                        move_both(horizontal, vertical, target);
                        self.phase = BatchPhase::ToSlot;
                        BatchEvent::InProgress
                    }
                    Err(code) => {
                        self.phase = BatchPhase::Finished;
                        BatchEvent::Failed(code)
                    }
                }
            }
            BatchPhase::ToSlot => {
                if !horizontal.is_running() && !vertical.is_running() {
                    move_both(horizontal, vertical, grid.drop_off());
                    self.phase = BatchPhase::ToDropOff;
                }
                BatchEvent::InProgress
            }
            BatchPhase::ToDropOff => {
                if horizontal.is_running() || vertical.is_running() {
                    return BatchEvent::InProgress;
                }
                self.index += 1;
                self.phase = BatchPhase::Next;
                match self.current.take() {
                    Some((slot, quantity)) => BatchEvent::PairDone {
                        slot: slot.number(),
                        quantity,
                    },
                    None => BatchEvent::InProgress,
                }
            }
            BatchPhase::Finished => BatchEvent::BatchDone,
        }
    }
}

/// Validate one pair and look up its target
fn resolve(token: PairToken, grid: &GridTable) -> Result<(Slot, u32, Position), ErrorCode> {
    let PairToken::Pair(pair) = token else {
        return Err(ErrorCode::InvalidFormat);
    };
    if pair.quantity < 1 {
        return Err(ErrorCode::InvalidSlotOrQuantity);
    }
    let slot = Slot::new(pair.slot).map_err(|_| ErrorCode::InvalidSlotOrQuantity)?;
    let target = grid
        .resolve(slot)
        .map_err(|_| ErrorCode::InvalidSlotOrQuantity)?;
    Ok((slot, pair.quantity as u32, target))
}

fn move_both<H: Axis, V: Axis>(horizontal: &mut H, vertical: &mut V, target: Position) {
    horizontal.move_to(target.horizontal);
    vertical.move_to(target.vertical);
}
