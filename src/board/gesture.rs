//! Translates continuous pointer motion into grid-quantized board actions.
//!
//! A gesture starts on pointer-down over a card, proposes a full update on
//! every pointer-move (move and resize give live previews this way; a
//! rejected proposal simply leaves the card at its last accepted position),
//! and resolves on pointer-up. One gesture owns the pointer at a time; there
//! is no abort path besides releasing the pointer.

use super::cards::ScheduleCard;
use super::slots::{BoardConfig, SlotMinute, SlotTime};
use super::store::{BoardAction, DragKind, DragState, EditMode, SweepEdge};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel geometry of the rendered grid: one column per day, one row per hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub column_width: f64,
    pub slot_height: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum GestureState {
    Idle,
    Moving {
        origin: ScheduleCard,
        anchor: PointerPosition,
    },
    Resizing {
        origin: ScheduleCard,
        anchor: PointerPosition,
    },
    Sweeping {
        origin: ScheduleCard,
        anchor: PointerPosition,
        edge: SweepEdge,
    },
}

pub struct GestureController {
    metrics: GridMetrics,
    config: BoardConfig,
    state: GestureState,
}

impl GestureController {
    pub fn new(metrics: GridMetrics, config: BoardConfig) -> Self {
        Self {
            metrics,
            config,
            state: GestureState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// Starts a gesture over `card`. Ignored outside edit mode, and while
    /// another gesture is still holding the pointer.
    pub fn pointer_down(
        &mut self,
        mode: EditMode,
        kind: DragKind,
        card: &ScheduleCard,
        at: PointerPosition,
    ) -> Option<BoardAction> {
        if mode != EditMode::Edit || self.is_active() {
            return None;
        }
        let origin = card.clone();
        self.state = match kind {
            DragKind::Move => GestureState::Moving {
                origin: origin.clone(),
                anchor: at,
            },
            DragKind::ResizeDuration => GestureState::Resizing {
                origin: origin.clone(),
                anchor: at,
            },
            DragKind::SweepDays(edge) => GestureState::Sweeping {
                origin: origin.clone(),
                anchor: at,
                edge,
            },
        };
        Some(BoardAction::SetDragState(Some(DragState {
            kind,
            card_id: origin.id,
            origin,
        })))
    }

    /// Proposes an update for the current pointer position. Move and resize
    /// gestures propose on every event; a day sweep stays silent until
    /// release.
    pub fn pointer_move(&mut self, at: PointerPosition) -> Option<BoardAction> {
        match &self.state {
            GestureState::Idle | GestureState::Sweeping { .. } => None,
            GestureState::Moving { origin, anchor } => {
                Some(BoardAction::UpdateScheduleCard(self.moved_card(
                    origin,
                    *anchor,
                    at,
                )))
            }
            GestureState::Resizing { origin, anchor } => {
                let delta_minutes =
                    ((at.y - anchor.y) / self.metrics.slot_height * 60.0).round() as i64;
                let duration = self
                    .config
                    .clamp_duration(origin.duration + chrono::Duration::minutes(delta_minutes));
                Some(BoardAction::UpdateScheduleCard(
                    origin.clone().with_duration(duration),
                ))
            }
        }
    }

    /// Ends the gesture. A day sweep commits its duplication here; all
    /// gestures clear the drag state and return the machine to idle.
    pub fn pointer_up(&mut self, at: PointerPosition) -> Vec<BoardAction> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Idle => vec![],
            GestureState::Moving { .. } | GestureState::Resizing { .. } => {
                vec![BoardAction::SetDragState(None)]
            }
            GestureState::Sweeping {
                origin,
                anchor,
                edge,
            } => {
                let delta_days = ((at.x - anchor.x) / self.metrics.column_width).round() as i64;
                if delta_days == 0 {
                    return vec![BoardAction::SetDragState(None)];
                }
                let target = origin.day.offset(delta_days);
                let (start_day, end_day) = match edge {
                    SweepEdge::Right => (origin.day, target),
                    SweepEdge::Left => (target, origin.day),
                };
                vec![
                    BoardAction::DuplicateToDays {
                        card_id: origin.id,
                        start_day,
                        end_day,
                    },
                    BoardAction::SetDragState(None),
                ]
            }
        }
    }

    fn moved_card(
        &self,
        origin: &ScheduleCard,
        anchor: PointerPosition,
        at: PointerPosition,
    ) -> ScheduleCard {
        let dx = at.x - anchor.x;
        let dy = at.y - anchor.y;

        let day_delta = (dx / self.metrics.column_width).round() as i64;
        // Quantize vertical motion to whole minutes first, then to half-hour
        // steps.
        let minute_delta =
            ((dy / self.metrics.slot_height * 60.0).round() / 30.0).round() as i64 * 30;

        let day = origin.day.offset(day_delta);
        let total_minutes = origin.start_minute_of_day() + minute_delta;
        let hour = self.config.clamp_hour(total_minutes.div_euclid(60));
        let minute = if (total_minutes % 60).max(0) >= 30 {
            SlotMinute::Half
        } else {
            SlotMinute::Zero
        };
        origin
            .clone()
            .with_day(day)
            .with_start(SlotTime::new(hour, minute))
    }
}
