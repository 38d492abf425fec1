//! Single source of truth for the weekly board. All mutations funnel through
//! [Board::apply], which either commits an action atomically or leaves the
//! state untouched. Conflicting placements are rejected, never partially
//! applied.

use serde::Deserialize;
use serde::Serialize;

use super::cards::{CardId, Day, MasterCard, ScheduleCard, default_master_cards};
use super::slots::{BoardConfig, SlotTime};

/// At most one thing is selected at a time. Selecting a schedule card clears a
/// master-card selection and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Schedule(CardId),
    Master(CardId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepEdge {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeDuration,
    SweepDays(SweepEdge),
}

/// Snapshot of an in-progress gesture. Only lives between pointer-down and
/// pointer-up; `origin` holds the card as it was before the gesture started.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub kind: DragKind,
    pub card_id: CardId,
    pub origin: ScheduleCard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    SetEditMode(EditMode),
    SelectScheduleCard(Option<CardId>),
    SelectMasterCard(Option<CardId>),
    AddMasterCard(MasterCard),
    UpdateMasterCard { card: MasterCard, cascade: bool },
    DeleteMasterCard(CardId),
    AddScheduleCard(ScheduleCard),
    UpdateScheduleCard(ScheduleCard),
    DeleteScheduleCard(CardId),
    DuplicateToDays {
        card_id: CardId,
        start_day: Day,
        end_day: Day,
    },
    SetDragState(Option<DragState>),
    Load(BoardSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The candidate interval intersects an existing card on the same day.
    Overlap,
    /// The action referenced a card id the board doesn't know.
    UnknownCard,
}

/// Result of [Board::apply]. A rejected action leaves the board exactly as it
/// was; the reason is informational and has no state attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    Applied,
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Persistable slice of the board: configuration and cards, but not the
/// transient selection/drag/edit-mode state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub config: BoardConfig,
    pub master_cards: Vec<MasterCard>,
    pub schedule_cards: Vec<ScheduleCard>,
}

#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    master_cards: Vec<MasterCard>,
    schedule_cards: Vec<ScheduleCard>,
    selection: Selection,
    edit_mode: EditMode,
    drag: Option<DragState>,
}

impl Default for Board {
    fn default() -> Self {
        Self::with_config(BoardConfig::default())
    }
}

impl Board {
    pub fn with_config(config: BoardConfig) -> Self {
        Self {
            config,
            master_cards: default_master_cards(),
            schedule_cards: vec![],
            selection: Selection::None,
            edit_mode: EditMode::View,
            drag: None,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn master_cards(&self) -> &[MasterCard] {
        &self.master_cards
    }

    pub fn schedule_cards(&self) -> &[ScheduleCard] {
        &self.schedule_cards
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn master_card(&self, id: CardId) -> Option<&MasterCard> {
        self.master_cards.iter().find(|card| card.id == id)
    }

    pub fn schedule_card(&self, id: CardId) -> Option<&ScheduleCard> {
        self.schedule_cards.iter().find(|card| card.id == id)
    }

    /// Cards placed on `day`, ordered by start time.
    pub fn cards_for_day(&self, day: Day) -> Vec<&ScheduleCard> {
        let mut cards = self
            .schedule_cards
            .iter()
            .filter(|card| card.day == day)
            .collect::<Vec<_>>();
        cards.sort_by_key(|card| card.start_minute_of_day());
        cards
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            config: self.config,
            master_cards: self.master_cards.clone(),
            schedule_cards: self.schedule_cards.clone(),
        }
    }

    /// Places a new instance of a master card, inheriting its default
    /// duration. The new card becomes the selection on success.
    pub fn place_from_master(
        &mut self,
        master_id: CardId,
        day: Day,
        start: SlotTime,
    ) -> Outcome {
        let Some(master) = self.master_card(master_id) else {
            return Outcome::Rejected(RejectReason::UnknownCard);
        };
        let card = ScheduleCard::new(master, day, start);
        self.apply(BoardAction::AddScheduleCard(card))
    }

    pub fn toggle_edit_mode(&mut self) {
        self.edit_mode = match self.edit_mode {
            EditMode::View => EditMode::Edit,
            EditMode::Edit => EditMode::View,
        };
    }

    pub fn apply(&mut self, action: BoardAction) -> Outcome {
        match action {
            BoardAction::SetEditMode(mode) => {
                self.edit_mode = mode;
                Outcome::Applied
            }
            BoardAction::SelectScheduleCard(id) => {
                self.selection = id.map_or(Selection::None, Selection::Schedule);
                Outcome::Applied
            }
            BoardAction::SelectMasterCard(id) => {
                self.selection = id.map_or(Selection::None, Selection::Master);
                Outcome::Applied
            }
            BoardAction::AddMasterCard(card) => {
                self.master_cards.push(card);
                Outcome::Applied
            }
            BoardAction::UpdateMasterCard { card, cascade } => self.update_master(card, cascade),
            BoardAction::DeleteMasterCard(id) => self.delete_master(id),
            BoardAction::AddScheduleCard(card) => self.add_schedule_card(card),
            BoardAction::UpdateScheduleCard(card) => self.update_schedule_card(card),
            BoardAction::DeleteScheduleCard(id) => self.delete_schedule_card(id),
            BoardAction::DuplicateToDays {
                card_id,
                start_day,
                end_day,
            } => self.duplicate_to_days(card_id, start_day, end_day),
            BoardAction::SetDragState(drag) => {
                self.drag = drag;
                Outcome::Applied
            }
            BoardAction::Load(snapshot) => {
                self.config = snapshot.config;
                self.master_cards = snapshot.master_cards;
                self.schedule_cards = snapshot.schedule_cards;
                Outcome::Applied
            }
        }
    }

    fn update_master(&mut self, card: MasterCard, cascade: bool) -> Outcome {
        let Some(existing) = self.master_cards.iter_mut().find(|c| c.id == card.id) else {
            return Outcome::Rejected(RejectReason::UnknownCard);
        };
        *existing = card.clone();
        if cascade {
            // Cascaded duration rewrites deliberately skip the overlap check;
            // instances keep their slots and just get the new length.
            for instance in &mut self.schedule_cards {
                if instance.master_id == card.id {
                    instance.duration = card.default_duration;
                }
            }
        }
        Outcome::Applied
    }

    fn delete_master(&mut self, id: CardId) -> Outcome {
        if self.master_card(id).is_none() {
            return Outcome::Rejected(RejectReason::UnknownCard);
        }
        let doomed = self
            .schedule_cards
            .iter()
            .filter(|card| card.master_id == id)
            .map(|card| card.id)
            .collect::<Vec<_>>();
        self.master_cards.retain(|card| card.id != id);
        self.schedule_cards.retain(|card| card.master_id != id);
        match self.selection {
            Selection::Master(selected) if selected == id => self.selection = Selection::None,
            Selection::Schedule(selected) if doomed.contains(&selected) => {
                self.selection = Selection::None
            }
            _ => {}
        }
        Outcome::Applied
    }

    fn add_schedule_card(&mut self, card: ScheduleCard) -> Outcome {
        if self.schedule_cards.iter().any(|existing| existing.overlaps(&card)) {
            return Outcome::Rejected(RejectReason::Overlap);
        }
        self.selection = Selection::Schedule(card.id);
        self.schedule_cards.push(card);
        Outcome::Applied
    }

    fn update_schedule_card(&mut self, card: ScheduleCard) -> Outcome {
        if self.schedule_card(card.id).is_none() {
            return Outcome::Rejected(RejectReason::UnknownCard);
        }
        let clamped = self.config.clamp_duration(card.duration);
        let card = card.with_duration(clamped);
        let conflict = self
            .schedule_cards
            .iter()
            .any(|existing| existing.id != card.id && existing.overlaps(&card));
        if conflict {
            return Outcome::Rejected(RejectReason::Overlap);
        }
        for existing in &mut self.schedule_cards {
            if existing.id == card.id {
                *existing = card;
                break;
            }
        }
        Outcome::Applied
    }

    fn delete_schedule_card(&mut self, id: CardId) -> Outcome {
        if self.schedule_card(id).is_none() {
            return Outcome::Rejected(RejectReason::UnknownCard);
        }
        self.schedule_cards.retain(|card| card.id != id);
        if self.selection == Selection::Schedule(id) {
            self.selection = Selection::None;
        }
        Outcome::Applied
    }

    /// Copies a card onto every other day of the inclusive range, keeping its
    /// time and duration. Days run in ascending order; the source day is
    /// skipped, and a candidate that would overlap anything already placed --
    /// including copies made earlier in this batch -- is silently dropped.
    fn duplicate_to_days(&mut self, card_id: CardId, start_day: Day, end_day: Day) -> Outcome {
        let Some(source) = self.schedule_card(card_id).cloned() else {
            return Outcome::Rejected(RejectReason::UnknownCard);
        };

        let from = start_day.index().min(end_day.index());
        let to = start_day.index().max(end_day.index());

        let mut copies: Vec<ScheduleCard> = vec![];
        for index in from..=to {
            let day = Day::try_from(index).expect("range stays within the week");
            if day == source.day {
                continue;
            }
            let copy = ScheduleCard {
                id: CardId::new(),
                ..source.clone()
            }
            .with_day(day);
            let conflict = self
                .schedule_cards
                .iter()
                .chain(copies.iter())
                .any(|existing| existing.overlaps(&copy));
            if !conflict {
                copies.push(copy);
            }
        }

        self.schedule_cards.extend(copies);
        Outcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::board::cards::{CardColor, CardId, Day, MasterCard, ScheduleCard};
    use crate::board::slots::{SlotMinute, SlotTime};

    use super::{
        Board, BoardAction, EditMode, Outcome, RejectReason, Selection,
    };

    fn gym() -> MasterCard {
        MasterCard::new("Gym", CardColor::Crimson, Duration::minutes(60))
    }

    fn board_with(master: &MasterCard) -> Board {
        let mut board = Board::default();
        assert!(board
            .apply(BoardAction::AddMasterCard(master.clone()))
            .is_applied());
        board
    }

    fn at(hour: u8, minute: SlotMinute) -> SlotTime {
        SlotTime::new(hour, minute)
    }

    /// Invariant from the data model: no two same-day cards may intersect.
    fn assert_no_overlaps(board: &Board) {
        let cards = board.schedule_cards();
        for (i, a) in cards.iter().enumerate() {
            for b in &cards[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    fn place(board: &mut Board, master: &MasterCard, day: Day, start: SlotTime) -> ScheduleCard {
        let card = ScheduleCard::new(master, day, start);
        assert!(board
            .apply(BoardAction::AddScheduleCard(card.clone()))
            .is_applied());
        card
    }

    #[test]
    fn test_add_rejects_overlap_and_accepts_adjacent() {
        let master = gym();
        let mut board = board_with(&master);
        place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        // [540, 600) and [570, 630) intersect.
        let overlapping = ScheduleCard::new(&master, Day::Mon, at(9, SlotMinute::Half));
        assert_eq!(
            board.apply(BoardAction::AddScheduleCard(overlapping)),
            Outcome::Rejected(RejectReason::Overlap)
        );
        assert_eq!(board.schedule_cards().len(), 1);

        // [540, 600) and [600, 660) are adjacent, not overlapping.
        let adjacent = ScheduleCard::new(&master, Day::Mon, at(10, SlotMinute::Zero));
        assert!(board.apply(BoardAction::AddScheduleCard(adjacent)).is_applied());
        assert_eq!(board.schedule_cards().len(), 2);
        assert_no_overlaps(&board);
    }

    #[test]
    fn test_add_selects_new_card() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        assert_eq!(board.selection(), Selection::Schedule(card.id));
    }

    #[test]
    fn test_same_slot_on_other_day_is_fine() {
        let master = gym();
        let mut board = board_with(&master);
        place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        place(&mut board, &master, Day::Tue, at(9, SlotMinute::Zero));
        assert_no_overlaps(&board);
    }

    #[test]
    fn test_update_moves_card_when_free() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        let moved = card.clone().with_day(Day::Wed).with_start(at(14, SlotMinute::Half));
        assert!(board
            .apply(BoardAction::UpdateScheduleCard(moved.clone()))
            .is_applied());
        assert_eq!(board.schedule_card(card.id), Some(&moved));
        assert_eq!(board.schedule_cards().len(), 1);
    }

    #[test]
    fn test_update_rejected_atomically_on_conflict() {
        let master = gym();
        let mut board = board_with(&master);
        let first = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        let second = place(&mut board, &master, Day::Mon, at(11, SlotMinute::Zero));

        let conflicting = second.clone().with_start(at(9, SlotMinute::Half));
        assert_eq!(
            board.apply(BoardAction::UpdateScheduleCard(conflicting)),
            Outcome::Rejected(RejectReason::Overlap)
        );
        // Nothing changed, not even the duration clamp.
        assert_eq!(board.schedule_card(first.id), Some(&first));
        assert_eq!(board.schedule_card(second.id), Some(&second));
    }

    #[test]
    fn test_update_ignores_self_overlap() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        // Growing in place overlaps only the card's own old interval.
        let grown = card.clone().with_duration(Duration::minutes(120));
        assert!(board.apply(BoardAction::UpdateScheduleCard(grown)).is_applied());
        assert_eq!(
            board.schedule_card(card.id).unwrap().duration,
            Duration::minutes(120)
        );
    }

    #[test]
    fn test_update_clamps_duration_before_overlap_check() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        // 105 minutes rounds up to 120 before being applied.
        let resized = card.clone().with_duration(Duration::minutes(105));
        assert!(board.apply(BoardAction::UpdateScheduleCard(resized)).is_applied());
        assert_eq!(
            board.schedule_card(card.id).unwrap().duration,
            Duration::minutes(120)
        );
    }

    #[test]
    fn test_delete_clears_selection_of_deleted_card() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        assert_eq!(board.selection(), Selection::Schedule(card.id));

        assert!(board
            .apply(BoardAction::DeleteScheduleCard(card.id))
            .is_applied());
        assert!(board.schedule_cards().is_empty());
        assert_eq!(board.selection(), Selection::None);
    }

    #[test]
    fn test_delete_keeps_unrelated_selection() {
        let master = gym();
        let mut board = board_with(&master);
        let first = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        let second = place(&mut board, &master, Day::Tue, at(9, SlotMinute::Zero));
        assert!(board
            .apply(BoardAction::SelectScheduleCard(Some(first.id)))
            .is_applied());

        assert!(board
            .apply(BoardAction::DeleteScheduleCard(second.id))
            .is_applied());
        assert_eq!(board.selection(), Selection::Schedule(first.id));
    }

    #[test]
    fn test_delete_master_cascades() {
        let master = gym();
        let other = MasterCard::new("Reading", CardColor::Amber, Duration::minutes(30));
        let mut board = board_with(&master);
        assert!(board
            .apply(BoardAction::AddMasterCard(other.clone()))
            .is_applied());
        place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        place(&mut board, &master, Day::Tue, at(9, SlotMinute::Zero));
        let kept = place(&mut board, &other, Day::Wed, at(9, SlotMinute::Zero));

        assert!(board
            .apply(BoardAction::DeleteMasterCard(master.id))
            .is_applied());
        assert!(board.master_card(master.id).is_none());
        assert_eq!(board.schedule_cards().len(), 1);
        assert_eq!(board.schedule_cards()[0].id, kept.id);
    }

    #[test]
    fn test_cascade_overwrites_instance_durations() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));
        let resized = card.clone().with_duration(Duration::minutes(120));
        assert!(board.apply(BoardAction::UpdateScheduleCard(resized)).is_applied());

        let mut updated = master.clone();
        updated.default_duration = Duration::minutes(90);
        assert!(board
            .apply(BoardAction::UpdateMasterCard {
                card: updated,
                cascade: true,
            })
            .is_applied());
        assert_eq!(
            board.schedule_card(card.id).unwrap().duration,
            Duration::minutes(90)
        );
    }

    #[test]
    fn test_update_without_cascade_keeps_instances() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        let mut updated = master.clone();
        updated.default_duration = Duration::minutes(90);
        assert!(board
            .apply(BoardAction::UpdateMasterCard {
                card: updated.clone(),
                cascade: false,
            })
            .is_applied());
        assert_eq!(
            board.master_card(master.id).unwrap().default_duration,
            Duration::minutes(90)
        );
        assert_eq!(
            board.schedule_card(card.id).unwrap().duration,
            Duration::minutes(60)
        );
    }

    #[test]
    fn test_duplicate_to_days_skips_source_and_conflicts() {
        let master = gym();
        let mut board = board_with(&master);
        let source = place(&mut board, &master, Day::Wed, at(9, SlotMinute::Zero));
        // Monday already has something in the way.
        let blocker = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Half));
        let existing = [source.id, blocker.id];

        assert!(board
            .apply(BoardAction::DuplicateToDays {
                card_id: source.id,
                start_day: Day::Sun,
                end_day: Day::Thu,
            })
            .is_applied());

        // Candidates were Sun, Mon, Tue, Thu; the Monday copy was blocked.
        let mut copy_days = board
            .schedule_cards()
            .iter()
            .filter(|card| !existing.contains(&card.id))
            .map(|card| card.day)
            .collect::<Vec<_>>();
        copy_days.sort_by_key(|day| day.index());
        assert_eq!(copy_days, vec![Day::Sun, Day::Tue, Day::Thu]);
        assert_no_overlaps(&board);
    }

    #[test]
    fn test_duplicate_covers_every_other_day_of_the_range() {
        let master = gym();
        let mut board = board_with(&master);
        let source = place(&mut board, &master, Day::Wed, at(9, SlotMinute::Zero));

        assert!(board
            .apply(BoardAction::DuplicateToDays {
                card_id: source.id,
                start_day: Day::Sun,
                end_day: Day::Thu,
            })
            .is_applied());

        let mut copy_days = board
            .schedule_cards()
            .iter()
            .filter(|card| card.id != source.id)
            .map(|card| card.day)
            .collect::<Vec<_>>();
        copy_days.sort_by_key(|day| day.index());
        assert_eq!(copy_days, vec![Day::Sun, Day::Mon, Day::Tue, Day::Thu]);
        assert_no_overlaps(&board);
    }

    #[test]
    fn test_duplicate_copies_share_time_but_not_identity() {
        let master = gym();
        let mut board = board_with(&master);
        let source = place(&mut board, &master, Day::Mon, at(7, SlotMinute::Half));

        assert!(board
            .apply(BoardAction::DuplicateToDays {
                card_id: source.id,
                start_day: Day::Mon,
                end_day: Day::Wed,
            })
            .is_applied());
        for copy in board.schedule_cards().iter().filter(|c| c.id != source.id) {
            assert_ne!(copy.id, source.id);
            assert_eq!(copy.start, source.start);
            assert_eq!(copy.duration, source.duration);
            assert_eq!(copy.master_id, source.master_id);
        }
    }

    #[test]
    fn test_duplicate_unknown_source_is_rejected() {
        let mut board = Board::default();
        assert_eq!(
            board.apply(BoardAction::DuplicateToDays {
                card_id: CardId::new(),
                start_day: Day::Sun,
                end_day: Day::Sat,
            }),
            Outcome::Rejected(RejectReason::UnknownCard)
        );
    }

    #[test]
    fn test_selection_is_mutually_exclusive() {
        let master = gym();
        let mut board = board_with(&master);
        let card = place(&mut board, &master, Day::Mon, at(9, SlotMinute::Zero));

        assert!(board
            .apply(BoardAction::SelectMasterCard(Some(master.id)))
            .is_applied());
        assert_eq!(board.selection(), Selection::Master(master.id));

        assert!(board
            .apply(BoardAction::SelectScheduleCard(Some(card.id)))
            .is_applied());
        assert_eq!(board.selection(), Selection::Schedule(card.id));

        assert!(board
            .apply(BoardAction::SelectScheduleCard(None))
            .is_applied());
        assert_eq!(board.selection(), Selection::None);
    }

    #[test]
    fn test_toggle_edit_mode() {
        let mut board = Board::default();
        assert_eq!(board.edit_mode(), EditMode::View);
        board.toggle_edit_mode();
        assert_eq!(board.edit_mode(), EditMode::Edit);
        board.toggle_edit_mode();
        assert_eq!(board.edit_mode(), EditMode::View);
    }

    #[test]
    fn test_snapshot_round_trips_through_load() {
        let master = gym();
        let mut board = board_with(&master);
        place(&mut board, &master, Day::Fri, at(18, SlotMinute::Zero));
        let snapshot = board.snapshot();

        let mut restored = Board::default();
        assert!(restored.apply(BoardAction::Load(snapshot.clone())).is_applied());
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_place_from_master_uses_default_duration() {
        let master = gym();
        let mut board = board_with(&master);
        assert!(board
            .place_from_master(master.id, Day::Mon, at(9, SlotMinute::Zero))
            .is_applied());
        let placed = board.schedule_cards().last().unwrap();
        assert_eq!(placed.duration, master.default_duration);
        assert_eq!(board.selection(), Selection::Schedule(placed.id));
    }
}
