use ansi_term::Style;

use crate::board::cards::{ALL_DAYS, ScheduleCard};
use crate::board::store::Board;

const CELL_WIDTH: usize = 10;

/// Renders the weekly board as a grid: one column per day, one row per
/// half-hour slot of the operating window. A card paints its name into its
/// first slot and fills the rest of its span. With `colored` off the cells
/// fall back to plain markers, which is also what the tests look at.
pub fn render_board(board: &Board, colored: bool) -> String {
    let config = board.config();
    let mut out = String::new();

    out.push_str(&" ".repeat(6));
    for day in ALL_DAYS {
        out.push_str(&format!("{:<width$} ", day.short_label(), width = CELL_WIDTH));
    }
    out.push('\n');

    let first_slot = config.day_start_hour as i64 * 60;
    // Cards may start at the last operating hour's half slot, so the grid
    // runs one full hour past it.
    let last_slot = (config.day_end_hour as i64 + 1) * 60;
    for slot in (first_slot..last_slot).step_by(30) {
        if slot % 60 == 0 {
            out.push_str(&format!("{:02}:00 ", slot / 60));
        } else {
            out.push_str(&" ".repeat(6));
        }
        for day in ALL_DAYS {
            let covering = board
                .cards_for_day(day)
                .into_iter()
                .find(|card| card.start_minute_of_day() <= slot && slot < card.end_minute_of_day());
            out.push_str(&render_cell(board, covering, slot, colored));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn render_cell(board: &Board, covering: Option<&ScheduleCard>, slot: i64, colored: bool) -> String {
    let Some(card) = covering else {
        return format!("{:<CELL_WIDTH$}", ".");
    };
    let is_start = card.start_minute_of_day() == slot;
    let label = if is_start {
        board
            .master_card(card.master_id)
            .map(|master| truncated(&master.name))
            .unwrap_or_default()
    } else {
        String::new()
    };
    if !colored {
        let marker = if is_start { label } else { "|".to_string() };
        return format!("{marker:<CELL_WIDTH$}");
    }
    let style = board
        .master_card(card.master_id)
        .map(|master| Style::new().on(master.color.ansi()).fg(ansi_term::Colour::White))
        .unwrap_or_default();
    style.paint(format!("{label:<CELL_WIDTH$}")).to_string()
}

fn truncated(name: &str) -> String {
    name.chars().take(CELL_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::board::cards::{CardColor, Day, MasterCard, ScheduleCard};
    use crate::board::slots::{SlotMinute, SlotTime};
    use crate::board::store::{Board, BoardAction};

    use super::render_board;

    #[test]
    fn test_grid_places_card_in_its_slot() {
        let master = MasterCard::new("Gym", CardColor::Crimson, Duration::minutes(90));
        let mut board = Board::default();
        let _ = board.apply(BoardAction::AddMasterCard(master.clone()));
        let card = ScheduleCard::new(&master, Day::Mon, SlotTime::new(9, SlotMinute::Zero));
        assert!(board.apply(BoardAction::AddScheduleCard(card)).is_applied());

        let grid = render_board(&board, false);
        let lines = grid.lines().collect::<Vec<_>>();
        assert!(lines[0].contains("Mon"));

        let nine = lines
            .iter()
            .find(|line| line.starts_with("09:00"))
            .expect("9:00 row");
        assert!(nine.contains("Gym"));

        // The 9:30 continuation row is marked but unlabeled.
        let row_index = lines.iter().position(|line| line.starts_with("09:00")).unwrap();
        assert!(lines[row_index + 1].contains('|'));
        // By 10:30 the card has ended.
        assert!(!lines[row_index + 3].contains('|'));
    }

    #[test]
    fn test_grid_covers_operating_window() {
        let board = Board::default();
        let grid = render_board(&board, false);
        assert!(grid.contains("06:00"));
        assert!(grid.contains("22:00"));
        assert!(!grid.contains("23:00"));
        assert!(!grid.contains("05:00"));
    }
}
