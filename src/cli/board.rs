use std::path::Path;

use anyhow::{Result, anyhow, bail};
use chrono::Duration;
use clap::Subcommand;

use crate::board::cards::{CardColor, CardId, Day, MasterCard, ScheduleCard};
use crate::board::slots::{SlotTime, format_duration};
use crate::board::store::{Board, BoardAction, Outcome, RejectReason};
use crate::storage::snapshot::BoardFile;

use super::output::grid::render_board;

#[derive(Debug, Subcommand)]
pub enum BoardCommand {
    #[command(about = "Show the weekly board")]
    Show {
        #[arg(long, help = "Render without colors")]
        plain: bool,
    },
    #[command(about = "List the master cards in the palette")]
    Cards,
    #[command(about = "Create a master card")]
    CardAdd {
        name: String,
        #[arg(long, value_enum, default_value_t)]
        color: CardColor,
        #[arg(long = "duration", default_value_t = 60, help = "Default duration in minutes")]
        duration: i64,
    },
    #[command(about = "Edit a master card")]
    CardEdit {
        #[arg(help = "Master card name or id prefix")]
        card: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        color: Option<CardColor>,
        #[arg(long = "duration", help = "Default duration in minutes")]
        duration: Option<i64>,
        #[arg(
            long,
            help = "Also apply the new duration to every placed instance of this card"
        )]
        cascade: bool,
    },
    #[command(about = "Delete a master card and every placement of it")]
    CardRm {
        #[arg(help = "Master card name or id prefix")]
        card: String,
    },
    #[command(about = "Place a master card on the board")]
    Place {
        #[arg(help = "Master card name or id prefix")]
        master: String,
        #[arg(long, value_enum)]
        day: Day,
        #[arg(long, help = "Start time, e.g. 9:00 or 14:30")]
        at: String,
        #[arg(long = "duration", help = "Duration in minutes, defaults to the card's own")]
        duration: Option<i64>,
    },
    #[command(about = "Move a placed card to another slot")]
    Move {
        #[arg(help = "Placed card id prefix")]
        card: String,
        #[arg(long, value_enum)]
        day: Option<Day>,
        #[arg(long, help = "Start time, e.g. 9:00 or 14:30")]
        at: Option<String>,
    },
    #[command(about = "Change the duration of a placed card")]
    Resize {
        #[arg(help = "Placed card id prefix")]
        card: String,
        #[arg(long = "duration", help = "New duration in minutes")]
        duration: i64,
    },
    #[command(
        about = "Copy a placed card onto every free day between its own day and the target day"
    )]
    Repeat {
        #[arg(help = "Placed card id prefix")]
        card: String,
        #[arg(long, value_enum)]
        to: Day,
    },
    #[command(about = "Remove a card from the board")]
    Rm {
        #[arg(help = "Placed card id prefix")]
        card: String,
    },
}

pub async fn process_board_command(command: BoardCommand, app_dir: &Path) -> Result<()> {
    let file = BoardFile::new(app_dir);
    let mut board = Board::default();
    if let Some(snapshot) = file.load().await? {
        let _ = board.apply(BoardAction::Load(snapshot));
    }

    match command {
        BoardCommand::Show { plain } => {
            print!("{}", render_board(&board, !plain));
            Ok(())
        }
        BoardCommand::Cards => {
            for card in board.master_cards() {
                println!(
                    "{}\t{}\t{}\t{}",
                    card.id.short(),
                    format_duration(card.default_duration),
                    card.color.hex(),
                    card.name
                );
            }
            Ok(())
        }
        BoardCommand::CardAdd {
            name,
            color,
            duration,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("A master card needs a name");
            }
            let card = MasterCard::new(name, color, Duration::minutes(duration));
            let short = card.id.short();
            commit(&mut board, &file, BoardAction::AddMasterCard(card)).await?;
            println!("Added master card {short}");
            Ok(())
        }
        BoardCommand::CardEdit {
            card,
            name,
            color,
            duration,
            cascade,
        } => {
            let id = find_master(&board, &card)?;
            let mut updated = board.master_card(id).expect("just resolved").clone();
            if let Some(name) = name {
                updated.name = name;
            }
            if let Some(color) = color {
                updated.color = color;
            }
            if let Some(duration) = duration {
                updated.default_duration = Duration::minutes(duration);
            }
            commit(
                &mut board,
                &file,
                BoardAction::UpdateMasterCard {
                    card: updated,
                    cascade,
                },
            )
            .await?;
            println!("Updated master card {}", id.short());
            Ok(())
        }
        BoardCommand::CardRm { card } => {
            let id = find_master(&board, &card)?;
            let instances = board
                .schedule_cards()
                .iter()
                .filter(|c| c.master_id == id)
                .count();
            commit(&mut board, &file, BoardAction::DeleteMasterCard(id)).await?;
            println!("Deleted master card {} and {instances} placement(s)", id.short());
            Ok(())
        }
        BoardCommand::Place {
            master,
            day,
            at,
            duration,
        } => {
            let master_id = find_master(&board, &master)?;
            let start: SlotTime = at.parse()?;
            let template = board.master_card(master_id).expect("just resolved");
            let mut card = ScheduleCard::new(template, day, start);
            if let Some(minutes) = duration {
                card.duration = board.config().clamp_duration(Duration::minutes(minutes));
            }
            let short = card.id.short();
            match board.apply(BoardAction::AddScheduleCard(card)) {
                Outcome::Applied => {
                    file.save(&board.snapshot()).await?;
                    println!("Placed {short} on {day} at {start}");
                }
                Outcome::Rejected(_) => {
                    println!("Not placed: that slot overlaps an existing card on {day}")
                }
            }
            Ok(())
        }
        BoardCommand::Move { card, day, at } => {
            let id = find_schedule_card(&board, &card)?;
            let current = board.schedule_card(id).expect("just resolved").clone();
            let day = day.unwrap_or(current.day);
            let start = match at {
                Some(at) => at.parse()?,
                None => current.start,
            };
            let updated = current.with_day(day).with_start(start);
            match board.apply(BoardAction::UpdateScheduleCard(updated)) {
                Outcome::Applied => {
                    file.save(&board.snapshot()).await?;
                    println!("Moved {} to {day} at {start}", id.short());
                }
                Outcome::Rejected(_) => {
                    println!("Not moved: that slot overlaps an existing card on {day}")
                }
            }
            Ok(())
        }
        BoardCommand::Resize { card, duration } => {
            let id = find_schedule_card(&board, &card)?;
            let current = board.schedule_card(id).expect("just resolved").clone();
            let updated = current.with_duration(Duration::minutes(duration));
            match board.apply(BoardAction::UpdateScheduleCard(updated)) {
                Outcome::Applied => {
                    file.save(&board.snapshot()).await?;
                    let applied = board.schedule_card(id).expect("still there");
                    println!("Resized {} to {}", id.short(), format_duration(applied.duration));
                }
                Outcome::Rejected(_) => {
                    println!("Not resized: the longer card would overlap a neighbour")
                }
            }
            Ok(())
        }
        BoardCommand::Repeat { card, to } => {
            let id = find_schedule_card(&board, &card)?;
            let source_day = board.schedule_card(id).expect("just resolved").day;
            let before = board.schedule_cards().len();
            commit(
                &mut board,
                &file,
                BoardAction::DuplicateToDays {
                    card_id: id,
                    start_day: source_day,
                    end_day: to,
                },
            )
            .await?;
            let placed = board.schedule_cards().len() - before;
            println!("Placed {placed} new card(s) between {source_day} and {to}");
            Ok(())
        }
        BoardCommand::Rm { card } => {
            let id = find_schedule_card(&board, &card)?;
            commit(&mut board, &file, BoardAction::DeleteScheduleCard(id)).await?;
            println!("Removed {}", id.short());
            Ok(())
        }
    }
}

/// Applies an action that's expected to succeed and persists the result.
async fn commit(board: &mut Board, file: &BoardFile, action: BoardAction) -> Result<()> {
    match board.apply(action) {
        Outcome::Applied => {
            file.save(&board.snapshot()).await?;
            Ok(())
        }
        Outcome::Rejected(RejectReason::UnknownCard) => bail!("Card not found"),
        Outcome::Rejected(RejectReason::Overlap) => bail!("Placement overlaps an existing card"),
    }
}

fn find_master(board: &Board, needle: &str) -> Result<CardId> {
    let prefix = needle.to_lowercase();
    let matches = board
        .master_cards()
        .iter()
        .filter(|card| {
            card.name.eq_ignore_ascii_case(needle) || card.id.to_string().starts_with(&prefix)
        })
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [card] => Ok(card.id),
        [] => Err(anyhow!("No master card matches {needle:?}")),
        _ => Err(anyhow!(
            "{needle:?} is ambiguous: {}",
            matches
                .iter()
                .map(|card| format!("{} ({})", card.name, card.id.short()))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

fn find_schedule_card(board: &Board, needle: &str) -> Result<CardId> {
    let prefix = needle.to_lowercase();
    let matches = board
        .schedule_cards()
        .iter()
        .filter(|card| card.id.to_string().starts_with(&prefix))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [card] => Ok(card.id),
        [] => Err(anyhow!("No placed card matches {needle:?}")),
        _ => Err(anyhow!("{needle:?} matches more than one placed card")),
    }
}
