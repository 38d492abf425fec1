use std::fmt::Display;

use chrono::Duration;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::slots::SlotTime;

/// Identifier shared by master cards and placed schedule cards. Random 128-bit
/// values, so collisions across sessions are not a practical concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Prefix used when showing ids to the user. Long enough to stay unique on
    /// a board of realistic size.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Day of the week, indexed 0 (Sunday) through 6 (Saturday).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Day {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

pub const ALL_DAYS: [Day; 7] = [
    Day::Sun,
    Day::Mon,
    Day::Tue,
    Day::Wed,
    Day::Thu,
    Day::Fri,
    Day::Sat,
];

impl Day {
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Moves by `delta` days, saturating at the week boundaries instead of
    /// wrapping.
    pub fn offset(self, delta: i64) -> Day {
        let index = (self.index() as i64 + delta).clamp(0, 6);
        ALL_DAYS[index as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Day::Sun => "Sunday",
            Day::Mon => "Monday",
            Day::Tue => "Tuesday",
            Day::Wed => "Wednesday",
            Day::Thu => "Thursday",
            Day::Fri => "Friday",
            Day::Sat => "Saturday",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Day::Sun => "Sun",
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
        }
    }
}

impl From<Day> for u8 {
    fn from(value: Day) -> Self {
        value.index()
    }
}

impl TryFrom<u8> for Day {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ALL_DAYS
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("day index out of range: {value}"))
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fixed palette cards can be painted with. Hex values are what gets
/// serialized, the ANSI mapping is for terminal rendering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    #[default]
    Crimson,
    Amber,
    Emerald,
    Teal,
    Sky,
    Indigo,
    Violet,
    Rose,
}

impl CardColor {
    pub fn hex(self) -> &'static str {
        match self {
            CardColor::Crimson => "#dc2626",
            CardColor::Amber => "#d97706",
            CardColor::Emerald => "#059669",
            CardColor::Teal => "#0d9488",
            CardColor::Sky => "#0284c7",
            CardColor::Indigo => "#4f46e5",
            CardColor::Violet => "#7c3aed",
            CardColor::Rose => "#e11d48",
        }
    }

    pub fn ansi(self) -> ansi_term::Colour {
        let hex = self.hex().trim_start_matches('#');
        // The palette is compile-time constants, so the parse cannot fail.
        let value = u32::from_str_radix(hex, 16).expect("palette entries are valid hex");
        ansi_term::Colour::RGB((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

/// An activity template. Placing one on the board creates a [ScheduleCard]
/// that starts out with the template's default duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterCard {
    pub id: CardId,
    pub name: String,
    pub color: CardColor,
    #[serde(with = "duration_mins")]
    pub default_duration: Duration,
}

impl MasterCard {
    pub fn new(name: impl Into<String>, color: CardColor, default_duration: Duration) -> Self {
        Self {
            id: CardId::new(),
            name: name.into(),
            color,
            default_duration,
        }
    }
}

/// A placement of a master card on a specific day and time slot. The card
/// references its template by id; deleting the template deletes its
/// placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCard {
    pub id: CardId,
    pub master_id: CardId,
    pub day: Day,
    pub start: SlotTime,
    #[serde(with = "duration_mins")]
    pub duration: Duration,
}

impl ScheduleCard {
    pub fn new(master: &MasterCard, day: Day, start: SlotTime) -> Self {
        Self {
            id: CardId::new(),
            master_id: master.id,
            day,
            start,
            duration: master.default_duration,
        }
    }

    pub fn start_minute_of_day(&self) -> i64 {
        self.start.minute_of_day()
    }

    pub fn end_minute_of_day(&self) -> i64 {
        self.start.minute_of_day() + self.duration.num_minutes()
    }

    /// End of the card on a 24-hour clock, for display.
    pub fn end_time(&self) -> SlotTime {
        SlotTime::from_minute_of_day(self.end_minute_of_day().rem_euclid(24 * 60))
    }

    /// Two cards overlap iff they sit on the same day and their half-open
    /// minute intervals intersect. Back-to-back cards do not overlap.
    pub fn overlaps(&self, other: &ScheduleCard) -> bool {
        self.day == other.day
            && self.start_minute_of_day() < other.end_minute_of_day()
            && other.start_minute_of_day() < self.end_minute_of_day()
    }

    pub fn with_day(self, day: Day) -> Self {
        Self { day, ..self }
    }

    pub fn with_start(self, start: SlotTime) -> Self {
        Self { start, ..self }
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Self { duration, ..self }
    }
}

/// Palette a fresh board starts out with.
pub fn default_master_cards() -> Vec<MasterCard> {
    vec![
        MasterCard::new("Deep Work", CardColor::Indigo, Duration::minutes(120)),
        MasterCard::new("Gym", CardColor::Crimson, Duration::minutes(60)),
        MasterCard::new("Reading", CardColor::Amber, Duration::minutes(30)),
        MasterCard::new("Errands", CardColor::Teal, Duration::minutes(60)),
    ]
}

pub(crate) mod duration_mins {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_minutes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minutes = i64::deserialize(deserializer)?;
        Ok(Duration::minutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::board::slots::SlotTime;

    use super::{CardColor, Day, MasterCard, ScheduleCard};

    fn card_at(day: Day, minute_of_day: i64, duration: i64) -> ScheduleCard {
        let master = MasterCard::new("test", CardColor::Sky, Duration::minutes(duration));
        ScheduleCard::new(&master, day, SlotTime::from_minute_of_day(minute_of_day))
    }

    #[test]
    fn test_overlap_requires_same_day() {
        let a = card_at(Day::Mon, 9 * 60, 60);
        let b = card_at(Day::Tue, 9 * 60, 60);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&a.clone().with_duration(Duration::minutes(30))));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = card_at(Day::Mon, 9 * 60, 60);
        let b = card_at(Day::Mon, 9 * 60 + 30, 60);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_adjacent_cards_do_not_overlap() {
        let a = card_at(Day::Mon, 9 * 60, 60);
        let b = card_at(Day::Mon, 10 * 60, 60);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_day_offset_saturates() {
        assert_eq!(Day::Mon.offset(2), Day::Wed);
        assert_eq!(Day::Mon.offset(-3), Day::Sun);
        assert_eq!(Day::Fri.offset(4), Day::Sat);
    }

    #[test]
    fn test_end_time_wraps_for_display() {
        let late = card_at(Day::Sat, 23 * 60, 120);
        assert_eq!(late.end_minute_of_day(), 25 * 60);
        assert_eq!(late.end_time().to_string(), "01:00");
    }
}
