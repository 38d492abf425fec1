use std::fmt::Display;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

use super::cards::duration_mins;

/// Cards snap to half-hour boundaries, so a start minute is either :00 or :30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SlotMinute {
    Zero,
    Half,
}

impl SlotMinute {
    pub fn minutes(self) -> i64 {
        match self {
            SlotMinute::Zero => 0,
            SlotMinute::Half => 30,
        }
    }
}

impl From<SlotMinute> for u8 {
    fn from(value: SlotMinute) -> Self {
        value.minutes() as u8
    }
}

impl TryFrom<u8> for SlotMinute {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SlotMinute::Zero),
            30 => Ok(SlotMinute::Half),
            other => Err(format!("start minute must be 0 or 30, got {other}")),
        }
    }
}

/// A grid-aligned point in time within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotTime {
    pub hour: u8,
    pub minute: SlotMinute,
}

impl SlotTime {
    pub fn new(hour: u8, minute: SlotMinute) -> Self {
        Self { hour, minute }
    }

    pub fn minute_of_day(&self) -> i64 {
        self.hour as i64 * 60 + self.minute.minutes()
    }

    /// Snaps an arbitrary minute-of-day down to its half-hour slot. Values are
    /// taken modulo a 24-hour day.
    pub fn from_minute_of_day(minute_of_day: i64) -> Self {
        let minute_of_day = minute_of_day.rem_euclid(24 * 60);
        let minute = if minute_of_day % 60 >= 30 {
            SlotMinute::Half
        } else {
            SlotMinute::Zero
        };
        Self {
            hour: (minute_of_day / 60) as u8,
            minute,
        }
    }
}

impl Display for SlotTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute.minutes())
    }
}

impl FromStr for SlotTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected a time like 9:00 or 14:30, got {s:?}"))?;
        let hour: u8 = hour.parse()?;
        if hour > 23 {
            return Err(anyhow!("hour must be between 0 and 23, got {hour}"));
        }
        let minute: u8 = minute.parse()?;
        let minute =
            SlotMinute::try_from(minute).map_err(|e| anyhow!("can't parse {s:?}: {e}"))?;
        Ok(SlotTime::new(hour, minute))
    }
}

/// Granularity of the schedule grid. Durations and drag deltas quantize to
/// this step.
pub const DURATION_STEP: Duration = Duration::minutes(30);

/// Grid boundaries and duration limits for a board. The operating window only
/// constrains where a card may start; a long card can run past `day_end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub day_start_hour: u8,
    pub day_end_hour: u8,
    #[serde(with = "duration_mins")]
    pub min_duration: Duration,
    #[serde(with = "duration_mins")]
    pub max_duration: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 6,
            day_end_hour: 22,
            min_duration: Duration::minutes(30),
            max_duration: Duration::minutes(240),
        }
    }
}

impl BoardConfig {
    /// Rounds to the nearest half-hour step (ties round up) and clamps into
    /// the configured duration range. Idempotent.
    pub fn clamp_duration(&self, duration: Duration) -> Duration {
        let step = DURATION_STEP.num_minutes();
        let rounded = (duration.num_minutes() + step / 2).div_euclid(step) * step;
        Duration::minutes(rounded.clamp(
            self.min_duration.num_minutes(),
            self.max_duration.num_minutes(),
        ))
    }

    /// Clamps a start hour into the operating window.
    pub fn clamp_hour(&self, hour: i64) -> u8 {
        hour.clamp(self.day_start_hour as i64, self.day_end_hour as i64) as u8
    }
}

pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    if minutes >= 60 && minutes % 60 != 0 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else if minutes >= 60 {
        format!("{}h", minutes / 60)
    } else {
        format!("{minutes}m")
    }
}
