//! Display sequence derived from the sleep night collection.
//!
//! # Responsibility
//! - Build `DisplayItem` sequences for the sleep list.
//! - Format durations, dates and quality text for rows.
//!
//! # Invariants
//! - Empty input yields an empty sequence (no lone header).
//! - Non-empty input yields exactly one `Header`, always at index 0.
//! - Building twice from the same input yields equal sequences.

use crate::diff::Diffable;
use crate::model::sleep_night::{quality_icon, quality_label, NightId, SleepNight};
use chrono::{Local, TimeZone};
use std::fmt::{Display, Write};

const ONE_MINUTE_MILLIS: i64 = 60 * 1000;
const ONE_HOUR_MILLIS: i64 = 60 * ONE_MINUTE_MILLIS;
const UNKNOWN_TIME_TEXT: &str = "--";

/// Row identity inside a display sequence.
///
/// The header variant carries no id, so it can never collide with a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Header,
    Night(NightId),
}

/// Display fields for one sleep night row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightRow {
    pub night_id: NightId,
    pub duration_text: String,
    pub quality_text: &'static str,
    pub quality_icon: &'static str,
}

/// One rendered list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    Header,
    Night(NightRow),
}

impl DisplayItem {
    pub fn night_id(&self) -> Option<NightId> {
        match self {
            Self::Header => None,
            Self::Night(row) => Some(row.night_id),
        }
    }
}

impl Diffable for DisplayItem {
    type Key = RowKey;

    fn key(&self) -> RowKey {
        match self {
            Self::Header => RowKey::Header,
            Self::Night(row) => RowKey::Night(row.night_id),
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        self == other
    }
}

/// Formats night timestamps in a fixed time zone.
#[derive(Debug, Clone)]
pub struct NightFormatter<Tz: TimeZone> {
    tz: Tz,
}

impl NightFormatter<Local> {
    /// Formatter using the device's local time zone.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl<Tz> NightFormatter<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// `"{n} seconds|minutes|hours on {Weekday}"`, weekday taken from start.
    pub fn duration_text(&self, night: &SleepNight) -> String {
        let duration = night.duration_ms();
        let weekday = self.format_millis(night.start_time_milli, "%A");
        if duration < ONE_MINUTE_MILLIS {
            format!("{} seconds on {weekday}", duration / 1000)
        } else if duration < ONE_HOUR_MILLIS {
            format!("{} minutes on {weekday}", duration / ONE_MINUTE_MILLIS)
        } else {
            format!("{} hours on {weekday}", duration / ONE_HOUR_MILLIS)
        }
    }

    /// `"Monday Jan-02-2023 Time: 13:45"` style timestamp.
    pub fn date_text(&self, millis: i64) -> String {
        self.format_millis(millis, "%A %b-%d-%Y Time: %H:%M")
    }

    fn format_millis(&self, millis: i64, pattern: &str) -> String {
        match self.tz.timestamp_millis_opt(millis).single() {
            Some(at) => at.format(pattern).to_string(),
            None => UNKNOWN_TIME_TEXT.to_string(),
        }
    }
}

/// Builds the display sequence for `nights` (most recent first).
pub fn build_display_items<Tz>(
    nights: &[SleepNight],
    formatter: &NightFormatter<Tz>,
) -> Vec<DisplayItem>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if nights.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::with_capacity(nights.len() + 1);
    items.push(DisplayItem::Header);
    items.extend(nights.iter().map(|night| {
        DisplayItem::Night(NightRow {
            night_id: night.night_id,
            duration_text: formatter.duration_text(night),
            quality_text: quality_label(night.sleep_quality),
            quality_icon: quality_icon(night.sleep_quality),
        })
    }));
    items
}

/// Plain-text history summary shown by the tracker screen.
///
/// Open nights only list their start time.
pub fn format_nights<Tz>(nights: &[SleepNight], formatter: &NightFormatter<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut text = String::from("Here is your sleep data");
    for night in nights {
        // Writing into a String cannot fail.
        let _ = write!(
            text,
            "\n\nStart:\t{}",
            formatter.date_text(night.start_time_milli)
        );
        if night.is_open() {
            continue;
        }
        let seconds = night.duration_ms() / 1000;
        let _ = write!(
            text,
            "\nEnd:\t{}\nQuality:\t{}\nHours:Minutes:Seconds:\t{}:{}:{}",
            formatter.date_text(night.end_time_milli),
            quality_label(night.sleep_quality),
            seconds / 3600,
            seconds / 60,
            seconds
        );
    }
    text
}
