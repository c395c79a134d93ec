//! Line-oriented journal reading.
//!
//! A journal line may start with `dd/mm/yyyy` and/or `HH:MM:SS`. Lines
//! without a time inherit the previous record's timestamp. Timestamps are
//! anchored to a base date and never go backwards: a time more than twelve
//! hours earlier than the previous one is taken to be on the next day, a
//! smaller backward step is clamped to the previous timestamp.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;

/// Date used when neither the file name nor the lines carry one.
pub const UNDATED: NaiveDate = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");

static STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{2}/\d{2}/\d{4})\s+)?(\d{2}:\d{2}:\d{2})\b").expect("valid regex")
});

static NAME_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8}").expect("valid regex"));

/// One journal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    /// 1-based line number.
    pub line: usize,
    pub timestamp: NaiveDateTime,
    /// Line text with any leading date removed.
    pub text: String,
}

/// First `YYYYMMDD` run in a file name that is a real date.
#[must_use]
pub fn date_from_name(name: &str) -> Option<NaiveDate> {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    NAME_DATE
        .find_iter(stem)
        .find_map(|run| NaiveDate::parse_from_str(run.as_str(), "%Y%m%d").ok())
}

/// Assigns non-decreasing timestamps to a sequence of times of day.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Date from the file name; inline dates are ignored when set.
    fixed: Option<NaiveDate>,
    date: NaiveDate,
    last: Option<NaiveDateTime>,
}

impl Clock {
    #[must_use]
    pub fn new(base: Option<NaiveDate>) -> Self {
        Self {
            fixed: base,
            date: base.unwrap_or(UNDATED),
            last: None,
        }
    }

    /// Whether timestamps carry a real date.
    #[must_use]
    pub fn is_dated(&self) -> bool {
        self.date != UNDATED
    }

    pub fn stamp(&mut self, inline: Option<NaiveDate>, time: NaiveTime) -> NaiveDateTime {
        if self.fixed.is_none() {
            if let Some(date) = inline {
                self.date = date;
            }
        }
        let mut stamp = self.date.and_time(time);
        if let Some(last) = self.last {
            if stamp < last {
                stamp = last.date().and_time(time);
                if last - stamp > TimeDelta::hours(12) {
                    stamp += TimeDelta::days(1);
                } else if stamp < last {
                    stamp = last;
                }
                self.date = stamp.date();
            }
        }
        self.last = Some(stamp);
        stamp
    }
}

/// Split a leading `dd/mm/yyyy HH:MM:SS` stamp off a line.
///
/// Returns the inline date, the time, and the text starting at the time.
#[must_use]
pub fn split_stamp(line: &str) -> Option<(Option<NaiveDate>, NaiveTime, &str)> {
    let caps = STAMP.captures(line)?;
    let time = NaiveTime::parse_from_str(&caps[2], "%H:%M:%S").ok()?;
    let date = caps
        .get(1)
        .and_then(|date| NaiveDate::parse_from_str(date.as_str(), "%d/%m/%Y").ok());
    let start = caps.get(2).map_or(0, |m| m.start());
    Some((date, time, &line[start..]))
}

fn is_filler(line: &str) -> bool {
    line.is_empty() || line.chars().all(|c| c == '*')
}

/// Read journal text into records.
///
/// `source` is the journal's file name, used for the base date.
#[must_use]
pub fn read_records(source: &str, text: &str) -> Vec<JournalRecord> {
    let mut clock = Clock::new(date_from_name(source));
    let mut current: Option<NaiveDateTime> = None;
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if is_filler(line) {
            continue;
        }
        let (timestamp, text) = match split_stamp(line) {
            Some((date, time, rest)) => (clock.stamp(date, time), rest),
            None => match current {
                Some(timestamp) => (timestamp, line),
                None => continue,
            },
        };
        current = Some(timestamp);
        records.push(JournalRecord {
            line: index + 1,
            timestamp,
            text: text.to_string(),
        });
    }
    records
}
