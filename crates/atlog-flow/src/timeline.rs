//! UI journal timelines.
//!
//! UI journal lines look like
//! `HH:MM:SS id module dir [view] - screen result|action:{json}`. Lines whose
//! payload is not valid JSON are dropped, as are `GUIDM` lines for any
//! screen other than `DMAuthorization`. Exact duplicate lines are kept once.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use atlog_core::{TransactionFlow, text};
use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;

use crate::error::FlowError;
use crate::journal::{Clock, UNDATED, date_from_name, split_stamp};

static UI_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{2}:\d{2}:\d{2}\s+(\d+)\s+(\w+)\s+([<>*])\s+\[(\d+)\]\s+-\s+(\w+)\s+(result|action):(.+)$",
    )
    .expect("valid regex")
});

const DIALOG_MODULE: &str = "GUIDM";
const DIALOG_SCREEN: &str = "DMAuthorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEventKind {
    Result,
    Action,
}

/// One UI journal event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiEvent {
    pub timestamp: NaiveDateTime,
    pub id: u64,
    pub module: String,
    /// `<`, `>` or `*`.
    pub direction: char,
    pub view_id: u32,
    pub screen: String,
    pub kind: UiEventKind,
    pub payload: serde_json::Value,
    pub line: usize,
}

/// Parsed UI journal, events in file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UiTimeline {
    pub source: String,
    pub events: Vec<UiEvent>,
    /// Whether timestamps carry a real date.
    pub dated: bool,
}

impl UiTimeline {
    pub fn from_path(path: &Path) -> Result<Self, FlowError> {
        let bytes = std::fs::read(path).map_err(|source| FlowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self::parse(&source, &text::decode(&bytes)))
    }

    #[must_use]
    pub fn parse(source: &str, text: &str) -> Self {
        let mut clock = Clock::new(date_from_name(source));
        let mut seen = HashSet::new();
        let mut events = Vec::new();
        let mut dropped = 0usize;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let Some((date, time, rest)) = split_stamp(line) else {
                continue;
            };
            let Some(event) = parse_event(rest) else {
                if UI_LINE.is_match(rest) {
                    dropped += 1;
                }
                continue;
            };
            if !seen.insert(line.to_string()) {
                continue;
            }
            let (id, module, direction, view_id, screen, kind, payload) = event;
            events.push(UiEvent {
                timestamp: clock.stamp(date, time),
                id,
                module,
                direction,
                view_id,
                screen,
                kind,
                payload,
                line: index + 1,
            });
        }

        tracing::debug!(source, events = events.len(), dropped, "ui journal parsed");
        Self {
            source: source.to_string(),
            events,
            dated: clock.is_dated(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Screens between `start` and `end` inclusive, consecutive repeats collapsed.
    ///
    /// With `by_time_of_day` only the time component is compared, and a
    /// window whose end is before its start wraps past midnight.
    #[must_use]
    pub fn screens_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        by_time_of_day: bool,
    ) -> Vec<String> {
        let inside = |at: NaiveDateTime| {
            if by_time_of_day {
                within_times(at.time(), start.time(), end.time())
            } else {
                start <= at && at <= end
            }
        };
        let mut path: Vec<String> = Vec::new();
        for event in self.events.iter().filter(|event| inside(event.timestamp)) {
            if path.last().is_none_or(|last| *last != event.screen) {
                path.push(event.screen.clone());
            }
        }
        path
    }

    /// Screens shown during a flow's time window.
    ///
    /// Dates are compared only when both the timeline and the flow have one.
    #[must_use]
    pub fn path_for(&self, flow: &TransactionFlow) -> Vec<String> {
        let (Some(start), Some(end)) = (flow.start(), flow.end()) else {
            return Vec::new();
        };
        let by_time_of_day = !self.dated || start.date() == UNDATED;
        self.screens_between(start, end, by_time_of_day)
    }
}

fn within_times(at: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= at && at <= end
    } else {
        at >= start || at <= end
    }
}

type ParsedEvent = (u64, String, char, u32, String, UiEventKind, serde_json::Value);

fn parse_event(line: &str) -> Option<ParsedEvent> {
    let caps = UI_LINE.captures(line)?;
    let module = &caps[2];
    let screen = &caps[5];
    if module == DIALOG_MODULE && screen != DIALOG_SCREEN {
        return None;
    }
    let payload: serde_json::Value = serde_json::from_str(caps[7].trim()).ok()?;
    let kind = if &caps[6] == "result" {
        UiEventKind::Result
    } else {
        UiEventKind::Action
    };
    Some((
        caps[1].parse().ok()?,
        module.to_string(),
        caps[3].chars().next()?,
        caps[4].parse().ok()?,
        screen.to_string(),
        kind,
        payload,
    ))
}

/// UI path of a flow: its own screen fields, else the first timeline that
/// shows anything during the flow.
#[must_use]
pub fn ui_path_for(flow: &TransactionFlow, timelines: &[UiTimeline]) -> Vec<String> {
    let own = flow.ui_path();
    if !own.is_empty() {
        return own;
    }
    timelines
        .iter()
        .map(|timeline| timeline.path_for(flow))
        .find(|path| !path.is_empty())
        .unwrap_or_default()
}
