//! # atlog-flow
//!
//! Transaction flow reconstruction over customer and UI journals.
//!
//! - [`FlowBuilder`]: rule-driven flows from one journal
//! - [`UiTimeline`]: UI journal events and the screens shown in a window
//! - [`diff_paths`] / [`diff_flows`]: LCS alignment of UI paths
//! - [`FlowSummary`]: counts over a set of flows

mod builder;
mod diff;
pub mod error;
pub mod journal;
mod summary;
mod timeline;

pub use builder::{FlowBuilder, TRANSACTION_ID_FIELD};
pub use diff::{diff_flows, diff_paths};
pub use error::FlowError;
pub use summary::FlowSummary;
pub use timeline::{UiEvent, UiEventKind, UiTimeline, ui_path_for};
