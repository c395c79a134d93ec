//! # atlog-core
//!
//! Core types shared across all atlog crates.
//!
//! This crate provides:
//! - Closed enums for file categories, record kinds, journal kinds and flow states
//! - Entity structs produced by the unpacker, scanner and flow builder
//! - Best-effort text encoding detection and decoding for diagnostic files

pub mod entities;
pub mod enums;
pub mod text;

pub use entities::{
    DiffStep, EventField, ExtractedFile, OpaqueReason, RecordBuffer, TransactionEvent,
    TransactionFlow, UiPathDiff,
};
pub use enums::{DiffStepKind, FileCategory, FlowOutcome, FlowStatus, JournalKind, RecordKind};
pub use text::TextEncoding;
