//! # atlog-categorize
//!
//! Assigns every extracted file and embedded record to exactly one
//! [`FileCategory`](atlog_core::FileCategory).
//!
//! Classification runs a declarative [`PatternTable`] in three stages:
//! filename, parent directories (nearest first), then the head of the
//! content. The first stage that matches decides.

mod categorizer;
pub mod error;
pub mod table;

pub use categorizer::{CategorizeMode, CategorizedItem, Categorizer, CategoryBuckets, Decision};
pub use error::CategorizeError;
pub use table::{Matcher, PatternRow, PatternTable, Stage};
