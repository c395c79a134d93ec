//! # atlog-archive
//!
//! Archive handling for diagnostic bundles:
//!
//! - [`Unpacker`]: recursive, junk-filtered unpacking of nested ZIP
//!   archives into a scratch directory
//! - [`RecordScanner`]: in-memory extraction of embedded configuration
//!   records (`jdd*.xml`, `x3*.xml`) and their `.xsd` schemas
//! - [`companion`]: structural validation of records against those schemas
//! - [`Session`]: scratch directory lifetime for one archive
//!
//! Both passes share the in-memory Zip32 reader in [`zip`].

mod cancel;
pub mod companion;
pub mod error;
mod filter;
pub mod path;
mod scan;
mod session;
mod unpack;
pub mod zip;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use cancel::CancelToken;
pub use error::{ArchiveError, ContainerError, EntryError};
pub use filter::{EntryFilter, SkipReason};
pub use scan::RecordScanner;
pub use session::Session;
pub use unpack::{Notice, NoticeKind, SkippedEntry, UnpackReport, Unpacker};
