//! Entity structs produced by the unpacker, scanner and flow builder.
//!
//! All structs derive `Serialize` and `Deserialize` so front ends can hand
//! them straight to their own response contracts.

mod diff;
mod extracted;
mod flow;
mod record;

pub use diff::{DiffStep, UiPathDiff};
pub use extracted::{ExtractedFile, OpaqueReason};
pub use flow::{EventField, TransactionEvent, TransactionFlow, UI_STEP_FIELD};
pub use record::RecordBuffer;
