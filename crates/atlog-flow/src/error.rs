use std::path::PathBuf;

use atlog_core::FileCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flows are only built from customer and UI journals.
    #[error("{} is not a journal (categorized as {category})", path.display())]
    NotAJournal {
        path: PathBuf,
        category: FileCategory,
    },
}
