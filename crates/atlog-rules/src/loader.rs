//! Load-once access to the rule document.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info, warn};

use crate::document::RuleDocument;
use crate::error::RuleError;
use crate::schema;
use crate::table::RuleTable;

/// Parses one rule document at most once and hands out the shared table.
///
/// Concurrent first calls serialize on an init lock; later calls return the
/// cached `Arc` without touching the filesystem. A failed load is not
/// cached, so a corrected document can be picked up by calling again.
#[derive(Debug)]
pub struct RuleLoader {
    path: PathBuf,
    table: OnceLock<Arc<RuleTable>>,
    init: Mutex<()>,
}

impl RuleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// The compiled table, parsing the document on first use.
    pub fn load(&self) -> Result<Arc<RuleTable>, RuleError> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(read_rule_file(&self.path)?);
        info!(
            path = %self.path.display(),
            rules = table.len(),
            "loaded transaction rules"
        );
        Ok(Arc::clone(self.table.get_or_init(|| table)))
    }
}

/// Read, validate and compile the rule document at `path`.
///
/// Does not cache; use [`RuleLoader`] for load-once semantics.
pub fn read_rule_file(path: &Path) -> Result<RuleTable, RuleError> {
    if !path.is_file() {
        return Err(RuleError::Missing {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "parsing rule document");

    let doc = RuleDocument::from_xml(&text)?;
    schema::validate(&doc, Some(&schema::companion_schema_path(path)))?;
    RuleTable::from_document(&doc)
}

static GLOBAL: OnceLock<RuleLoader> = OnceLock::new();

/// Process-wide rule table.
///
/// The first caller fixes the document path; later calls with another path
/// get the original table and a warning.
pub fn load_global(path: &Path) -> Result<Arc<RuleTable>, RuleError> {
    let loader = GLOBAL.get_or_init(|| RuleLoader::new(path));
    if loader.path() != path {
        warn!(
            requested = %path.display(),
            loaded = %loader.path().display(),
            "global rule table already bound to another document"
        );
    }
    loader.load()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"<configuration><rules>
        <rule type="withdrawal" journal="customer"><start>3201</start><end>3202</end></rule>
      </rules></configuration>"#;

    #[test]
    fn second_load_returns_cached_table_without_reading() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.xml");
        std::fs::write(&path, RULES).unwrap();

        let loader = RuleLoader::new(&path);
        assert!(!loader.is_loaded());
        let first = loader.load().unwrap();

        std::fs::remove_file(&path).unwrap();
        let second = loader.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(loader.is_loaded());
    }

    #[test]
    fn missing_document_is_an_error_and_not_cached() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.xml");
        let loader = RuleLoader::new(&path);

        assert!(matches!(loader.load(), Err(RuleError::Missing { .. })));
        assert!(!loader.is_loaded());

        std::fs::write(&path, RULES).unwrap();
        assert_eq!(loader.load().unwrap().len(), 1);
    }

    #[test]
    fn malformed_xml_is_an_xml_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.xml");
        std::fs::write(&path, "<configuration><rules><rule type=").unwrap();
        assert!(matches!(read_rule_file(&path), Err(RuleError::Xml(_))));
    }

    #[test]
    fn concurrent_first_loads_share_one_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.xml");
        std::fs::write(&path, RULES).unwrap();
        let loader = Arc::new(RuleLoader::new(&path));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = Arc::clone(&loader);
                std::thread::spawn(move || loader.load().unwrap())
            })
            .collect();
        let tables: Vec<Arc<RuleTable>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tables.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
